//! Tree-walking evaluator.
//!
//! The interpreter owns the global frame and one *current* frame cursor,
//! swapped in and out around blocks, calls and class bodies. Statements
//! produce a [`Flow`] so `return` unwinds to the nearest call without using
//! the error channel; runtime failures and `exit()` travel as
//! [`InterpretError`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::ast::{Expr, ExprKind, LiteralValue, Stmt};
use crate::class::{Class, Instance, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::{ConsoleReporter, LoxError, Reporter, RuntimeError};
use crate::function::Function;
use crate::module::{self, FsLoader, ModuleLoader, STD_PREFIX};
use crate::native;
use crate::parser::Parser;
use crate::resolver::{Locals, Resolver};
use crate::scanner;
use crate::token::{Token, TokenType};
use crate::value::Value;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpretError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// The program called `exit()`. Not a failure.
    #[error("exit requested")]
    Exit,
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, InterpretError>;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    /// A `return` is unwinding to the nearest function call.
    Return(Value),
}

/// Default bound on nested calls before a run fails with "Stack overflow.".
pub const MAX_CALL_DEPTH: usize = 1000;

/// End state of [`Interpreter::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Completed,
    /// Scanning, parsing or resolution failed; nothing was executed.
    StaticError,
    RuntimeError,
    Exited,
}

impl Status {
    /// Conventional process exit code for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Completed | Status::Exited => 0,
            Status::StaticError => 65,
            Status::RuntimeError => 70,
        }
    }
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: Locals,
    call_depth: usize,
    max_call_depth: usize,
    output: Box<dyn Write>,
    input: Box<dyn BufRead>,
    reporter: Box<dyn Reporter>,
    loader: Box<dyn ModuleLoader>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter with every native function defined, talking to
    /// stdin/stdout/stderr and loading modules from the filesystem.
    pub fn new() -> Self {
        info!("Initializing Interpreter");

        let mut globals = Environment::new();
        native::register(&mut globals);
        let globals: EnvRef = Rc::new(RefCell::new(globals));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            call_depth: 0,
            max_call_depth: MAX_CALL_DEPTH,
            output: Box::new(io::stdout()),
            input: Box::new(BufReader::new(io::stdin())),
            reporter: Box::new(ConsoleReporter),
            loader: Box::new(FsLoader),
        }
    }

    /// Sends `print` output to `output` instead of stdout.
    pub fn with_output<W: Write + 'static>(mut self, output: W) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Reads `input()` lines from `input` instead of stdin.
    pub fn with_input<R: BufRead + 'static>(mut self, input: R) -> Self {
        self.input = Box::new(input);
        self
    }

    pub fn with_reporter<R: Reporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Caps how deeply calls may nest. Each call also uses native stack, so
    /// the host thread must be large enough for the chosen limit.
    pub fn with_max_call_depth(mut self, limit: usize) -> Self {
        self.max_call_depth = limit;
        self
    }

    pub fn with_loader<L: ModuleLoader + 'static>(mut self, loader: L) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Names currently bound in the global frame.
    pub fn global_names(&self) -> Vec<String> {
        self.globals.borrow().names().map(str::to_string).collect()
    }

    // ─────────────────────────────── pipeline ───────────────────────────────

    /// Scan → parse → resolve `source`. On success the resolution table is
    /// merged into this interpreter and the program is returned, ready for
    /// [`interpret`](Self::interpret).
    pub fn compile(&mut self, source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let (tokens, mut errors) = scanner::scan(source);

        let statements = match Parser::new(tokens).parse() {
            Ok(statements) => statements,
            Err(parse_errors) => {
                errors.extend(parse_errors);
                return Err(errors);
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let locals = Resolver::new(self.global_names()).resolve(&statements)?;
        self.resolve(locals);

        Ok(statements)
    }

    /// Merges resolver output into the side-table.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved reference(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Compiles and runs `source`, sending every failure to the reporter.
    pub fn run(&mut self, source: &str) -> Status {
        let statements = match self.compile(source) {
            Ok(statements) => statements,
            Err(errors) => {
                debug!("Refusing to run: {} static error(s)", errors.len());
                for error in &errors {
                    self.reporter.static_error(error);
                }
                return Status::StaticError;
            }
        };

        match self.interpret(&statements) {
            Ok(()) => Status::Completed,
            Err(InterpretError::Runtime(error)) => {
                debug!("Runtime error on line {}: {}", error.line(), error.message());
                self.reporter.runtime_error(&error);
                Status::RuntimeError
            }
            Err(InterpretError::Exit) => Status::Exited,
        }
    }

    /// Executes an already-resolved program in the global frame.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        let globals = Rc::clone(&self.globals);
        self.execute_block(statements, globals)?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────── host I/O ───────────────────────────────

    pub(crate) fn write_line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.output, "{}", text).and_then(|_| self.output.flush()) {
            debug!("Failed to write program output: {}", e);
        }
    }

    /// One line of input without its terminator; `None` at end of input.
    pub(crate) fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();

        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed);
                Some(line)
            }
        }
    }

    pub(crate) fn diagnostic(&mut self, message: &str) {
        self.reporter.diagnostic(message);
    }

    // ─────────────────────────────── statements ─────────────────────────────

    /// Runs `statements` with `environment` as the current frame, restoring
    /// the previous frame on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> IResult<Flow> {
        let previous = mem::replace(&mut self.environment, environment);

        let result = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Block(statements) => {
                debug!("Entering block with {} statements", statements.len());
                let environment = Environment::child(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Declaring class '{}'", name.lexeme);

                let superclass: Option<Rc<Class>> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let at = match &expr.kind {
                                ExprKind::Variable(token) => token,
                                _ => name,
                            };
                            return Err(
                                RuntimeError::type_error(at, "Superclass must be a class.").into()
                            );
                        }
                    },
                    None => None,
                };

                // Bound first so method bodies can refer to the class.
                self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

                let enclosing: Option<EnvRef> = superclass.as_ref().map(|superclass| {
                    let environment = Environment::child(&self.environment);
                    environment
                        .borrow_mut()
                        .define("super", Value::Class(Rc::clone(superclass)));
                    mem::replace(&mut self.environment, environment)
                });

                let methods = methods
                    .iter()
                    .map(|decl| {
                        let function = Function::new(
                            Rc::clone(decl),
                            Rc::clone(&self.environment),
                            decl.name.lexeme == INITIALIZER,
                        );
                        (decl.name.lexeme.clone(), Rc::new(function))
                    })
                    .collect();

                let class = Class::new(name.lexeme.clone(), superclass, methods);

                if let Some(enclosing) = enclosing {
                    self.environment = enclosing;
                }

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(Rc::new(class)))?;

                info!("Class '{}' defined", name.lexeme);
                Ok(Flow::Normal)
            }

            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));

                Ok(Flow::Normal)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::Import { keyword, module } => {
                let name = match self.evaluate(module)? {
                    Value::String(name) => name,
                    _ => {
                        return Err(
                            RuntimeError::module(keyword, "Module name must be a string.").into()
                        )
                    }
                };

                self.import(keyword, &name)?;
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Variable '{}' defined with value: {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(Flow::Normal)
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }

                Ok(Flow::Normal)
            }
        }
    }

    /// Loads a module and runs it in the global frame of this interpreter.
    fn import(&mut self, keyword: &Token, name: &str) -> IResult<()> {
        info!("Importing module '{}'", name);

        let source: String = match name.strip_prefix(STD_PREFIX) {
            Some(library) => module::builtin(library)
                .ok_or_else(|| {
                    RuntimeError::module(
                        keyword,
                        format!("'{}' is not a standard library module.", name),
                    )
                })?
                .to_string(),

            None => self.loader.load(name).map_err(|e| {
                debug!("Module load failed: {}", e);
                RuntimeError::module(keyword, format!("Could not import module '{}'.", name))
            })?,
        };

        let statements = match self.compile(&source) {
            Ok(statements) => statements,
            Err(errors) => {
                for error in &errors {
                    self.reporter.static_error(error);
                }
                return Err(RuntimeError::module(
                    keyword,
                    format!("Module '{}' contains errors.", name),
                )
                .into());
            }
        };

        self.interpret(&statements)
    }

    // ─────────────────────────────── expressions ────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match &expr.kind {
            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(&expr.id) {
                    Some(&distance) => self.environment.borrow_mut().assign_at(
                        distance,
                        &name.lexeme,
                        value.clone(),
                    ),
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(binary(operator, left, right)?)
            }

            ExprKind::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Some(callable) = callee.as_callable() else {
                    return Err(RuntimeError::type_error(
                        paren,
                        "Can only call functions and classes.",
                    )
                    .into());
                };

                if values.len() != callable.arity() {
                    return Err(RuntimeError::arity(paren, callable.arity(), values.len()).into());
                }

                if self.call_depth >= self.max_call_depth {
                    debug!("Call depth limit {} reached", self.max_call_depth);
                    return Err(RuntimeError::stack_overflow(paren).into());
                }

                self.call_depth += 1;
                let result = callable.call(self, values);
                self.call_depth -= 1;

                result
            }

            ExprKind::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Ok(Instance::get(&instance, name)?),
                _ => Err(RuntimeError::type_error(name, "Only instances have properties.").into()),
            },

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let decided = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            ExprKind::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::type_error(name, "Only instances have fields.").into());
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            ExprKind::Super { keyword, method } => {
                let Some(&distance) = self.locals.get(&expr.id) else {
                    panic!("'super' on line {} was never resolved", keyword.line);
                };

                let superclass = self.environment.borrow().get_at(distance, "super");
                // `this` lives in the frame just inside the one binding `super`.
                let object = self.environment.borrow().get_at(distance - 1, "this");

                let (Value::Class(superclass), Value::Instance(object)) = (superclass, object) else {
                    panic!("'super'/'this' frames hold unexpected values");
                };

                match superclass.find_method(&method.lexeme) {
                    Some(found) => Ok(Value::Function(Rc::new(found.bind(&object)))),
                    None => Err(RuntimeError::undefined_property(method).into()),
                }
            }

            ExprKind::This(keyword) => self.look_up_variable(keyword, expr),

            ExprKind::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(
                            RuntimeError::type_error(operator, "Operand must be a number.").into()
                        ),
                    },
                    _ => Ok(Value::Bool(!right.is_truthy())),
                }
            }

            ExprKind::Variable(name) => self.look_up_variable(name, expr),
        }
    }

    fn look_up_variable(&self, name: &Token, expr: &Expr) -> IResult<Value> {
        match self.locals.get(&expr.id) {
            Some(&distance) => Ok(self.environment.borrow().get_at(distance, &name.lexeme)),
            None => Ok(self.globals.borrow().get(name)?),
        }
    }
}

/// Arithmetic, comparison and equality on two evaluated operands.
fn binary(operator: &Token, left: Value, right: Value) -> Result<Value, RuntimeError> {
    let numbers = |left: &Value, right: &Value| match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::type_error(operator, "Operands must be numbers.")),
    };

    Ok(match operator.token_type {
        TokenType::EQUAL_EQUAL => Value::Bool(left == right),
        TokenType::BANG_EQUAL => Value::Bool(left != right),

        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::String(a), Value::String(b)) => Value::String(a + &b),
            _ => {
                return Err(RuntimeError::type_error(
                    operator,
                    "Operands must be two numbers or two strings.",
                ))
            }
        },

        TokenType::MINUS => {
            let (a, b) = numbers(&left, &right)?;
            Value::Number(a - b)
        }
        TokenType::STAR => {
            let (a, b) = numbers(&left, &right)?;
            Value::Number(a * b)
        }
        TokenType::SLASH => {
            let (a, b) = numbers(&left, &right)?;
            Value::Number(a / b)
        }
        TokenType::GREATER => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a > b)
        }
        TokenType::GREATER_EQUAL => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a >= b)
        }
        TokenType::LESS => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a < b)
        }
        TokenType::LESS_EQUAL => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a <= b)
        }

        _ => unreachable!("parser only builds binary nodes from binary operators"),
    })
}
