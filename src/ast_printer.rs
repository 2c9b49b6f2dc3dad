use crate::ast::{Expr, ExprKind, FunctionDecl, LiteralValue, Stmt};
use crate::value::format_number;

/// Renders trees in parenthesized prefix form, one top-level statement per
/// line.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_program(statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(Self::print_stmt)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Block(statements) => Self::wrap("block", statements.iter().map(Self::print_stmt)),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut head = format!("class {}", name.lexeme);
                if let Some(superclass) = superclass {
                    head.push_str(" < ");
                    head.push_str(&Self::print(superclass));
                }
                Self::wrap(&head, methods.iter().map(|m| Self::print_function(m)))
            }

            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Function(decl) => Self::print_function(decl),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::Import { module, .. } => format!("(import {})", Self::print(module)),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),
        }
    }

    fn print_function(decl: &FunctionDecl) -> String {
        let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
        let head = format!("fun {}({})", decl.name.lexeme, params.join(" "));
        Self::wrap(&head, decl.body.iter().map(Self::print_stmt))
    }

    pub fn print(expr: &Expr) -> String {
        match &expr.kind {
            // ── literals ────────────────────────────────────────────────
            ExprKind::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),
                LiteralValue::False => "false".into(),
                LiteralValue::Nil => "nil".into(),
                LiteralValue::Str(s) => format!("\"{}\"", s),
                LiteralValue::Number(n) => format_number(*n),
            },

            ExprKind::Grouping(inner) => format!("(group {})", Self::print(inner)),

            ExprKind::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            }
            | ExprKind::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            ExprKind::Variable(name) => name.lexeme.clone(),

            ExprKind::Assign { name, value } => format!("(= {} {})", name.lexeme, Self::print(value)),

            ExprKind::Call {
                callee, arguments, ..
            } => {
                let head = format!("call {}", Self::print(callee));
                Self::wrap(&head, arguments.iter().map(Self::print))
            }

            // ── objects ─────────────────────────────────────────────────
            ExprKind::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            ExprKind::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            ExprKind::This(_) => "this".into(),

            ExprKind::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }

    fn wrap(head: &str, parts: impl Iterator<Item = String>) -> String {
        let mut s = format!("({}", head);
        for part in parts {
            s.push(' ');
            s.push_str(&part);
        }
        s.push(')');
        s
    }
}
