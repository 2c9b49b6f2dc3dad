//! Host functions registered into the global frame.
//!
//! Misuse is lenient and per-function: a wrong argument type writes a
//! diagnostic through the interpreter's reporter and yields the sentinel
//! string `"\n"` instead of failing the run. File helpers stringify whatever
//! they are given and report failure as `nil`/`false`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};

use crate::environment::Environment;
use crate::function::{NativeFn, NativeFunction};
use crate::interpreter::{IResult, InterpretError, Interpreter};
use crate::value::{format_number, Value};

const NATIVES: &[(&str, usize, NativeFn)] = &[
    ("clock", 0, clock),
    ("sleep", 1, sleep),
    ("exit", 0, exit),
    ("print", 1, print),
    ("input", 0, input),
    ("readFile", 1, read_file),
    ("writeFile", 2, write_file),
    ("appendFile", 2, append_file),
    ("fileExists", 1, file_exists),
    ("createFile", 1, create_file),
    ("deleteFile", 1, delete_file),
    ("len", 1, len),
    ("lower", 1, lower),
    ("upper", 1, upper),
    ("toStr", 1, to_str),
    ("abs", 1, abs),
    ("pow", 2, pow),
];

/// Defines every native in `globals`.
pub fn register(globals: &mut Environment) {
    for &(name, arity, func) in NATIVES {
        debug!("Defining native function '{}'", name);

        globals.define(name, Value::Native(Rc::new(NativeFunction { name, arity, func })));
    }

    info!("Registered {} native functions", NATIVES.len());
}

fn sentinel() -> Value {
    Value::String("\n".to_string())
}

/// Reports `message` and yields the sentinel.
fn lenient(interpreter: &mut Interpreter, message: &str) -> IResult<Value> {
    interpreter.diagnostic(message);
    Ok(sentinel())
}

// ─────────────────────────────── process ────────────────────────────────

fn clock(_: &mut Interpreter, _: &[Value]) -> IResult<Value> {
    Ok(Value::Number(Utc::now().timestamp_millis() as f64 / 1000.0))
}

fn sleep(interpreter: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    match args[0] {
        Value::Number(ms) => {
            thread::sleep(Duration::from_millis(ms.max(0.0) as u64));
            Ok(sentinel())
        }
        _ => lenient(interpreter, "Sleep function arguments can only be numbers."),
    }
}

fn exit(_: &mut Interpreter, _: &[Value]) -> IResult<Value> {
    info!("Script requested exit");
    Err(InterpretError::Exit)
}

// ─────────────────────────────── console ────────────────────────────────

fn print(interpreter: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    interpreter.write_line(&args[0].to_string());
    Ok(Value::Nil)
}

fn input(interpreter: &mut Interpreter, _: &[Value]) -> IResult<Value> {
    Ok(match interpreter.read_line() {
        Some(line) => Value::String(line),
        None => Value::Nil,
    })
}

// ──────────────────────────────── files ─────────────────────────────────

fn read_file(_: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    Ok(match fs::read_to_string(args[0].to_string()) {
        Ok(content) => Value::String(content),
        Err(e) => {
            debug!("readFile failed: {}", e);
            Value::Nil
        }
    })
}

fn write_file(_: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    let written = fs::write(args[0].to_string(), args[1].to_string());
    Ok(Value::Bool(written.is_ok()))
}

fn append_file(_: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    let appended = OpenOptions::new()
        .append(true)
        .create(true)
        .open(args[0].to_string())
        .and_then(|mut file| write!(file, "\n{}", args[1]));

    Ok(Value::Bool(appended.is_ok()))
}

fn file_exists(_: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    Ok(Value::Bool(Path::new(&args[0].to_string()).is_file()))
}

fn create_file(interpreter: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    let path = args[0].to_string();

    if Path::new(&path).is_file() {
        interpreter.diagnostic(&format!(" '{}' already exists.", path));
        return Ok(Value::Bool(false));
    }

    Ok(Value::Bool(fs::File::create(&path).is_ok()))
}

fn delete_file(interpreter: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    let path = args[0].to_string();

    if !Path::new(&path).is_file() {
        interpreter.diagnostic(&format!(" '{}' does not exist.", path));
        return Ok(Value::Bool(false));
    }

    Ok(Value::Bool(fs::remove_file(&path).is_ok()))
}

// ─────────────────────────────── strings ────────────────────────────────

fn len(interpreter: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    match &args[0] {
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        _ => lenient(interpreter, "Length function can only be used on Strings."),
    }
}

fn lower(interpreter: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    match &args[0] {
        Value::String(s) => Ok(Value::String(s.to_lowercase())),
        _ => lenient(interpreter, "Lower case function can only be used on Strings."),
    }
}

fn upper(interpreter: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    match &args[0] {
        Value::String(s) => Ok(Value::String(s.to_uppercase())),
        _ => lenient(interpreter, "Upper case function can only be used on Strings."),
    }
}

fn to_str(interpreter: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    match args[0] {
        Value::Number(n) => Ok(Value::String(format_number(n))),
        _ => lenient(interpreter, "Only numbers can be converted to strings."),
    }
}

// ──────────────────────────────── math ──────────────────────────────────

fn abs(interpreter: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    match args[0] {
        Value::Number(n) => Ok(Value::Number(n.abs())),
        _ => lenient(interpreter, "Absolute function can only be used on Numbers."),
    }
}

fn pow(interpreter: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    match (&args[0], &args[1]) {
        (Value::Number(base), Value::Number(exp)) => Ok(Value::Number(base.powf(*exp))),
        _ => lenient(interpreter, "Power function can only be used on Numbers."),
    }
}
