use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use slox::ast_printer::AstPrinter;
use slox::interpreter::{Interpreter, Status};
use slox::module::read_source;
use slox::parser::Parser;
use slox::scanner::{self, Scanner};

const EXIT_USAGE: i32 = 64;
const EXIT_STATIC_ERROR: i32 = 65;

/// Native stack for the interpreter thread, sized for `MAX_CALL_DEPTH` nested
/// calls in an unoptimized build.
const INTERPRETER_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for a small class-based language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// File the log is written to when --log is given
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs a program from a file
    Run { filename: PathBuf },

    /// Starts an interactive prompt (the default)
    Repl,

    /// Tokenizes a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses a file and prints its syntax tree
    Parse {
        filename: PathBuf,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logger(path: &PathBuf) -> Result<()> {
    let log_file =
        File::create(path).with_context(|| format!("Failed to create log file {:?}", path))?;

    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("slox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug);

    // RUST_LOG, when set, overrides the default level.
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder.init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn read_file(filename: &PathBuf) -> Result<String> {
    read_source(filename).with_context(|| format!("Failed to read file {:?}", filename))
}

/// Runs `job` on a dedicated thread with a large stack and waits for it.
fn on_interpreter_thread<T, F>(job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = thread::Builder::new()
        .name("interpreter".to_string())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(job)
        .context("Failed to spawn interpreter thread")?;

    handle
        .join()
        .map_err(|_| anyhow::anyhow!("Interpreter thread panicked"))?
}

fn run_file(filename: &PathBuf) -> Result<i32> {
    info!("Running Run subcommand");

    let source = read_file(filename)?;

    on_interpreter_thread(move || {
        let mut interpreter = Interpreter::new();
        let status = interpreter.run(&source);

        info!("Program finished with status {:?}", status);
        Ok(status.exit_code())
    })
}

fn run_prompt() -> Result<i32> {
    info!("Starting REPL");

    on_interpreter_thread(|| {
        let mut interpreter = Interpreter::new();
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("> ");
            io::stdout().flush().context("Failed to flush prompt")?;

            let Some(line) = lines.next() else { break };
            let line = line.context("Failed to read from stdin")?;

            debug!("REPL input: {}", line);

            // Static and runtime errors are reported; the session goes on.
            if interpreter.run(&line) == Status::Exited {
                break;
            }
        }

        info!("REPL finished");
        Ok(0)
    })
}

fn tokenize(filename: &PathBuf) -> Result<i32> {
    info!("Running Tokenize subcommand");

    let source = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    Ok(if tokenized { 0 } else { EXIT_STATIC_ERROR })
}

fn parse(filename: &PathBuf, json: bool) -> Result<i32> {
    info!("Running Parse subcommand");

    let source = read_file(filename)?;
    let (tokens, mut errors) = scanner::scan(&source);

    match Parser::new(tokens).parse() {
        Ok(statements) if errors.is_empty() => {
            if json {
                let text = serde_json::to_string_pretty(&statements)
                    .context("Failed to serialize syntax tree")?;
                println!("{}", text);
            } else {
                println!("{}", AstPrinter::print_program(&statements));
            }
            Ok(0)
        }
        Ok(_) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            Ok(EXIT_STATIC_ERROR)
        }
        Err(parse_errors) => {
            errors.extend(parse_errors);
            for e in &errors {
                eprintln!("{}", e);
            }
            Ok(EXIT_STATIC_ERROR)
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version land here too; only real misuse is 64.
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match &args.command {
        Some(Command::Run { filename }) => run_file(filename)?,
        Some(Command::Repl) | None => run_prompt()?,
        Some(Command::Tokenize { filename }) => tokenize(filename)?,
        Some(Command::Parse { filename, json }) => parse(filename, *json)?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        process::exit(code);
    }

    Ok(())
}
