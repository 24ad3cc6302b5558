use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::reporter::Reporter;
use rox::scanner::{scan, Scanner};
use rox::Lox;

/// Bad command line.
const EXIT_USAGE: u8 = 64;
/// Syntax, lexical or static errors.
const EXIT_COMPILE_ERROR: u8 = 65;
/// Runtime errors.
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print tokens as JSON objects, one per line
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt (the default without a subcommand)
    Repl,
}

/// Loads a source file through a read-only memory map and checks it is UTF-8.
fn read_source(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero-length files cannot be mapped.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is read-only and copied out before it is dropped.
    let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("Failed to map file {:?}", filename))?;

    let text = std::str::from_utf8(&mmap)
        .map_err(LoxError::from)
        .with_context(|| format!("File {:?} is not valid UTF-8", filename))?;

    info!("Read {} bytes from {:?}", len, filename);

    Ok(text.to_owned())
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);

            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");

    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<ExitCode> {
    let source = read_source(filename)?;
    let mut tokenized = true;

    for result in Scanner::new(&source) {
        match result {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),

            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        return Ok(ExitCode::from(EXIT_COMPILE_ERROR));
    }

    Ok(ExitCode::SUCCESS)
}

fn parse(filename: &Path, evaluate: bool) -> Result<ExitCode> {
    let source = read_source(filename)?;
    let mut reporter = Reporter::new();

    let tokens = scan(&source, &mut reporter);
    let expr = Parser::new(&tokens, &mut reporter).parse_expression();

    let expr = match expr {
        Some(expr) if !reporter.had_error() => expr,
        _ => return Ok(ExitCode::from(EXIT_COMPILE_ERROR)),
    };

    if !evaluate {
        println!("{}", AstPrinter::print(&expr));
        return Ok(ExitCode::SUCCESS);
    }

    match Interpreter::new().evaluate(&expr) {
        Ok(value) => {
            println!("{}", value);
            Ok(ExitCode::SUCCESS)
        }

        Err(e) => {
            reporter.runtime_error(&e);
            Ok(ExitCode::from(EXIT_RUNTIME_ERROR))
        }
    }
}

fn run_file(filename: &Path) -> Result<ExitCode> {
    let source = read_source(filename)?;
    let mut lox = Lox::new();

    match lox.run(&source) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(ExitCode::SUCCESS)
        }

        Err(LoxError::Runtime(e)) => {
            debug!("Runtime debug: {}", e);
            Ok(ExitCode::from(EXIT_RUNTIME_ERROR))
        }

        Err(e) => {
            debug!("Compile debug: {}", e);
            Ok(ExitCode::from(EXIT_COMPILE_ERROR))
        }
    }
}

fn run_prompt() -> Result<ExitCode> {
    info!("Starting interactive prompt");

    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            break;
        }

        // Errors were already reported; the prompt keeps going.
        if let Err(e) = lox.run(&line) {
            debug!("Prompt line failed: {}", e);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,

        // --help and --version also land here, on stdout.
        Err(e) => {
            e.print()?;

            return Ok(if e.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Some(Commands::Tokenize { filename, json }) => tokenize(&filename, json),
        Some(Commands::Parse { filename }) => parse(&filename, false),
        Some(Commands::Evaluate { filename }) => parse(&filename, true),
        Some(Commands::Run { filename }) => run_file(&filename),
        Some(Commands::Repl) | None => run_prompt(),
    }
}
