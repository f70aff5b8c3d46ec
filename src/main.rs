use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use void_interpreter as void;

use void::interpreter::Interpreter;
use void::parser::Parser;
use void::scanner::Scanner;
use void::token::Token;

/// Exit status for lex and parse failures.
const EXIT_DATA_ERR: i32 = 65;

/// Exit status for runtime failures.
const EXIT_SOFTWARE: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Void language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to void.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a source file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses a source file and prints the program as JSON
    Parse { filename: PathBuf },

    /// Runs a source file as a Void program
    Run { filename: PathBuf },
}

fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let source = String::from_utf8(buf)
        .with_context(|| format!("File {:?} is not valid UTF-8", filename))?;

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("void.log").context("Failed to create void.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("void_interpreter::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to void.log");
    Ok(())
}

/// Scans the whole source, reporting every lex error; exits 65 if any.
fn scan_or_exit(source: &str, echo: bool) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut tokenized = true;

    for token in Scanner::new(source.as_bytes()) {
        match token {
            Ok(token) => {
                if echo {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_DATA_ERR);
        process::exit(EXIT_DATA_ERR);
    }

    tokens
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => {
            let source = read_file(&filename)?;
            scan_or_exit(&source, true);
            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            let source = read_file(&filename)?;
            let tokens = scan_or_exit(&source, false);

            match Parser::new(&tokens).parse() {
                Ok(statements) => {
                    let json = serde_json::to_string_pretty(&statements)
                        .context("Failed to serialise program")?;
                    println!("{}", json);
                }

                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(EXIT_DATA_ERR);
                }
            }
        }

        Commands::Run { filename } => {
            let source = read_file(&filename)?;
            let tokens = scan_or_exit(&source, false);

            let statements = match Parser::new(&tokens).parse() {
                Ok(statements) => statements,

                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(EXIT_DATA_ERR);
                }
            };

            info!("Parsed {} statements", statements.len());

            let mut interpreter = Interpreter::new();

            if let Err(e) = interpreter.interpret(&statements) {
                debug!("Runtime debug: {}", e);
                eprintln!("{}", e);
                process::exit(EXIT_SOFTWARE);
            }

            info!("Program executed successfully");
        }
    }

    Ok(())
}
