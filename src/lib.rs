pub mod ast;
pub mod callable;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod output;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner::Scanner;

/// Scans, parses and executes `source` against `interpreter`.
///
/// Lex and parse failures abort before any statement runs; a runtime failure
/// leaves the side effects of earlier statements in place.
pub fn run_source(interpreter: &mut Interpreter, source: &str) -> Result<()> {
    let tokens = Scanner::new(source.as_bytes()).collect::<Result<Vec<_>>>()?;
    let statements = Parser::new(&tokens).parse()?;

    interpreter.interpret(&statements)?;

    Ok(())
}
