pub mod ast;
pub mod env;
pub mod error;
pub mod function;
pub mod interpreter;
mod limits;
pub mod parser;
pub mod value;

pub use error::{ParseError, RuntimeError};
pub use interpreter::Interpreter;
pub use parser::Parser;
pub use value::Value;

use monk_core::Lexer;

use crate::ast::Program;

/// Parses a whole source text, failing with every recorded error when there is at least one.
pub fn parse(src: &str) -> Result<Program, Vec<ParseError>> {
    let mut parser = Parser::new(Lexer::new(src));
    let program = parser.parse_program();

    let errors = parser.into_errors();
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}
