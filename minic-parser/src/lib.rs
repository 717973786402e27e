//! Lexer, parser and abstract syntax tree.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;

use minic_source::{Source, SyntaxError};

/// Parses the content of `source` into a [`ast::Program`].
pub fn parse(source: &Source) -> Result<ast::Program, SyntaxError> {
    parser::Parser::new(source).parse_program()
}
