//! Tree-walking evaluator for parsed programs.

pub mod error;
pub mod interpreter;
pub mod io;
pub mod value;

pub use error::RuntimeError;
pub use interpreter::{Config, Interpreter};
pub use io::{InputError, Io, StdIo};
pub use value::Value;

use minic_parser::ast::Program;

/// Runs `program` with the default [`Config`] and returns its exit status.
pub fn run(program: &Program, io: &mut dyn Io) -> Result<i32, RuntimeError> {
    Interpreter::new(program, io).run()
}
