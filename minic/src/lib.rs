//! Runs programs through the whole pipeline: parsing, the optional static checker and evaluation.

use minic_eval::{Config, Interpreter, Io, RuntimeError, StdIo};
use minic_parser::ast::Program;
use minic_source::{Source, SyntaxError};
use std::fmt;

/// An error from any phase of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Lexing or parsing failed. Only the first error is reported.
    Syntax(SyntaxError),
    /// The static checker rejected the program.
    Check(Vec<SyntaxError>),
    Runtime(RuntimeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax(err) => write!(f, "{}", err),
            Error::Check(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            Error::Runtime(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Syntax(err) => Some(err),
            Error::Check(_) => None,
            Error::Runtime(err) => Some(err),
        }
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::Syntax(err)
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        Error::Runtime(err)
    }
}

/// Pipeline settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Run the static checker before evaluating.
    pub check: bool,
    pub config: Config,
}

pub fn parse(source: &Source) -> Result<Program, Error> {
    Ok(minic_parser::parse(source)?)
}

/// Runs the static checker. All reported errors are returned at once.
pub fn check(source: &Source, program: &Program) -> Result<(), Error> {
    if minic_passes::check(source, program) {
        Ok(())
    } else {
        Err(Error::Check(source.errors.to_vec()))
    }
}

/// Parses, optionally checks, and evaluates `content`. Returns the exit status of the program.
pub fn run(content: &str, io: &mut dyn Io, options: &Options) -> Result<i32, Error> {
    let source = Source::new(content);
    let program = parse(&source)?;
    if options.check {
        check(&source, &program)?;
    }
    Ok(Interpreter::with_config(&program, io, options.config).run()?)
}

/// The result of [`interpret`].
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Everything the program printed, including output written before an error.
    pub output: String,
    pub result: Result<i32, Error>,
}

/// Runs `content` with `input` as the console input and captures the output.
/// For testing purposes.
pub fn interpret(content: &str, input: &str) -> Outcome {
    interpret_with(content, input, &Options::default())
}

pub fn interpret_with(content: &str, input: &str, options: &Options) -> Outcome {
    let mut io = StdIo::captured(input);
    let result = run(content, &mut io, options);
    Outcome {
        output: io.output(),
        result,
    }
}
