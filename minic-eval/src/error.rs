use minic_source::Position;
use std::fmt;

/// An error that aborts evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The program does not define `main`.
    MissingMain,
    UndefinedVariable {
        ident: String,
        pos: Position,
    },
    UndefinedFunction {
        ident: String,
        pos: Position,
    },
    /// A variable declared twice in the same scope.
    DuplicateVariable {
        ident: String,
        pos: Position,
    },
    TypeMismatch {
        message: String,
        pos: Position,
    },
    Arity {
        ident: String,
        expected: usize,
        found: usize,
        pos: Position,
    },
    DivisionByZero {
        pos: Position,
    },
    /// The call stack grew past the configured depth.
    StackOverflow {
        ident: String,
        depth: usize,
        pos: Position,
    },
    /// `scanInt` was called with no input left.
    EndOfInput {
        pos: Position,
    },
    /// `scanInt` read something that is not an integer.
    MalformedInput {
        text: String,
        pos: Position,
    },
    /// Reading or writing the console failed.
    Io {
        message: String,
    },
}

impl RuntimeError {
    /// The position of the construct that failed, if any.
    pub fn position(&self) -> Option<Position> {
        match self {
            RuntimeError::MissingMain | RuntimeError::Io { .. } => None,
            RuntimeError::UndefinedVariable { pos, .. }
            | RuntimeError::UndefinedFunction { pos, .. }
            | RuntimeError::DuplicateVariable { pos, .. }
            | RuntimeError::TypeMismatch { pos, .. }
            | RuntimeError::Arity { pos, .. }
            | RuntimeError::DivisionByZero { pos }
            | RuntimeError::StackOverflow { pos, .. }
            | RuntimeError::EndOfInput { pos }
            | RuntimeError::MalformedInput { pos, .. } => Some(*pos),
        }
    }

    /// The category of the error, used as a prefix when reporting.
    pub fn category(&self) -> &'static str {
        match self {
            RuntimeError::MissingMain => "missing main",
            RuntimeError::UndefinedVariable { .. }
            | RuntimeError::UndefinedFunction { .. }
            | RuntimeError::DuplicateVariable { .. } => "name resolution",
            RuntimeError::TypeMismatch { .. } => "type",
            RuntimeError::Arity { .. } => "arity",
            RuntimeError::DivisionByZero { .. } => "division by zero",
            RuntimeError::StackOverflow { .. } => "stack overflow",
            RuntimeError::EndOfInput { .. }
            | RuntimeError::MalformedInput { .. }
            | RuntimeError::Io { .. } => "input",
        }
    }

    fn message(&self) -> String {
        match self {
            RuntimeError::MissingMain => "no `main` function defined".to_string(),
            RuntimeError::UndefinedVariable { ident, .. } => {
                format!("undeclared variable `{}`", ident)
            }
            RuntimeError::UndefinedFunction { ident, .. } => {
                format!("undeclared function `{}`", ident)
            }
            RuntimeError::DuplicateVariable { ident, .. } => {
                format!("variable `{}` is already declared in this scope", ident)
            }
            RuntimeError::TypeMismatch { message, .. } => message.clone(),
            RuntimeError::Arity {
                ident,
                expected,
                found,
                ..
            } => format!(
                "`{}` expects {} argument(s), received {}",
                ident, expected, found
            ),
            RuntimeError::DivisionByZero { .. } => "division by zero".to_string(),
            RuntimeError::StackOverflow { ident, depth, .. } => format!(
                "call to `{}` exceeds the maximum call depth of {}",
                ident, depth
            ),
            RuntimeError::EndOfInput { .. } => "`scanInt` reached the end of input".to_string(),
            RuntimeError::MalformedInput { text, .. } => {
                format!("`scanInt` expected an integer, read `{}`", text)
            }
            RuntimeError::Io { message } => message.clone(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position() {
            Some(pos) => write!(
                f,
                "{} error at {}: {}",
                self.category(),
                pos,
                self.message()
            ),
            None => write!(f, "{} error: {}", self.category(), self.message()),
        }
    }
}

impl std::error::Error for RuntimeError {}
