//! Console input and output used by the built-in functions.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, Cursor, Write};

/// Why `scanInt` could not produce a value.
#[derive(Debug)]
pub enum InputError {
    /// The input stream has no more tokens.
    EndOfInput,
    /// The next token is not an integer.
    Malformed(String),
    Io(io::Error),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::EndOfInput => f.write_str("end of input"),
            InputError::Malformed(text) => write!(f, "`{}` is not an integer", text),
            InputError::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for InputError {}

/// The IO capability used by the interpreter.
pub trait Io {
    /// Writes `text` and makes it visible before returning.
    fn write_str(&mut self, text: &str) -> io::Result<()>;

    /// Reads the next whitespace separated integer.
    fn read_int(&mut self) -> Result<i64, InputError>;
}

/// [`Io`] over any buffered reader and writer.
pub struct StdIo<R, W> {
    reader: R,
    writer: W,
    /// Words of the current input line that have not been consumed yet.
    pending: VecDeque<String>,
}

impl<R: BufRead, W: Write> StdIo<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            pending: VecDeque::new(),
        }
    }
}

impl StdIo<io::StdinLock<'static>, io::Stdout> {
    /// Reads from stdin and writes to stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl StdIo<Cursor<String>, Vec<u8>> {
    /// Reads from `input` and captures the output in memory.
    pub fn captured(input: &str) -> Self {
        Self::new(Cursor::new(input.to_string()), Vec::new())
    }

    /// Returns everything written so far.
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.writer).into_owned()
    }
}

impl<R: BufRead, W: Write> Io for StdIo<R, W> {
    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()
    }

    fn read_int(&mut self) -> Result<i64, InputError> {
        loop {
            if let Some(word) = self.pending.pop_front() {
                return word.parse().map_err(|_| InputError::Malformed(word));
            }

            let mut line = String::new();
            if self.reader.read_line(&mut line).map_err(InputError::Io)? == 0 {
                return Err(InputError::EndOfInput);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
    }
}
