use clap::Parser;
use console::style;
use minic::{Error, Options};
use minic_eval::interpreter::{DEFAULT_FLOAT_PRECISION, DEFAULT_MAX_CALL_DEPTH};
use minic_eval::{Config, StdIo};
use minic_parser::lexer::Lexer;
use std::fs;
use std::path::PathBuf;
use std::process;

/// minic runs programs written in a small subset of C: `int`, `float` and `void` functions,
/// `if`, `while` and the built-ins `printStr`, `printInt`, `printFloat` and `scanInt`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Print the token stream to stderr before running.
    #[arg(long)]
    tokens: bool,

    /// Print the parsed program to stderr before running.
    #[arg(long)]
    ast: bool,

    /// Reject the program if the static checker finds any error.
    #[arg(long)]
    check: bool,

    /// Print every function call and return to stderr.
    #[arg(long)]
    trace: bool,

    /// Maximum number of nested function calls, `main` included.
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,

    /// Number of digits printed after the decimal point by `printFloat`.
    #[arg(long, default_value_t = DEFAULT_FLOAT_PRECISION)]
    precision: usize,

    /// The source file to run.
    file: PathBuf,
}

impl Args {
    fn options(&self) -> Options {
        Options {
            check: self.check,
            config: Config {
                max_call_depth: self.max_depth,
                float_precision: self.precision,
                trace: self.trace,
            },
        }
    }
}

/// Prints the token stream, one token per line.
fn dump_tokens(content: &str) -> Result<(), Error> {
    for token in Lexer::new(content) {
        let token = token?;
        eprintln!("{:<8} {}", token.pos.to_string(), token.token.describe());
    }
    Ok(())
}

fn run(args: &Args, content: &str) -> Result<i32, Error> {
    if args.tokens {
        dump_tokens(content)?;
    }
    if args.ast {
        let source = content.into();
        eprint!("{}", minic::parse(&source)?);
    }

    let mut io = StdIo::stdio();
    minic::run(content, &mut io, &args.options())
}

fn report(err: impl std::fmt::Display) {
    eprintln!("{} {}", style("error:").red().bold(), err);
}

fn main() {
    let args = Args::parse();

    let content = fs::read_to_string(&args.file).unwrap_or_else(|err| {
        report(format!("failed to read '{}': {}", args.file.display(), err));
        process::exit(1);
    });

    match run(&args, &content) {
        Ok(status) => process::exit(status),
        Err(Error::Check(errors)) => {
            for err in errors {
                report(err);
            }
            process::exit(1);
        }
        Err(err) => {
            report(err);
            process::exit(1);
        }
    }
}
