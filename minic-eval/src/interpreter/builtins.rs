//! The built-in functions `printStr`, `printInt`, `printFloat` and `scanInt`.

use super::*;
use crate::io::InputError;
use minic_parser::ast::{Builtin, Expr};

impl<'a, 'io> Interpreter<'a, 'io> {
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: &[Expr],
        pos: Position,
    ) -> Result<Option<Value>, RuntimeError> {
        if args.len() != builtin.arity() {
            return Err(RuntimeError::Arity {
                ident: builtin.ident().to_string(),
                expected: builtin.arity(),
                found: args.len(),
                pos,
            });
        }

        match builtin {
            Builtin::PrintStr => {
                let arg = self.eval_expr(&args[0])?;
                match arg.cast_to_str() {
                    Some(text) => self.write(text)?,
                    None => return Err(argument_error(builtin, "a string", &arg, pos)),
                }
                Ok(None)
            }
            Builtin::PrintInt => {
                match self.eval_expr(&args[0])? {
                    Value::Int(val) => self.write(&val.to_string())?,
                    arg => return Err(argument_error(builtin, "an `int`", &arg, pos)),
                }
                Ok(None)
            }
            Builtin::PrintFloat => {
                let arg = self.eval_expr(&args[0])?;
                match arg.cast_to_number() {
                    Some(val) => {
                        let text = format!("{:.*}", self.config.float_precision, val);
                        self.write(&text)?
                    }
                    None => return Err(argument_error(builtin, "a number", &arg, pos)),
                }
                Ok(None)
            }
            Builtin::ScanInt => match self.io.read_int() {
                Ok(val) => Ok(Some(Value::Int(val))),
                Err(InputError::EndOfInput) => Err(RuntimeError::EndOfInput { pos }),
                Err(InputError::Malformed(text)) => Err(RuntimeError::MalformedInput { text, pos }),
                Err(InputError::Io(err)) => Err(RuntimeError::Io {
                    message: err.to_string(),
                }),
            },
        }
    }

    fn write(&mut self, text: &str) -> Result<(), RuntimeError> {
        self.io.write_str(text).map_err(|err| RuntimeError::Io {
            message: err.to_string(),
        })
    }
}

fn argument_error(builtin: Builtin, expected: &str, found: &Value, pos: Position) -> RuntimeError {
    RuntimeError::TypeMismatch {
        message: format!(
            "`{}` expects {}, found `{}`",
            builtin.ident(),
            expected,
            found.type_name()
        ),
        pos,
    }
}
