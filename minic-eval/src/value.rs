use minic_parser::ast::Type;
use minic_parser::lexer::float_text;
use std::fmt;

/// A runtime value.
/// Strings only exist as arguments of `printStr`.
#[derive(Clone, PartialEq, PartialOrd)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// The value of a declared but uninitialized variable of type `ty`.
    /// Returns `None` for `void`.
    pub fn zero(ty: Type) -> Option<Value> {
        match ty {
            Type::Int => Some(Value::Int(0)),
            Type::Float => Some(Value::Float(0.0)),
            Type::Void => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }

    /// Attempts to cast the `Value` into a `&str` or `None` if wrong type.
    pub fn cast_to_str(&self) -> Option<&str> {
        match self {
            Value::Str(val) => Some(val),
            _ => None,
        }
    }

    /// Attempts to cast the `Value` into a `f64` or `None` if not a number.
    /// Integers are widened.
    pub fn cast_to_number(&self) -> Option<f64> {
        match self {
            Value::Int(val) => Some(*val as f64),
            Value::Float(val) => Some(*val),
            Value::Str(_) => None,
        }
    }

    /// Nonzero numbers are `true`. Returns `None` if not a number.
    pub fn is_truthy(&self) -> Option<bool> {
        match self {
            Value::Int(val) => Some(*val != 0),
            Value::Float(val) => Some(*val != 0.0),
            Value::Str(_) => None,
        }
    }

    /// Converts the value for storage in a slot of type `ty`.
    /// Only the int to float widening is implicit. Returns `None` if not allowed.
    pub fn coerce(self, ty: Type) -> Option<Value> {
        match (self, ty) {
            (Value::Int(val), Type::Int) => Some(Value::Int(val)),
            (Value::Int(val), Type::Float) => Some(Value::Float(val as f64)),
            (Value::Float(val), Type::Float) => Some(Value::Float(val)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(val) => write!(f, "{}", val),
            Value::Float(val) => f.write_str(&float_text(*val)),
            Value::Str(val) => write!(f, "{}", val),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
