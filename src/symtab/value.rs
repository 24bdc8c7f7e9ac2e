use std::fmt::Display;

/// Runtime value held in a symbol entry slot, or folded for a constant.
///
/// Enumeration values are stored as their ordinal in `Integer`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    Real(f64),
    Boolean(bool),
    Char(char),
    Str(String),
    Array(Vec<Value>),
    Record(Vec<Value>),
}

impl Value {
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Reals, and integers widened to real.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(value) => Some(*value),
            Value::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Ordinal of an integer, enumeration, boolean or char value.
    pub fn ordinal(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value as i64),
            Value::Boolean(value) => Some(*value as i64),
            Value::Char(value) => Some(*value as i64),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Real(value) => write!(f, "{}", value),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Char(value) => write!(f, "'{}'", value),
            Value::Str(value) => write!(f, "'{}'", value),
            Value::Array(values) => write!(f, "[{} elements]", values.len()),
            Value::Record(values) => write!(f, "{{{} fields}}", values.len()),
        }
    }
}
