// src/value.rs
// The computed value of a cell, and the evaluation-plane errors that can stand in for one.

use std::fmt;

use thiserror::Error;

/// Evaluation-plane errors: produced while evaluating a formula, returned as a `Value`,
/// never surfaced as a `Result::Err` and never cached (a later edit may make them go away).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("#REF!")]
    Ref,
    #[error("#VALUE!")]
    Value,
    #[error("#ARITHM!")]
    Arithmetic,
}

/// A cell's computed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Error(ArithmeticError),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Error(e) => write!(f, "{e}"),
        }
    }
}

impl Value {
    pub fn empty() -> Self {
        Value::Text(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_error_sigils() {
        assert_eq!(Value::Error(ArithmeticError::Ref).to_string(), "#REF!");
        assert_eq!(Value::Error(ArithmeticError::Value).to_string(), "#VALUE!");
        assert_eq!(Value::Error(ArithmeticError::Arithmetic).to_string(), "#ARITHM!");
    }

    #[test]
    fn renders_number_as_default_decimal() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }
}
