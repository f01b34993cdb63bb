// src/formula.rs
// The Formula collaborator: parses an expression into an `Artifact`, lists the positions it
// references, prints a canonical form, and evaluates against a sheet lookup with the binding
// coercion/propagation rules.

use std::collections::HashSet;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::parser::{self, FormulaParseError};
use crate::position::Position;
use crate::value::{ArithmeticError, Value};

/// A parsed, evaluable formula. Immutable once parsed; `Cell` is the one that caches results.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    expr: Expr,
    references: Vec<Position>,
}

impl Artifact {
    pub fn parse(source: &str) -> Result<Self, FormulaParseError> {
        let expr = parser::parse(source)?;
        let mut seen = HashSet::new();
        let mut references = Vec::new();
        collect_references(&expr, &mut seen, &mut references);
        Ok(Artifact { expr, references })
    }

    /// Deduplicated, valid-positions-only list of cells this formula references.
    pub fn referenced_cells(&self) -> &[Position] {
        &self.references
    }

    /// Canonical string form, e.g. for reconstructing `"=" + canonical` as the cell's source text.
    pub fn canonical(&self) -> String {
        print_expr(&self.expr, 0)
    }

    /// Evaluates the formula against a sheet lookup, returning `Number` or `Error` -- never `Text`.
    pub fn evaluate(&self, lookup: impl Fn(Position) -> Value) -> Value {
        match eval(&self.expr, &lookup) {
            Ok(n) => Value::Number(n),
            Err(e) => Value::Error(e),
        }
    }
}

fn collect_references(expr: &Expr, seen: &mut HashSet<Position>, out: &mut Vec<Position>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Reference(pos) => {
            if pos.is_valid() && seen.insert(*pos) {
                out.push(*pos);
            }
        }
        Expr::Unary(_, inner) => collect_references(inner, seen, out),
        Expr::Binary(_, left, right) => {
            collect_references(left, seen, out);
            collect_references(right, seen, out);
        }
    }
}

/// Coerces a cell's raw `Value` to a number per the binding contract:
/// Empty/Text("") -> 0, Number -> itself, a fully-consumed decimal Text -> that number,
/// any other Text -> `Value` error, Error propagates as itself.
fn as_number(value: &Value) -> Result<f64, ArithmeticError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Text(s) if s.is_empty() => Ok(0.0),
        Value::Text(s) => s.parse::<f64>().map_err(|_| ArithmeticError::Value),
        Value::Error(e) => Err(*e),
    }
}

fn eval(expr: &Expr, lookup: &impl Fn(Position) -> Value) -> Result<f64, ArithmeticError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Reference(pos) => {
            if !pos.is_valid() {
                return Err(ArithmeticError::Ref);
            }
            as_number(&lookup(*pos))
        }
        Expr::Unary(UnaryOp::Neg, inner) => eval(inner, lookup).map(|n| -n),
        Expr::Binary(op, left, right) => {
            // Both sides are evaluated regardless of which errors first -- a reference read
            // has the observable side effect of populating that cell's cache -- but the left
            // operand's error wins when both are errors, matching left-to-right encounter order.
            let lv = eval(left, lookup);
            let rv = eval(right, lookup);
            match (lv, rv) {
                (Err(e), _) => Err(e),
                (Ok(_), Err(e)) => Err(e),
                (Ok(a), Ok(b)) => apply(*op, a, b),
            }
        }
    }
}

fn apply(op: BinaryOp, a: f64, b: f64) -> Result<f64, ArithmeticError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(ArithmeticError::Arithmetic);
            }
            a / b
        }
    };
    if result.is_finite() {
        Ok(result)
    } else {
        Err(ArithmeticError::Arithmetic)
    }
}

fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Add | BinaryOp::Sub => 1,
        BinaryOp::Mul | BinaryOp::Div => 2,
    }
}

fn print_expr(expr: &Expr, parent_prec: u8) -> String {
    match expr {
        Expr::Number(n) => format_number(*n),
        Expr::Reference(pos) => pos.to_a1(),
        Expr::Unary(UnaryOp::Neg, inner) => format!("-{}", print_expr(inner, 3)),
        Expr::Binary(op, left, right) => {
            let prec = precedence(*op);
            let symbol = match op {
                BinaryOp::Add => "+",
                BinaryOp::Sub => "-",
                BinaryOp::Mul => "*",
                BinaryOp::Div => "/",
            };
            let rendered = format!("{}{}{}", print_expr(left, prec), symbol, print_expr(right, prec + 1));
            if prec < parent_prec {
                format!("({rendered})")
            } else {
                rendered
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_zero(_: Position) -> Value {
        Value::empty()
    }

    #[test]
    fn evaluates_arithmetic() {
        let artifact = Artifact::parse("1+2*3").unwrap();
        assert_eq!(artifact.evaluate(lookup_zero), Value::Number(7.0));
    }

    #[test]
    fn division_by_zero_is_arithmetic_error() {
        let artifact = Artifact::parse("1/0").unwrap();
        assert_eq!(artifact.evaluate(lookup_zero), Value::Error(ArithmeticError::Arithmetic));
    }

    #[test]
    fn referenced_cells_are_deduplicated_and_ordered() {
        let artifact = Artifact::parse("A1+A1+B2").unwrap();
        assert_eq!(artifact.referenced_cells(), &[Position::new(0, 0), Position::new(1, 1)]);
    }

    #[test]
    fn out_of_range_reference_is_ref_error() {
        let artifact = Artifact::parse("A1000000").unwrap();
        assert_eq!(artifact.evaluate(lookup_zero), Value::Error(ArithmeticError::Ref));
    }

    #[test]
    fn canonical_round_trips_through_reparse() {
        for source in ["1+2*3", "(1+2)*3", "-1*-2", "A1-(B2-C3)", "A1-B2-C3"] {
            let first = Artifact::parse(source).unwrap();
            let second = Artifact::parse(&first.canonical()).unwrap();
            assert_eq!(first.evaluate(lookup_zero), second.evaluate(lookup_zero));
        }
    }

    #[test]
    fn text_coercion_rules() {
        assert_eq!(as_number(&Value::Text(String::new())), Ok(0.0));
        assert_eq!(as_number(&Value::Text("3.5".into())), Ok(3.5));
        assert_eq!(as_number(&Value::Text("3.5x".into())), Err(ArithmeticError::Value));
        assert_eq!(as_number(&Value::Number(4.0)), Ok(4.0));
    }
}
