// src/parser.rs
// Formula parsing using pest. The grammar lives in grammar/formula.pest and already encodes
// operator precedence (expr > term > unary > primary), so turning pairs into an `Expr` is a
// straightforward recursive descent with no precedence climbing of our own to get wrong.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::position::Position;

#[derive(Parser)]
#[grammar = "grammar/formula.pest"]
struct FormulaGrammar;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct FormulaParseError(String);

pub fn parse(input: &str) -> Result<Expr, FormulaParseError> {
    let mut pairs = FormulaGrammar::parse(Rule::formula, input)
        .map_err(|e| FormulaParseError(e.to_string()))?;
    let formula = pairs.next().expect("formula rule always produced on parse success");
    let expr_pair = formula
        .into_inner()
        .next()
        .expect("formula := expr ~ EOI");
    Ok(parse_expr(expr_pair))
}

fn parse_expr(pair: Pair<Rule>) -> Expr {
    debug_assert_eq!(pair.as_rule(), Rule::expr);
    let mut inner = pair.into_inner();
    let mut node = parse_term(inner.next().expect("expr := term (add_op term)*"));
    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            other => unreachable!("grammar only emits +/- for add_op, got {other}"),
        };
        let rhs = parse_term(inner.next().expect("add_op is always followed by a term"));
        node = Expr::Binary(op, Box::new(node), Box::new(rhs));
    }
    node
}

fn parse_term(pair: Pair<Rule>) -> Expr {
    debug_assert_eq!(pair.as_rule(), Rule::term);
    let mut inner = pair.into_inner();
    let mut node = parse_unary(inner.next().expect("term := unary (mul_op unary)*"));
    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            other => unreachable!("grammar only emits */ for mul_op, got {other}"),
        };
        let rhs = parse_unary(inner.next().expect("mul_op is always followed by a unary"));
        node = Expr::Binary(op, Box::new(node), Box::new(rhs));
    }
    node
}

fn parse_unary(pair: Pair<Rule>) -> Expr {
    debug_assert_eq!(pair.as_rule(), Rule::unary);
    let mut inner = pair.into_inner();
    let first = inner.next().expect("unary := unary_op? primary");
    match first.as_rule() {
        Rule::unary_op => {
            let negative = first.as_str() == "-";
            let primary = parse_primary(inner.next().expect("unary_op is always followed by a primary"));
            if negative {
                Expr::Unary(UnaryOp::Neg, Box::new(primary))
            } else {
                primary
            }
        }
        Rule::primary => parse_primary(first),
        other => unreachable!("unary's first child is unary_op or primary, got {other:?}"),
    }
}

fn parse_primary(pair: Pair<Rule>) -> Expr {
    debug_assert_eq!(pair.as_rule(), Rule::primary);
    let inner = pair.into_inner().next().expect("primary always wraps one child");
    match inner.as_rule() {
        Rule::number => Expr::Number(inner.as_str().parse().expect("grammar guarantees a valid float literal")),
        Rule::reference => Expr::Reference(Position::from_a1(inner.as_str())),
        Rule::expr => parse_expr(inner),
        other => unreachable!("primary only wraps number/reference/expr, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_precedence() {
        let expr = parse("1+2*3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Number(1.0)),
                Box::new(Expr::Binary(BinaryOp::Mul, Box::new(Expr::Number(2.0)), Box::new(Expr::Number(3.0)))),
            )
        );
    }

    #[test]
    fn parses_reference() {
        let expr = parse("A1").unwrap();
        assert_eq!(expr, Expr::Reference(Position::new(0, 0)));
    }

    #[test]
    fn parses_parens_and_unary_minus() {
        let expr = parse("-(A1+1)").unwrap();
        assert_eq!(
            expr,
            Expr::Unary(
                UnaryOp::Neg,
                Box::new(Expr::Binary(
                    BinaryOp::Add,
                    Box::new(Expr::Reference(Position::new(0, 0))),
                    Box::new(Expr::Number(1.0)),
                )),
            )
        );
    }

    #[test]
    fn rejects_malformed_expression() {
        assert!(parse("1+").is_err());
        assert!(parse("*1").is_err());
        assert!(parse("").is_err());
    }
}
