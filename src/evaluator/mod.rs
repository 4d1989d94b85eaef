//! Expression evaluation against a cell lookup function.

use std::{error::Error, fmt::Display};

use crate::amount::{self, Amount, ArithError};
use crate::parser::expression::Expression;
use crate::xy::XY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError(String);

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Error for EvalError {}

impl From<ArithError> for EvalError {
    fn from(value: ArithError) -> Self {
        Self(value.to_string())
    }
}

pub type EvalResult = Result<Amount, EvalError>;

/// How the evaluator reads other cells: the sheet's cache, borrowed for the
/// duration of one evaluation.
pub type LookupFn<'a> = dyn Fn(XY) -> Option<Amount> + 'a;

pub fn evaluate(expression: &Expression, lookup: &LookupFn) -> EvalResult {
    match expression {
        Expression::Value(amount) => Ok(amount.clone()),
        Expression::Lookup(xy) => lookup(*xy)
            .ok_or_else(|| EvalError::new(format!("no value at {xy}"))),
        Expression::Range(_) => Err(EvalError::new("a range is not evaluable")),
        Expression::Operation { fn_name, terms } => {
            let mut amounts = Vec::with_capacity(terms.len());
            for term in terms {
                amounts.push(evaluate(term, lookup)?);
            }
            apply(fn_name, &amounts)
        }
    }
}

/// Dispatch on (name, arity). Names the table doesn't know — `POW` and `MOD`
/// included, which parse but don't evaluate — are errors.
fn apply(fn_name: &str, amounts: &[Amount]) -> EvalResult {
    match amounts {
        [arg] => match fn_name {
            "NOT" => Ok(amount::not(arg)?),
            _ => Err(EvalError::new(format!(
                "no unary operation named '{fn_name}'"
            ))),
        },
        [lhs, rhs] => match fn_name {
            "PLUS" | "SUM" | "ADD" => Ok(amount::add(lhs, rhs)?),
            "MINUS" | "SUB" | "SUBTRACT" => Ok(amount::sub(lhs, rhs)?),
            "MULTIPLIED_BY" | "TIMES" | "PRODUCT" => Ok(amount::mul(lhs, rhs)?),
            "DIVIDED_BY" | "DIV" => Ok(amount::div(lhs, rhs)?),
            "AND" => Ok(amount::and(lhs, rhs)?),
            "OR" => Ok(amount::or(lhs, rhs)?),
            "LTHAN" => Ok(Amount::Bool(amount::lt(lhs, rhs)?)),
            "GTHAN" => Ok(Amount::Bool(amount::gt(lhs, rhs)?)),
            "LEQ" => Ok(Amount::Bool(amount::leq(lhs, rhs)?)),
            "GEQ" => Ok(Amount::Bool(amount::geq(lhs, rhs)?)),
            "EQ" => Ok(Amount::Bool(amount::eq(lhs, rhs)?)),
            "NEQ" => Ok(Amount::Bool(amount::neq(lhs, rhs)?)),
            _ => Err(EvalError::new(format!(
                "no binary operation named '{fn_name}'"
            ))),
        },
        _ => Err(EvalError::new(format!(
            "no operation named '{fn_name}' over {} terms",
            amounts.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::{Currency, Money};
    use crate::parser::parse;

    fn evaluate_with_empty_sheet(input: &str) -> EvalResult {
        evaluate(&parse(input).unwrap(), &|_| None)
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(evaluate_with_empty_sheet("42"), Ok(Amount::Int(42)));
        assert_eq!(
            evaluate_with_empty_sheet("\"foo\""),
            Ok(Amount::Str("foo".into()))
        );
    }

    #[test]
    fn test_evaluate_operations() {
        assert_eq!(evaluate_with_empty_sheet("2+3"), Ok(Amount::Int(5)));
        assert_eq!(evaluate_with_empty_sheet("PLUS(2,3)"), Ok(Amount::Int(5)));
        assert_eq!(evaluate_with_empty_sheet("SUM(2,3)"), Ok(Amount::Int(5)));
        assert_eq!(evaluate_with_empty_sheet("6/2"), Ok(Amount::Int(3)));
        assert_eq!(
            evaluate_with_empty_sheet("NOT(True)"),
            Ok(Amount::Bool(false))
        );
        assert_eq!(evaluate_with_empty_sheet("1 <= 2"), Ok(Amount::Bool(true)));
        assert_eq!(evaluate_with_empty_sheet("1 == 2"), Ok(Amount::Bool(false)));
        assert_eq!(evaluate_with_empty_sheet("1 != 2"), Ok(Amount::Bool(true)));
        assert_eq!(
            evaluate_with_empty_sheet("$1.23 + $2"),
            Ok(Amount::Money(Money::new(3, 23, Currency::Usd)))
        );
    }

    #[test]
    fn test_evaluate_nested_operations() {
        assert_eq!(evaluate_with_empty_sheet("(3+2)+1"), Ok(Amount::Int(6)));
        assert_eq!(
            evaluate_with_empty_sheet("PLUS(TIMES(2,3), 1)"),
            Ok(Amount::Int(7))
        );
    }

    #[test]
    fn test_evaluate_unknown_functions() {
        assert!(evaluate_with_empty_sheet("BOGUS(1,2)").is_err());
        // POW and MOD parse but have no evaluation rule.
        assert!(evaluate_with_empty_sheet("2^3").is_err());
        assert!(evaluate_with_empty_sheet("7%3").is_err());
        // Wrong arity.
        assert!(evaluate_with_empty_sheet("NOT(True, False)").is_err());
        assert!(evaluate_with_empty_sheet("PLUS(1)").is_err());
    }

    #[test]
    fn test_evaluate_type_errors() {
        assert!(evaluate_with_empty_sheet("1 && 2").is_err());
        assert!(evaluate_with_empty_sheet("\"a\" - \"b\"").is_err());
        assert!(evaluate_with_empty_sheet("1/0").is_err());
    }

    #[test]
    fn test_evaluate_lookup() {
        let expression = parse("A1+1").unwrap();

        let hit = evaluate(&expression, &|xy| {
            (xy == XY::new(0, 0)).then_some(Amount::Int(41))
        });
        assert_eq!(hit, Ok(Amount::Int(42)));

        let miss = evaluate(&expression, &|_| None);
        assert!(miss.is_err());
    }

    #[test]
    fn test_evaluate_range_is_an_error() {
        assert!(evaluate_with_empty_sheet("A1:B2").is_err());
    }
}
