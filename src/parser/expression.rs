//! The expression tree and its grammar.
//!
//! ```text
//! expression := operation | '(' expression ')' | range | amount | point
//! operation  := infix | fn_name '(' expression (',' expression)* ')'
//! ```
//!
//! Infix operations are left-recursive; a guard keyed on (rule, cursor
//! position) cuts the loop, which makes infix chains associate to the right.

use std::collections::BTreeSet;
use std::fmt::Display;

use log::trace;

use crate::amount::Amount;
use crate::lexer::TokenKind;
use crate::xy::XY;
use crate::{any, in_sequence};

use super::combinators::{exact, maybe, with_restriction, ParseResult};
use super::literals::consume_amount;
use super::location::{consume_point_location, consume_range_location, RangeLocation};
use super::{ParseError, ParseState};

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal.
    Value(Amount),
    /// Read another cell.
    Lookup(XY),
    /// Parsed but not evaluable.
    Range(RangeLocation),
    /// A named operation over one or two sub-expressions.
    Operation {
        fn_name: String,
        terms: Vec<Expression>,
    },
}

impl Expression {
    /// Every cell this expression reads, directly or nested. Ranges don't
    /// evaluate and therefore don't count as reads.
    pub fn referenced_cells(&self) -> BTreeSet<XY> {
        let mut cells = BTreeSet::new();
        self.collect_references(&mut cells);
        cells
    }

    fn collect_references(&self, cells: &mut BTreeSet<XY>) {
        match self {
            Expression::Lookup(xy) => {
                cells.insert(*xy);
            }
            Expression::Operation { terms, .. } => {
                for term in terms {
                    term.collect_references(cells);
                }
            }
            Expression::Value(_) | Expression::Range(_) => {}
        }
    }
}

/// Renders in formula syntax. Operations render in prefix form, which
/// re-parses to an equal tree regardless of how the user originally spelled
/// them.
impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Value(amount) => write!(f, "{amount}"),
            Expression::Lookup(xy) => write!(f, "{xy}"),
            Expression::Range(range) => write!(f, "{range}"),
            Expression::Operation { fn_name, terms } => {
                write!(f, "{fn_name}(")?;
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{term}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// `(alpha | numeric | '_')+`, uppercase, not starting with a digit or
/// underscore.
pub fn consume_fn_name(state: &mut ParseState) -> ParseResult<String> {
    let checkpoint = state.get_index();
    let mut resultant = String::new();

    loop {
        if let Some(alpha) = maybe(state, |s: &mut ParseState| exact(s, TokenKind::Alpha)) {
            resultant.push_str(&alpha);
        } else if let Some(digits) = maybe(state, |s: &mut ParseState| exact(s, TokenKind::Numeric))
        {
            resultant.push_str(&digits);
        } else if maybe(state, |s: &mut ParseState| exact(s, TokenKind::Underscore)).is_some() {
            resultant.push('_');
        } else {
            break;
        }
    }

    let rejection = if resultant.is_empty() {
        Some("can't have an empty fn name")
    } else if resultant.chars().any(|c| c.is_ascii_lowercase()) {
        Some("can't have a fn name with lowercase letters")
    } else if resultant.starts_with(|c: char| c.is_ascii_digit()) {
        Some("can't have a fn name which begins with a digit")
    } else if resultant.starts_with('_') {
        Some("can't have a fn name which begins with an underscore")
    } else {
        None
    };

    if let Some(reason) = rejection {
        state.set_index(checkpoint);
        return Err(ParseError::new(reason));
    }

    Ok(resultant)
}

/// The infix operator table. Two-token operators go first so `<=` isn't
/// eaten as `<`.
pub fn consume_op_binary_infix_fn(state: &mut ParseState) -> ParseResult<String> {
    let two = |state: &mut ParseState, a: TokenKind, b: TokenKind| {
        in_sequence!(
            state,
            |s: &mut ParseState| exact(s, a),
            |s: &mut ParseState| exact(s, b),
        )
        .is_ok()
    };

    let resultant = if two(state, TokenKind::Ampersand, TokenKind::Ampersand) {
        "AND"
    } else if two(state, TokenKind::Pipe, TokenKind::Pipe) {
        "OR"
    } else if two(state, TokenKind::LessThan, TokenKind::Equals) {
        "LEQ"
    } else if two(state, TokenKind::GreaterThan, TokenKind::Equals) {
        "GEQ"
    } else if two(state, TokenKind::Equals, TokenKind::Equals) {
        "EQ"
    } else if two(state, TokenKind::Bang, TokenKind::Equals) {
        "NEQ"
    } else if exact(state, TokenKind::Plus).is_ok() {
        "PLUS"
    } else if exact(state, TokenKind::Minus).is_ok() {
        "MINUS"
    } else if exact(state, TokenKind::Asterisk).is_ok() {
        "TIMES"
    } else if exact(state, TokenKind::Slash).is_ok() {
        "DIVIDED_BY"
    } else if exact(state, TokenKind::Carat).is_ok() {
        "POW"
    } else if exact(state, TokenKind::Percent).is_ok() {
        "MOD"
    } else if exact(state, TokenKind::LessThan).is_ok() {
        "LTHAN"
    } else if exact(state, TokenKind::GreaterThan).is_ok() {
        "GTHAN"
    } else {
        return Err(ParseError::new("not a binary infix"));
    };

    Ok(resultant.into())
}

/// `expression infix_op expression`. Both sides are full expressions; the
/// guard in [`ParseState`] stops the left side from recursing back into this
/// rule at the same position.
pub fn consume_operation_infix(state: &mut ParseState) -> ParseResult<Expression> {
    let Some(key) = state.guard("operation_infix") else {
        return Err(ParseError::new("already parsing an infix operation here"));
    };
    trace!("trying OP_BINARY_INFIX at {}", state.get_index());

    let result = in_sequence!(
        state,
        consume_expression,
        consume_op_binary_infix_fn,
        consume_expression,
    );
    state.unguard(key);

    let (lhs, fn_name, rhs) = result?;
    Ok(Expression::Operation {
        fn_name,
        terms: vec![lhs, rhs],
    })
}

/// `FN_NAME '(' expression (',' expression)* ')'`.
pub fn consume_operation_prefix(state: &mut ParseState) -> ParseResult<Expression> {
    trace!("trying OPERATION_PREFIX at {}", state.get_index());

    let (fn_name, terms) = in_sequence!(state, consume_fn_name, consume_parentheses)?;
    Ok(Expression::Operation { fn_name, terms })
}

pub fn consume_operation(state: &mut ParseState) -> ParseResult<Expression> {
    trace!("trying OPERATION at {}", state.get_index());

    any!(state, consume_operation_infix, consume_operation_prefix)
}

/// `'(' expression (',' expression)* ')'` with at least one inner
/// expression.
pub fn consume_parentheses(state: &mut ParseState) -> ParseResult<Vec<Expression>> {
    trace!("trying PARENTHESES at {}", state.get_index());

    let checkpoint = state.get_index();

    exact(state, TokenKind::LParen)?;

    let mut resultant = vec![];
    loop {
        match consume_expression(state) {
            Ok(expression) => resultant.push(expression),
            Err(error) => {
                state.set_index(checkpoint);
                return Err(error);
            }
        }

        if maybe(state, |s: &mut ParseState| exact(s, TokenKind::Comma)).is_none() {
            break;
        }
    }

    if exact(state, TokenKind::RParen).is_err() {
        state.set_index(checkpoint);
        return Err(ParseError::new("expected ')'"));
    }

    Ok(resultant)
}

pub fn consume_expression(state: &mut ParseState) -> ParseResult<Expression> {
    trace!("trying EXPRESSION at {}", state.get_index());

    any!(
        state,
        consume_operation,
        // A parenthesized expression is just its inner expression; tuples
        // are only legal as prefix-operation arguments.
        |s: &mut ParseState| with_restriction(s, consume_parentheses, |exprs: &Vec<Expression>| {
            exprs.len() == 1
        })
        .map(|mut exprs| exprs.remove(0)),
        |s: &mut ParseState| consume_range_location(s).map(Expression::Range),
        // Amounts outrank points so `USD3` and `CAD4.56` read as money, not
        // as cells in columns "USD" and "CAD".
        |s: &mut ParseState| consume_amount(s).map(Expression::Value),
        |s: &mut ParseState| consume_point_location(s).map(Expression::Lookup),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::{Currency, Money};
    use crate::lexer::lex;
    use crate::parser::parse;

    fn run<T>(
        input: &str,
        consumer: impl FnOnce(&mut ParseState) -> ParseResult<T>,
    ) -> ParseResult<T> {
        consumer(&mut ParseState::from(lex(input).unwrap()))
    }

    fn int(i: i64) -> Expression {
        Expression::Value(Amount::Int(i))
    }

    fn plus(lhs: Expression, rhs: Expression) -> Expression {
        Expression::Operation {
            fn_name: "PLUS".into(),
            terms: vec![lhs, rhs],
        }
    }

    #[test]
    fn test_consume_fn_name() {
        assert_eq!(run("SUM", consume_fn_name), Ok("SUM".into()));
        assert_eq!(run("MULTIPLIED_BY", consume_fn_name), Ok("MULTIPLIED_BY".into()));
        assert_eq!(run("POW2", consume_fn_name), Ok("POW2".into()));

        assert!(run("sum", consume_fn_name).is_err());
        assert!(run("2POW", consume_fn_name).is_err());
        assert!(run("_SUM", consume_fn_name).is_err());
        assert!(run("+", consume_fn_name).is_err());
    }

    #[test]
    fn test_consume_infix_fn_prefers_two_token_operators() {
        assert_eq!(run("<=", consume_op_binary_infix_fn), Ok("LEQ".into()));
        assert_eq!(run(">=", consume_op_binary_infix_fn), Ok("GEQ".into()));
        assert_eq!(run("==", consume_op_binary_infix_fn), Ok("EQ".into()));
        assert_eq!(run("!=", consume_op_binary_infix_fn), Ok("NEQ".into()));
        assert_eq!(run("&&", consume_op_binary_infix_fn), Ok("AND".into()));
        assert_eq!(run("||", consume_op_binary_infix_fn), Ok("OR".into()));
        assert_eq!(run("<", consume_op_binary_infix_fn), Ok("LTHAN".into()));
        assert_eq!(run("+", consume_op_binary_infix_fn), Ok("PLUS".into()));
        assert_eq!(run("^", consume_op_binary_infix_fn), Ok("POW".into()));
        assert_eq!(run("%", consume_op_binary_infix_fn), Ok("MOD".into()));
        assert!(run(",", consume_op_binary_infix_fn).is_err());
    }

    #[test]
    fn test_parse_infix() {
        assert_eq!(parse("2+3"), Ok(plus(int(2), int(3))));
        assert_eq!(
            parse("1 <= 2"),
            Ok(Expression::Operation {
                fn_name: "LEQ".into(),
                terms: vec![int(1), int(2)],
            })
        );
        assert_eq!(
            parse("True && False"),
            Ok(Expression::Operation {
                fn_name: "AND".into(),
                terms: vec![
                    Expression::Value(Amount::Bool(true)),
                    Expression::Value(Amount::Bool(false)),
                ],
            })
        );
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(parse("PLUS(2,3)"), Ok(plus(int(2), int(3))));
        assert_eq!(
            parse("NOT(True)"),
            Ok(Expression::Operation {
                fn_name: "NOT".into(),
                terms: vec![Expression::Value(Amount::Bool(true))],
            })
        );
        assert_eq!(
            parse("SUM(A1,A2)"),
            Ok(Expression::Operation {
                fn_name: "SUM".into(),
                terms: vec![
                    Expression::Lookup(XY::new(0, 0)),
                    Expression::Lookup(XY::new(0, 1)),
                ],
            })
        );
    }

    #[test]
    fn test_parse_parenthesized_grouping() {
        // Parentheses force the left association.
        assert_eq!(parse("(3+2)+1"), Ok(plus(plus(int(3), int(2)), int(1))));
        // Without them the guard makes infix chains right-associative.
        assert_eq!(parse("3+2+1"), Ok(plus(int(3), plus(int(2), int(1)))));
        // A parenthesized expression is a pass-through.
        assert_eq!(parse("(42)"), Ok(int(42)));
        // Tuples only belong to prefix calls.
        assert!(parse("(1,2)").is_err());
    }

    #[test]
    fn test_parse_lookups_and_ranges() {
        assert_eq!(parse("A1"), Ok(Expression::Lookup(XY::new(0, 0))));
        assert_eq!(
            parse("A1+B1"),
            Ok(plus(
                Expression::Lookup(XY::new(0, 0)),
                Expression::Lookup(XY::new(1, 0)),
            ))
        );
        assert_eq!(
            parse("A1:B2"),
            Ok(Expression::Range(RangeLocation::PointToPoint {
                from: XY::new(0, 0),
                to: XY::new(1, 1),
            }))
        );
        assert_eq!(
            parse("1:2"),
            Ok(Expression::Range(RangeLocation::RowToRow {
                from_row: 0,
                to_row: 1,
            }))
        );
    }

    #[test]
    fn test_parse_money_arithmetic() {
        assert_eq!(
            parse("$1.23 + $2"),
            Ok(plus(
                Expression::Value(Amount::Money(Money::new(1, 23, Currency::Usd))),
                Expression::Value(Amount::Money(Money::new(2, 0, Currency::Usd))),
            ))
        );
    }

    #[test]
    fn test_currency_words_outrank_columns() {
        // "USD" and "CAD" are valid column letters, but the money reading
        // wins.
        assert_eq!(
            parse("USD3"),
            Ok(Expression::Value(Amount::Money(Money::new(
                3,
                0,
                Currency::Usd
            ))))
        );
        assert_eq!(
            parse("CAD4.56"),
            Ok(Expression::Value(Amount::Money(Money::new(
                4,
                56,
                Currency::Cad
            ))))
        );
    }

    #[test]
    fn test_referenced_cells() {
        let expression = parse("PLUS(A1, PLUS(B2, A1))").unwrap();
        let cells: Vec<XY> = expression.referenced_cells().into_iter().collect();
        assert_eq!(cells, vec![XY::new(0, 0), XY::new(1, 1)]);

        // Ranges don't evaluate, so they aren't reads.
        assert!(parse("A1:B2").unwrap().referenced_cells().is_empty());
        assert!(parse("42").unwrap().referenced_cells().is_empty());
    }

    #[test]
    fn test_rendering_round_trips() {
        for input in [
            "123",
            "12.34",
            ".5",
            "42.",
            "\"foo\"",
            "True",
            "False",
            "$123.45",
            "USD3",
            "CAD4.56",
            "2007-03-01T13:00:00+00:00",
            "2007-03-01T13:00:00.25-08:00",
            "A1",
            "AA100",
            "A1:B2",
            "A1:B",
            "A1:2",
            "A:B",
            "1:2",
            "PLUS(2,3)",
            "NOT(True)",
            "SUM(A1,A2)",
            "2+3",
            "A1-B1",
            "1<=2",
            "True && False",
            "1 != 2",
            "(3+2)+1",
        ] {
            let expression = parse(input).unwrap();
            let rendered = expression.to_string();
            assert_eq!(
                parse(&rendered),
                Ok(expression),
                "'{input}' rendered as '{rendered}'"
            );
        }
    }
}
