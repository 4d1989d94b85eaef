pub mod combinators;
pub mod expression;
pub mod literals;
pub mod location;
mod parse_state;

pub use self::parse_state::*;

use std::{error::Error, fmt::Display};

use colored::Colorize;

use crate::lexer::lex;

use self::expression::{consume_expression, Expression};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: Option<usize>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    pub fn at(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(position),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} (at position {position})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for ParseError {}

/// Render a parse error underneath its input, with a caret pointing at the
/// offending position.
pub fn annotate(input: &str, error: &ParseError) -> String {
    let Some(position) = error.position else {
        return error.message.clone();
    };

    let padding: String = vec![' '; position].iter().collect();
    format!("{input}\n{padding}{} {}", "^".red(), error.message)
}

/// Lex and parse a complete formula. Trailing tokens are an error: the whole
/// input must be one expression.
pub fn parse(input: &str) -> Result<Expression, crate::Error> {
    let tokens = lex(input)?;
    let mut state = ParseState::from(tokens);

    let expression = consume_expression(&mut state)?;

    if let Some(token) = state.peek() {
        return Err(ParseError::at(
            format!("unexpected trailing '{}'", token.value),
            token.position,
        )
        .into());
    }

    Ok(expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;

    #[test]
    fn test_parse_consumes_everything() {
        assert!(parse("1").is_ok());
        assert!(parse("1 2").is_err());
        assert!(parse("(1))").is_err());
    }

    #[test]
    fn test_parse_reports_lex_errors() {
        assert!(matches!(parse("1 @ 2"), Err(crate::Error::Lex(_))));
    }

    #[test]
    fn test_parse_simple_literal() {
        assert_eq!(parse("42"), Ok(Expression::Value(Amount::Int(42))));
    }

    #[test]
    fn test_annotate_points_at_position() {
        let error = ParseError::at("boom", 2);
        let rendered = annotate("1+?", &error);
        assert!(rendered.starts_with("1+?\n  "));
        assert!(rendered.ends_with(" boom"));
    }
}
