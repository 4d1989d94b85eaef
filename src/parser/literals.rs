//! Consumers for the literal amount grammar: ints, doubles, bools, strings,
//! money and RFC-3339 date-times.

use std::collections::HashMap;

use chrono::{FixedOffset, TimeZone};
use log::trace;
use once_cell::sync::Lazy;

use crate::amount::{Amount, Currency, Money, Timestamp};
use crate::lexer::TokenKind;
use crate::{any, in_sequence};

use super::combinators::{exact, maybe, with_lookup, with_restriction, ParseResult};
use super::{ParseError, ParseState};

static CURRENCY_WORDS: Lazy<HashMap<String, Currency>> = Lazy::new(|| {
    HashMap::from([
        ("USD".to_string(), Currency::Usd),
        ("CAD".to_string(), Currency::Cad),
    ])
});

/// A numeric literal is either a double or an int; doubles are tried first
/// so that `12.34` doesn't stop at `12`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Double(f64),
    Int(i64),
}

pub fn consume_int(state: &mut ParseState) -> ParseResult<i64> {
    let checkpoint = state.get_index();
    let value = exact(state, TokenKind::Numeric)?;

    match value.parse::<i64>() {
        Ok(number) => Ok(number),
        Err(_) => {
            state.set_index(checkpoint);
            Err(ParseError::new("numeric literal out of range"))
        }
    }
}

/// `[int] '.' [int]` with at least one side present. The fraction is scaled
/// by its literal digit count, so `1.05` is one dollar-and-a-twentieth, not
/// `1.5`.
pub fn consume_double(state: &mut ParseState) -> ParseResult<f64> {
    let checkpoint = state.get_index();

    let (whole, _, fraction) = in_sequence!(
        state,
        |s: &mut ParseState| Ok::<_, ParseError>(maybe(s, consume_int)),
        |s: &mut ParseState| exact(s, TokenKind::Period),
        |s: &mut ParseState| Ok::<_, ParseError>(maybe(s, |s: &mut ParseState| {
            exact(s, TokenKind::Numeric)
        })),
    )?;

    if whole.is_none() && fraction.is_none() {
        state.set_index(checkpoint);
        return Err(ParseError::new("'.' alone is not a double"));
    }

    let mut resultant = whole.unwrap_or(0) as f64;
    if let Some(digits) = &fraction {
        let value: f64 = digits.parse().unwrap_or(0.0);
        resultant += value / 10f64.powi(digits.len() as i32);
    }

    Ok(resultant)
}

pub fn consume_numeric(state: &mut ParseState) -> ParseResult<Numeric> {
    any!(
        state,
        |s: &mut ParseState| consume_double(s).map(Numeric::Double),
        |s: &mut ParseState| consume_int(s).map(Numeric::Int),
    )
}

pub fn consume_string(state: &mut ParseState) -> ParseResult<String> {
    exact(state, TokenKind::Quote)
}

/// A numeric token of exactly two digits, leading zeros significant.
pub fn consume_2digit(state: &mut ParseState) -> ParseResult<i64> {
    let value = with_restriction(
        state,
        |s: &mut ParseState| exact(s, TokenKind::Numeric),
        |v: &String| v.len() == 2,
    )?;
    value
        .parse()
        .map_err(|_| ParseError::new("not a 2-digit number"))
}

pub fn consume_4digit(state: &mut ParseState) -> ParseResult<i64> {
    let value = with_restriction(
        state,
        |s: &mut ParseState| exact(s, TokenKind::Numeric),
        |v: &String| v.len() == 4,
    )?;
    value
        .parse()
        .map_err(|_| ParseError::new("not a 4-digit number"))
}

/// An alpha token reading exactly `True` or `False`.
pub fn consume_bool(state: &mut ParseState) -> ParseResult<bool> {
    let checkpoint = state.get_index();
    let word = exact(state, TokenKind::Alpha)?;

    match word.as_str() {
        "True" => Ok(true),
        "False" => Ok(false),
        _ => {
            state.set_index(checkpoint);
            Err(ParseError::new("neither 'True' nor 'False'"))
        }
    }
}

fn consume_currency_symbol(state: &mut ParseState) -> ParseResult<Currency> {
    exact(state, TokenKind::Dollar).map(|_| Currency::Usd)
}

fn consume_currency_word(state: &mut ParseState) -> ParseResult<Currency> {
    with_lookup(
        state,
        |s: &mut ParseState| exact(s, TokenKind::Alpha),
        &CURRENCY_WORDS,
    )
}

pub fn consume_currency(state: &mut ParseState) -> ParseResult<Currency> {
    any!(state, consume_currency_symbol, consume_currency_word)
}

/// A currency marker followed by a numeric: `$123.45`, `USD3`, `CAD4.56`.
pub fn consume_money(state: &mut ParseState) -> ParseResult<Money> {
    trace!("trying MONEY at {}", state.get_index());

    let (currency, numeric) = in_sequence!(state, consume_currency, consume_numeric)?;

    Ok(match numeric {
        Numeric::Int(dollars) => Money::new(dollars, 0, currency),
        Numeric::Double(value) => Money::from_fraction(value, currency),
    })
}

fn consume_date_full_year(state: &mut ParseState) -> ParseResult<i64> {
    consume_4digit(state)
}

fn consume_date_month(state: &mut ParseState) -> ParseResult<i64> {
    with_restriction(state, consume_2digit, |i| (1..=12).contains(i))
}

fn consume_date_mday(state: &mut ParseState) -> ParseResult<i64> {
    with_restriction(state, consume_2digit, |i| (1..=31).contains(i))
}

fn consume_time_hour(state: &mut ParseState) -> ParseResult<i64> {
    with_restriction(state, consume_2digit, |i| (0..=23).contains(i))
}

fn consume_time_minute(state: &mut ParseState) -> ParseResult<i64> {
    with_restriction(state, consume_2digit, |i| (0..=59).contains(i))
}

fn consume_time_second(state: &mut ParseState) -> ParseResult<i64> {
    // Up to 60, counting leap seconds.
    with_restriction(state, consume_2digit, |i| (0..=60).contains(i))
}

fn consume_time_sec_frac(state: &mut ParseState) -> ParseResult<f64> {
    consume_double(state)
}

/// `('+'|'-') hh ':' mm` as an offset in seconds east of UTC.
pub fn consume_time_offset(state: &mut ParseState) -> ParseResult<i32> {
    let (sign, hours, _, minutes) = in_sequence!(
        state,
        |s: &mut ParseState| any!(
            s,
            |s: &mut ParseState| exact(s, TokenKind::Plus),
            |s: &mut ParseState| exact(s, TokenKind::Minus),
        ),
        consume_time_hour,
        |s: &mut ParseState| exact(s, TokenKind::Colon),
        consume_time_minute,
    )?;

    let magnitude = (hours * 60 * 60 + minutes * 60) as i32;
    Ok(if sign == "+" { magnitude } else { -magnitude })
}

/// RFC-3339-style date-time: built as a civil time in the parsed offset and
/// converted to Unix seconds; fractional seconds land as rounded
/// milliseconds.
pub fn consume_datetime(state: &mut ParseState) -> ParseResult<Timestamp> {
    trace!("trying DATE_TIME at {}", state.get_index());

    let checkpoint = state.get_index();

    let (year, _, month, _, day, _, hour, _, minute, _, second, secfrac, offset) = in_sequence!(
        state,
        consume_date_full_year,
        |s: &mut ParseState| exact(s, TokenKind::Minus),
        consume_date_month,
        |s: &mut ParseState| exact(s, TokenKind::Minus),
        consume_date_mday,
        |s: &mut ParseState| with_restriction(
            s,
            |s: &mut ParseState| exact(s, TokenKind::Alpha),
            |v: &String| v == "T",
        ),
        consume_time_hour,
        |s: &mut ParseState| exact(s, TokenKind::Colon),
        consume_time_minute,
        |s: &mut ParseState| exact(s, TokenKind::Colon),
        consume_time_second,
        |s: &mut ParseState| Ok::<_, ParseError>(maybe(s, consume_time_sec_frac)),
        consume_time_offset,
    )?;

    let civil_to_unix = || -> Option<i64> {
        let tz = FixedOffset::east_opt(offset)?;
        // Leap seconds normalize onto the next civil second.
        let leap = i64::from(second == 60);
        let clock_second = if second == 60 { 59 } else { second };
        let instant = tz
            .with_ymd_and_hms(
                year as i32,
                month as u32,
                day as u32,
                hour as u32,
                minute as u32,
                clock_second as u32,
            )
            .single()?;
        Some(instant.timestamp() + leap)
    };

    let Some(mut seconds) = civil_to_unix() else {
        state.set_index(checkpoint);
        return Err(ParseError::new("not a real calendar date-time"));
    };

    let mut nanos = match secfrac {
        Some(frac) => ((frac * 1000.0).round() as i32) * 1_000_000,
        None => 0,
    };
    if nanos >= 1_000_000_000 {
        seconds += 1;
        nanos -= 1_000_000_000;
    }

    Ok(Timestamp::new(seconds, nanos))
}

/// Any literal amount. Date-times go before plain numerics so `2007-…`
/// doesn't stop at the year; doubles go before ints so `12.34` doesn't stop
/// at `12`.
pub fn consume_amount(state: &mut ParseState) -> ParseResult<Amount> {
    trace!("trying AMOUNT at {}", state.get_index());

    any!(
        state,
        |s: &mut ParseState| consume_string(s).map(Amount::Str),
        |s: &mut ParseState| consume_datetime(s).map(Amount::Timestamp),
        |s: &mut ParseState| consume_double(s).map(Amount::Double),
        |s: &mut ParseState| consume_int(s).map(Amount::Int),
        |s: &mut ParseState| consume_money(s).map(Amount::Money),
        |s: &mut ParseState| consume_bool(s).map(Amount::Bool),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn state_of(input: &str) -> ParseState {
        ParseState::from(lex(input).unwrap())
    }

    fn run<T>(
        input: &str,
        consumer: impl FnOnce(&mut ParseState) -> ParseResult<T>,
    ) -> ParseResult<T> {
        consumer(&mut state_of(input))
    }

    #[test]
    fn test_consume_int() {
        assert_eq!(run("42", consume_int), Ok(42));
        assert!(run("foo", consume_int).is_err());
        assert!(run("99999999999999999999999", consume_int).is_err());
    }

    #[test]
    fn test_consume_double() {
        assert_eq!(run("12.34", consume_double), Ok(12.34));
        assert_eq!(run(".5", consume_double), Ok(0.5));
        assert_eq!(run("42.", consume_double), Ok(42.0));
        // The fraction keeps its leading zeros.
        assert_eq!(run("1.05", consume_double), Ok(1.05));
        assert!(run(".", consume_double).is_err());
        assert!(run("42", consume_double).is_err());
    }

    #[test]
    fn test_consume_numeric_prefers_double() {
        assert_eq!(run("12.34", consume_numeric), Ok(Numeric::Double(12.34)));
        assert_eq!(run("12", consume_numeric), Ok(Numeric::Int(12)));
    }

    #[test]
    fn test_consume_digit_widths() {
        assert_eq!(run("07", consume_2digit), Ok(7));
        assert!(run("7", consume_2digit).is_err());
        assert!(run("123", consume_2digit).is_err());
        assert_eq!(run("2020", consume_4digit), Ok(2020));
        assert!(run("20", consume_4digit).is_err());
    }

    #[test]
    fn test_consume_bool() {
        assert_eq!(run("True", consume_bool), Ok(true));
        assert_eq!(run("False", consume_bool), Ok(false));
        assert!(run("true", consume_bool).is_err());
    }

    #[test]
    fn test_consume_money() {
        assert_eq!(
            run("$123.45", consume_money),
            Ok(Money::new(123, 45, Currency::Usd))
        );
        assert_eq!(run("USD3", consume_money), Ok(Money::new(3, 0, Currency::Usd)));
        assert_eq!(
            run("CAD4.56", consume_money),
            Ok(Money::new(4, 56, Currency::Cad))
        );
        assert_eq!(
            run("$1.05", consume_money),
            Ok(Money::new(1, 5, Currency::Usd))
        );
        assert!(run("EUR3", consume_money).is_err());
        assert!(run("3", consume_money).is_err());
    }

    #[test]
    fn test_consume_time_offset() {
        assert_eq!(run("+01:30", consume_time_offset), Ok(5400));
        assert_eq!(run("-08:00", consume_time_offset), Ok(-28800));
        assert!(run("01:30", consume_time_offset).is_err());
    }

    #[test]
    fn test_consume_datetime() {
        // 2007-03-01T13:00:00Z.
        assert_eq!(
            run("2007-03-01T13:00:00+00:00", consume_datetime),
            Ok(Timestamp::new(1172754000, 0))
        );
        // The offset shifts the instant.
        assert_eq!(
            run("2007-03-01T13:00:00+01:00", consume_datetime),
            Ok(Timestamp::new(1172750400, 0))
        );
        // Fractional seconds round to milliseconds.
        assert_eq!(
            run("2007-03-01T13:00:00.25+00:00", consume_datetime),
            Ok(Timestamp::new(1172754000, 250_000_000))
        );
    }

    #[test]
    fn test_consume_datetime_rejects_nonsense() {
        assert!(run("2007-13-01T13:00:00+00:00", consume_datetime).is_err());
        assert!(run("2007-02-31T13:00:00+00:00", consume_datetime).is_err());
        assert!(run("2007-03-01T24:00:00+00:00", consume_datetime).is_err());
        assert!(run("2007-3-01T13:00:00+00:00", consume_datetime).is_err());
    }

    #[test]
    fn test_consume_datetime_leap_second() {
        // :60 normalizes onto the next minute.
        assert_eq!(
            run("2007-03-01T13:00:60+00:00", consume_datetime),
            Ok(Timestamp::new(1172754060, 0))
        );
    }

    #[test]
    fn test_consume_amount_dispatch() {
        assert_eq!(run("\"foo\"", consume_amount), Ok(Amount::Str("foo".into())));
        assert_eq!(run("42", consume_amount), Ok(Amount::Int(42)));
        assert_eq!(run("12.34", consume_amount), Ok(Amount::Double(12.34)));
        assert_eq!(run("True", consume_amount), Ok(Amount::Bool(true)));
        assert_eq!(
            run("$1.23", consume_amount),
            Ok(Amount::Money(Money::new(1, 23, Currency::Usd)))
        );
        assert_eq!(
            run("2007-03-01T13:00:00+00:00", consume_amount),
            Ok(Amount::Timestamp(Timestamp::new(1172754000, 0)))
        );
    }
}
