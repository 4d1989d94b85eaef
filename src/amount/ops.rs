//! The operator tables over [`Amount`]: arithmetic and logic with type
//! lifting, and comparisons derived from `<=` and `==`.

use std::{error::Error, fmt::Display};

use super::{Amount, Currency, Money, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithError(String);

impl ArithError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl Display for ArithError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Error for ArithError {}

pub type ArithResult<T> = Result<T, ArithError>;

fn mismatch(op: &str, lhs: &Amount, rhs: &Amount) -> ArithError {
    ArithError(format!("can't {} {} and {}", op, lhs.kind(), rhs.kind()))
}

fn same_currency(lhs: &Money, rhs: &Money) -> ArithResult<Currency> {
    if lhs.currency != rhs.currency {
        return Err(ArithError::new("different currencies"));
    }
    if lhs.currency == Currency::Unknown {
        return Err(ArithError::new("unknown currency"));
    }
    Ok(lhs.currency)
}

fn timestamp_add(lhs: Timestamp, rhs: Timestamp) -> Timestamp {
    let mut seconds = lhs.seconds + rhs.seconds;
    let mut nanos = lhs.nanos + rhs.nanos;
    if nanos >= 1_000_000_000 {
        seconds += 1;
        nanos -= 1_000_000_000;
    }
    Timestamp::new(seconds, nanos)
}

fn timestamp_sub(lhs: Timestamp, rhs: Timestamp) -> ArithResult<Timestamp> {
    if lhs < rhs {
        return Err(ArithError::new("timestamp lhs < rhs, can't subtract"));
    }
    let mut seconds = lhs.seconds - rhs.seconds;
    let mut nanos = lhs.nanos - rhs.nanos;
    if nanos < 0 {
        seconds -= 1;
        nanos += 1_000_000_000;
    }
    Ok(Timestamp::new(seconds, nanos))
}

fn money_add(lhs: Money, rhs: Money) -> ArithResult<Money> {
    let currency = same_currency(&lhs, &rhs)?;
    Ok(Money::new(
        lhs.dollars + rhs.dollars,
        i64::from(lhs.cents) + i64::from(rhs.cents),
        currency,
    ))
}

fn money_sub(lhs: Money, rhs: Money) -> ArithResult<Money> {
    let currency = same_currency(&lhs, &rhs)?;
    if (lhs.dollars, lhs.cents) < (rhs.dollars, rhs.cents) {
        return Err(ArithError::new("money lhs < rhs, can't subtract"));
    }
    let mut dollars = lhs.dollars - rhs.dollars;
    let mut cents = i64::from(lhs.cents) - i64::from(rhs.cents);
    if cents < 0 {
        dollars -= 1;
        cents += 100;
    }
    Ok(Money::new(dollars, cents, currency))
}

fn money_mul(lhs: Money, rhs: Money) -> ArithResult<Money> {
    let currency = same_currency(&lhs, &rhs)?;
    Ok(Money::from_fraction(
        lhs.as_fraction() * rhs.as_fraction(),
        currency,
    ))
}

fn money_div(lhs: Money, rhs: Money) -> ArithResult<Money> {
    let currency = same_currency(&lhs, &rhs)?;
    if rhs.dollars == 0 && rhs.cents == 0 {
        return Err(ArithError::new("division by zero money"));
    }
    Ok(Money::from_fraction(
        lhs.as_fraction() / rhs.as_fraction(),
        currency,
    ))
}

pub fn add(lhs: &Amount, rhs: &Amount) -> ArithResult<Amount> {
    match (lhs, rhs) {
        (Amount::Str(l), Amount::Str(r)) => Ok(Amount::Str(format!("{l}{r}"))),
        (Amount::Timestamp(l), Amount::Timestamp(r)) => Ok(Amount::Timestamp(timestamp_add(*l, *r))),
        (Amount::Money(l), Amount::Money(r)) => Ok(Amount::Money(money_add(*l, *r)?)),
        (Amount::Int(l), Amount::Int(r)) => Ok(Amount::Int(l + r)),
        (Amount::Int(l), Amount::Double(r)) => Ok(Amount::Double(*l as f64 + r)),
        (Amount::Double(l), Amount::Int(r)) => Ok(Amount::Double(l + *r as f64)),
        (Amount::Double(l), Amount::Double(r)) => Ok(Amount::Double(l + r)),
        _ => Err(mismatch("add", lhs, rhs)),
    }
}

pub fn sub(lhs: &Amount, rhs: &Amount) -> ArithResult<Amount> {
    match (lhs, rhs) {
        (Amount::Timestamp(l), Amount::Timestamp(r)) => {
            Ok(Amount::Timestamp(timestamp_sub(*l, *r)?))
        }
        (Amount::Money(l), Amount::Money(r)) => Ok(Amount::Money(money_sub(*l, *r)?)),
        (Amount::Int(l), Amount::Int(r)) => Ok(Amount::Int(l - r)),
        (Amount::Int(l), Amount::Double(r)) => Ok(Amount::Double(*l as f64 - r)),
        (Amount::Double(l), Amount::Int(r)) => Ok(Amount::Double(l - *r as f64)),
        (Amount::Double(l), Amount::Double(r)) => Ok(Amount::Double(l - r)),
        _ => Err(mismatch("subtract", lhs, rhs)),
    }
}

pub fn mul(lhs: &Amount, rhs: &Amount) -> ArithResult<Amount> {
    match (lhs, rhs) {
        (Amount::Money(l), Amount::Money(r)) => Ok(Amount::Money(money_mul(*l, *r)?)),
        (Amount::Int(l), Amount::Int(r)) => Ok(Amount::Int(l * r)),
        (Amount::Int(l), Amount::Double(r)) => Ok(Amount::Double(*l as f64 * r)),
        (Amount::Double(l), Amount::Int(r)) => Ok(Amount::Double(l * *r as f64)),
        (Amount::Double(l), Amount::Double(r)) => Ok(Amount::Double(l * r)),
        _ => Err(mismatch("multiply", lhs, rhs)),
    }
}

pub fn div(lhs: &Amount, rhs: &Amount) -> ArithResult<Amount> {
    match (lhs, rhs) {
        (Amount::Money(l), Amount::Money(r)) => Ok(Amount::Money(money_div(*l, *r)?)),
        (_, Amount::Int(0)) => Err(ArithError::new("division by zero")),
        (_, Amount::Double(r)) if *r == 0.0 => Err(ArithError::new("division by zero")),
        (Amount::Int(l), Amount::Int(r)) => Ok(Amount::Int(l / r)),
        (Amount::Int(l), Amount::Double(r)) => Ok(Amount::Double(*l as f64 / r)),
        (Amount::Double(l), Amount::Int(r)) => Ok(Amount::Double(l / *r as f64)),
        (Amount::Double(l), Amount::Double(r)) => Ok(Amount::Double(l / r)),
        _ => Err(mismatch("divide", lhs, rhs)),
    }
}

pub fn and(lhs: &Amount, rhs: &Amount) -> ArithResult<Amount> {
    match (lhs, rhs) {
        (Amount::Bool(l), Amount::Bool(r)) => Ok(Amount::Bool(*l && *r)),
        _ => Err(mismatch("&&", lhs, rhs)),
    }
}

pub fn or(lhs: &Amount, rhs: &Amount) -> ArithResult<Amount> {
    match (lhs, rhs) {
        (Amount::Bool(l), Amount::Bool(r)) => Ok(Amount::Bool(*l || *r)),
        _ => Err(mismatch("||", lhs, rhs)),
    }
}

pub fn not(arg: &Amount) -> ArithResult<Amount> {
    match arg {
        Amount::Bool(b) => Ok(Amount::Bool(!b)),
        _ => Err(ArithError(format!("can't ! a {}", arg.kind()))),
    }
}

/// `<=` over matching pairs. Money comparisons are currency-gated; money and
/// timestamps compare in normalized lexicographic order.
pub fn leq(lhs: &Amount, rhs: &Amount) -> ArithResult<bool> {
    match (lhs, rhs) {
        (Amount::Str(l), Amount::Str(r)) => Ok(l <= r),
        (Amount::Int(l), Amount::Int(r)) => Ok(l <= r),
        (Amount::Int(l), Amount::Double(r)) => Ok(*l as f64 <= *r),
        (Amount::Double(l), Amount::Int(r)) => Ok(*l <= *r as f64),
        (Amount::Double(l), Amount::Double(r)) => Ok(l <= r),
        (Amount::Timestamp(l), Amount::Timestamp(r)) => Ok(l <= r),
        (Amount::Money(l), Amount::Money(r)) => {
            same_currency(l, r)?;
            Ok((l.dollars, l.cents) <= (r.dollars, r.cents))
        }
        _ => Err(mismatch("compare", lhs, rhs)),
    }
}

/// `==` over matching pairs; also defined for bools.
pub fn eq(lhs: &Amount, rhs: &Amount) -> ArithResult<bool> {
    match (lhs, rhs) {
        (Amount::Bool(l), Amount::Bool(r)) => Ok(l == r),
        (Amount::Str(l), Amount::Str(r)) => Ok(l == r),
        (Amount::Int(l), Amount::Int(r)) => Ok(l == r),
        (Amount::Int(l), Amount::Double(r)) => Ok(*l as f64 == *r),
        (Amount::Double(l), Amount::Int(r)) => Ok(*l == *r as f64),
        (Amount::Double(l), Amount::Double(r)) => Ok(l == r),
        (Amount::Timestamp(l), Amount::Timestamp(r)) => Ok(l == r),
        (Amount::Money(l), Amount::Money(r)) => {
            same_currency(l, r)?;
            Ok((l.dollars, l.cents) == (r.dollars, r.cents))
        }
        _ => Err(mismatch("compare", lhs, rhs)),
    }
}

pub fn lt(lhs: &Amount, rhs: &Amount) -> ArithResult<bool> {
    Ok(leq(lhs, rhs)? && !eq(lhs, rhs)?)
}

pub fn gt(lhs: &Amount, rhs: &Amount) -> ArithResult<bool> {
    Ok(!leq(lhs, rhs)?)
}

pub fn geq(lhs: &Amount, rhs: &Amount) -> ArithResult<bool> {
    Ok(gt(lhs, rhs)? || eq(lhs, rhs)?)
}

pub fn neq(lhs: &Amount, rhs: &Amount) -> ArithResult<bool> {
    Ok(!eq(lhs, rhs)?)
}
