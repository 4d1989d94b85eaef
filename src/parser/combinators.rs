//! Parser combinators.
//!
//! Each combinator runs one or more inner parsers against a [`ParseState`]
//! and either advances the cursor and yields a value, or leaves the cursor
//! where it found it and fails. Heterogeneous alternation is spelled
//! `any!` + a mapping per arm; sequencing is `in_sequence!`, which yields a
//! tuple.

use std::collections::HashMap;
use std::hash::Hash;

use crate::lexer::TokenKind;

use super::{ParseError, ParseState};

pub type ParseResult<T> = Result<T, ParseError>;

/// Match a single token of the given kind and yield its value.
pub fn exact(state: &mut ParseState, kind: TokenKind) -> ParseResult<String> {
    let Some(token) = state.peek() else {
        return Err(ParseError::new(format!(
            "expected {kind:?}, hit end of input"
        )));
    };

    if token.kind != kind {
        return Err(ParseError::at(
            format!("expected {kind:?}, found {:?}", token.kind),
            token.position,
        ));
    }

    let value = token.value.clone();
    state.next();
    Ok(value)
}

/// Never fails: `Some` if the inner parser matched, `None` (cursor restored)
/// otherwise.
pub fn maybe<T>(
    state: &mut ParseState,
    parser: impl FnOnce(&mut ParseState) -> ParseResult<T>,
) -> Option<T> {
    let checkpoint = state.get_index();
    match parser(state) {
        Ok(value) => Some(value),
        Err(_) => {
            state.set_index(checkpoint);
            None
        }
    }
}

/// Run the inner parser, then fail (restoring the cursor) unless the value
/// passes the restriction.
pub fn with_restriction<T>(
    state: &mut ParseState,
    parser: impl FnOnce(&mut ParseState) -> ParseResult<T>,
    restriction: impl FnOnce(&T) -> bool,
) -> ParseResult<T> {
    let checkpoint = state.get_index();
    let value = parser(state)?;
    if !restriction(&value) {
        state.set_index(checkpoint);
        return Err(ParseError::new("didn't pass restriction"));
    }
    Ok(value)
}

/// Run the inner parser and map its value.
pub fn with_transformation<A, B>(
    state: &mut ParseState,
    parser: impl FnOnce(&mut ParseState) -> ParseResult<A>,
    transformation: impl FnOnce(A) -> B,
) -> ParseResult<B> {
    parser(state).map(transformation)
}

/// Run the inner parser, then look the produced key up in `map`; fail
/// (restoring the cursor) if it is absent.
pub fn with_lookup<K: Eq + Hash, V: Clone>(
    state: &mut ParseState,
    parser: impl FnOnce(&mut ParseState) -> ParseResult<K>,
    map: &HashMap<K, V>,
) -> ParseResult<V> {
    let checkpoint = state.get_index();
    let key = parser(state)?;
    match map.get(&key) {
        Some(value) => Ok(value.clone()),
        None => {
            state.set_index(checkpoint);
            Err(ParseError::new("no lookup match"))
        }
    }
}

/// Try each alternative in order; the first success wins. The cursor is
/// restored between attempts and on overall failure.
#[macro_export]
macro_rules! any {
    ($state:expr, $($parser:expr),+ $(,)?) => {
        'any: {
            $(
                let checkpoint = $state.get_index();
                match $parser($state) {
                    Ok(value) => break 'any Ok(value),
                    Err(_) => $state.set_index(checkpoint),
                }
            )+
            break 'any Err($crate::parser::ParseError::new("no alternative matched"));
        }
    };
}

/// Run every parser in order and yield the tuple of their results. The first
/// failure restores the cursor to where the sequence started.
#[macro_export]
macro_rules! in_sequence {
    ($state:expr, $($parser:expr),+ $(,)?) => {{
        let checkpoint = $state.get_index();
        'seq: {
            Ok((
                $(
                    match $parser($state) {
                        Ok(value) => value,
                        Err(error) => {
                            $state.set_index(checkpoint);
                            break 'seq Err(error);
                        }
                    }
                ),+
            ))
        }
    }};
}
