//! Consumers for cell locations: points (`A1`) and ranges (`A1:B2`, `A1:B`,
//! `A1:2`, `A:B`, `1:2`).

use std::fmt::Display;

use log::trace;

use crate::lexer::TokenKind;
use crate::xy::{column_letter_to_integer, integer_to_column_letter, XY};
use crate::{any, in_sequence};

use super::combinators::{exact, with_restriction, with_transformation, ParseResult};
use super::{ParseError, ParseState};

/// A rectangular (or half-open) region of the sheet. Ranges parse but do not
/// evaluate; they exist as an extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeLocation {
    PointToPoint { from: XY, to: XY },
    PointToRow { from: XY, to_row: u32 },
    PointToCol { from: XY, to_col: u32 },
    RowToRow { from_row: u32, to_row: u32 },
    ColToCol { from_col: u32, to_col: u32 },
}

impl Display for RangeLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeLocation::PointToPoint { from, to } => write!(f, "{from}:{to}"),
            RangeLocation::PointToRow { from, to_row } => write!(f, "{from}:{}", to_row + 1),
            RangeLocation::PointToCol { from, to_col } => {
                write!(f, "{from}:{}", integer_to_column_letter(*to_col))
            }
            RangeLocation::RowToRow { from_row, to_row } => {
                write!(f, "{}:{}", from_row + 1, to_row + 1)
            }
            RangeLocation::ColToCol { from_col, to_col } => write!(
                f,
                "{}:{}",
                integer_to_column_letter(*from_col),
                integer_to_column_letter(*to_col)
            ),
        }
    }
}

/// A 1-based row number, yielded 0-based.
pub fn consume_row_indicator(state: &mut ParseState) -> ParseResult<u32> {
    with_transformation(
        state,
        |s: &mut ParseState| {
            with_restriction(s, super::literals::consume_int, |i| {
                *i > 0 && *i - 1 <= u32::MAX as i64
            })
        },
        |i| (i - 1) as u32,
    )
}

/// One alpha token of column letters, yielded as a 0-based column index.
pub fn consume_col_indicator(state: &mut ParseState) -> ParseResult<u32> {
    let checkpoint = state.get_index();
    let letters = exact(state, TokenKind::Alpha)?;

    match column_letter_to_integer(&letters) {
        Ok(col) => Ok(col),
        Err(_) => {
            state.set_index(checkpoint);
            Err(ParseError::new(
                "LOCATION must begin with one or more of [A-Z]",
            ))
        }
    }
}

pub fn consume_point_location(state: &mut ParseState) -> ParseResult<XY> {
    trace!("trying POINT_LOCATION at {}", state.get_index());

    let (col, row) = in_sequence!(state, consume_col_indicator, consume_row_indicator)?;
    Ok(XY::new(col, row))
}

fn consume_range_location_point_then_any(state: &mut ParseState) -> ParseResult<RangeLocation> {
    let checkpoint = state.get_index();

    let (from, _) = in_sequence!(
        state,
        consume_point_location,
        |s: &mut ParseState| exact(s, TokenKind::Colon),
    )?;

    let resultant = any!(
        state,
        |s: &mut ParseState| consume_point_location(s)
            .map(|to| RangeLocation::PointToPoint { from, to }),
        |s: &mut ParseState| consume_row_indicator(s)
            .map(|to_row| RangeLocation::PointToRow { from, to_row }),
        |s: &mut ParseState| consume_col_indicator(s)
            .map(|to_col| RangeLocation::PointToCol { from, to_col }),
    );

    match resultant {
        Ok(range) => Ok(range),
        Err(_) => {
            state.set_index(checkpoint);
            Err(ParseError::new("RANGE_LOCATION must end in a point/row/col"))
        }
    }
}

fn consume_range_location_row_then_row(state: &mut ParseState) -> ParseResult<RangeLocation> {
    let (from_row, _, to_row) = in_sequence!(
        state,
        consume_row_indicator,
        |s: &mut ParseState| exact(s, TokenKind::Colon),
        consume_row_indicator,
    )?;
    Ok(RangeLocation::RowToRow { from_row, to_row })
}

fn consume_range_location_col_then_col(state: &mut ParseState) -> ParseResult<RangeLocation> {
    let (from_col, _, to_col) = in_sequence!(
        state,
        consume_col_indicator,
        |s: &mut ParseState| exact(s, TokenKind::Colon),
        consume_col_indicator,
    )?;
    Ok(RangeLocation::ColToCol { from_col, to_col })
}

pub fn consume_range_location(state: &mut ParseState) -> ParseResult<RangeLocation> {
    trace!("trying RANGE_LOCATION at {}", state.get_index());

    any!(
        state,
        consume_range_location_point_then_any,
        consume_range_location_row_then_row,
        consume_range_location_col_then_col,
    )
}
