//! Saving and loading sheets.
//!
//! The on-disk shape is `{metadata, cells}` as JSON, with each cell carrying
//! its coordinates and its formula rendered back to formula syntax. Loading
//! replays every record through [`Sheet::set`], which rebuilds the
//! dependency graph and the caches; the graph itself is never persisted.

use std::{error::Error, fmt::Display, fs, path::Path};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::sheet::{Metadata, Sheet};
use crate::xy::XY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub row: u32,
    pub col: u32,
    pub formula: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetFile {
    pub metadata: Metadata,
    pub cells: Vec<CellRecord>,
}

#[derive(Debug)]
pub enum PersistError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// A record failed to replay, even after every other record had its
    /// chance to land first.
    Replay { cell: XY, source: crate::Error },
}

impl Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::Io(error) => write!(f, "io error: {error}"),
            PersistError::Json(error) => write!(f, "json error: {error}"),
            PersistError::Replay { cell, source } => {
                write!(f, "couldn't replay {cell}: {source}")
            }
        }
    }
}

impl Error for PersistError {}

impl From<std::io::Error> for PersistError {
    fn from(value: std::io::Error) -> Self {
        PersistError::Io(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        PersistError::Json(value)
    }
}

/// The logical record of a sheet: metadata plus one record per cell, in
/// coordinate order.
pub fn to_sheet_file(sheet: &Sheet) -> SheetFile {
    let mut cells: Vec<&crate::sheet::Cell> = sheet.cells().collect();
    cells.sort_by_key(|cell| cell.location);

    SheetFile {
        metadata: sheet.metadata().clone(),
        cells: cells
            .into_iter()
            .map(|cell| CellRecord {
                row: cell.location.y,
                col: cell.location.x,
                formula: cell.formula.expression.to_string(),
            })
            .collect(),
    }
}

/// Rebuild a sheet by replaying records through `set`.
///
/// Records can reference each other in any order, so failed records retry
/// after the rest have landed; a record that still fails once no further
/// progress is possible aborts the load.
pub fn from_sheet_file(file: SheetFile) -> Result<Sheet, PersistError> {
    let mut sheet = Sheet::new();

    let mut pending = file.cells;
    while !pending.is_empty() {
        let attempted = pending.len();
        let mut remaining = vec![];
        let mut failure = None;

        for record in pending {
            let xy = XY::new(record.col, record.row);
            match sheet.set(xy, &record.formula) {
                Ok(_) => {}
                Err(error) => {
                    debug!("deferring {xy}: {error}");
                    failure = Some(PersistError::Replay {
                        cell: xy,
                        source: error,
                    });
                    remaining.push(record);
                }
            }
        }

        // No progress over a whole round means the failure is permanent.
        if remaining.len() == attempted {
            if let Some(failure) = failure {
                return Err(failure);
            }
        }
        pending = remaining;
    }

    // Replaying bumped the edited time; the file's metadata wins.
    sheet.set_metadata(file.metadata);
    Ok(sheet)
}

pub fn to_json(sheet: &Sheet) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(&to_sheet_file(sheet))?)
}

pub fn from_json(json: &str) -> Result<Sheet, PersistError> {
    from_sheet_file(serde_json::from_str(json)?)
}

pub fn save(sheet: &Sheet, path: impl AsRef<Path>) -> Result<(), PersistError> {
    fs::write(path, to_json(sheet)?)?;
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<Sheet, PersistError> {
    from_json(&fs::read_to_string(path)?)
}
