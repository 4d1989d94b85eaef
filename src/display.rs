//! Rendering amounts and cells for the terminal.

use std::fmt::Display;

use crate::amount::Amount;
use crate::sheet::{Cell, Sheet};
use crate::xy::{integer_to_column_letter, XY};

/// Marker shown for a cell whose last evaluation failed.
pub const ERROR_MARKER: &str = "#ERR";

/// Human-facing rendering: strings unquoted, doubles at two decimal places.
pub fn print_amount(amount: &Amount) -> String {
    match amount {
        Amount::Str(s) => s.clone(),
        Amount::Double(d) => format!("{d:.2}"),
        other => other.to_string(),
    }
}

pub fn print_cell(cell: &Cell) -> String {
    match &cell.formula.cached {
        Ok(amount) => print_amount(amount),
        Err(_) => ERROR_MARKER.into(),
    }
}

/// Short-lived helper for printing a rectangle of cells as an aligned text
/// grid with A1-style headers. Column widths are computed here; the engine
/// knows nothing about them.
#[derive(Debug, Clone)]
pub struct GridView {
    width: u32,
    height: u32,
    strings: Vec<Vec<Option<String>>>, // y, then x
}

impl GridView {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            strings: vec![vec![None; width as usize]; height as usize],
        }
    }

    /// A view covering every occupied cell of the sheet.
    pub fn of_sheet(sheet: &Sheet) -> Self {
        let mut view = Self::new(sheet.width(), sheet.height());
        for cell in sheet.cells() {
            view.write(cell.location, cell);
        }
        view
    }

    /// Place a cell's rendering; out-of-bounds writes are dropped.
    pub fn write(&mut self, xy: XY, cell: &Cell) {
        if xy.x < self.width && xy.y < self.height {
            self.strings[xy.y as usize][xy.x as usize] = Some(print_cell(cell));
        }
    }

    fn column_width(&self, x: u32) -> usize {
        let header = integer_to_column_letter(x).len();
        self.strings
            .iter()
            .filter_map(|row| row[x as usize].as_ref())
            .map(String::len)
            .chain([header])
            .max()
            .unwrap_or(header)
    }
}

impl Display for GridView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let widths: Vec<usize> = (0..self.width).map(|x| self.column_width(x)).collect();
        let row_label_width = self.height.to_string().len();

        write!(f, "{:row_label_width$} |", "")?;
        for (x, width) in widths.iter().enumerate() {
            write!(f, " {:width$} |", integer_to_column_letter(x as u32))?;
        }
        writeln!(f)?;

        for (y, row) in self.strings.iter().enumerate() {
            write!(f, "{:row_label_width$} |", y + 1)?;
            for (x, width) in widths.iter().enumerate() {
                let value = row[x].as_deref().unwrap_or("");
                write!(f, " {value:width$} |")?;
            }
            if y + 1 < self.strings.len() {
                writeln!(f)?;
            }
        }

        Ok(())
    }
}
