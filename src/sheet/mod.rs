//! The sheet engine: cells, the dependency graph between them, and the
//! write path that keeps every cached amount consistent.

mod cell;
mod metadata;

pub use self::cell::*;
pub use self::metadata::*;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::debug;

use crate::amount::Amount;
use crate::evaluator::evaluate;
use crate::graph::{Graph, Transaction};
use crate::parser;
use crate::xy::XY;
use crate::Error;

pub type ChangeCallback = Box<dyn FnMut(&Cell)>;
pub type EditedTimeCallback = Box<dyn FnMut(DateTime<Utc>)>;

/// A spreadsheet.
///
/// All mutation goes through [`Sheet::set`] and [`Sheet::clear`], which keep
/// the dependency graph and every cached amount in step: after either
/// returns, each cell's cache equals re-evaluating its expression, or holds
/// the error that re-evaluation produced.
///
/// The change callbacks are a single-consumer model. They receive plain
/// references and cannot re-enter the sheet.
#[derive(Default)]
pub struct Sheet {
    cells: HashMap<XY, Cell>,
    graph: Graph<XY>,
    metadata: Metadata,
    on_change: Option<ChangeCallback>,
    on_edited_time: Option<EditedTimeCallback>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::with_metadata(Metadata::new())
    }

    pub fn with_metadata(metadata: Metadata) -> Self {
        Self {
            cells: HashMap::new(),
            graph: Graph::new(),
            metadata,
            on_change: None,
            on_edited_time: None,
        }
    }

    /// The cell's cached amount. No side effects.
    pub fn get(&self, xy: XY) -> Result<Amount, Error> {
        match self.cells.get(&xy) {
            Some(cell) => match &cell.formula.cached {
                Ok(amount) => Ok(amount.clone()),
                Err(error) => Err(Error::Eval(error.clone())),
            },
            None => Err(Error::NotFound(xy)),
        }
    }

    /// Bind `xy` to a formula.
    ///
    /// Parses the input, rewires the dependency graph (rejecting cycles with
    /// the graph untouched), evaluates, stores the cell, then re-evaluates
    /// every transitive dependent in topological order, firing `on_change`
    /// for each one whose cached amount actually changed. The written cell
    /// itself never triggers `on_change`.
    pub fn set(&mut self, xy: XY, input: &str) -> Result<Amount, Error> {
        debug!("set {xy} = {input:?}");

        let expression = parser::parse(input)?;
        let references = expression.referenced_cells();

        // Rewire: drop the old inbound edges, stage the new ones.
        let previous_parents = self.graph.parents_of(&xy);
        for parent in &previous_parents {
            self.graph.remove_edge(parent, &xy);
        }

        let mut transaction = Transaction::new();
        for reference in &references {
            transaction.stage(*reference, xy);
        }
        if !transaction.commit(&mut self.graph) {
            for parent in &previous_parents {
                self.graph.add_edge(*parent, xy);
            }
            return Err(Error::Cycle(xy));
        }

        // Evaluate against the current caches. On failure the graph goes
        // back to its prior state and the cell map is untouched.
        let evaluated = evaluate(&expression, &|q| self.lookup(q));
        let amount = match evaluated {
            Ok(amount) => amount,
            Err(error) => {
                for reference in &references {
                    self.graph.remove_edge(reference, &xy);
                }
                for parent in &previous_parents {
                    self.graph.add_edge(*parent, xy);
                }
                return Err(Error::Eval(error));
            }
        };

        self.cells
            .insert(xy, Cell::new(xy, expression, Ok(amount.clone())));

        let order = self.graph.descendants_of(&xy);
        self.recompute(&order);
        self.touch();

        Ok(amount)
    }

    /// Remove a cell and its edges. Dependents re-evaluate; the ones that
    /// now read a missing cell store the break and surface it via
    /// `on_change`.
    pub fn clear(&mut self, xy: XY) {
        if !self.cells.contains_key(&xy) {
            return;
        }
        debug!("clear {xy}");

        // Descendants need collecting before the edges go away.
        let order = self.graph.descendants_of(&xy);
        self.graph.remove(&xy);
        self.cells.remove(&xy);

        self.recompute(&order);
        self.touch();
    }

    pub fn register_on_change(&mut self, callback: impl FnMut(&Cell) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn register_on_edited_time(&mut self, callback: impl FnMut(DateTime<Utc>) + 'static) {
        self.on_edited_time = Some(Box::new(callback));
    }

    pub fn cell(&self, xy: XY) -> Option<&Cell> {
        self.cells.get(&xy)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.values()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Replace the metadata wholesale; used when re-hydrating a persisted
    /// sheet, where replaying cells must not disturb the recorded times.
    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.metadata.set_title(title);
        self.fire_edited_time();
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.metadata.set_author(author);
        self.fire_edited_time();
    }

    /// One past the rightmost occupied column.
    pub fn width(&self) -> u32 {
        self.cells.keys().map(|xy| xy.x + 1).max().unwrap_or(0)
    }

    /// One past the bottommost occupied row.
    pub fn height(&self) -> u32 {
        self.cells.keys().map(|xy| xy.y + 1).max().unwrap_or(0)
    }

    fn lookup(&self, xy: XY) -> Option<Amount> {
        self.cells
            .get(&xy)
            .and_then(|cell| cell.formula.cached.as_ref().ok().cloned())
    }

    /// Re-evaluate `order` (already topologically sorted), updating caches
    /// and notifying on actual changes. Ancestors in the order are updated
    /// before their dependents, so every callback observes a consistent
    /// sheet.
    fn recompute(&mut self, order: &[XY]) {
        for &descendant in order {
            let Some(cell) = self.cells.get(&descendant) else {
                continue;
            };

            let recomputed = evaluate(&cell.formula.expression, &|q| self.lookup(q));
            if cell.formula.cached == recomputed {
                continue;
            }

            debug!("recomputed {descendant}: {recomputed:?}");
            if let Some(cell) = self.cells.get_mut(&descendant) {
                cell.formula.cached = recomputed;
            }
            if let (Some(callback), Some(cell)) =
                (self.on_change.as_mut(), self.cells.get(&descendant))
            {
                callback(cell);
            }
        }
    }

    fn touch(&mut self) {
        self.metadata.update_edited_time();
        self.fire_edited_time();
    }

    fn fire_edited_time(&mut self) {
        if let Some(callback) = self.on_edited_time.as_mut() {
            callback(self.metadata.edited_time());
        }
    }
}
