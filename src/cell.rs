// src/cell.rs
// A single cell: its content (Empty/Text/Formula), a memoized value, and the two edge sets
// that make the sheet's dependency graph bidirectional. Cells never store pointers or
// references to each other -- only positions, resolved back through the owning `Sheet`.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::formula::Artifact;
use crate::position::Position;
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum CellContent {
    Empty,
    Text(String),
    Formula(Artifact),
}

/// One cell in a `Sheet`. `out` is the set of positions this cell's formula reads from;
/// `in_edges` is the set of positions that read from this one -- maintained by the `Sheet`
/// whenever an edit changes `out` elsewhere.
#[derive(Debug)]
pub struct Cell {
    content: CellContent,
    cache: RefCell<Option<Value>>,
    out: HashSet<Position>,
    in_edges: HashSet<Position>,
}

impl Cell {
    pub fn new_empty() -> Self {
        Cell {
            content: CellContent::Empty,
            cache: RefCell::new(None),
            out: HashSet::new(),
            in_edges: HashSet::new(),
        }
    }

    /// Classifies raw input text into the content it should become: `""` is Empty, text
    /// starting with `=` (and containing more than just `=`) is a Formula, anything else
    /// is Text. Checked once here rather than re-derived from indexing at each call site.
    pub fn classify(text: &str) -> Result<CellContent, crate::error::EngineError> {
        if text.is_empty() {
            Ok(CellContent::Empty)
        } else if let Some(source) = text.strip_prefix('=') {
            if source.is_empty() {
                Ok(CellContent::Text(text.to_string()))
            } else {
                let artifact = Artifact::parse(source)
                    .map_err(|e| crate::error::EngineError::FormulaParse(e.to_string()))?;
                Ok(CellContent::Formula(artifact))
            }
        } else {
            Ok(CellContent::Text(text.to_string()))
        }
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub(crate) fn set_content(&mut self, content: CellContent) {
        self.content = content;
        *self.cache.borrow_mut() = None;
    }

    pub(crate) fn invalidate(&self) {
        *self.cache.borrow_mut() = None;
    }

    /// The cell's literal text, as it would be re-entered: `=...` for formulas, the raw
    /// text otherwise.
    pub fn get_text(&self) -> String {
        match &self.content {
            CellContent::Empty => String::new(),
            CellContent::Text(s) => s.clone(),
            CellContent::Formula(artifact) => format!("={}", artifact.canonical()),
        }
    }

    /// The cell's computed value, memoizing formula results through the shared cache.
    /// `lookup` resolves a referenced position to its (possibly freshly computed) value.
    pub fn get_value(&self, lookup: impl Fn(Position) -> Value) -> Value {
        match &self.content {
            CellContent::Empty => Value::empty(),
            CellContent::Text(s) => Value::Text(s.strip_prefix('\'').unwrap_or(s).to_string()),
            CellContent::Formula(artifact) => {
                if let Some(cached) = self.cache.borrow().as_ref() {
                    return cached.clone();
                }
                let value = artifact.evaluate(lookup);
                if let Value::Number(_) = &value {
                    *self.cache.borrow_mut() = Some(value.clone());
                }
                value
            }
        }
    }

    pub fn get_referenced_cells(&self) -> &[Position] {
        match &self.content {
            CellContent::Formula(artifact) => artifact.referenced_cells(),
            _ => &[],
        }
    }

    pub fn is_referenced(&self) -> bool {
        !self.in_edges.is_empty()
    }

    pub(crate) fn out_edges(&self) -> &HashSet<Position> {
        &self.out
    }

    pub(crate) fn set_out_edges(&mut self, out: HashSet<Position>) {
        self.out = out;
    }

    pub(crate) fn in_edges(&self) -> &HashSet<Position> {
        &self.in_edges
    }

    pub(crate) fn add_in_edge(&mut self, from: Position) {
        self.in_edges.insert(from);
    }

    pub(crate) fn remove_in_edge(&mut self, from: Position) {
        self.in_edges.remove(&from);
    }
}
