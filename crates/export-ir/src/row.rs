//! Fixed-width rows

use crate::value::Value;
use crate::{Error, Result};
use std::ops::Index;

/// Renders an ordered sequence of strings as one output line.
///
/// Implementations own quoting and escaping; the engine hands over raw text.
pub trait LineSerializer {
    /// Render one line, including its terminator
    ///
    /// # Errors
    ///
    /// Returns an error when the line cannot be encoded.
    fn render(&self, cells: &[String]) -> Result<String>;

    /// Render a row, absent cells as empty text unless the serializer says
    /// otherwise
    ///
    /// # Errors
    ///
    /// Returns an error when the line cannot be encoded.
    fn render_row(&self, row: &Row) -> Result<String> {
        self.render(&row.to_strings())
    }
}

/// One exported row, index-aligned with the mapping's columns.
///
/// `None` marks a column that was not mapped for the record. It is distinct
/// from an empty string value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<Option<Value>>,
}

impl Row {
    /// A row of `width` absent cells
    #[must_use]
    pub fn blank(width: usize) -> Self {
        Self {
            cells: vec![None; width],
        }
    }

    /// Build a row from explicit cells
    #[must_use]
    pub fn from_cells(cells: Vec<Option<Value>>) -> Self {
        Self { cells }
    }

    /// Number of cells
    #[must_use]
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Value at `index`, `None` when absent or out of range
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.cells.get(index).and_then(Option::as_ref)
    }

    /// Whether the cell at `index` holds no value
    #[must_use]
    pub fn is_absent(&self, index: usize) -> bool {
        self.get(index).is_none()
    }

    /// Store a cell. A null value is stored as absent.
    ///
    /// # Errors
    ///
    /// Returns an error when `index` is outside the row.
    pub fn set(&mut self, index: usize, value: Option<Value>) -> Result<()> {
        let width = self.cells.len();
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, width })?;
        *cell = value.filter(|v| !v.is_null());
        Ok(())
    }

    /// All cells in column order
    #[must_use]
    pub fn cells(&self) -> &[Option<Value>] {
        &self.cells
    }

    /// Fill this row's absent cells from `fallback`.
    ///
    /// The result has this row's width; a fallback shorter than this row
    /// leaves the remaining cells as they are.
    #[must_use]
    pub fn merge(&self, fallback: &Row) -> Row {
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                cell.clone()
                    .or_else(|| fallback.cells.get(index).cloned().flatten())
            })
            .collect();
        Row { cells }
    }

    /// Render every cell as text, absent cells as empty strings
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|cell| cell.as_ref().map(Value::to_string).unwrap_or_default())
            .collect()
    }
}

impl Index<usize> for Row {
    type Output = Option<Value>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.cells[index]
    }
}
