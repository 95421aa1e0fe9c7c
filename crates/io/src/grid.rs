// In-memory view of one worksheet

use plotdues_core::text::format_number;

/// A single cell as read from the source, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// A typed date/time cell, kept as its spreadsheet serial
    DateSerial(f64),
    Bool(bool),
}

impl Cell {
    /// Text rendering used for header matching and string fields.
    ///
    /// Integral numbers render without a fractional part, so plot `12`
    /// reads back as `"12"` rather than `"12.0"`.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) | Cell::DateSerial(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
        }
    }

    /// Blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Rows of cells, top to bottom. Rows may have different lengths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Build a grid of text cells. Empty strings become [`Cell::Empty`].
    pub fn from_text_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|s| Cell::from(s.into())).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_formats_numbers() {
        assert_eq!(Cell::Number(1000.0).text(), "1000");
        assert_eq!(Cell::Number(12.5).text(), "12.5");
        assert_eq!(Cell::DateSerial(45292.0).text(), "45292");
        assert_eq!(Cell::Bool(true).text(), "true");
        assert_eq!(Cell::Empty.text(), "");
    }

    #[test]
    fn test_cell_blank() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::Text("   ".into()).is_blank());
        assert!(!Cell::Text(" x ".into()).is_blank());
        assert!(!Cell::Number(0.0).is_blank());
    }

    #[test]
    fn test_from_text_rows_maps_empty_strings() {
        let grid = Grid::from_text_rows(vec![vec!["a", ""], vec!["b", "c"]]);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.rows()[0][1], Cell::Empty);
        assert_eq!(grid.rows()[1][1], Cell::Text("c".into()));
    }
}
