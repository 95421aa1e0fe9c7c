// Workbook reading (xlsx, xlsm, xlsb, xls, ods)
//
// Only the first worksheet is read. Cell values stay as calamine typed them;
// date cells keep their serial so the normalizer can decode them.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use tracing::debug;

use crate::error::NormalizeError;
use crate::grid::{Cell, Grid};

pub fn read_grid(path: &Path) -> Result<Grid, NormalizeError> {
    let workbook = open_workbook_auto(path)
        .map_err(|e| NormalizeError::Workbook(format!("failed to open {}: {}", path.display(), e)))?;
    first_sheet(workbook)
}

pub fn read_grid_from_bytes(bytes: &[u8]) -> Result<Grid, NormalizeError> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| NormalizeError::Workbook(e.to_string()))?;
    first_sheet(workbook)
}

fn first_sheet<RS: Read + Seek>(mut workbook: Sheets<RS>) -> Result<Grid, NormalizeError> {
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(NormalizeError::NoSheets)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| NormalizeError::Workbook(format!("failed to read sheet '{}': {}", sheet_name, e)))?;

    let grid = grid_from_range(&range);
    debug!(sheet = %sheet_name, rows = grid.len(), "read worksheet");
    Ok(grid)
}

fn grid_from_range(range: &Range<Data>) -> Grid {
    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(cell_from_data));
        rows.push(cells);
    }
    Grid::new(rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from(s.as_str()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        // Note: calamine's ExcelDateTime stores is_1904 flag internally
        // but doesn't expose a getter; serials are read as 1900 system.
        Data::DateTime(dt) => Cell::DateSerial(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::from(s.as_str()),
        Data::DurationIso(s) => Cell::from(s.as_str()),
        // #N/A, #REF! and friends carry no usable dues data
        Data::Error(_) => Cell::Empty,
    }
}
