//! Grid → dues candidates.
//!
//! Dues sheets come from many hands: title rows above the header, merged
//! banners, "Plot No." spelled five ways. Columns are therefore found by
//! substring heuristics, and cell contents are coerced rather than validated.
//! Only a missing header row is an error.

use chrono::{DateTime, Utc};
use plotdues_core::amount::{clamp_amount, coerce_amount};
use plotdues_core::timestamp::parse_date_text;
use plotdues_core::DuesPatch;
use tracing::{debug, info};

use crate::error::NormalizeError;
use crate::grid::{Cell, Grid};
use crate::serial::serial_to_datetime;

// Candidate header fragments, tried in order; first column containing the
// fragment wins. Order matters: "date" would otherwise catch any dated column.
const PLOT_COLUMN: &[&str] = &["plot no", "plot"];
const OWNER_COLUMN: &[&str] = &["owner name", "owner"];
const STATUS_COLUMN: &[&str] = &["dues status", "status"];
const TOTAL_COLUMN: &[&str] = &["total dues", "dues rs"];
const PAID_COLUMN: &[&str] = &["amount paid", "paid"];
const BALANCE_COLUMN: &[&str] = &["balance"];
const PO_NO_COLUMN: &[&str] = &["p/o no", "po no"];
const PO_DATE_COLUMN: &[&str] = &["po r date", "date"];

/// Resolved column positions. `None` means the sheet has no such column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub plot: Option<usize>,
    pub owner: Option<usize>,
    pub status: Option<usize>,
    pub total: Option<usize>,
    pub paid: Option<usize>,
    pub balance: Option<usize>,
    pub po_no: Option<usize>,
    pub po_date: Option<usize>,
}

impl ColumnMap {
    pub fn resolve(header: &[Cell]) -> Self {
        let lowered: Vec<String> = header
            .iter()
            .map(|cell| cell.text().trim().to_lowercase())
            .collect();

        Self {
            plot: find_column(&lowered, PLOT_COLUMN),
            owner: find_column(&lowered, OWNER_COLUMN),
            status: find_column(&lowered, STATUS_COLUMN),
            total: find_column(&lowered, TOTAL_COLUMN),
            paid: find_column(&lowered, PAID_COLUMN),
            balance: find_column(&lowered, BALANCE_COLUMN),
            po_no: find_column(&lowered, PO_NO_COLUMN),
            po_date: find_column(&lowered, PO_DATE_COLUMN),
        }
    }
}

fn find_column(lowered: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|candidate| lowered.iter().position(|h| h.contains(candidate)))
}

/// First row holding a cell that mentions both "plot" and "no".
pub fn find_header_row(grid: &Grid) -> Option<usize> {
    grid.rows().iter().position(|row| {
        row.iter().any(|cell| {
            let text = cell.text().to_lowercase();
            text.contains("plot") && text.contains("no")
        })
    })
}

/// Turn a grid into keyed candidates, one per data row with a plot number.
///
/// A sheet with a header and no data yields an empty vector.
pub fn normalize(grid: &Grid) -> Result<Vec<DuesPatch>, NormalizeError> {
    let header_idx = find_header_row(grid).ok_or(NormalizeError::HeaderNotFound)?;
    let columns = ColumnMap::resolve(&grid.rows()[header_idx]);
    debug!(header_row = header_idx, ?columns, "resolved dues columns");

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for row in &grid.rows()[header_idx + 1..] {
        if row.iter().all(Cell::is_blank) {
            continue;
        }

        let plot_no = text_at(row, columns.plot);
        if plot_no.is_empty() {
            skipped += 1;
            continue;
        }

        out.push(DuesPatch {
            plot_no,
            owner_name: Some(text_at(row, columns.owner)),
            dues_status: Some(text_at(row, columns.status)),
            total_dues: Some(amount_at(row, columns.total)),
            amount_paid: Some(amount_at(row, columns.paid)),
            balance_raw: Some(text_at(row, columns.balance)),
            po_no: Some(text_at(row, columns.po_no)),
            po_date: Some(date_at(row, columns.po_date)),
            address: None,
            contact: None,
        });
    }

    info!(candidates = out.len(), skipped, "normalized dues sheet");
    Ok(out)
}

fn cell_at(row: &[Cell], col: Option<usize>) -> Option<&Cell> {
    col.and_then(|c| row.get(c))
}

fn text_at(row: &[Cell], col: Option<usize>) -> String {
    cell_at(row, col)
        .map(|cell| cell.text().trim().to_string())
        .unwrap_or_default()
}

fn amount_at(row: &[Cell], col: Option<usize>) -> f64 {
    match cell_at(row, col) {
        Some(Cell::Number(n)) | Some(Cell::DateSerial(n)) => clamp_amount(*n),
        Some(Cell::Text(s)) => coerce_amount(s),
        _ => 0.0,
    }
}

fn date_at(row: &[Cell], col: Option<usize>) -> Option<DateTime<Utc>> {
    match cell_at(row, col)? {
        Cell::Number(n) | Cell::DateSerial(n) => serial_to_datetime(*n),
        Cell::Text(s) => parse_date_text(s),
        Cell::Empty | Cell::Bool(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn grid(rows: Vec<Vec<&str>>) -> Grid {
        Grid::from_text_rows(rows)
    }

    #[test]
    fn test_basic_sheet() {
        let g = grid(vec![
            vec!["Sr", "Plot No.", "Owner Name", "Total Dues", "Amount Paid"],
            vec!["1", "B-7", "J. Doe", "1000", "400"],
        ]);
        let out = normalize(&g).unwrap();

        assert_eq!(out.len(), 1);
        let p = &out[0];
        assert_eq!(p.plot_no, "B-7");
        assert_eq!(p.owner_name.as_deref(), Some("J. Doe"));
        assert_eq!(p.total_dues, Some(1000.0));
        assert_eq!(p.amount_paid, Some(400.0));
        assert_eq!(p.address, None);
    }

    #[test]
    fn test_header_not_found() {
        let g = grid(vec![
            vec!["House", "Owner", "Total"],
            vec!["B-7", "J. Doe", "1000"],
        ]);
        assert!(matches!(normalize(&g), Err(NormalizeError::HeaderNotFound)));
    }

    #[test]
    fn test_empty_grid_has_no_header() {
        assert!(matches!(normalize(&Grid::default()), Err(NormalizeError::HeaderNotFound)));
    }

    #[test]
    fn test_header_only_yields_empty() {
        let g = grid(vec![vec!["Plot No", "Owner"]]);
        assert_eq!(normalize(&g).unwrap(), Vec::new());
    }

    #[test]
    fn test_title_rows_above_header_are_skipped() {
        let g = grid(vec![
            vec!["Green Valley Society"],
            vec!["Dues statement 2024"],
            vec![],
            vec!["PLOT NO", "OWNER", "DUES RS", "PAID"],
            vec!["C-1", "Ali", "2,500", "500"],
        ]);
        let out = normalize(&g).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].total_dues, Some(2500.0));
        assert_eq!(out[0].amount_paid, Some(500.0));
    }

    #[test]
    fn test_blank_rows_and_blank_plots_skipped() {
        let g = grid(vec![
            vec!["Plot No.", "Owner Name", "Total Dues"],
            vec!["", "", ""],
            vec!["  ", " ", ""],
            vec!["", "Orphan", "900"],
            vec!["A-2", "Kept", "100"],
        ]);
        let out = normalize(&g).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].plot_no, "A-2");
    }

    #[test]
    fn test_first_candidate_wins_over_column_order() {
        // "status" appears first, but "dues status" is the earlier candidate
        let g = grid(vec![
            vec!["Plot No.", "Status Note", "Dues Status"],
            vec!["A-1", "call back", "Pending"],
        ]);
        let cols = ColumnMap::resolve(&g.rows()[0]);
        assert_eq!(cols.status, Some(2));

        let out = normalize(&g).unwrap();
        assert_eq!(out[0].dues_status.as_deref(), Some("Pending"));
    }

    #[test]
    fn test_unresolved_columns_default() {
        let g = grid(vec![vec!["Plot No."], vec!["Z-9"]]);
        let out = normalize(&g).unwrap();

        let p = &out[0];
        assert_eq!(p.owner_name.as_deref(), Some(""));
        assert_eq!(p.total_dues, Some(0.0));
        assert_eq!(p.amount_paid, Some(0.0));
        assert_eq!(p.po_date, Some(None));
    }

    #[test]
    fn test_column_resolution_full_header() {
        let header: Vec<Cell> = [
            "S.No", "Plot No.", "Owner Name", "Dues Status", "Total Dues", "Amount Paid", "Balance", "P/O No.",
            "PO R Date",
        ]
        .into_iter()
        .map(Cell::from)
        .collect();
        let cols = ColumnMap::resolve(&header);

        assert_eq!(
            cols,
            ColumnMap {
                plot: Some(1),
                owner: Some(2),
                status: Some(3),
                total: Some(4),
                paid: Some(5),
                balance: Some(6),
                po_no: Some(7),
                po_date: Some(8),
            }
        );
    }

    #[test]
    fn test_numeric_coercion() {
        let g = grid(vec![
            vec!["Plot No.", "Total Dues", "Amount Paid"],
            vec!["A-1", "1,200", "n/a"],
            vec!["A-2", "", "-50"],
        ]);
        let out = normalize(&g).unwrap();

        assert_eq!(out[0].total_dues, Some(1200.0));
        assert_eq!(out[0].amount_paid, Some(0.0));
        assert_eq!(out[1].total_dues, Some(0.0));
        assert_eq!(out[1].amount_paid, Some(0.0));
    }

    #[test]
    fn test_typed_cells() {
        let g = Grid::new(vec![
            vec!["Plot No.".into(), "Total Dues".into(), "PO R Date".into(), "Owner".into()],
            vec![Cell::Number(12.0), Cell::Number(1500.0), Cell::DateSerial(45292.0), Cell::Bool(true)],
        ]);
        let out = normalize(&g).unwrap();

        assert_eq!(out[0].plot_no, "12");
        assert_eq!(out[0].total_dues, Some(1500.0));
        assert_eq!(out[0].po_date, Some(Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())));
        assert_eq!(out[0].owner_name.as_deref(), Some("true"));
    }

    #[test]
    fn test_text_dates_and_garbage() {
        let g = grid(vec![
            vec!["Plot No.", "PO R Date"],
            vec!["A-1", "2024-03-15"],
            vec!["A-2", "pending"],
            vec!["A-3", ""],
        ]);
        let out = normalize(&g).unwrap();

        assert_eq!(out[0].po_date, Some(Some(Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap())));
        assert_eq!(out[1].po_date, Some(None));
        assert_eq!(out[2].po_date, Some(None));
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let g = grid(vec![
            vec!["Plot No.", "Owner Name", "Total Dues", "Amount Paid"],
            vec!["A-1", "Short"],
        ]);
        let out = normalize(&g).unwrap();

        assert_eq!(out[0].owner_name.as_deref(), Some("Short"));
        assert_eq!(out[0].total_dues, Some(0.0));
    }
}
