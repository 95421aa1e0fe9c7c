// CSV/TSV reading
//
// Every field is read as text. Typed cells only come from workbooks.

use std::path::Path;

use crate::error::NormalizeError;
use crate::grid::{Cell, Grid};

pub fn read_grid(path: &Path) -> Result<Grid, NormalizeError> {
    let bytes = std::fs::read(path)?;
    read_grid_from_bytes(&bytes)
}

pub fn read_grid_from_bytes(bytes: &[u8]) -> Result<Grid, NormalizeError> {
    let content = decode_to_utf8(bytes);
    let delimiter = sniff_delimiter(&content);
    grid_from_string(&content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// whose widest field count (>1) repeats on the most lines wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Dues sheets often open with a title line, so score against the
        // widest line rather than the first one
        let target = counts.iter().copied().max().unwrap_or(0);
        if target <= 1 {
            continue;
        }
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Decode bytes as UTF-8, falling back to Windows-1252 (common for Excel-exported CSVs).
fn decode_to_utf8(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

fn grid_from_string(content: &str, delimiter: u8) -> Result<Grid, NormalizeError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from).collect::<Vec<_>>());
    }

    Ok(Grid::new(rows))
}
