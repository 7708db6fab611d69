use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::board::{Board, format_minutes, output_cells, output_columns};
use crate::state::BetSlip;

/// Leading Name and Team columns stay text on both sheets.
const TEXT_COLUMNS: usize = 2;

pub struct ExportReport {
    pub path: PathBuf,
    pub rows: usize,
    pub bets: usize,
}

pub fn default_export_path(dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("nba_props_board_{stamp}.xlsx"))
}

/// Writes the board (sorted by minutes) and the bet slip to a workbook.
pub fn export_board_xlsx(path: &Path, board: &Board, bets: &BetSlip) -> Result<ExportReport> {
    let mut board_rows = vec![output_columns(&board.line_categories)];
    for row in board.sorted_by_minutes() {
        board_rows.push(output_cells(row, &board.line_categories));
    }

    let mut bet_rows = vec![vec![
        "Name".to_string(),
        "Team".to_string(),
        "Minutes".to_string(),
        "Category".to_string(),
        "Line".to_string(),
        "Signal".to_string(),
    ]];
    for name in bets.names() {
        let Some(row) = board.row_by_name(name) else {
            bet_rows.push(vec![name.to_string(), String::new(), String::new()]);
            continue;
        };
        for category in &board.line_categories {
            let stat = row.stat(*category);
            bet_rows.push(vec![
                row.name.clone(),
                row.team.clone(),
                format_minutes(row.minutes),
                category.label().to_string(),
                stat.line.map(|v| v.to_string()).unwrap_or_default(),
                stat.signal.label().to_string(),
            ]);
        }
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Board")?;
        write_rows(sheet, &board_rows, TEXT_COLUMNS)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Bets")?;
        write_rows(sheet, &bet_rows, TEXT_COLUMNS)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    let report = ExportReport {
        path: path.to_path_buf(),
        rows: board_rows.len().saturating_sub(1),
        bets: bets.len(),
    };
    info!(path = %path.display(), rows = report.rows, bets = report.bets, "board exported");
    Ok(report)
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>], text_cols: usize) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            let written = match numeric_cell(row_idx, col_idx, value, text_cols) {
                Some(number) => worksheet.write_number(r, c, number).map(|_| ()),
                None => worksheet.write_string(r, c, value).map(|_| ()),
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

// Header row and the leading text columns are never numeric.
fn numeric_cell(row_idx: usize, col_idx: usize, value: &str, text_cols: usize) -> Option<f64> {
    if row_idx == 0 || col_idx < text_cols {
        return None;
    }
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::{TEXT_COLUMNS, numeric_cell};

    #[test]
    fn stat_cells_are_numbers() {
        assert_eq!(numeric_cell(1, 2, "27.2", TEXT_COLUMNS), Some(27.2));
        assert_eq!(numeric_cell(1, 6, "34", TEXT_COLUMNS), Some(34.0));
        assert_eq!(numeric_cell(3, 4, "0", TEXT_COLUMNS), Some(0.0));
    }

    #[test]
    fn labels_headers_and_blanks_stay_text() {
        assert_eq!(numeric_cell(0, 3, "Points", TEXT_COLUMNS), None);
        assert_eq!(numeric_cell(1, 7, "No Edge", TEXT_COLUMNS), None);
        assert_eq!(numeric_cell(1, 4, "", TEXT_COLUMNS), None);
        assert_eq!(numeric_cell(1, 0, "76", TEXT_COLUMNS), None);
        assert_eq!(numeric_cell(1, 5, "NaN", TEXT_COLUMNS), None);
    }
}
