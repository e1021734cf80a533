use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::leaderboard::{self, PlayerBoard, board_metrics, display_name};
use crate::state::{Delta, StatsSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetRows {
    pub name: &'static str,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub sheets: usize,
    pub rows: usize,
}

pub fn build_sheets(snapshot: &StatsSnapshot) -> Vec<SheetRows> {
    let mut sheets = Vec::with_capacity(4);
    for board in PlayerBoard::ALL {
        let metrics = board_metrics(board);
        let mut header = vec![
            Cell::Text("Rank".to_string()),
            Cell::Text("Player".to_string()),
            Cell::Text("Team".to_string()),
        ];
        header.extend(metrics.iter().map(|m| Cell::Text(m.label().to_string())));

        let mut rows = vec![header];
        for entry in leaderboard::player_leaderboard(snapshot, board) {
            let mut row = vec![
                Cell::Number(entry.rank as f64),
                Cell::Text(display_name(&entry.player.player).to_string()),
                Cell::Text(display_name(&entry.player.team).to_string()),
            ];
            row.extend(
                metrics
                    .iter()
                    .map(|m| Cell::Number(m.value(entry.player) as f64)),
            );
            rows.push(row);
        }
        sheets.push(SheetRows {
            name: sheet_name(board),
            rows,
        });
    }

    let mut team_rows = vec![
        ["Rank", "Team", "Players", "Goals", "Assists", "Points"]
            .iter()
            .map(|h| Cell::Text(h.to_string()))
            .collect::<Vec<_>>(),
    ];
    for entry in leaderboard::team_leaderboard(snapshot) {
        team_rows.push(vec![
            Cell::Number(entry.rank as f64),
            Cell::Text(display_name(&entry.team.team).to_string()),
            Cell::Number(f64::from(entry.team.player_count)),
            Cell::Number(f64::from(entry.team.total_goals)),
            Cell::Number(f64::from(entry.team.total_assists)),
            Cell::Number(f64::from(entry.team.total_points)),
        ]);
    }
    sheets.push(SheetRows {
        name: "Teams",
        rows: team_rows,
    });
    sheets
}

pub fn export_snapshot(path: &Path, snapshot: &StatsSnapshot) -> Result<ExportReport> {
    let sheets = build_sheets(snapshot);
    let mut workbook = Workbook::new();
    let mut rows = 0usize;
    for sheet_rows in &sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_rows.name)?;
        write_rows(sheet, &sheet_rows.rows)?;
        rows += sheet_rows.rows.len().saturating_sub(1);
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed creating {}", dir.display()))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        sheets: sheets.len(),
        rows,
    })
}

pub fn run_export(path: &Path, snapshot: &StatsSnapshot) -> Delta {
    match export_snapshot(path, snapshot) {
        Ok(report) => Delta::ExportFinished {
            path: path.to_path_buf(),
            rows: report.rows,
        },
        Err(err) => Delta::ExportFailed(format!("{err:#}")),
    }
}

fn sheet_name(board: PlayerBoard) -> &'static str {
    match board {
        PlayerBoard::Scorers => "Top Scorers",
        PlayerBoard::Assists => "Top Assists",
        PlayerBoard::Points => "Fantasy Points",
    }
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match cell {
                Cell::Text(value) => worksheet.write_string(r, c, value),
                Cell::Number(value) => worksheet.write_number(r, c, *value),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
