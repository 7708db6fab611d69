use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};

use crate::names::normalize_name;
use crate::pace::parse_minutes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatCategory {
    Points,
    Assists,
    Rebounds,
}

impl StatCategory {
    pub const ALL: [StatCategory; 3] = [
        StatCategory::Points,
        StatCategory::Assists,
        StatCategory::Rebounds,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatCategory::Points => "Points",
            StatCategory::Assists => "Assists",
            StatCategory::Rebounds => "Rebounds",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|cat| cat.label().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerObservation {
    pub name: String,
    pub team: String,
    pub minutes: f64,
    pub points: u32,
    pub assists: u32,
    pub rebounds: u32,
}

impl PlayerObservation {
    pub fn stat(&self, category: StatCategory) -> u32 {
        match category {
            StatCategory::Points => self.points,
            StatCategory::Assists => self.assists,
            StatCategory::Rebounds => self.rebounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionRecord {
    pub name: String,
    pub key: String,
    pub points: Option<f64>,
    pub assists: Option<f64>,
    pub rebounds: Option<f64>,
    pub combined: Option<f64>,
}

impl ProjectionRecord {
    pub fn get(&self, category: StatCategory) -> Option<f64> {
        match category {
            StatCategory::Points => self.points,
            StatCategory::Assists => self.assists,
            StatCategory::Rebounds => self.rebounds,
        }
    }
}

/// One long-format sportsbook row. `key` starts as the normalized player name
/// and may be rewritten by fuzzy matching before the pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct BettingLine {
    pub player: String,
    pub key: String,
    pub category: StatCategory,
    pub line: Option<f64>,
}

/// A row that was dropped or had a value discarded at the load boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub rows: Vec<T>,
    pub issues: Vec<RowIssue>,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{} not found", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("malformed feed from {url}: {reason}")]
    MalformedFeed { url: String, reason: String },

    #[error("no game in progress")]
    NoActiveGame,
}

const NAME_COLUMNS: &[&str] = &["Name", "Player", "Player Name"];
const TEAM_COLUMNS: &[&str] = &["Team", "Tm"];
const MINUTES_COLUMNS: &[&str] = &["Minutes", "Min", "MP"];
const POINTS_COLUMNS: &[&str] = &["Points", "PTS", "Proj Points"];
const ASSISTS_COLUMNS: &[&str] = &["Assists", "AST", "Proj Assists"];
const REBOUNDS_COLUMNS: &[&str] = &["Rebounds", "REB", "TRB", "Proj Rebounds"];
const COMBINED_COLUMNS: &[&str] = &["PRA", "Combined", "Proj PRA"];
const PLAYER_COLUMNS: &[&str] = &["Player", "Name", "Player Name"];
const STAT_TYPE_COLUMNS: &[&str] = &["StatType", "Stat Type", "Stat", "Market"];
const LINE_COLUMNS: &[&str] = &["Line", "FD_Line", "Value"];

pub fn load_projections(path: &Path) -> Result<Loaded<ProjectionRecord>, SourceError> {
    projections_from_reader(open_source(path)?, path)
}

pub fn load_betting_lines(path: &Path) -> Result<Loaded<BettingLine>, SourceError> {
    betting_lines_from_reader(open_source(path)?, path)
}

pub fn load_simulated_boxscore(path: &Path) -> Result<Loaded<PlayerObservation>, SourceError> {
    observations_from_reader(open_source(path)?, path)
}

pub fn projections_from_reader<R: Read>(
    rdr: R,
    origin: &Path,
) -> Result<Loaded<ProjectionRecord>, SourceError> {
    let mut reader = csv_reader(rdr);
    let headers = read_headers(&mut reader, origin)?;
    let name_col = require_column(&headers, NAME_COLUMNS, origin)?;
    let points_col = find_column(&headers, POINTS_COLUMNS);
    let assists_col = find_column(&headers, ASSISTS_COLUMNS);
    let rebounds_col = find_column(&headers, REBOUNDS_COLUMNS);
    let combined_col = find_column(&headers, COMBINED_COLUMNS);
    if points_col.is_none() && assists_col.is_none() && rebounds_col.is_none() {
        return Err(malformed(origin, "no Points, Assists or Rebounds column"));
    }

    let mut rows = Vec::new();
    let mut issues = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = data_line(idx);
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                issues.push(issue(line, format!("unreadable row: {err}")));
                continue;
            }
        };
        let Some(name) = cell(&record, Some(name_col)) else {
            issues.push(issue(line, "missing player name"));
            continue;
        };
        let points = number_cell(&record, points_col, line, "Points", &mut issues);
        let assists = number_cell(&record, assists_col, line, "Assists", &mut issues);
        let rebounds = number_cell(&record, rebounds_col, line, "Rebounds", &mut issues);
        let combined = number_cell(&record, combined_col, line, "PRA", &mut issues);
        rows.push(ProjectionRecord {
            key: normalize_name(Some(name)),
            name: name.to_string(),
            points,
            assists,
            rebounds,
            combined,
        });
    }
    Ok(Loaded { rows, issues })
}

/// Reads the long-format sportsbook table. Rows for stat types other than
/// points, assists and rebounds are skipped.
pub fn betting_lines_from_reader<R: Read>(
    rdr: R,
    origin: &Path,
) -> Result<Loaded<BettingLine>, SourceError> {
    let mut reader = csv_reader(rdr);
    let headers = read_headers(&mut reader, origin)?;
    let player_col = require_column(&headers, PLAYER_COLUMNS, origin)?;
    let stat_col = require_column(&headers, STAT_TYPE_COLUMNS, origin)?;
    let line_col = require_column(&headers, LINE_COLUMNS, origin)?;

    let mut rows = Vec::new();
    let mut issues = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = data_line(idx);
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                issues.push(issue(line, format!("unreadable row: {err}")));
                continue;
            }
        };
        let Some(category) = cell(&record, Some(stat_col)).and_then(StatCategory::parse) else {
            continue;
        };
        let Some(player) = cell(&record, Some(player_col)) else {
            issues.push(issue(line, "missing player name"));
            continue;
        };
        let raw_line = cell(&record, Some(line_col));
        let value = raw_line.and_then(parse_line_value);
        if value.is_none() {
            issues.push(issue(
                line,
                format!("unparseable line {:?}", raw_line.unwrap_or_default()),
            ));
        }
        rows.push(BettingLine {
            key: normalize_name(Some(player)),
            player: player.to_string(),
            category,
            line: value,
        });
    }
    Ok(Loaded { rows, issues })
}

pub fn observations_from_reader<R: Read>(
    rdr: R,
    origin: &Path,
) -> Result<Loaded<PlayerObservation>, SourceError> {
    let mut reader = csv_reader(rdr);
    let headers = read_headers(&mut reader, origin)?;
    let name_col = require_column(&headers, NAME_COLUMNS, origin)?;
    let team_col = find_column(&headers, TEAM_COLUMNS);
    let minutes_col = require_column(&headers, MINUTES_COLUMNS, origin)?;
    let points_col = require_column(&headers, POINTS_COLUMNS, origin)?;
    let assists_col = require_column(&headers, ASSISTS_COLUMNS, origin)?;
    let rebounds_col = require_column(&headers, REBOUNDS_COLUMNS, origin)?;

    let mut rows = Vec::new();
    let mut issues = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = data_line(idx);
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                issues.push(issue(line, format!("unreadable row: {err}")));
                continue;
            }
        };
        let Some(name) = cell(&record, Some(name_col)) else {
            issues.push(issue(line, "missing player name"));
            continue;
        };
        rows.push(PlayerObservation {
            name: name.to_string(),
            team: cell(&record, team_col).unwrap_or_default().to_string(),
            minutes: cell(&record, Some(minutes_col))
                .map(parse_minutes)
                .unwrap_or(0.0),
            points: count_cell(&record, points_col, line, "Points", &mut issues),
            assists: count_cell(&record, assists_col, line, "Assists", &mut issues),
            rebounds: count_cell(&record, rebounds_col, line, "Rebounds", &mut issues),
        });
    }
    Ok(Loaded { rows, issues })
}

/// Takes the leading number of a sportsbook line cell, so "24.5 (-110)"
/// reads as 24.5.
pub fn parse_line_value(raw: &str) -> Option<f64> {
    let token = raw.split_whitespace().next()?;
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn open_source(path: &Path) -> Result<File, SourceError> {
    File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => SourceError::Missing {
            path: path.to_path_buf(),
        },
        _ => SourceError::Unreadable {
            path: path.to_path_buf(),
            source: err,
        },
    })
}

fn csv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr)
}

fn read_headers<R: Read>(
    reader: &mut csv::Reader<R>,
    origin: &Path,
) -> Result<StringRecord, SourceError> {
    let headers = reader.headers().map_err(|err| match err.into_kind() {
        csv::ErrorKind::Io(source) => SourceError::Unreadable {
            path: origin.to_path_buf(),
            source,
        },
        other => malformed(origin, format!("bad header row: {other:?}")),
    })?;
    if headers.is_empty() {
        return Err(malformed(origin, "empty header row"));
    }
    Ok(headers.clone())
}

fn find_column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim_start_matches('\u{feff}').trim();
        aliases.iter().any(|alias| header.eq_ignore_ascii_case(alias))
    })
}

fn require_column(
    headers: &StringRecord,
    aliases: &[&str],
    origin: &Path,
) -> Result<usize, SourceError> {
    find_column(headers, aliases)
        .ok_or_else(|| malformed(origin, format!("missing {} column", aliases[0])))
}

fn cell(record: &StringRecord, col: Option<usize>) -> Option<&str> {
    record
        .get(col?)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn number_cell(
    record: &StringRecord,
    col: Option<usize>,
    line: u64,
    column: &str,
    issues: &mut Vec<RowIssue>,
) -> Option<f64> {
    let raw = cell(record, col)?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            issues.push(issue(line, format!("unparseable {column} {raw:?}")));
            None
        }
    }
}

fn count_cell(
    record: &StringRecord,
    col: usize,
    line: u64,
    column: &str,
    issues: &mut Vec<RowIssue>,
) -> u32 {
    match number_cell(record, Some(col), line, column, issues) {
        Some(value) if value >= 0.0 => value.round() as u32,
        _ => 0,
    }
}

fn data_line(idx: usize) -> u64 {
    // Header is line 1.
    idx as u64 + 2
}

fn issue(line: u64, reason: impl Into<String>) -> RowIssue {
    RowIssue {
        line,
        reason: reason.into(),
    }
}

fn malformed(origin: &Path, reason: impl Into<String>) -> SourceError {
    SourceError::Malformed {
        path: origin.to_path_buf(),
        reason: reason.into(),
    }
}
