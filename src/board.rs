use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::names::{KeyRewrite, normalize_name, reconcile_line_keys};
use crate::pace::pace_project;
use crate::signal::{Signal, betting_signal};
use crate::sources::{BettingLine, PlayerObservation, ProjectionRecord, StatCategory};

/// Wide-format sportsbook lines for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineSet {
    pub points: Option<f64>,
    pub assists: Option<f64>,
    pub rebounds: Option<f64>,
}

impl LineSet {
    pub fn get(&self, category: StatCategory) -> Option<f64> {
        match category {
            StatCategory::Points => self.points,
            StatCategory::Assists => self.assists,
            StatCategory::Rebounds => self.rebounds,
        }
    }

    fn slot(&mut self, category: StatCategory) -> &mut Option<f64> {
        match category {
            StatCategory::Points => &mut self.points,
            StatCategory::Assists => &mut self.assists,
            StatCategory::Rebounds => &mut self.rebounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatCell {
    pub actual: u32,
    pub projected: Option<f64>,
    pub paced: u32,
    pub line: Option<f64>,
    pub signal: Signal,
}

impl StatCell {
    fn evaluate(actual: u32, minutes: f64, projected: Option<f64>, line: Option<f64>) -> Self {
        let paced = pace_project(actual, minutes);
        Self {
            actual,
            projected,
            paced,
            line,
            signal: betting_signal(line, projected, Some(f64::from(paced))),
        }
    }

    /// Projection rounded for display. The signal uses the unrounded value.
    pub fn projected_rounded(&self) -> Option<i64> {
        self.projected.map(|v| v.round_ties_even() as i64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub name: String,
    pub team: String,
    pub key: String,
    pub minutes: f64,
    pub points: StatCell,
    pub assists: StatCell,
    pub rebounds: StatCell,
    pub combined_projection: Option<f64>,
}

impl MergedRow {
    pub fn stat(&self, category: StatCategory) -> &StatCell {
        match category {
            StatCategory::Points => &self.points,
            StatCategory::Assists => &self.assists,
            StatCategory::Rebounds => &self.rebounds,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Board {
    /// One row per live observation, in feed order.
    pub rows: Vec<MergedRow>,
    /// Categories with at least one sportsbook row; the others have no
    /// line or signal columns.
    pub line_categories: Vec<StatCategory>,
    pub key_rewrites: Vec<KeyRewrite>,
    pub unmatched_line_keys: Vec<String>,
    pub live_keys: Vec<String>,
    pub line_keys: Vec<String>,
}

impl Board {
    pub fn sorted_by_minutes(&self) -> Vec<&MergedRow> {
        let mut rows: Vec<&MergedRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| b.minutes.partial_cmp(&a.minutes).unwrap_or(Ordering::Equal));
        rows
    }

    pub fn row_by_name(&self, name: &str) -> Option<&MergedRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    pub fn has_lines(&self, category: StatCategory) -> bool {
        self.line_categories.contains(&category)
    }

    pub fn signal_counts(&self) -> HashMap<Signal, usize> {
        let mut counts = HashMap::new();
        for row in &self.rows {
            for category in &self.line_categories {
                *counts.entry(row.stat(*category).signal).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Reshapes long-format lines into one `LineSet` per key. The first row for a
/// key and category wins.
pub fn pivot_lines(lines: &[BettingLine]) -> (HashMap<String, LineSet>, Vec<StatCategory>) {
    let mut pivot: HashMap<String, LineSet> = HashMap::new();
    let mut seen: HashSet<(String, StatCategory)> = HashSet::new();
    let mut categories: BTreeSet<StatCategory> = BTreeSet::new();
    for line in lines {
        categories.insert(line.category);
        if !seen.insert((line.key.clone(), line.category)) {
            continue;
        }
        *pivot.entry(line.key.clone()).or_default().slot(line.category) = line.line;
    }
    (pivot, categories.into_iter().collect())
}

/// Joins live observations with projections and sportsbook lines.
///
/// Live players always appear exactly once per observation. Sportsbook keys
/// are fuzzily reconciled onto live keys before the pivot; the first
/// projection per key wins.
pub fn build_board(
    live: &[PlayerObservation],
    projections: &[ProjectionRecord],
    mut lines: Vec<BettingLine>,
) -> Board {
    let keyed: Vec<(String, &PlayerObservation)> = live
        .iter()
        .map(|obs| (normalize_name(Some(&obs.name)), obs))
        .collect();
    let live_key_set: HashSet<String> = keyed.iter().map(|(key, _)| key.clone()).collect();

    let key_rewrites = reconcile_line_keys(&mut lines, &live_key_set);
    let (pivot, line_categories) = pivot_lines(&lines);

    let mut projection_by_key: HashMap<&str, &ProjectionRecord> = HashMap::new();
    for record in projections {
        projection_by_key.entry(record.key.as_str()).or_insert(record);
    }

    let rows = keyed
        .iter()
        .map(|(key, obs)| {
            let projection = projection_by_key.get(key.as_str()).copied();
            let line_set = pivot.get(key).copied().unwrap_or_default();
            let cell = |category: StatCategory| {
                StatCell::evaluate(
                    obs.stat(category),
                    obs.minutes,
                    projection.and_then(|p| p.get(category)),
                    line_set.get(category),
                )
            };
            MergedRow {
                name: obs.name.clone(),
                team: obs.team.clone(),
                key: key.clone(),
                minutes: obs.minutes,
                points: cell(StatCategory::Points),
                assists: cell(StatCategory::Assists),
                rebounds: cell(StatCategory::Rebounds),
                combined_projection: projection.and_then(|p| p.combined),
            }
        })
        .collect();

    let line_keys: BTreeSet<String> = lines.iter().map(|line| line.key.clone()).collect();
    let unmatched_line_keys = line_keys
        .iter()
        .filter(|key| !live_key_set.contains(*key))
        .cloned()
        .collect();
    let live_keys: BTreeSet<String> = live_key_set.into_iter().collect();

    Board {
        rows,
        line_categories,
        key_rewrites,
        unmatched_line_keys,
        live_keys: live_keys.into_iter().collect(),
        line_keys: line_keys.into_iter().collect(),
    }
}

/// Column headers of the output table, omitting line and signal columns for
/// categories without sportsbook data.
pub fn output_columns(line_categories: &[StatCategory]) -> Vec<String> {
    let mut cols = vec!["Name".to_string(), "Team".to_string(), "Minutes".to_string()];
    for category in StatCategory::ALL {
        let label = category.label();
        cols.push(label.to_string());
        cols.push(format!("Proj{label}"));
        cols.push(format!("Paced{label}"));
        if line_categories.contains(&category) {
            cols.push(format!("FD{label}"));
            cols.push(format!("Signal{label}"));
        }
    }
    cols
}

/// Display cells for one row, aligned with `output_columns`.
pub fn output_cells(row: &MergedRow, line_categories: &[StatCategory]) -> Vec<String> {
    let mut cells = vec![row.name.clone(), row.team.clone(), format_minutes(row.minutes)];
    for category in StatCategory::ALL {
        let stat = row.stat(category);
        cells.push(stat.actual.to_string());
        cells.push(opt_to_string(stat.projected_rounded()));
        cells.push(stat.paced.to_string());
        if line_categories.contains(&category) {
            cells.push(opt_to_string(stat.line));
            cells.push(stat.signal.label().to_string());
        }
    }
    cells
}

pub fn format_minutes(minutes: f64) -> String {
    format!("{minutes:.1}")
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
