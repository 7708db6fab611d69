use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Local};

use crate::board::{Board, MergedRow};
use crate::config::LiveMode;
use crate::live_feed::GameSummary;
use crate::pipeline::{CycleFailure, CycleReport, CycleRequest, LiveSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardView {
    All,
    BetsOnly,
}

/// Players the user has marked as simulated bets, keyed by display name.
/// Survives refreshes until changed.
#[derive(Debug, Clone, Default)]
pub struct BetSlip {
    names: BTreeSet<String>,
}

impl BetSlip {
    /// Returns true when the player is on the slip after the toggle.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.names.remove(name) {
            false
        } else {
            self.names.insert(name.to_string());
            true
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

pub struct AppState {
    pub board: Option<Board>,
    pub board_source: Option<LiveSource>,
    pub board_updated_at: Option<DateTime<Local>>,
    pub games: Vec<GameSummary>,
    pub game: Option<GameSummary>,
    pub requested_game: Option<String>,
    pub live_mode: LiveMode,
    pub bets: BetSlip,
    pub view: BoardView,
    pub selected: usize,
    pub show_keys: bool,
    pub help_overlay: bool,
    /// Shown instead of refreshing the board when a cycle fails outright.
    pub notice: Option<String>,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(live_mode: LiveMode, requested_game: Option<String>) -> Self {
        Self {
            board: None,
            board_source: None,
            board_updated_at: None,
            games: Vec::new(),
            game: None,
            requested_game,
            live_mode,
            bets: BetSlip::default(),
            view: BoardView::All,
            selected: 0,
            show_keys: false,
            help_overlay: false,
            notice: None,
            logs: VecDeque::new(),
        }
    }

    pub fn cycle_request(&self) -> CycleRequest {
        CycleRequest {
            mode: self.live_mode,
            game_id: self.requested_game.clone(),
        }
    }

    /// Installs a fresh board, or keeps the previous one and raises a notice
    /// when the cycle had nothing to display.
    pub fn apply_cycle(&mut self, outcome: Result<CycleReport, CycleFailure>) {
        match outcome {
            Ok(report) => {
                let selected_name = self.selected_row().map(|row| row.name.clone());
                for note in &report.notes {
                    self.push_log(note.clone());
                }
                self.board = Some(report.board);
                self.board_source = Some(report.source);
                self.board_updated_at = Some(Local::now());
                self.games = report.games;
                self.game = report.game;
                self.notice = None;
                self.reselect(selected_name.as_deref());
            }
            Err(err) => {
                if let CycleFailure::NoActiveGame { games } = &err {
                    self.games = games.clone();
                }
                self.push_log(format!("[WARN] {err}"));
                self.notice = Some(err.to_string());
            }
        }
    }

    /// Rows in display order: minutes descending, optionally limited to the
    /// bet slip.
    pub fn visible_rows(&self) -> Vec<&MergedRow> {
        let Some(board) = &self.board else {
            return Vec::new();
        };
        let rows = board.sorted_by_minutes();
        match self.view {
            BoardView::All => rows,
            BoardView::BetsOnly => rows
                .into_iter()
                .filter(|row| self.bets.contains(&row.name))
                .collect(),
        }
    }

    pub fn selected_row(&self) -> Option<&MergedRow> {
        self.visible_rows().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let total = self.visible_rows().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.visible_rows().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.visible_rows().len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn toggle_selected_bet(&mut self) {
        let Some(name) = self.selected_row().map(|row| row.name.clone()) else {
            self.push_log("[INFO] No player selected");
            return;
        };
        if self.bets.toggle(&name) {
            self.push_log(format!("[INFO] Bet added: {name}"));
        } else {
            self.push_log(format!("[INFO] Bet removed: {name}"));
        }
        self.clamp_selection();
    }

    pub fn clear_bets(&mut self) {
        self.bets.clear();
        self.push_log("[INFO] Bet slip cleared");
        self.clamp_selection();
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            BoardView::All => BoardView::BetsOnly,
            BoardView::BetsOnly => BoardView::All,
        };
        self.selected = 0;
    }

    pub fn cycle_live_mode(&mut self) {
        self.live_mode = self.live_mode.next();
        self.push_log(format!("[INFO] Mode: {}", self.live_mode.label()));
    }

    /// Moves the game request to the next game on today's scoreboard.
    pub fn cycle_game(&mut self) {
        if self.games.is_empty() {
            self.push_log("[INFO] No games on the scoreboard");
            return;
        }
        let current = self
            .requested_game
            .as_deref()
            .or(self.game.as_ref().map(|g| g.game_id.as_str()));
        let next_idx = current
            .and_then(|id| self.games.iter().position(|g| g.game_id == id))
            .map(|idx| (idx + 1) % self.games.len())
            .unwrap_or(0);
        let next = &self.games[next_idx];
        let label = next.label();
        self.requested_game = Some(next.game_id.clone());
        self.push_log(format!("[INFO] Game: {label}"));
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn reselect(&mut self, name: Option<&str>) {
        let idx = name.and_then(|name| {
            self.visible_rows()
                .iter()
                .position(|row| row.name == name)
        });
        match idx {
            Some(idx) => self.selected = idx,
            None => self.clamp_selection(),
        }
    }
}
