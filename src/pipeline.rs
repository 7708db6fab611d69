use std::path::Path;

use tracing::{debug, info, warn};

use crate::board::{Board, build_board};
use crate::config::{Config, LiveMode};
use crate::live_feed::{self, GameSummary};
use crate::sources::{self, Loaded, PlayerObservation, SourceError};

#[derive(Debug, Clone)]
pub struct CycleRequest {
    pub mode: LiveMode,
    pub game_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveSource {
    Feed,
    Simulated,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub board: Board,
    pub source: LiveSource,
    pub games: Vec<GameSummary>,
    pub game: Option<GameSummary>,
    /// Console lines describing degraded inputs.
    pub notes: Vec<String>,
}

/// Conditions that leave nothing to display this cycle.
#[derive(Debug, thiserror::Error)]
pub enum CycleFailure {
    #[error("live stats unavailable: {0}")]
    LiveUnavailable(#[source] SourceError),

    #[error("no live NBA games in progress; press m to switch to simulated mode")]
    NoActiveGame { games: Vec<GameSummary> },
}

struct LiveSnapshot {
    players: Vec<PlayerObservation>,
    source: LiveSource,
    games: Vec<GameSummary>,
    game: Option<GameSummary>,
}

/// Runs one refresh: live stats, then projections and lines, then the merge.
/// Projection and line failures degrade the board; live failures abort it.
pub fn run_cycle(cfg: &Config, req: &CycleRequest) -> Result<CycleReport, CycleFailure> {
    let mut notes = Vec::new();
    let live = resolve_live(cfg, req, &mut notes)?;

    let projections = load_or_note(
        "Projections",
        &cfg.projections_path,
        sources::load_projections,
        &mut notes,
    );
    let lines = load_or_note(
        "Lines",
        &cfg.lines_path,
        sources::load_betting_lines,
        &mut notes,
    );

    let board = build_board(&live.players, &projections, lines);
    for rewrite in &board.key_rewrites {
        debug!(
            from = %rewrite.from,
            to = %rewrite.to,
            score = rewrite.score,
            "fuzzy matched sportsbook key"
        );
    }
    if !board.unmatched_line_keys.is_empty() {
        notes.push(format!(
            "[INFO] {} sportsbook players not in live stats (n for keys)",
            board.unmatched_line_keys.len()
        ));
    }
    info!(
        players = board.rows.len(),
        rewrites = board.key_rewrites.len(),
        unmatched = board.unmatched_line_keys.len(),
        "refresh cycle complete"
    );

    Ok(CycleReport {
        board,
        source: live.source,
        games: live.games,
        game: live.game,
        notes,
    })
}

/// Where this cycle's live stats come from, before the simulated file is read.
#[derive(Debug)]
enum LiveChoice {
    Feed {
        players: Vec<PlayerObservation>,
        games: Vec<GameSummary>,
        game: GameSummary,
    },
    Simulated {
        games: Vec<GameSummary>,
    },
}

fn resolve_live(
    cfg: &Config,
    req: &CycleRequest,
    notes: &mut Vec<String>,
) -> Result<LiveSnapshot, CycleFailure> {
    if req.mode == LiveMode::Simulated {
        return simulated(cfg, Vec::new(), notes);
    }
    let scoreboard = live_feed::fetch_scoreboard();
    match choose_live(req, scoreboard, live_feed::fetch_boxscore, notes)? {
        LiveChoice::Feed {
            players,
            games,
            game,
        } => Ok(LiveSnapshot {
            players,
            source: LiveSource::Feed,
            games,
            game: Some(game),
        }),
        LiveChoice::Simulated { games } => simulated(cfg, games, notes),
    }
}

/// Applies the mode rules to a scoreboard outcome. Auto falls back to the
/// simulated box score when the scoreboard fails or nothing is in progress;
/// Live turns both into failures.
fn choose_live(
    req: &CycleRequest,
    scoreboard: Result<Vec<GameSummary>, SourceError>,
    fetch_boxscore: impl FnOnce(&str) -> Result<Vec<PlayerObservation>, SourceError>,
    notes: &mut Vec<String>,
) -> Result<LiveChoice, CycleFailure> {
    if req.mode == LiveMode::Simulated {
        return Ok(LiveChoice::Simulated { games: Vec::new() });
    }

    let games = match scoreboard {
        Ok(games) => games,
        Err(err) if req.mode == LiveMode::Auto => {
            warn!(error = %err, "scoreboard unavailable, using simulated box score");
            notes.push(format!("[WARN] Scoreboard unavailable: {err}"));
            return Ok(LiveChoice::Simulated { games: Vec::new() });
        }
        Err(err) => return Err(CycleFailure::LiveUnavailable(err)),
    };

    let Some(game) = live_feed::pick_game(&games, req.game_id.as_deref()).cloned() else {
        if req.mode == LiveMode::Auto {
            notes.push("[INFO] No game in progress, using simulated box score".to_string());
            return Ok(LiveChoice::Simulated { games });
        }
        return Err(CycleFailure::NoActiveGame { games });
    };

    let players = fetch_boxscore(&game.game_id).map_err(CycleFailure::LiveUnavailable)?;
    Ok(LiveChoice::Feed {
        players,
        games,
        game,
    })
}

fn simulated(
    cfg: &Config,
    games: Vec<GameSummary>,
    notes: &mut Vec<String>,
) -> Result<LiveSnapshot, CycleFailure> {
    let loaded = sources::load_simulated_boxscore(&cfg.sim_boxscore_path)
        .map_err(CycleFailure::LiveUnavailable)?;
    note_issues("Simulated box score", &loaded, notes);
    Ok(LiveSnapshot {
        players: loaded.rows,
        source: LiveSource::Simulated,
        games,
        game: None,
    })
}

fn load_or_note<T>(
    label: &str,
    path: &Path,
    load: impl FnOnce(&Path) -> Result<Loaded<T>, SourceError>,
    notes: &mut Vec<String>,
) -> Vec<T> {
    match load(path) {
        Ok(loaded) => {
            note_issues(label, &loaded, notes);
            loaded.rows
        }
        Err(err) => {
            warn!(source = label, error = %err, "source unavailable");
            notes.push(format!("[WARN] {label} unavailable: {err}"));
            Vec::new()
        }
    }
}

fn note_issues<T>(label: &str, loaded: &Loaded<T>, notes: &mut Vec<String>) {
    if loaded.issues.is_empty() {
        return;
    }
    for issue in &loaded.issues {
        debug!(source = label, line = issue.line, reason = %issue.reason, "row flagged");
    }
    notes.push(format!(
        "[WARN] {label}: {} rows flagged",
        loaded.issues.len()
    ));
}

#[cfg(test)]
mod tests {
    use super::{CycleFailure, CycleRequest, LiveChoice, choose_live};
    use crate::config::LiveMode;
    use crate::live_feed::GameSummary;
    use crate::sources::{PlayerObservation, SourceError};

    fn game(id: &str, status: u8) -> GameSummary {
        GameSummary {
            game_id: id.to_string(),
            status,
            status_text: String::new(),
            home: "DEN".to_string(),
            away: "LAL".to_string(),
            home_score: 0,
            away_score: 0,
        }
    }

    fn request(mode: LiveMode, game_id: Option<&str>) -> CycleRequest {
        CycleRequest {
            mode,
            game_id: game_id.map(str::to_string),
        }
    }

    fn network_down() -> SourceError {
        SourceError::Network {
            url: "https://cdn.nba.com/scoreboard".to_string(),
            reason: "timed out".to_string(),
        }
    }

    fn one_player(game_id: &str) -> Result<Vec<PlayerObservation>, SourceError> {
        Ok(vec![PlayerObservation {
            name: format!("Player {game_id}"),
            team: "DEN".to_string(),
            minutes: 12.0,
            points: 8,
            assists: 2,
            rebounds: 3,
        }])
    }

    fn no_fetch(_: &str) -> Result<Vec<PlayerObservation>, SourceError> {
        panic!("boxscore should not be fetched")
    }

    #[test]
    fn auto_falls_back_when_scoreboard_fails() {
        let mut notes = Vec::new();
        let choice = choose_live(
            &request(LiveMode::Auto, None),
            Err(network_down()),
            no_fetch,
            &mut notes,
        )
        .expect("auto never fails on the scoreboard");
        assert!(matches!(choice, LiveChoice::Simulated { ref games } if games.is_empty()));
        assert!(notes[0].starts_with("[WARN] Scoreboard unavailable"));
    }

    #[test]
    fn auto_falls_back_when_nothing_is_live() {
        let mut notes = Vec::new();
        let choice = choose_live(
            &request(LiveMode::Auto, None),
            Ok(vec![game("a", 1), game("b", 3)]),
            no_fetch,
            &mut notes,
        )
        .expect("auto never fails without a live game");
        match choice {
            LiveChoice::Simulated { games } => assert_eq!(games.len(), 2),
            other => panic!("expected simulated, got {other:?}"),
        }
        assert!(notes[0].starts_with("[INFO] No game in progress"));
    }

    #[test]
    fn live_mode_without_game_is_no_active_game() {
        let mut notes = Vec::new();
        let err = choose_live(
            &request(LiveMode::Live, None),
            Ok(vec![game("a", 3)]),
            no_fetch,
            &mut notes,
        )
        .unwrap_err();
        match err {
            CycleFailure::NoActiveGame { games } => {
                assert_eq!(games.len(), 1);
                assert_eq!(games[0].game_id, "a");
            }
            other => panic!("expected NoActiveGame, got {other:?}"),
        }
        assert!(notes.is_empty());
    }

    #[test]
    fn live_mode_scoreboard_failure_is_live_unavailable() {
        let mut notes = Vec::new();
        let err = choose_live(
            &request(LiveMode::Live, None),
            Err(network_down()),
            no_fetch,
            &mut notes,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CycleFailure::LiveUnavailable(SourceError::Network { .. })
        ));
    }

    #[test]
    fn boxscore_failure_is_live_unavailable_in_any_feed_mode() {
        for mode in [LiveMode::Auto, LiveMode::Live] {
            let mut notes = Vec::new();
            let err = choose_live(
                &request(mode, None),
                Ok(vec![game("b", 2)]),
                |id: &str| {
                    Err(SourceError::MalformedFeed {
                        url: format!("boxscore_{id}.json"),
                        reason: "invalid boxscore json".to_string(),
                    })
                },
                &mut notes,
            )
            .unwrap_err();
            assert!(matches!(
                err,
                CycleFailure::LiveUnavailable(SourceError::MalformedFeed { .. })
            ));
        }
    }

    #[test]
    fn live_game_is_fetched() {
        let mut notes = Vec::new();
        let choice = choose_live(
            &request(LiveMode::Live, None),
            Ok(vec![game("a", 3), game("b", 2)]),
            one_player,
            &mut notes,
        )
        .expect("live game available");
        match choice {
            LiveChoice::Feed {
                players,
                games,
                game,
            } => {
                assert_eq!(game.game_id, "b");
                assert_eq!(games.len(), 2);
                assert_eq!(players[0].name, "Player b");
            }
            other => panic!("expected feed, got {other:?}"),
        }
    }

    #[test]
    fn requested_game_is_fetched_even_when_not_live() {
        let mut notes = Vec::new();
        let choice = choose_live(
            &request(LiveMode::Live, Some("a")),
            Ok(vec![game("a", 3), game("b", 2)]),
            one_player,
            &mut notes,
        )
        .expect("requested game on the scoreboard");
        assert!(matches!(choice, LiveChoice::Feed { ref game, .. } if game.game_id == "a"));
    }

    #[test]
    fn simulated_mode_ignores_the_scoreboard() {
        let mut notes = Vec::new();
        let choice = choose_live(
            &request(LiveMode::Simulated, None),
            Err(network_down()),
            no_fetch,
            &mut notes,
        )
        .expect("simulated never fails here");
        assert!(matches!(choice, LiveChoice::Simulated { .. }));
        assert!(notes.is_empty());
    }
}
