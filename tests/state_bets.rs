use nba_props_terminal::board::build_board;
use nba_props_terminal::config::LiveMode;
use nba_props_terminal::live_feed::GameSummary;
use nba_props_terminal::pipeline::{CycleFailure, CycleReport, LiveSource};
use nba_props_terminal::sources::PlayerObservation;
use nba_props_terminal::state::{AppState, BetSlip, BoardView};

fn obs(name: &str, minutes: f64) -> PlayerObservation {
    PlayerObservation {
        name: name.to_string(),
        team: "DEN".to_string(),
        minutes,
        points: 10,
        assists: 2,
        rebounds: 3,
    }
}

fn report(players: &[PlayerObservation]) -> CycleReport {
    CycleReport {
        board: build_board(players, &[], Vec::new()),
        source: LiveSource::Simulated,
        games: Vec::new(),
        game: None,
        notes: vec!["[WARN] Lines unavailable: test".to_string()],
    }
}

fn game(id: &str) -> GameSummary {
    GameSummary {
        game_id: id.to_string(),
        status: 2,
        status_text: "Q1".to_string(),
        home: "DEN".to_string(),
        away: "LAL".to_string(),
        home_score: 10,
        away_score: 8,
    }
}

#[test]
fn bet_slip_toggles_by_name() {
    let mut slip = BetSlip::default();
    assert!(slip.toggle("Nikola Jokic"));
    assert!(slip.contains("Nikola Jokic"));
    assert!(!slip.toggle("Nikola Jokic"));
    assert!(slip.is_empty());
}

#[test]
fn bets_survive_refresh_and_filter_view() {
    let mut state = AppState::new(LiveMode::Simulated, None);
    let players = vec![obs("Nikola Jokic", 30.0), obs("Jamal Murray", 20.0)];
    state.apply_cycle(Ok(report(&players)));
    assert_eq!(state.visible_rows().len(), 2);
    assert!(state.logs.iter().any(|l| l.contains("Lines unavailable")));

    state.select_next();
    assert_eq!(state.selected_row().map(|r| r.name.as_str()), Some("Jamal Murray"));
    state.toggle_selected_bet();
    assert!(state.bets.contains("Jamal Murray"));

    state.apply_cycle(Ok(report(&players)));
    assert!(state.bets.contains("Jamal Murray"));

    state.toggle_view();
    assert_eq!(state.view, BoardView::BetsOnly);
    let rows = state.visible_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Jamal Murray");

    state.clear_bets();
    assert!(state.visible_rows().is_empty());
    assert_eq!(state.selected, 0);
}

#[test]
fn selection_follows_player_across_refresh() {
    let mut state = AppState::new(LiveMode::Simulated, None);
    state.apply_cycle(Ok(report(&[obs("A", 30.0), obs("B", 20.0)])));
    state.select_next();
    assert_eq!(state.selected_row().map(|r| r.name.as_str()), Some("B"));

    // B now leads in minutes.
    state.apply_cycle(Ok(report(&[obs("A", 30.0), obs("B", 35.0)])));
    assert_eq!(state.selected, 0);
    assert_eq!(state.selected_row().map(|r| r.name.as_str()), Some("B"));
}

#[test]
fn failed_cycle_keeps_previous_board() {
    let mut state = AppState::new(LiveMode::Live, None);
    state.apply_cycle(Ok(report(&[obs("A", 30.0)])));
    assert!(state.notice.is_none());

    state.apply_cycle(Err(CycleFailure::NoActiveGame {
        games: vec![game("g1")],
    }));
    assert!(state.board.is_some());
    assert_eq!(state.visible_rows().len(), 1);
    assert!(
        state
            .notice
            .as_deref()
            .is_some_and(|n| n.contains("simulated mode"))
    );
    assert_eq!(state.games.len(), 1);

    state.apply_cycle(Ok(report(&[obs("A", 31.0)])));
    assert!(state.notice.is_none());
}

#[test]
fn cycle_game_walks_the_scoreboard() {
    let mut state = AppState::new(LiveMode::Live, None);
    state.cycle_game();
    assert!(state.requested_game.is_none());

    state.games = vec![game("g1"), game("g2")];
    state.cycle_game();
    assert_eq!(state.requested_game.as_deref(), Some("g1"));
    state.cycle_game();
    assert_eq!(state.requested_game.as_deref(), Some("g2"));
    state.cycle_game();
    assert_eq!(state.requested_game.as_deref(), Some("g1"));
}

#[test]
fn selection_wraps() {
    let mut state = AppState::new(LiveMode::Simulated, None);
    state.select_prev();
    assert_eq!(state.selected, 0);
    state.apply_cycle(Ok(report(&[obs("A", 30.0), obs("B", 20.0), obs("C", 10.0)])));
    state.select_prev();
    assert_eq!(state.selected, 2);
    state.select_next();
    assert_eq!(state.selected, 0);
}
