use std::fs;
use std::path::PathBuf;

use nba_props_terminal::live_feed::{parse_boxscore_json, parse_scoreboard_json, pick_game};
use nba_props_terminal::names::normalize_name;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_scoreboard_fixture() {
    let raw = read_fixture("scoreboard.json");
    let games = parse_scoreboard_json(&raw).expect("fixture should parse");
    assert_eq!(games.len(), 3);

    let live: Vec<_> = games.iter().filter(|g| g.is_live()).collect();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].game_id, "0022600102");
    assert_eq!(live[0].home, "DEN");
    assert_eq!(live[0].away, "LAL");
    assert_eq!(live[0].status_text, "Q3 5:32");
    assert_eq!(live[0].label(), "LAL 74-78 DEN (Q3 5:32)");

    let picked = pick_game(&games, None).expect("live game");
    assert_eq!(picked.game_id, "0022600102");
}

#[test]
fn empty_scoreboard_has_no_games() {
    let raw = r#"{"scoreboard":{"gameDate":"2026-07-01","games":[]}}"#;
    let games = parse_scoreboard_json(raw).expect("should parse");
    assert!(games.is_empty());
    assert!(pick_game(&games, None).is_none());
}

#[test]
fn parses_boxscore_fixture() {
    let raw = read_fixture("boxscore.json");
    let players = parse_boxscore_json(&raw).expect("fixture should parse");
    // Nameless inactive player is dropped; away team comes first.
    assert_eq!(players.len(), 5);
    assert_eq!(players[0].name, "LeBron James");
    assert_eq!(players[0].team, "LAL");
    assert_eq!(players[0].minutes, 27.2);

    let davis = &players[1];
    assert_eq!(davis.name, "Anthony Davis");
    assert_eq!(davis.rebounds, 11);

    let jokic = players
        .iter()
        .find(|p| normalize_name(Some(&p.name)) == "nikola jokic")
        .expect("jokic present");
    assert_eq!(jokic.name, "Nikola Jokić");
    assert_eq!(jokic.team, "DEN");
    assert_eq!(jokic.minutes, 18.0);
    assert_eq!((jokic.points, jokic.assists, jokic.rebounds), (18, 9, 9));

    let bench = players.iter().find(|p| p.name == "Bench Guy").expect("bench");
    assert_eq!(bench.minutes, 0.0);
}

#[test]
fn boxscore_without_game_is_an_error() {
    assert!(parse_boxscore_json(r#"{"meta":{}}"#).is_err());
    assert!(parse_boxscore_json("not json").is_err());
}
