use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::http_cache::fetch_json_revalidated;
use crate::http_client::http_client;
use crate::pace::parse_minutes_value;
use crate::sources::{PlayerObservation, SourceError};

const SCOREBOARD_URL: &str =
    "https://cdn.nba.com/static/json/liveData/scoreboard/todaysScoreboard_00.json";
const BOXSCORE_URL_PREFIX: &str = "https://cdn.nba.com/static/json/liveData/boxscore/boxscore_";

const STATUS_IN_PROGRESS: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub game_id: String,
    pub status: u8,
    pub status_text: String,
    pub home: String,
    pub away: String,
    pub home_score: u32,
    pub away_score: u32,
}

impl GameSummary {
    pub fn is_live(&self) -> bool {
        self.status == STATUS_IN_PROGRESS
    }

    pub fn label(&self) -> String {
        format!(
            "{} {}-{} {} ({})",
            self.away, self.away_score, self.home_score, self.home, self.status_text
        )
    }
}

pub fn fetch_scoreboard() -> Result<Vec<GameSummary>, SourceError> {
    let body = fetch(SCOREBOARD_URL)?;
    decode_feed(SCOREBOARD_URL, &body, parse_scoreboard_json)
}

pub fn fetch_boxscore(game_id: &str) -> Result<Vec<PlayerObservation>, SourceError> {
    let url = format!("{BOXSCORE_URL_PREFIX}{game_id}.json");
    let body = fetch(&url)?;
    decode_feed(&url, &body, parse_boxscore_json)
}

/// The requested game when it is on today's board, otherwise the first game
/// in progress.
pub fn pick_game<'a>(games: &'a [GameSummary], requested: Option<&str>) -> Option<&'a GameSummary> {
    if let Some(id) = requested
        && let Some(game) = games.iter().find(|g| g.game_id == id)
    {
        return Some(game);
    }
    games.iter().find(|g| g.is_live())
}

fn fetch(url: &str) -> Result<String, SourceError> {
    let client = http_client().map_err(|err| network_error(url, err))?;
    fetch_json_revalidated(client, url).map_err(|err| network_error(url, err))
}

/// Runs a feed parser over a fetched body. A body that arrived but does not
/// parse is a malformed feed, not a transport failure.
fn decode_feed<T>(
    url: &str,
    body: &str,
    parse: impl FnOnce(&str) -> Result<T>,
) -> Result<T, SourceError> {
    parse(body).map_err(|err| SourceError::MalformedFeed {
        url: url.to_string(),
        reason: format!("{err:#}"),
    })
}

fn network_error(url: &str, err: anyhow::Error) -> SourceError {
    SourceError::Network {
        url: url.to_string(),
        reason: format!("{err:#}"),
    }
}

#[derive(Debug, Deserialize)]
struct ScoreboardResponse {
    scoreboard: Scoreboard,
}

#[derive(Debug, Deserialize)]
struct Scoreboard {
    #[serde(default)]
    games: Vec<ScoreboardGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreboardGame {
    game_id: String,
    #[serde(default)]
    game_status: u8,
    #[serde(default)]
    game_status_text: String,
    home_team: ScoreboardTeam,
    away_team: ScoreboardTeam,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreboardTeam {
    #[serde(default)]
    team_tricode: String,
    #[serde(default)]
    score: u32,
}

pub fn parse_scoreboard_json(raw: &str) -> Result<Vec<GameSummary>> {
    let resp: ScoreboardResponse =
        serde_json::from_str(raw.trim()).context("invalid scoreboard json")?;
    Ok(resp
        .scoreboard
        .games
        .into_iter()
        .map(|g| GameSummary {
            game_id: g.game_id,
            status: g.game_status,
            status_text: g.game_status_text.trim().to_string(),
            home: g.home_team.team_tricode,
            away: g.away_team.team_tricode,
            home_score: g.home_team.score,
            away_score: g.away_team.score,
        })
        .collect())
}

/// Flattens both teams of a live boxscore into observations, away team
/// first. Players without a usable name are dropped.
pub fn parse_boxscore_json(raw: &str) -> Result<Vec<PlayerObservation>> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid boxscore json")?;
    let game = root.get("game").context("boxscore has no game")?;

    let mut players = Vec::new();
    for side in ["awayTeam", "homeTeam"] {
        let Some(team) = game.get(side) else {
            continue;
        };
        let tricode = team
            .get("teamTricode")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some(list) = team.get("players").and_then(Value::as_array) else {
            continue;
        };
        for player in list {
            let Some(name) = player_name(player) else {
                continue;
            };
            let stats = player.get("statistics").unwrap_or(&Value::Null);
            players.push(PlayerObservation {
                name,
                team: tricode.to_string(),
                minutes: parse_minutes_value(stats.get("minutes").unwrap_or(&Value::Null)),
                points: stat_count(stats, "points"),
                assists: stat_count(stats, "assists"),
                rebounds: stat_count(stats, "reboundsTotal"),
            });
        }
    }
    Ok(players)
}

fn player_name(player: &Value) -> Option<String> {
    let first = player.get("firstName").and_then(Value::as_str).unwrap_or_default();
    let family = player.get("familyName").and_then(Value::as_str).unwrap_or_default();
    let joined = format!("{} {}", first.trim(), family.trim());
    let joined = joined.trim();
    if !joined.is_empty() {
        return Some(joined.to_string());
    }
    player
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn stat_count(stats: &Value, key: &str) -> u32 {
    match stats.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| *v >= 0.0).map(|v| v.round() as u64))
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u32>().unwrap_or(0),
        _ => 0,
    }
}
