use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "nba_props_terminal";
const DEFAULT_PROJECTIONS_PATH: &str = "data/projections.csv";
const DEFAULT_LINES_PATH: &str = "data/player_props.csv";
const DEFAULT_SIM_BOXSCORE_PATH: &str = "data/simulated_boxscore.csv";
const DEFAULT_REFRESH_SECS: u64 = 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveMode {
    /// Live feed when a game is in progress, simulated box score otherwise.
    Auto,
    Live,
    Simulated,
}

impl LiveMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(LiveMode::Auto),
            "live" => Some(LiveMode::Live),
            "sim" | "simulated" | "simulation" => Some(LiveMode::Simulated),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LiveMode::Auto => "AUTO",
            LiveMode::Live => "LIVE",
            LiveMode::Simulated => "SIM",
        }
    }

    pub fn next(self) -> Self {
        match self {
            LiveMode::Auto => LiveMode::Live,
            LiveMode::Live => LiveMode::Simulated,
            LiveMode::Simulated => LiveMode::Auto,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub projections_path: PathBuf,
    pub lines_path: PathBuf,
    pub sim_boxscore_path: PathBuf,
    pub live_mode: LiveMode,
    pub game_id: Option<String>,
    pub refresh_secs: u64,
    pub export_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let path_or = |key: &str, default: &str| {
            non_empty(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };

        Self {
            projections_path: path_or("PROJECTIONS_PATH", DEFAULT_PROJECTIONS_PATH),
            lines_path: path_or("LINES_PATH", DEFAULT_LINES_PATH),
            sim_boxscore_path: path_or("SIM_BOXSCORE_PATH", DEFAULT_SIM_BOXSCORE_PATH),
            live_mode: non_empty("LIVE_MODE")
                .and_then(|v| LiveMode::parse(&v))
                .unwrap_or(LiveMode::Auto),
            game_id: non_empty("GAME_ID"),
            refresh_secs: non_empty("REFRESH_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_REFRESH_SECS)
                .max(10),
            export_dir: path_or("EXPORT_DIR", "."),
            log_dir: non_empty("LOG_DIR").map(PathBuf::from).or_else(app_cache_dir),
        }
    }
}

pub fn http_timeout_secs() -> u64 {
    env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
        .clamp(2, 60)
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}
