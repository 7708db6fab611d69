pub mod board;
pub mod config;
pub mod export;
pub mod http_cache;
pub mod http_client;
pub mod live_feed;
pub mod logging;
pub mod names;
pub mod pace;
pub mod pipeline;
pub mod signal;
pub mod sources;
pub mod state;
