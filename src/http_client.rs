use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER};

use crate::config::http_timeout_secs;

const NBA_REFERER: &str = "https://www.nba.com/";

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(REFERER, HeaderValue::from_static(NBA_REFERER));
        Client::builder()
            .timeout(Duration::from_secs(http_timeout_secs()))
            .default_headers(headers)
            .build()
            .context("failed to build http client")
    })
}
