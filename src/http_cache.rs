use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT};

// Process-local only: the live feed is refetched every cycle and nothing is
// written to disk.
static CACHE: Mutex<Option<HashMap<String, CacheEntry>>> = Mutex::new(None);

#[derive(Debug, Clone, PartialEq)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
}

/// GETs `url`, revalidating against the last body seen for it. A 304 answer
/// returns the remembered body.
pub fn fetch_json_revalidated(client: &Client, url: &str) -> Result<String> {
    let cached = lookup(url);

    let mut req = client.get(url).header(USER_AGENT, "Mozilla/5.0");
    if let Some(entry) = cached.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().context("request failed")?;
    let status = resp.status();
    if status == StatusCode::NOT_MODIFIED {
        return cached
            .map(|entry| entry.body)
            .ok_or_else(|| anyhow!("received 304 without cached body"));
    }

    let etag = header_string(resp.headers(), ETAG);
    let last_modified = header_string(resp.headers(), LAST_MODIFIED);
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {status}"));
    }

    remember(
        url,
        CacheEntry {
            body: body.clone(),
            etag,
            last_modified,
        },
    );
    Ok(body)
}

fn lookup(url: &str) -> Option<CacheEntry> {
    let guard = CACHE.lock().ok()?;
    guard.as_ref()?.get(url).cloned()
}

fn remember(url: &str, entry: CacheEntry) {
    // Entries without validators can never be revalidated.
    if entry.etag.is_none() && entry.last_modified.is_none() {
        return;
    }
    if let Ok(mut guard) = CACHE.lock() {
        guard
            .get_or_insert_with(HashMap::new)
            .insert(url.to_string(), entry);
    }
}

fn header_string(
    headers: &reqwest::header::HeaderMap,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
