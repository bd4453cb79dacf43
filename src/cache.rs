use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write;
use std::path::PathBuf;

const MAX_KEY_LEN: usize = 120;

/// XDG-compatible cache directory: ~/.cache/hubdeck/ (Linux) or ~/Library/Caches/hubdeck/ (macOS)
fn cache_dir() -> Option<PathBuf> {
    let dir = dirs::cache_dir()?.join("hubdeck");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

fn cache_path(key: &str) -> Option<PathBuf> {
    Some(cache_dir()?.join(format!("{}.json", key)))
}

#[derive(Serialize, Deserialize)]
struct Entry<T> {
    stored_at: DateTime<Utc>,
    value: T,
}

/// Read a cached value no older than `max_age`. Returns None if missing, stale or corrupt.
pub fn read<T: DeserializeOwned>(key: &str, max_age: Duration) -> Option<T> {
    let path = cache_path(key)?;
    let data = std::fs::read_to_string(path).ok()?;
    let entry: Entry<T> = serde_json::from_str(&data).ok()?;
    is_fresh(entry.stored_at, Utc::now(), max_age).then_some(entry.value)
}

/// Write a value to cache. Silently ignores errors.
pub fn write<T: Serialize>(key: &str, value: &T) {
    if let Some(path) = cache_path(key) {
        let entry = Entry {
            stored_at: Utc::now(),
            value,
        };
        if let Ok(data) = serde_json::to_string(&entry) {
            let _ = std::fs::write(path, data);
        }
    }
}

fn is_fresh(stored_at: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> bool {
    now.signed_duration_since(stored_at) <= max_age
}

/// Build a filesystem-safe key for one request made by one account.
///
/// The readable part is sanitized and may be cut short, so the key ends in a
/// digest of the raw request to keep distinct requests apart.
pub fn request_key(account: &str, route: &str, params: &[(&str, String)]) -> String {
    let mut raw = format!("{}{}", account, route);
    for (name, value) in params {
        raw.push('?');
        raw.push_str(name);
        raw.push('=');
        raw.push_str(value);
    }
    let readable = sanitize(&raw);
    let prefix = &readable[..readable.len().min(MAX_KEY_LEN - DIGEST_LEN - 1)];
    format!("{}_{}", prefix, digest(&raw))
}

const DIGEST_LEN: usize = 16;

/// First eight bytes of the SHA-256 of `raw`, hex encoded
fn digest(raw: &str) -> String {
    let hash = Sha256::digest(raw.as_bytes());
    hash.iter().take(DIGEST_LEN / 2).fold(String::new(), |mut out, byte| {
        let _ = write!(out, "{:02x}", byte);
        out
    })
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
