//! Itinerary feed download.
//!
//! The feed location is usually the CSV export URL of a published
//! spreadsheet. A location without an `http://` or `https://` scheme is
//! read from the local filesystem instead, which is handy for working
//! from a saved export.

use std::path::Path;

use crate::{SourceError, retry};

/// Fetches the raw CSV text of the itinerary feed.
///
/// # Errors
///
/// Returns [`SourceError`] if the download fails after retries, the server
/// answers with an error status, or the local file cannot be read.
pub async fn load_feed(client: &reqwest::Client, location: &str) -> Result<String, SourceError> {
    if is_remote(location) {
        log::info!("Downloading itinerary feed from {location}");
        let text = retry::send_text(|| client.get(location)).await?;
        log::info!("Downloaded {} bytes of itinerary CSV", text.len());
        Ok(text)
    } else {
        log::info!("Reading itinerary feed from {location}");
        Ok(tokio::fs::read_to_string(Path::new(location)).await?)
    }
}

fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_remote_locations() {
        assert!(is_remote("https://docs.google.com/spreadsheets/d/e/x/pub?output=csv"));
        assert!(is_remote("HTTP://example.com/feed.csv"));
        assert!(!is_remote("data/itinerary.csv"));
        assert!(!is_remote("/tmp/feed.csv"));
    }
}
