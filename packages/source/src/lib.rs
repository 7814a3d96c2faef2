#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Itinerary feed download and parsing.
//!
//! The itinerary is published as a spreadsheet CSV export. This crate
//! downloads it ([`feed`]), turns it into [`ItineraryRow`]s
//! ([`csv_rows`]), and interprets the free-form date cells
//! ([`parsing`]).
//!
//! [`ItineraryRow`]: trip_map_itinerary_models::ItineraryRow

pub mod csv_rows;
pub mod feed;
pub mod parsing;
pub mod progress;
pub mod retry;

/// Errors that can occur while fetching or parsing the itinerary feed.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP status {status} from {url}")]
    Status {
        /// Response status code.
        status: reqwest::StatusCode,
        /// Requested URL.
        url: String,
    },

    /// The feed is empty or has no header line.
    #[error("Malformed input: {message}")]
    MalformedInput {
        /// Description of what went wrong.
        message: String,
    },

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
