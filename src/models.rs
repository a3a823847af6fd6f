//! Data models for Plex Monitor

use chrono::{Local, TimeZone};
use std::fmt::Display;

pub const UNKNOWN_USER: &str = "Unknown User";
pub const UNKNOWN_PLATFORM: &str = "Unknown Platform";
pub const UNKNOWN_STATE: &str = "Unknown State";
pub const NO_DESCRIPTION: &str = "No description";
pub const NEVER_VIEWED: &str = "Never";

/// An active playback session from `/status/sessions`
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub username: String,
    pub title: Option<String>,
    pub year: Option<String>,
    pub media_type: Option<String>,
    /// Duration in milliseconds, as reported
    pub duration: Option<i64>,
    /// Playback position in milliseconds, as reported
    pub view_offset: Option<i64>,
    pub player: String,
    pub state: String,
    /// e.g. "50.0%"
    pub progress: String,
}

/// A playlist from `/playlists/all`
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistRecord {
    pub title: Option<String>,
    pub summary: String,
    pub duration_secs: i64,
    pub item_count: String,
    pub last_viewed_at: String,
}

/// Details for a single library item from `/library/metadata/{id}`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetadataRecord {
    pub title: Option<String>,
    pub year: Option<String>,
    pub rating: Option<String>,
    pub summary: Option<String>,
    /// e.g. "90 minutes"
    pub duration: String,
    pub viewed_by: Vec<String>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub writers: Vec<String>,
}

/// Playback progress with one decimal place.
///
/// A missing or non-positive duration counts as 1 ms so the division is always
/// defined. Offsets past the end are not clamped.
pub fn progress_percent(view_offset: Option<i64>, duration: Option<i64>) -> String {
    let offset = view_offset.unwrap_or(0);
    let duration = duration.filter(|d| *d > 0).unwrap_or(1);
    format!("{:.1}%", offset as f64 / duration as f64 * 100.0)
}

/// Whole minutes rounded down, e.g. 5400000 -> "90 minutes"
pub fn format_minutes(duration_ms: i64) -> String {
    format!("{} minutes", duration_ms.div_euclid(60_000))
}

/// Format a `lastViewedAt` epoch in local time, or "Never" when unset
pub fn format_last_viewed(ts: Option<i64>) -> String {
    format_last_viewed_in(&Local, ts)
}

pub fn format_last_viewed_in<Tz>(tz: &Tz, ts: Option<i64>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match ts {
        None | Some(0) => NEVER_VIEWED.to_string(),
        Some(ts) => match tz.timestamp_opt(ts, 0).single() {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            // Out of chrono's range
            None => ts.to_string(),
        },
    }
}
