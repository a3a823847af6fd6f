//! Plain-text rendering of fetched records

use std::io::{self, Write};

use crate::models::{MetadataRecord, PlaylistRecord, SessionRecord};

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("Unknown")
}

/// Print one block per session. `with_player` adds the player/state line
/// shown while monitoring.
pub fn write_sessions<W: Write>(
    out: &mut W,
    sessions: &[SessionRecord],
    with_player: bool,
) -> io::Result<()> {
    if sessions.is_empty() {
        return writeln!(out, "No active sessions");
    }

    for session in sessions {
        writeln!(out, "\nUser: {}", session.username)?;
        writeln!(
            out,
            "Watching: {} ({})",
            or_unknown(&session.title),
            or_unknown(&session.year)
        )?;
        writeln!(out, "Progress: {}", session.progress)?;
        if with_player {
            writeln!(out, "Player: {} ({})", session.player, session.state)?;
        }
    }
    Ok(())
}

pub fn write_playlists<W: Write>(out: &mut W, playlists: &[PlaylistRecord]) -> io::Result<()> {
    if playlists.is_empty() {
        return writeln!(out, "No playlists found");
    }

    for playlist in playlists {
        writeln!(out, "\nTitle: {}", or_unknown(&playlist.title))?;
        writeln!(out, "Items: {}", playlist.item_count)?;
        writeln!(out, "Duration: {} seconds", playlist.duration_secs)?;
        writeln!(out, "Last Viewed: {}", playlist.last_viewed_at)?;
    }
    Ok(())
}

pub fn write_metadata<W: Write>(out: &mut W, metadata: Option<&MetadataRecord>) -> io::Result<()> {
    let Some(item) = metadata else {
        return writeln!(out, "Item not found or error occurred");
    };

    writeln!(out, "\nTitle: {} ({})", or_unknown(&item.title), or_unknown(&item.year))?;
    writeln!(out, "Duration: {}", item.duration)?;
    writeln!(out, "Rating: {}", or_unknown(&item.rating))?;
    writeln!(out, "Genres: {}", item.genres.join(", "))?;
    writeln!(out, "Directors: {}", item.directors.join(", "))?;
    writeln!(out, "Writers: {}", item.writers.join(", "))?;
    writeln!(out, "Viewed by: {}", item.viewed_by.join(", "))?;
    writeln!(out, "\nSummary: {}", or_unknown(&item.summary))
}
