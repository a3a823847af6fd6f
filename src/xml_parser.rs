//! Plex XML response parsers
//!
//! Streaming parsers over `quick-xml` events for the three documents the
//! monitor reads:
//! - `/status/sessions`  -> `Video` elements with `User`/`Player` children
//! - `/playlists/all`    -> `Playlist` elements
//! - `/library/metadata` -> first `Video` element plus tag lists
//!
//! Every parser rejects structurally broken documents as a whole; callers
//! decide what absence means for them.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{MonitorError, Result};
use crate::models::{
    format_last_viewed, format_minutes, progress_percent, MetadataRecord, PlaylistRecord,
    SessionRecord, NO_DESCRIPTION, UNKNOWN_PLATFORM, UNKNOWN_STATE, UNKNOWN_USER,
};

/// Element boundary seen while walking a document.
/// Depth 0 is the root element. Lookups only match below it.
enum Node<'a> {
    Open(&'a BytesStart<'a>, usize),
    Close(usize),
}

/// Walk every element in `xml`, reporting opens and closes in document order.
/// Self-closing elements produce an `Open` immediately followed by a `Close`.
///
/// The document must hold exactly one root element. Character data outside
/// it (other than whitespace) is rejected.
fn walk<F>(xml: &str, mut visit: F) -> Result<()>
where
    F: FnMut(Node<'_>) -> Result<()>,
{
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| MonitorError::Xml(format!("{} at byte {}", e, position)))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) if depth == 0 && seen_root => {
                return Err(MonitorError::Xml(format!(
                    "second root element <{}> at byte {}",
                    String::from_utf8_lossy(e.name().as_ref()),
                    position
                )));
            }
            Event::Start(ref e) => {
                seen_root = true;
                visit(Node::Open(e, depth))?;
                depth += 1;
            }
            Event::Empty(ref e) => {
                seen_root = true;
                visit(Node::Open(e, depth))?;
                visit(Node::Close(depth))?;
            }
            Event::End(_) => {
                // Unmatched end tags are rejected by the reader itself
                depth = depth.saturating_sub(1);
                visit(Node::Close(depth))?;
            }
            Event::Text(ref text) if depth == 0 => {
                if text.iter().any(|b| !b.is_ascii_whitespace()) {
                    return Err(MonitorError::Xml(format!(
                        "text outside the root element at byte {}",
                        position
                    )));
                }
            }
            Event::CData(_) | Event::GeneralRef(_) if depth == 0 => {
                return Err(MonitorError::Xml(format!(
                    "text outside the root element at byte {}",
                    position
                )));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(MonitorError::Xml("document has no root element".to_string()));
    }
    if depth != 0 {
        return Err(MonitorError::Xml(format!(
            "unexpected end of document, {} element(s) left open",
            depth
        )));
    }
    Ok(())
}

/// Get attribute value from XML element, with entities unescaped
fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name.as_bytes() {
            let raw = std::str::from_utf8(&attr.value)
                .map_err(|err| MonitorError::Xml(err.to_string()))?;
            let value = quick_xml::escape::unescape(raw)
                .map_err(|err| MonitorError::Xml(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Integer attribute; absent or empty is `None`, anything unparsable is an error
fn get_int(e: &BytesStart, element: &'static str, name: &'static str) -> Result<Option<i64>> {
    let value = match get_attribute(e, name)? {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(None),
    };

    let parsed = value.trim().parse::<i64>();
    match parsed {
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(MonitorError::InvalidAttribute {
            element,
            attribute: name,
            value,
        }),
    }
}

/// A `Video` element whose `User`/`Player` children are still being read
struct PendingSession {
    depth: usize,
    title: Option<String>,
    year: Option<String>,
    media_type: Option<String>,
    duration: Option<i64>,
    view_offset: Option<i64>,
    user: Option<Option<String>>,
    player: Option<(Option<String>, Option<String>)>,
}

impl PendingSession {
    fn open(e: &BytesStart, depth: usize) -> Result<Self> {
        Ok(Self {
            depth,
            title: get_attribute(e, "title")?,
            year: get_attribute(e, "year")?,
            media_type: get_attribute(e, "type")?,
            duration: get_int(e, "Video", "duration")?,
            view_offset: get_int(e, "Video", "viewOffset")?,
            user: None,
            player: None,
        })
    }

    fn finish(self) -> SessionRecord {
        let (platform, state) = self.player.unwrap_or((None, None));
        SessionRecord {
            username: self.user.flatten().unwrap_or_else(|| UNKNOWN_USER.to_string()),
            title: self.title,
            year: self.year,
            media_type: self.media_type,
            duration: self.duration,
            view_offset: self.view_offset,
            player: platform.unwrap_or_else(|| UNKNOWN_PLATFORM.to_string()),
            state: state.unwrap_or_else(|| UNKNOWN_STATE.to_string()),
            progress: progress_percent(self.view_offset, self.duration),
        }
    }
}

/// Parse a `/status/sessions` document into one record per `Video` element.
///
/// `Video` elements may nest; each is finished on its own close tag and
/// records keep the order of the opening tags.
pub fn parse_sessions(xml: &str) -> Result<Vec<SessionRecord>> {
    let mut slots: Vec<Option<SessionRecord>> = Vec::new();
    // Innermost open `Video` last, paired with its slot index
    let mut pending: Vec<(usize, PendingSession)> = Vec::new();

    walk(xml, |node| {
        match node {
            Node::Open(e, depth) if depth > 0 && e.name().as_ref() == b"Video" => {
                pending.push((slots.len(), PendingSession::open(e, depth)?));
                slots.push(None);
            }
            Node::Open(e, depth) if depth > 0 => {
                let innermost = pending.last_mut().map(|(_, s)| s);
                match (e.name().as_ref(), innermost) {
                    (b"User", Some(session)) if depth == session.depth + 1 => {
                        if session.user.is_none() {
                            session.user = Some(get_attribute(e, "title")?);
                        }
                    }
                    (b"Player", Some(session)) if depth == session.depth + 1 => {
                        if session.player.is_none() {
                            session.player =
                                Some((get_attribute(e, "platform")?, get_attribute(e, "state")?));
                        }
                    }
                    _ => {}
                }
            }
            Node::Open(..) => {}
            Node::Close(depth) => {
                if pending.last().is_some_and(|(_, s)| s.depth == depth) {
                    if let Some((slot, session)) = pending.pop() {
                        slots[slot] = Some(session.finish());
                    }
                }
            }
        }
        Ok(())
    })?;

    Ok(slots.into_iter().flatten().collect())
}

/// Parse a `/playlists/all` document into one record per `Playlist` element
pub fn parse_playlists(xml: &str) -> Result<Vec<PlaylistRecord>> {
    let mut playlists = Vec::new();

    walk(xml, |node| {
        if let Node::Open(e, depth) = node {
            if depth > 0 && e.name().as_ref() == b"Playlist" {
                let duration_ms = get_int(e, "Playlist", "duration")?.unwrap_or(0);
                playlists.push(PlaylistRecord {
                    title: get_attribute(e, "title")?,
                    summary: get_attribute(e, "summary")?
                        .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
                    duration_secs: duration_ms.div_euclid(1000),
                    item_count: get_attribute(e, "leafCount")?.unwrap_or_else(|| "0".to_string()),
                    last_viewed_at: format_last_viewed(get_int(e, "Playlist", "lastViewedAt")?),
                });
            }
        }
        Ok(())
    })?;

    Ok(playlists)
}

/// Parse a `/library/metadata/{id}` document.
///
/// Returns `Ok(None)` when the document is well formed but holds no `Video`.
/// The tag lists are gathered from the whole document in order.
pub fn parse_metadata(xml: &str) -> Result<Option<MetadataRecord>> {
    let mut item: Option<MetadataRecord> = None;
    let mut viewed_by = Vec::new();
    let mut genres = Vec::new();
    let mut directors = Vec::new();
    let mut writers = Vec::new();

    walk(xml, |node| {
        let Node::Open(e, depth) = node else {
            return Ok(());
        };
        if depth == 0 {
            return Ok(());
        }

        let (list, attribute) = match e.name().as_ref() {
            b"Video" => {
                if item.is_none() {
                    let duration = get_int(e, "Video", "duration")?.unwrap_or(0);
                    item = Some(MetadataRecord {
                        title: get_attribute(e, "title")?,
                        year: get_attribute(e, "year")?,
                        rating: get_attribute(e, "rating")?,
                        summary: get_attribute(e, "summary")?,
                        duration: format_minutes(duration),
                        ..MetadataRecord::default()
                    });
                }
                return Ok(());
            }
            b"Account" => (&mut viewed_by, "title"),
            b"Genre" => (&mut genres, "tag"),
            b"Director" => (&mut directors, "tag"),
            b"Writer" => (&mut writers, "tag"),
            _ => return Ok(()),
        };

        if let Some(value) = get_attribute(e, attribute)? {
            list.push(value);
        }
        Ok(())
    })?;

    Ok(item.map(|record| MetadataRecord {
        viewed_by,
        genres,
        directors,
        writers,
        ..record
    }))
}

#[cfg(test)]
#[path = "xml_parser_tests.rs"]
mod tests;
