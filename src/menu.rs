//! Interactive text menu

use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::api::PlexClient;
use crate::display::{write_metadata, write_playlists, write_sessions};
use crate::models::{MetadataRecord, PlaylistRecord, SessionRecord};
use crate::monitor::{run_monitor, ActiveMonitor};

const MENU: &str = "\nPlex Monitor Menu:\n\
                    1. Show active sessions\n\
                    2. Show playlists\n\
                    3. Get item metadata\n\
                    4. Start continuous monitoring\n\
                    5. Exit";

/// Where the menu gets its data from
pub trait PlexSource {
    fn active_sessions(&self) -> Vec<SessionRecord>;
    fn playlists(&self) -> Vec<PlaylistRecord>;
    fn item_metadata(&self, item_id: &str) -> Option<MetadataRecord>;
}

impl PlexSource for PlexClient {
    fn active_sessions(&self) -> Vec<SessionRecord> {
        PlexClient::active_sessions(self)
    }

    fn playlists(&self) -> Vec<PlaylistRecord> {
        PlexClient::playlists(self)
    }

    fn item_metadata(&self, item_id: &str) -> Option<MetadataRecord> {
        PlexClient::item_metadata(self, item_id)
    }
}

/// Library item ids are plain decimal numbers
pub fn is_valid_item_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Empty input means the default; `None` for anything that is not a positive
/// number of seconds
pub fn parse_interval(input: &str, default_secs: u64) -> Option<u64> {
    let input = input.trim();
    if input.is_empty() {
        return Some(default_secs);
    }
    input.parse::<u64>().ok().filter(|secs| *secs > 0)
}

pub struct Menu<'a, S, R, W> {
    source: &'a S,
    input: R,
    out: W,
    active: ActiveMonitor,
    default_interval_secs: u64,
}

impl<'a, S, R, W> Menu<'a, S, R, W>
where
    S: PlexSource,
    R: BufRead,
    W: Write,
{
    pub fn new(source: &'a S, input: R, out: W, active: ActiveMonitor, default_interval_secs: u64) -> Self {
        Self {
            source,
            input,
            out,
            active,
            default_interval_secs,
        }
    }

    /// Show the menu and dispatch choices until Exit or end of input
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.out, "{}", MENU)?;
            let Some(choice) = self.prompt("\nSelect an option (1-5): ")? else {
                writeln!(self.out, "\nExiting...")?;
                return Ok(());
            };

            match choice.trim() {
                "1" => {
                    let sessions = self.source.active_sessions();
                    write_sessions(&mut self.out, &sessions, false)?;
                }
                "2" => {
                    let playlists = self.source.playlists();
                    write_playlists(&mut self.out, &playlists)?;
                }
                "3" => self.show_metadata()?,
                "4" => self.monitor()?,
                "5" => {
                    writeln!(self.out, "Exiting...")?;
                    return Ok(());
                }
                _ => writeln!(self.out, "Invalid choice")?,
            }
        }
    }

    fn show_metadata(&mut self) -> io::Result<()> {
        let item_id = self.prompt("Enter media item ID: ")?.unwrap_or_default();
        let item_id = item_id.trim();

        if !is_valid_item_id(item_id) {
            return writeln!(self.out, "Invalid item ID");
        }

        let metadata = self.source.item_metadata(item_id);
        write_metadata(&mut self.out, metadata.as_ref())
    }

    fn monitor(&mut self) -> io::Result<()> {
        let default = self.default_interval_secs;
        let answer = self
            .prompt(&format!("Enter monitoring interval in seconds (default {}): ", default))?
            .unwrap_or_default();

        let secs = match parse_interval(&answer, default) {
            Some(secs) => secs,
            None => {
                writeln!(self.out, "Invalid interval, using default {} seconds", default)?;
                default
            }
        };

        let token = self.active.begin();
        let source = self.source;
        let result = run_monitor(
            || source.active_sessions(),
            Duration::from_secs(secs),
            &token,
            &mut self.out,
        );
        self.active.end();
        result.map(|_| ())
    }

    /// Print `text` and read one line. `None` at end of input.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
