//! Plex Media Server API client

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::{MonitorError, Result};
use crate::models::{MetadataRecord, PlaylistRecord, SessionRecord};
use crate::xml_parser::{parse_metadata, parse_playlists, parse_sessions};

pub const SESSIONS_ENDPOINT: &str = "/status/sessions";
pub const PLAYLISTS_ENDPOINT: &str = "/playlists/all";
const SIGN_IN_ENDPOINT: &str = "/users/sign_in";
const TOKEN_PARAM: &str = "X-Plex-Token";

const CLIENT_IDENTIFIER: &str = "PlexMonitorTool";
const PRODUCT: &str = "PlexMonitor";
const DEVICE: &str = "PlexMonitorCLI";
const DEVICE_NAME: &str = "PlexMonitor";

/// Which request a header set is for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaderPurpose {
    /// `POST /users/sign_in` on the provider
    SignIn,
    /// `GET` requests against the media server
    Api,
}

/// Client identification headers sent with every request
pub fn client_headers(purpose: HeaderPurpose) -> Vec<(&'static str, &'static str)> {
    let mut headers = vec![
        ("X-Plex-Client-Identifier", CLIENT_IDENTIFIER),
        ("X-Plex-Product", PRODUCT),
        ("X-Plex-Version", env!("CARGO_PKG_VERSION")),
        ("X-Plex-Platform", std::env::consts::OS),
    ];

    match purpose {
        HeaderPurpose::SignIn => {
            headers.push(("X-Plex-Device", DEVICE));
            headers.push(("X-Plex-Device-Name", DEVICE_NAME));
            headers.push(("Accept", "application/json"));
        }
        HeaderPurpose::Api => headers.push(("Accept", "application/xml")),
    }

    headers
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    user: SignInUser,
}

#[derive(Debug, Deserialize)]
struct SignInUser {
    #[serde(rename = "authToken")]
    auth_token: String,
}

fn create_agent(timeout: Option<Duration>) -> ureq::Agent {
    let builder = ureq::Agent::config_builder()
        .timeout_global(timeout)
        .http_status_as_error(false);

    // Loopback stubs must not be routed through an environment proxy
    #[cfg(test)]
    let builder = builder.proxy(None);

    builder.build().new_agent()
}

pub struct PlexClient {
    agent: ureq::Agent,
    server: String,
    provider_url: String,
    token: Option<String>,
}

impl PlexClient {
    /// Build a client and resolve its token.
    ///
    /// A configured token is used as is; otherwise username/password are
    /// exchanged for one. Without either the client has no token and every
    /// fetch is refused.
    pub fn new(config: &AppConfig) -> Self {
        let credentials = config.credentials();
        let mut client = Self {
            agent: create_agent(config.http_timeout()),
            server: credentials.server.clone(),
            provider_url: config.provider_url.trim_end_matches('/').to_string(),
            token: credentials.token.clone(),
        };

        if client.token.is_none() {
            client.token = match credentials.login() {
                Some((username, password)) => client.authenticate(username, password),
                None => {
                    error!("Authentication failed: {}", MonitorError::MissingCredentials);
                    None
                }
            };
        }

        client
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Exchange username/password for a token. Failures are logged and yield `None`.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<String> {
        match self.sign_in(username, password) {
            Ok(token) => {
                info!("Successfully authenticated with Plex");
                Some(token)
            }
            Err(e) => {
                error!("Authentication failed: {}", e);
                None
            }
        }
    }

    fn sign_in(&self, username: &str, password: &str) -> Result<String> {
        let url = format!("{}{}", self.provider_url, SIGN_IN_ENDPOINT);
        let basic = STANDARD.encode(format!("{}:{}", username, password));

        let request = client_headers(HeaderPurpose::SignIn)
            .into_iter()
            .fold(self.agent.post(url.as_str()), |req, (name, value)| req.header(name, value))
            .header("Authorization", format!("Basic {}", basic));

        let mut response = request.send_empty()?;
        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::Status {
                endpoint: SIGN_IN_ENDPOINT.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.body_mut().read_to_string()?;
        let parsed: SignInResponse = serde_json::from_str(&body)?;
        if parsed.user.auth_token.is_empty() {
            return Err(MonitorError::MissingToken);
        }
        Ok(parsed.user.auth_token)
    }

    /// GET `endpoint` on the media server. Failures are logged and yield `None`.
    pub fn fetch(&self, endpoint: &str) -> Option<String> {
        match self.try_fetch(endpoint) {
            Ok(body) => Some(body),
            Err(MonitorError::MissingToken) => {
                error!("{}", MonitorError::MissingToken);
                None
            }
            Err(e) => {
                error!("Request failed for {}: {}", endpoint, e);
                None
            }
        }
    }

    fn try_fetch(&self, endpoint: &str) -> Result<String> {
        let token = self.token.as_deref().ok_or(MonitorError::MissingToken)?;
        let url = format!("{}{}", self.server, endpoint);

        let request = client_headers(HeaderPurpose::Api)
            .into_iter()
            .fold(self.agent.get(url.as_str()), |req, (name, value)| req.header(name, value))
            .query(TOKEN_PARAM, token);

        let mut response = request.call()?;
        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.body_mut().read_to_string()?)
    }

    /// Currently playing sessions; empty when nothing could be fetched or parsed
    pub fn active_sessions(&self) -> Vec<SessionRecord> {
        let xml = match self.fetch(SESSIONS_ENDPOINT) {
            Some(xml) if !xml.is_empty() => xml,
            _ => return Vec::new(),
        };

        parse_sessions(&xml).unwrap_or_else(|e| {
            error!("Error parsing sessions XML: {}", e);
            Vec::new()
        })
    }

    pub fn playlists(&self) -> Vec<PlaylistRecord> {
        let xml = match self.fetch(PLAYLISTS_ENDPOINT) {
            Some(xml) if !xml.is_empty() => xml,
            _ => return Vec::new(),
        };

        parse_playlists(&xml).unwrap_or_else(|e| {
            error!("Error parsing playlists XML: {}", e);
            Vec::new()
        })
    }

    /// Metadata for one library item; `None` if it cannot be fetched or has no `Video`
    pub fn item_metadata(&self, item_id: &str) -> Option<MetadataRecord> {
        let xml = self
            .fetch(&format!("/library/metadata/{}", item_id))
            .filter(|xml| !xml.is_empty())?;

        parse_metadata(&xml).unwrap_or_else(|e| {
            error!("Error parsing metadata XML: {}", e);
            None
        })
    }
}
