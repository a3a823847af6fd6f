//! Error types shared by the client and the parsers

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("No valid token available")]
    MissingToken,

    #[error("No username/password configured")]
    MissingCredentials,

    #[error("Request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("HTTP error {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed XML: {0}")]
    Xml(String),

    #[error("Invalid {attribute}=\"{value}\" on <{element}>")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
}

impl From<quick_xml::events::attributes::AttrError> for MonitorError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        MonitorError::Xml(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
