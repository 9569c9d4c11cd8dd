//! Error types for fetching, formatting and configuration

use std::path::PathBuf;

/// Errors raised while talking to the Tautulli API
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure (connection refused, DNS, TLS, body read)
    #[error("HTTP request failed")]
    Http(#[source] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{command} returned HTTP {status}")]
    Status { command: String, status: u16 },

    /// The body was not the JSON shape we expected
    #[error("unexpected {command} response")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL cannot be turned into a request URL
    #[error("invalid Tautulli URL")]
    Url(#[from] url::ParseError),
}

/// Request URLs carry the API key in their query string, so the URL is
/// dropped before a transport error can reach the menu or the logs
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.without_url())
    }
}

/// Errors raised while turning a session into display lines
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unknown stream decision `{0}`")]
    UnknownDecision(String),
}

/// Errors raised while loading the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no {key} configured (set {env} or `{key}` in the config file)")]
    Missing {
        key: &'static str,
        env: &'static str,
    },

    #[error("cannot read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
