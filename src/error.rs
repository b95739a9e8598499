use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failures of the browsing session itself.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to start HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("no page loaded in the current context")]
    NoPage,
    #[error("browsing session already closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login rejected: {0}")]
    Rejected(String),
    #[error("login failed: {0}")]
    Browser(#[from] BrowserError),
}

#[derive(Debug, Error)]
#[error("failed to extract listing {url}: {source}")]
pub struct ExtractionError {
    pub url: String,
    #[source]
    pub source: BrowserError,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("bad mail address {address}: {message}")]
    Address { address: String, message: String },
    #[error("failed to build message: {0}")]
    Message(String),
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("failed to load search page {url}: {source}")]
    SearchPage {
        url: String,
        #[source]
        source: BrowserError,
    },
}
