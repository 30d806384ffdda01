use std::path::PathBuf;
use thiserror::Error;

/// Problems with the lookup token. All of them stop the run before tracing.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("failed to read token file {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("token file {path:?} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("token file {0:?} has an empty token")]
    EmptyToken(PathBuf),
}

/// Errors from a single lookup. Callers of `GeoLocator` never see these.
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("lookup service returned HTTP {0}")]
    BadStatus(u16),

    #[error("invalid lookup response: {0}")]
    InvalidResponse(String),
}
