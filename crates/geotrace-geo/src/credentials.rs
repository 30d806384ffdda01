use crate::error::CredentialError;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
struct TokenFile {
    token: String,
}

/// Lookup service token loaded from `{"token": "..."}`.
#[derive(Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let contents = fs::read_to_string(path).map_err(|source| CredentialError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let file: TokenFile =
            serde_json::from_str(&contents).map_err(|source| CredentialError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        let token = file.token.trim();
        if token.is_empty() {
            return Err(CredentialError::EmptyToken(path.to_path_buf()));
        }

        Ok(Self::new(token))
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}
