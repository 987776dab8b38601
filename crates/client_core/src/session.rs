//! The logged-in identity and its on-disk copy.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// HTTP Basic credential, kept as the encoded `username:password` token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasicCredential(String);

impl BasicCredential {
    pub fn new(username: &str, password: &str) -> Self {
        Self(STANDARD.encode(format!("{username}:{password}")))
    }

    pub fn header_value(&self) -> String {
        format!("Basic {}", self.0)
    }
}

impl fmt::Debug for BasicCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BasicCredential(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub credential: BasicCredential,
}

impl Session {
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        let username = username.into();
        let credential = BasicCredential::new(&username, password);
        Self {
            username,
            credential,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionFileError {
    #[error("failed to access session file '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("session file '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Session persisted between runs so a login survives process restarts.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>, SessionFileError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionFileError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let session = serde_json::from_str(&raw).map_err(|source| SessionFileError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionFileError> {
        let io_err = |source| SessionFileError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let raw = serde_json::to_string_pretty(session).map_err(|source| {
            SessionFileError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, raw).map_err(io_err)?;
        restrict_permissions(&self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), "session: saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionFileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionFileError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
