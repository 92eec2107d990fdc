//! Optional on-disk copy of the session token (`<data_dir>/session.toml`).
//!
//! The session itself lives in memory; this file only lets a later invocation of the
//! CLI pick up where `login` left off.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::session::AuthToken;

const SESSION_FILE: &str = "session.toml";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid session file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("failed to encode session file: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("session file {path} holds an empty token")]
    InvalidToken { path: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: String,
}

pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE)
}

pub fn save_session(data_dir: &Path, token: &AuthToken) -> Result<(), PersistError> {
    let path = session_path(data_dir);
    std::fs::create_dir_all(data_dir).map_err(|source| PersistError::Io {
        path: data_dir.display().to_string(),
        source,
    })?;

    let content = toml::to_string_pretty(&SessionFile {
        token: token.as_str().to_string(),
    })?;

    std::fs::write(&path, content).map_err(|source| PersistError::Io {
        path: path.display().to_string(),
        source,
    })?;
    restrict_permissions(&path);
    debug!(path = %path.display(), "session saved");
    Ok(())
}

/// Load the saved token. A missing file is not an error.
pub fn load_session(data_dir: &Path) -> Result<Option<AuthToken>, PersistError> {
    let path = session_path(data_dir);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };
    check_permissions(&path);

    let parsed: SessionFile = toml::from_str(&raw).map_err(|source| PersistError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    AuthToken::new(parsed.token)
        .map(Some)
        .map_err(|_| PersistError::InvalidToken {
            path: path.display().to_string(),
        })
}

pub fn remove_session(data_dir: &Path) -> Result<(), PersistError> {
    let path = session_path(data_dir);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PersistError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        warn!(path = %path.display(), error = %e, "could not restrict session file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

/// Warn if the session file is world-readable. No-op on non-Unix.
#[cfg(unix)]
fn check_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(path) {
        if meta.permissions().mode() & 0o004 != 0 {
            warn!(
                path = %path.display(),
                "session file is world-readable; consider chmod 600"
            );
        }
    }
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) {}
