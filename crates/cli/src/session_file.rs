//! Session persistence between invocations.
//!
//! The browser keeps its cookie jar; the CLI keeps this file instead. It
//! holds the backend cookie header and nothing else.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use metadots_storefront::api::Session;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SESSION_FILE: &str = ".metadots-session.json";

#[derive(Serialize, Deserialize)]
struct Stored {
    cookie: String,
}

/// Errors reading or writing the session file.
#[derive(Debug, thiserror::Error)]
pub enum SessionFileError {
    #[error("Session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the current session is stored.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SessionFileError {
        SessionFileError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Load the stored session. A missing file is an anonymous session.
    pub fn load(&self) -> Result<Session, SessionFileError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Session::anonymous()),
            Err(e) => return Err(self.io_error(e)),
        };
        let stored: Stored =
            serde_json::from_str(&raw).map_err(|source| SessionFileError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        Ok(Session::forwarded(&stored.cookie))
    }

    /// Store `session`. An anonymous session removes the file.
    pub fn save(&self, session: &Session) -> Result<(), SessionFileError> {
        let Some(cookie) = session.cookie_header() else {
            return self.clear();
        };
        let body = serde_json::to_string_pretty(&Stored {
            cookie: cookie.to_string(),
        })
        .map_err(|source| SessionFileError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        fs::write(&self.path, body).map_err(|e| self.io_error(e))?;
        restrict_permissions(&self.path).map_err(|e| self.io_error(e))
    }

    /// Remove the stored session, if any.
    pub fn clear(&self) -> Result<(), SessionFileError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(self.io_error(e)),
            _ => Ok(()),
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> SessionFile {
        let path = std::env::temp_dir().join(format!(
            "metadots-cli-{}-{name}.json",
            std::process::id()
        ));
        let file = SessionFile::new(path);
        file.clear().unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_anonymous() {
        let file = temp_file("missing");
        assert!(file.load().unwrap().is_anonymous());
    }

    #[test]
    fn test_save_then_load() {
        let file = temp_file("save");
        let session = Session::forwarded("access_token=abc");
        file.save(&session).unwrap();

        let loaded = file.load().unwrap();
        assert_eq!(loaded.cookie_header(), Some("access_token=abc"));
        file.clear().unwrap();
    }

    #[test]
    fn test_saving_anonymous_clears() {
        let file = temp_file("anon");
        file.save(&Session::forwarded("access_token=abc")).unwrap();
        file.save(&Session::anonymous()).unwrap();
        assert!(!file.path().exists());
    }

    #[test]
    fn test_corrupt_file() {
        let file = temp_file("corrupt");
        fs::write(file.path(), "not json").unwrap();
        assert!(matches!(file.load(), Err(SessionFileError::Corrupt { .. })));
        file.clear().unwrap();
    }
}
