//! Persisted session
//!
//! The token and user name live in `session.json` under the data directory so
//! separate invocations share one login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use super::error::SessionResult;

/// Session file name inside the data directory
pub const SESSION_FILE: &str = "session.json";

/// What survives between invocations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSession {
    pub token: String,
    pub user: String,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(token: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: user.into(),
            saved_at: Utc::now(),
        }
    }
}

/// File-backed token store
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store inside `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session
    ///
    /// A missing file means logged out. An unreadable or corrupt file is
    /// logged and also treated as logged out.
    pub fn load(&self) -> Option<StoredSession> {
        if !self.path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read session file");
                return None;
            }
        };

        match serde_json::from_str::<StoredSession>(&content) {
            Ok(session) if !session.token.is_empty() => Some(session),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt session file");
                None
            }
        }
    }

    /// Persist a session, replacing any previous one
    pub fn save(&self, session: &StoredSession) -> SessionResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(session)?;
        let partial = self.path.with_extension("json.part");
        let result = write_private(&partial, content.as_bytes())
            .and_then(|()| std::fs::rename(&partial, &self.path));
        if let Err(e) = result {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }
        Ok(())
    }

    /// Forget the stored session; succeeds when nothing is stored
    pub fn clear(&self) -> SessionResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write a file only the owner can read, from the moment it exists
#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // A leftover file keeps its old mode
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_logged_out() {
        let temp = TempDir::new().unwrap();
        let store = TokenStore::new(temp.path());
        assert!(store.load().is_none());
        assert!(store.clear().is_ok());
    }

    #[test]
    fn test_save_load_clear() {
        let temp = TempDir::new().unwrap();
        let store = TokenStore::new(temp.path().join("nested"));

        store.save(&StoredSession::new("abc123", "alice")).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.token, "abc123");
        assert_eq!(loaded.user, "alice");

        store.clear().unwrap();
        assert!(store.load().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let temp = TempDir::new().unwrap();
        let store = TokenStore::new(temp.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = TokenStore::new(temp.path());
        store.save(&StoredSession::new("t", "u")).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_leftover_partial_file_is_made_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = TokenStore::new(temp.path());
        let partial = store.path().with_extension("json.part");
        std::fs::write(&partial, "stale").unwrap();
        std::fs::set_permissions(&partial, std::fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&StoredSession::new("t", "u")).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().token, "t");
        assert!(!partial.exists());
    }

    #[test]
    fn test_failed_save_leaves_no_partial_file() {
        let temp = TempDir::new().unwrap();
        let store = TokenStore::new(temp.path());
        // A directory in the way makes the final rename fail
        std::fs::create_dir(store.path()).unwrap();
        std::fs::write(store.path().join("keep"), "x").unwrap();

        assert!(store.save(&StoredSession::new("t", "u")).is_err());
        assert!(!store.path().with_extension("json.part").exists());
    }
}
