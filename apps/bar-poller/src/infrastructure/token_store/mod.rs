//! File Token Store
//!
//! Persists the credential as pretty-printed JSON. Writes go to a sibling
//! `<path>.tmp` file which is flushed to disk and renamed over the canonical
//! path, so a reader sees either the old record or the new one. On Unix the
//! file is created owner-only (0600) and the mode is re-applied after rename.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::application::ports::{TokenStoreError, TokenStorePort};
use crate::domain::credential::Credential;

/// Default file name, relative to the user's home directory.
pub const DEFAULT_FILE_NAME: &str = ".ibkr_token.json";

/// Credential store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.ibkr_token.json`, or `None` if the home directory is unknown.
    #[must_use]
    pub fn default_location() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_FILE_NAME))
    }

    /// Canonical file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the temporary file used while saving.
    #[must_use]
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn display(path: &Path) -> String {
        path.display().to_string()
    }

    fn write_temp(&self, temp: &Path, content: &[u8]) -> std::io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(temp)?;
        file.write_all(content)?;
        file.sync_all()
    }

    fn restrict_permissions(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

impl TokenStorePort for FileTokenStore {
    fn load(&self) -> Result<Option<Credential>, TokenStoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No credential file");
                return Ok(None);
            }
            Err(e) => {
                return Err(TokenStoreError::Read {
                    path: Self::display(&self.path),
                    message: e.to_string(),
                });
            }
        };

        if content.trim().is_empty() {
            return Err(TokenStoreError::Corrupt {
                path: Self::display(&self.path),
                message: "file is empty".to_string(),
            });
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| TokenStoreError::Corrupt {
                path: Self::display(&self.path),
                message: e.to_string(),
            })
    }

    fn save(&self, credential: &Credential) -> Result<(), TokenStoreError> {
        let write_error = |path: &Path, message: String| TokenStoreError::Write {
            path: Self::display(path),
            message,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| write_error(parent, e.to_string()))?;
        }

        let content = serde_json::to_vec_pretty(credential)
            .map_err(|e| write_error(&self.path, e.to_string()))?;

        let temp = self.temp_path();
        let replaced = self
            .write_temp(&temp, &content)
            .map_err(|e| write_error(&temp, e.to_string()))
            .and_then(|()| {
                fs::rename(&temp, &self.path)
                    .map_err(|e| write_error(&self.path, format!("atomic rename: {e}")))
            });

        if let Err(e) = replaced {
            match fs::remove_file(&temp) {
                Err(cleanup) if cleanup.kind() != ErrorKind::NotFound => {
                    tracing::warn!(
                        path = %temp.display(),
                        error = %cleanup,
                        "Failed to remove temporary credential file"
                    );
                }
                _ => {}
            }
            return Err(e);
        }

        self.restrict_permissions()
            .map_err(|e| write_error(&self.path, format!("set permissions: {e}")))?;

        tracing::debug!(path = %self.path.display(), "Credential saved");
        Ok(())
    }

    fn location(&self) -> String {
        Self::display(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn credential(access: &str) -> Credential {
        Credential::new(access, "R1", 3600, 1_700_003_600)
    }

    fn store_in(dir: &TempDir) -> FileTokenStore {
        FileTokenStore::new(dir.path().join("token.json"))
    }

    #[test]
    fn absent_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store_in(&dir).load().unwrap(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&credential("A1")).unwrap();

        assert_eq!(store.load().unwrap(), Some(credential("A1")));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn malformed_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{\"access_token\": ").unwrap();

        assert!(matches!(
            store.load(),
            Err(TokenStoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn empty_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "  \n").unwrap();

        assert!(matches!(
            store.load(),
            Err(TokenStoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn record_without_refresh_token_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), json!({"access_token": "A1"}).to_string()).unwrap();

        assert!(matches!(
            store.load(),
            Err(TokenStoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn unreadable_path_is_read_error() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path());

        assert!(matches!(store.load(), Err(TokenStoreError::Read { .. })));
    }

    #[test]
    fn legacy_record_without_exp_loads() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            json!({"access_token": "A1", "refresh_token": "R1", "expires_in": 3600}).to_string(),
        )
        .unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.exp, None);
        assert_eq!(loaded.expires_in, 3600);
    }

    #[test]
    fn extra_fields_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            json!({
                "access_token": "A1",
                "refresh_token": "R1",
                "expires_in": 3600,
                "exp": 1_700_003_600,
                "token_type": "Bearer",
            })
            .to_string(),
        )
        .unwrap();

        let loaded = store.load().unwrap().unwrap();
        store.save(&loaded).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["token_type"], "Bearer");
        assert_eq!(raw["exp"], 1_700_003_600);
    }

    #[test]
    fn interrupted_save_leaves_previous_record() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&credential("A1")).unwrap();

        // Crash after writing the temp file, before the rename.
        fs::write(store.temp_path(), "{\"access_token\": \"A2\", \"ref").unwrap();

        assert_eq!(store.load().unwrap(), Some(credential("A1")));

        store.save(&credential("A3")).unwrap();
        assert_eq!(store.load().unwrap(), Some(credential("A3")));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let canonical = dir.path().join("token.json");
        fs::create_dir(&canonical).unwrap();
        fs::write(canonical.join("occupied"), "x").unwrap();
        let store = FileTokenStore::new(&canonical);

        let err = store.save(&credential("A1")).unwrap_err();

        assert!(matches!(err, TokenStoreError::Write { .. }));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested/deeper/token.json"));

        store.save(&credential("A1")).unwrap();

        assert_eq!(store.load().unwrap(), Some(credential("A1")));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{}").unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&credential("A1")).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn temp_path_appends_suffix() {
        let store = FileTokenStore::new("/home/user/.ibkr_token.json");
        assert_eq!(
            store.temp_path(),
            PathBuf::from("/home/user/.ibkr_token.json.tmp")
        );
        assert_eq!(store.location(), "/home/user/.ibkr_token.json");
    }
}
