//! Credential storage for the search token and the explanation API key.
//!
//! The pipeline only sees the [`CredentialStore`] trait, so the binary can
//! hand it a file-backed store while tests use [`MemoryCredentialStore`].

use std::collections::{BTreeMap, HashMap};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::CredentialError;

/// Store key holding the code search token.
pub const SEARCH_TOKEN_KEY: &str = "githubToken";

/// Store key holding the generative-text API key.
pub const EXPLANATION_KEY_KEY: &str = "geminiKey";

/// Persisted key/value settings.
pub trait CredentialStore: Send + Sync {
    /// Fetch the requested keys. Absent keys are missing from the map.
    fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>, CredentialError>;

    /// Insert or replace the given entries, leaving other keys untouched.
    fn set(&self, entries: HashMap<String, String>) -> Result<(), CredentialError>;
}

/// A validated pair of credentials, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    search_token: String,
    explanation_api_key: String,
}

impl Credentials {
    /// Trim both values and reject the pair if either ends up empty.
    pub fn new(
        search_token: impl AsRef<str>,
        explanation_api_key: impl AsRef<str>,
    ) -> Result<Self, CredentialError> {
        let search_token = search_token.as_ref().trim();
        let explanation_api_key = explanation_api_key.as_ref().trim();
        if search_token.is_empty() || explanation_api_key.is_empty() {
            return Err(CredentialError::Incomplete);
        }
        Ok(Self {
            search_token: search_token.to_string(),
            explanation_api_key: explanation_api_key.to_string(),
        })
    }

    pub fn search_token(&self) -> &str {
        &self.search_token
    }

    pub fn explanation_api_key(&self) -> &str {
        &self.explanation_api_key
    }
}

/// Credentials as currently stored; either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    pub search_token: Option<String>,
    pub explanation_api_key: Option<String>,
}

/// Write both credentials to the store.
pub fn save_credentials(
    store: &dyn CredentialStore,
    credentials: &Credentials,
) -> Result<(), CredentialError> {
    let entries = HashMap::from([
        (
            SEARCH_TOKEN_KEY.to_string(),
            credentials.search_token.clone(),
        ),
        (
            EXPLANATION_KEY_KEY.to_string(),
            credentials.explanation_api_key.clone(),
        ),
    ]);
    store.set(entries)
}

/// Read both credentials. Empty values count as absent.
pub fn load_credentials(store: &dyn CredentialStore) -> Result<StoredCredentials, CredentialError> {
    let mut values = store.get(&[SEARCH_TOKEN_KEY, EXPLANATION_KEY_KEY])?;
    let mut take = |key: &str| values.remove(key).filter(|v| !v.trim().is_empty());
    Ok(StoredCredentials {
        search_token: take(SEARCH_TOKEN_KEY),
        explanation_api_key: take(EXPLANATION_KEY_KEY),
    })
}

/// Render a secret for display without revealing it.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count < 8 {
        return "*".repeat(count);
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}…")
}

/// In-memory store, used for tests and one-shot embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>, CredentialError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    fn set(&self, new_entries: HashMap<String, String>) -> Result<(), CredentialError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.extend(new_entries);
        Ok(())
    }
}

/// TOML key/value file on disk.
///
/// A missing file reads as an empty store; `set` creates it (and its parent
/// directories) on first write. A file that no longer parses is replaced by
/// the next `set`. On Unix the file is only ever written with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string(entries)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // `mode` only applies on creation
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>, CredentialError> {
        let mut entries = self.read_all()?;
        Ok(keys
            .iter()
            .filter_map(|k| entries.remove(*k).map(|v| (k.to_string(), v)))
            .collect())
    }

    fn set(&self, new_entries: HashMap<String, String>) -> Result<(), CredentialError> {
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(CredentialError::Parse(e)) => {
                tracing::warn!(
                    "Replacing unreadable credential store {}: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.extend(new_entries);
        self.write_all(&entries)?;
        tracing::debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_credentials_require_both_values() {
        assert!(matches!(
            Credentials::new("  ", "key"),
            Err(CredentialError::Incomplete)
        ));
        assert!(matches!(
            Credentials::new("token", ""),
            Err(CredentialError::Incomplete)
        ));

        let creds = Credentials::new(" ghp_abc \n", "\tAIza123 ").unwrap();
        assert_eq!(creds.search_token(), "ghp_abc");
        assert_eq!(creds.explanation_api_key(), "AIza123");
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        assert_eq!(load_credentials(&store).unwrap(), StoredCredentials::default());

        let creds = Credentials::new("token", "key").unwrap();
        save_credentials(&store, &creds).unwrap();

        let loaded = load_credentials(&store).unwrap();
        assert_eq!(loaded.search_token.as_deref(), Some("token"));
        assert_eq!(loaded.explanation_api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_load_treats_empty_as_absent() {
        let store = MemoryCredentialStore::with_entries([
            (SEARCH_TOKEN_KEY, ""),
            (EXPLANATION_KEY_KEY, "key"),
        ]);
        let loaded = load_credentials(&store).unwrap();
        assert!(loaded.search_token.is_none());
        assert_eq!(loaded.explanation_api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nope.toml"));
        assert!(store.get(&[SEARCH_TOKEN_KEY]).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_set_merges_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.toml");
        let store = FileCredentialStore::new(&path);

        store
            .set(HashMap::from([("other".to_string(), "value".to_string())]))
            .unwrap();
        save_credentials(&store, &Credentials::new("token", "key").unwrap()).unwrap();

        let values = store.get(&["other", SEARCH_TOKEN_KEY, "missing"]).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values["other"], "value");
        assert_eq!(values[SEARCH_TOKEN_KEY], "token");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        let store = FileCredentialStore::new(&path);
        save_credentials(&store, &Credentials::new("token", "key").unwrap()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileCredentialStore::new(&path);
        save_credentials(&store, &Credentials::new("token", "key").unwrap()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.get(&[SEARCH_TOKEN_KEY]).unwrap()[SEARCH_TOKEN_KEY], "token");
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        let store = FileCredentialStore::new(&path);
        assert!(matches!(
            store.get(&[SEARCH_TOKEN_KEY]),
            Err(CredentialError::Parse(_))
        ));
    }

    #[test]
    fn test_file_store_set_replaces_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        let store = FileCredentialStore::new(&path);

        save_credentials(&store, &Credentials::new("token", "key").unwrap()).unwrap();

        let loaded = load_credentials(&store).unwrap();
        assert_eq!(loaded.search_token.as_deref(), Some("token"));
        assert_eq!(loaded.explanation_api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("ghp_1234567890"), "ghp_…");
        assert_eq!(mask_secret(""), "");
    }
}
