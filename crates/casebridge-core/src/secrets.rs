//! Secret access by reference, with a process-scoped cache.
//!
//! Secrets (the webhook bearer token and outbound API credentials) are owned
//! and rotated by an external store; this module only fetches them by name.
//! Fetched values are cached for the life of the process with no background
//! refresh: after a rotation, new values are picked up by new process
//! instances, or by an explicit [`SecretCache::refresh`] from a lifecycle
//! hook. That staleness window is a documented limitation, not an accident.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use thiserror::Error;
use tracing::{debug, info};

/// Errors fetching a secret from the backing store.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("secret store I/O error: {0}")]
    Io(String),
}

/// A store that resolves secret names to values.
///
/// Implementations must not log or otherwise expose secret values.
pub trait SecretStore: Send + Sync {
    fn fetch(&self, name: &str) -> Result<String, SecretError>;
}

/// Resolves secret names against environment variables.
///
/// The name `helpdesk_webhook_bearer` maps to `CASEBRIDGE_SECRET_HELPDESK_WEBHOOK_BEARER`.
pub struct EnvSecretStore;

impl EnvSecretStore {
    fn env_var(name: &str) -> String {
        format!(
            "CASEBRIDGE_SECRET_{}",
            name.to_uppercase().replace(['-', '.'], "_")
        )
    }
}

impl SecretStore for EnvSecretStore {
    fn fetch(&self, name: &str) -> Result<String, SecretError> {
        std::env::var(Self::env_var(name)).map_err(|_| SecretError::NotFound(name.to_string()))
    }
}

/// Resolves secret names against files in a directory (mounted secrets).
///
/// The value is the trimmed file content of `<dir>/<name>`.
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl SecretStore for FileSecretStore {
    fn fetch(&self, name: &str) -> Result<String, SecretError> {
        let path = self.dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(contents.trim_end().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SecretError::NotFound(name.to_string()))
            }
            Err(e) => Err(SecretError::Io(e.to_string())),
        }
    }
}

/// Process-scoped secret cache over a [`SecretStore`].
///
/// `get` fetches on first use and serves the cached value afterwards.
pub struct SecretCache {
    store: Box<dyn SecretStore>,
    cached: RwLock<HashMap<String, String>>,
}

impl SecretCache {
    pub fn new(store: Box<dyn SecretStore>) -> Self {
        Self {
            store,
            cached: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a secret by name, caching the value for the process lifetime.
    pub fn get(&self, name: &str) -> Result<String, SecretError> {
        if let Ok(cache) = self.cached.read() {
            if let Some(value) = cache.get(name) {
                return Ok(value.clone());
            }
        }

        let value = self.store.fetch(name)?;
        debug!(secret = %name, "Secret fetched and cached");

        if let Ok(mut cache) = self.cached.write() {
            cache.insert(name.to_string(), value.clone());
        }
        Ok(value)
    }

    /// Drop all cached values so the next `get` re-reads the store.
    ///
    /// Intended for the hosting platform's lifecycle hook after a rotation.
    pub fn refresh(&self) {
        if let Ok(mut cache) = self.cached.write() {
            let dropped = cache.len();
            cache.clear();
            info!(dropped, "Secret cache refreshed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingStore {
        fetches: Arc<AtomicU32>,
    }

    impl SecretStore for CountingStore {
        fn fetch(&self, name: &str) -> Result<String, SecretError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(format!("value-of-{name}"))
        }
    }

    #[test]
    fn cache_fetches_once() {
        let fetches = Arc::new(AtomicU32::new(0));
        let cache = SecretCache::new(Box::new(CountingStore {
            fetches: Arc::clone(&fetches),
        }));

        assert_eq!(cache.get("bearer").unwrap(), "value-of-bearer");
        assert_eq!(cache.get("bearer").unwrap(), "value-of-bearer");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn file_store_reads_and_trims() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("api_token"), "s3cret\n").unwrap();

        let store = FileSecretStore::new(dir.path().to_path_buf());
        assert_eq!(store.fetch("api_token").unwrap(), "s3cret");
        assert!(matches!(
            store.fetch("missing"),
            Err(SecretError::NotFound(_))
        ));
    }

    #[test]
    fn file_store_sees_rotated_value_after_refresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bearer"), "old").unwrap();

        let cache = SecretCache::new(Box::new(FileSecretStore::new(dir.path().to_path_buf())));
        assert_eq!(cache.get("bearer").unwrap(), "old");

        std::fs::write(dir.path().join("bearer"), "new").unwrap();
        // Still cached
        assert_eq!(cache.get("bearer").unwrap(), "old");

        cache.refresh();
        assert_eq!(cache.get("bearer").unwrap(), "new");
    }

    #[test]
    fn env_var_name_mapping() {
        assert_eq!(
            EnvSecretStore::env_var("helpdesk-webhook.bearer"),
            "CASEBRIDGE_SECRET_HELPDESK_WEBHOOK_BEARER"
        );
    }
}
