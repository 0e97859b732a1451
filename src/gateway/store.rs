//! Durable key-value storage for the credential pair and the signed-in user.
//!
//! Three fixed keys are used: `accessToken`, `refreshToken` and `user` (JSON).
//! Multi-key writes and clears go through a single store call so they land
//! together. Token values are handed out as `SecretString` and never logged.

use crate::{errors::AppError, features::auth::types::User};
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{debug, instrument};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

const ALL_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

/// Process-wide string store. `set_many` and `remove_many` must apply all of
/// their entries or none of them.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), AppError>;
    fn remove_many(&self, keys: &[&str]) -> Result<(), AppError>;
}

/// Non-durable store, used by tests and one-shot sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), AppError> {
        let mut map = self.lock();
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), AppError> {
        let mut map = self.lock();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// JSON-object file that survives restarts. Every mutation rewrites the whole
/// object to a sibling temp file and renames it over the original.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Storage(format!(
                    "Corrupt credential store {}: {err}",
                    self.path.display()
                ))
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(AppError::Storage(format!(
                "Failed to read {}: {err}",
                self.path.display()
            ))),
        }
    }

    fn write(&self, map: &BTreeMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                AppError::Storage(format!("Failed to create {}: {err}", parent.display()))
            })?;
        }

        let payload = serde_json::to_string_pretty(map)
            .map_err(|err| AppError::Storage(format!("Failed to encode credentials: {err}")))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)
            .map_err(|err| AppError::Storage(format!("Failed to write {}: {err}", tmp.display())))?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path).map_err(|err| {
            AppError::Storage(format!(
                "Failed to replace {}: {err}",
                self.path.display()
            ))
        })?;

        debug!(path = %self.path.display(), keys = map.len(), "credential store written");

        Ok(())
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let _guard = self.guard();
        Ok(self.read()?.remove(key))
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), AppError> {
        let _guard = self.guard();
        let mut map = self.read()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.write(&map)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), AppError> {
        let _guard = self.guard();
        let mut map = self.read()?;
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        if map.len() == before && !self.path.exists() {
            return Ok(());
        }
        self.write(&map)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), AppError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|err| AppError::Storage(format!("Failed to chmod {}: {err}", path.display())))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), AppError> {
    Ok(())
}

/// Typed view over the credential keys.
#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("Credentials(..)")
    }
}

impl Credentials {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn access_token(&self) -> Result<Option<SecretString>, AppError> {
        self.secret(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<SecretString>, AppError> {
        self.secret(REFRESH_TOKEN_KEY)
    }

    /// True when an access token is stored; the signal the route gate uses.
    pub fn is_authenticated(&self) -> Result<bool, AppError> {
        Ok(self.access_token()?.is_some())
    }

    /// Stored user, if any. An unreadable value is treated as absent.
    pub fn user(&self) -> Result<Option<User>, AppError> {
        Ok(self
            .store
            .get(USER_KEY)?
            .and_then(|raw| serde_json::from_str(&raw).ok()))
    }

    /// Writes the full login result in one store call.
    #[instrument(skip_all)]
    pub fn save_session(
        &self,
        access_token: &SecretString,
        refresh_token: &SecretString,
        user: &User,
    ) -> Result<(), AppError> {
        let user = serde_json::to_string(user)
            .map_err(|err| AppError::Serialization(format!("Failed to encode user: {err}")))?;
        self.store.set_many(&[
            (ACCESS_TOKEN_KEY, access_token.expose_secret()),
            (REFRESH_TOKEN_KEY, refresh_token.expose_secret()),
            (USER_KEY, user.as_str()),
        ])
    }

    /// Overwrites the token pair after a refresh; the stored user is kept.
    #[instrument(skip_all)]
    pub fn save_tokens(
        &self,
        access_token: &SecretString,
        refresh_token: &SecretString,
    ) -> Result<(), AppError> {
        self.store.set_many(&[
            (ACCESS_TOKEN_KEY, access_token.expose_secret()),
            (REFRESH_TOKEN_KEY, refresh_token.expose_secret()),
        ])
    }

    /// Removes both tokens and the user.
    #[instrument(skip_all)]
    pub fn clear(&self) -> Result<(), AppError> {
        self.store.remove_many(&ALL_KEYS)
    }

    fn secret(&self, key: &str) -> Result<Option<SecretString>, AppError> {
        Ok(self
            .store
            .get(key)?
            .filter(|value| !value.is_empty())
            .map(SecretString::from))
    }
}
