use crate::error::AuthError;
use jobtrack_api::{CredentialSource, UserProfile};
use secrecy::SecretString;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub const TOKEN_KEY: &str = "user-auth-code";
pub const USER_KEY: &str = "user_data";

type StorageMap = BTreeMap<String, String>;

/// Credential and cached profile, persisted per API origin.
///
/// The backing file is a flat string-to-string JSON map, like browser local
/// storage. Every write replaces the whole file, so readers never see a
/// half-applied update.
pub struct TokenStore {
    storage_path: PathBuf,
    write_lock: Mutex<()>,
}

impl TokenStore {
    pub fn new(origin: &str) -> Result<Self, AuthError> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| AuthError::Configuration("Could not find cache directory".to_string()))?
            .join("jobtrack");

        Self::in_dir(&cache_dir, origin)
    }

    pub fn in_dir(dir: &Path, origin: &str) -> Result<Self, AuthError> {
        // Create cache directory if it doesn't exist
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                AuthError::TokenStorage(format!("Failed to create cache directory: {}", e))
            })?;
        }

        let file_name = format!("local_storage-{}.json", sanitize_origin(origin));
        Ok(Self::at_path(dir.join(file_name)))
    }

    pub fn at_path(storage_path: PathBuf) -> Self {
        Self {
            storage_path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    pub fn set_token(&self, token: &str) -> Result<(), AuthError> {
        self.update(|map| {
            map.insert(TOKEN_KEY.to_string(), token.to_string());
        })
    }

    pub fn get_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.read_map()?.remove(TOKEN_KEY))
    }

    pub fn set_user(&self, user: &UserProfile) -> Result<(), AuthError> {
        let json = serde_json::to_string(user)?;
        self.update(|map| {
            map.insert(USER_KEY.to_string(), json);
        })
    }

    pub fn get_user(&self) -> Result<Option<UserProfile>, AuthError> {
        let Some(json) = self.read_map()?.remove(USER_KEY) else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached user profile: {}", e);
                Ok(None)
            }
        }
    }

    /// True iff a credential is stored. Unreadable storage counts as signed out.
    pub fn is_authenticated(&self) -> bool {
        match self.get_token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::warn!("Failed to read token storage: {}", e);
                false
            }
        }
    }

    /// Remove the credential and the cached profile in a single write.
    pub fn clear(&self) -> Result<(), AuthError> {
        self.update(|map| {
            map.remove(TOKEN_KEY);
            map.remove(USER_KEY);
        })
    }

    fn read_map(&self) -> Result<StorageMap, AuthError> {
        if !self.storage_path.exists() {
            return Ok(StorageMap::new());
        }

        let json = fs::read_to_string(&self.storage_path)
            .map_err(|e| AuthError::TokenStorage(format!("Failed to read storage: {}", e)))?;

        Ok(parse_map(&json))
    }

    fn update<F>(&self, update_fn: F) -> Result<(), AuthError>
    where
        F: FnOnce(&mut StorageMap),
    {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut map = self.read_map()?;
        update_fn(&mut map);
        self.write_map(&map)
    }

    fn write_map(&self, map: &StorageMap) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(map)?;
        let tmp_path = self.storage_path.with_extension("json.tmp");

        fs::write(&tmp_path, json)
            .map_err(|e| AuthError::TokenStorage(format!("Failed to write storage: {}", e)))?;

        // Set permissions to 0600 (read/write for owner only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&tmp_path)
                .map_err(|e| {
                    AuthError::TokenStorage(format!("Failed to get file permissions: {}", e))
                })?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&tmp_path, perms).map_err(|e| {
                AuthError::TokenStorage(format!("Failed to set file permissions: {}", e))
            })?;
        }

        fs::rename(&tmp_path, &self.storage_path)
            .map_err(|e| AuthError::TokenStorage(format!("Failed to replace storage: {}", e)))
    }
}

impl CredentialSource for TokenStore {
    fn credential(&self) -> Option<SecretString> {
        match self.get_token() {
            Ok(token) => token.map(SecretString::from),
            Err(e) => {
                tracing::warn!("Failed to read credential: {}", e);
                None
            }
        }
    }
}

// Non-string values are dropped; an unreadable file reads as empty so the
// next write replaces it.
fn parse_map(json: &str) -> StorageMap {
    if json.trim().is_empty() {
        return StorageMap::new();
    }

    match serde_json::from_str(json) {
        Ok(Value::Object(entries)) => entries
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(value) => Some((key, value)),
                _ => {
                    tracing::warn!(%key, "Ignoring non-string value in token storage");
                    None
                }
            })
            .collect(),
        Ok(_) => {
            tracing::warn!("Token storage is not a JSON object, treating it as empty");
            StorageMap::new()
        }
        Err(e) => {
            tracing::warn!("Token storage is unreadable, treating it as empty: {}", e);
            StorageMap::new()
        }
    }
}

fn sanitize_origin(origin: &str) -> String {
    origin
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
