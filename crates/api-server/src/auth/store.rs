//! Credential storage
//!
//! File-backed store for login credentials, kept separate from the user
//! profile store so password hashes never travel through profile endpoints.

use std::collections::HashMap;
use std::path::PathBuf;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;

use tm_core::user::UserId;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Credentials already exist for {0}")]
    AlreadyRegistered(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRecord {
    user_id: UserId,
    email: String,
    password_hash: String,
}

/// File-backed credential store
pub struct CredentialStore {
    path: PathBuf,
    cache: RwLock<HashMap<UserId, CredentialRecord>>,
}

impl CredentialStore {
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| AuthError::Storage(format!("Failed to read credentials: {}", e)))?;
            let records: Vec<CredentialRecord> = serde_json::from_str(&content)
                .map_err(|e| AuthError::Storage(format!("Failed to parse credentials: {}", e)))?;
            records.into_iter().map(|r| (r.user_id, r)).collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    async fn persist(&self) -> Result<(), AuthError> {
        let cache = self.cache.read().await;
        let records: Vec<&CredentialRecord> = cache.values().collect();
        let content = serde_json::to_string_pretty(&records)
            .map_err(|e| AuthError::Storage(format!("Failed to serialize credentials: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::Storage(format!("Failed to create data dir: {}", e)))?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| AuthError::Storage(format!("Failed to write credentials: {}", e)))
    }

    /// Register credentials for a new account
    pub async fn register(
        &self,
        user_id: UserId,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        {
            let mut cache = self.cache.write().await;
            if cache
                .values()
                .any(|r| r.email.eq_ignore_ascii_case(email))
            {
                return Err(AuthError::AlreadyRegistered(email.to_string()));
            }
            cache.insert(
                user_id,
                CredentialRecord {
                    user_id,
                    email: email.to_string(),
                    password_hash: hash_password(password),
                },
            );
        }
        self.persist().await
    }

    /// Check a login attempt, returning the account's user id on success
    pub async fn verify_login(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let cache = self.cache.read().await;
        let record = cache
            .values()
            .find(|r| r.email.eq_ignore_ascii_case(email))
            .ok_or(AuthError::InvalidCredentials)?;
        if verify_password(&record.password_hash, password) {
            Ok(record.user_id)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Drop credentials when an account is deleted
    pub async fn remove(&self, user_id: UserId) -> Result<bool, AuthError> {
        let removed = {
            let mut cache = self.cache.write().await;
            cache.remove(&user_id).is_some()
        };
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }
}

fn hash_password(password: &str) -> String {
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    format!(
        "v1${}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest)
    )
}

fn verify_password(stored_hash: &str, password: &str) -> bool {
    let mut parts = stored_hash.split('$');
    let version = parts.next();
    let encoded_salt = parts.next();
    let encoded_digest = parts.next();
    let (Some(encoded_salt), Some(encoded_digest)) = (encoded_salt, encoded_digest) else {
        return false;
    };
    if version != Some("v1") {
        return false;
    }

    let Ok(salt) = URL_SAFE_NO_PAD.decode(encoded_salt) else {
        return false;
    };

    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    URL_SAFE_NO_PAD.encode(digest) == encoded_digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter2");
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));
        assert!(!verify_password("garbage", "hunter2"));
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let temp_dir = TempDir::new().unwrap();
        let store = CredentialStore::new(temp_dir.path().join("credentials.json"))
            .await
            .unwrap();

        let user_id = UserId::new();
        store
            .register(user_id, "ana@example.com", "secret")
            .await
            .unwrap();

        let found = store.verify_login("ANA@example.com", "secret").await.unwrap();
        assert_eq!(found, user_id);

        assert!(store.verify_login("ana@example.com", "wrong").await.is_err());
        assert!(store
            .register(UserId::new(), "ana@example.com", "other")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_remove_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let store = CredentialStore::new(temp_dir.path().join("credentials.json"))
            .await
            .unwrap();

        let user_id = UserId::new();
        store
            .register(user_id, "gone@example.com", "secret")
            .await
            .unwrap();

        assert!(store.remove(user_id).await.unwrap());
        assert!(store
            .verify_login("gone@example.com", "secret")
            .await
            .is_err());
    }
}
