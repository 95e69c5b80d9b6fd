//! Application state

use std::path::PathBuf;
use std::sync::Arc;

use tm_core::task::FileTaskStore;
use tm_core::user::FileUserStore;

use crate::auth::CredentialStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    task_store: FileTaskStore,
    user_store: FileUserStore,
    credential_store: CredentialStore,
}

impl AppState {
    /// Create a new AppState with the given data directory
    pub async fn new(data_dir: PathBuf) -> Result<Self, String> {
        let task_store = FileTaskStore::new(data_dir.join("tasks.json"))
            .await
            .map_err(|e| format!("task store: {e}"))?;
        let user_store = FileUserStore::new(data_dir.join("users.json"))
            .await
            .map_err(|e| format!("user store: {e}"))?;
        let credential_store = CredentialStore::new(data_dir.join("credentials.json"))
            .await
            .map_err(|e| format!("credential store: {e}"))?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                task_store,
                user_store,
                credential_store,
            }),
        })
    }

    pub fn task_store(&self) -> &FileTaskStore {
        &self.inner.task_store
    }

    pub fn user_store(&self) -> &FileUserStore {
        &self.inner.user_store
    }

    pub fn credential_store(&self) -> &CredentialStore {
        &self.inner.credential_store
    }
}
