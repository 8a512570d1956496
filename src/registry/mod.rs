//! Session-scoped store of the known conversion file set.
//!
//! The registry owns the file list, loading flag, last error and selection,
//! and is the only component allowed to mutate them. It reconciles against
//! the server by full-list replacement: every successful refresh overwrites
//! the cached list wholesale, so deletions and new files need no special
//! handling. On a failed refresh the last good list is retained and the
//! error is surfaced.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::AppResult;
use crate::models::{ConversionFile, DeleteResponse};

/// Point-in-time copy of the registry state, for presentation consumers.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    /// Server-supplied order, never re-sorted locally.
    pub files: Vec<ConversionFile>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected_file_id: Option<String>,
}

pub struct FileRegistry {
    client: Arc<ApiClient>,
    state: Mutex<RegistrySnapshot>,
    poll: Mutex<Option<JoinHandle<()>>>,
}

impl FileRegistry {
    pub fn new(client: Arc<ApiClient>) -> Arc<Self> {
        Arc::new(FileRegistry {
            client,
            state: Mutex::new(RegistrySnapshot {
                loading: true,
                ..RegistrySnapshot::default()
            }),
            poll: Mutex::new(None),
        })
    }

    // Never held across an await.
    fn state(&self) -> MutexGuard<'_, RegistrySnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One full reconciliation pass against the server.
    ///
    /// Overlapping calls (timer vs. manual) are not de-duplicated; each runs
    /// to completion and overwrites the list, last response wins. List reads
    /// are idempotent so eventual convergence holds either way.
    pub async fn refresh_files(&self) {
        self.state().loading = true;

        match self.client.list_files().await {
            Ok(files) => {
                let mut state = self.state();
                debug!(count = files.len(), "Replacing file list from server");
                state.files = files;
                state.error = None;
                state.loading = false;
            }
            Err(e) => {
                warn!(error = %e, "File list refresh failed, keeping last known list");
                let mut state = self.state();
                state.error = Some(e.to_string());
                state.loading = false;
            }
        }
    }

    /// Starts the poll loop: an immediate refresh, then one per interval,
    /// until `stop_polling` or drop. Restarting replaces the previous loop.
    pub fn start_polling(self: &Arc<Self>, every: Duration) {
        let mut poll = self.poll.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = poll.take() {
            handle.abort();
        }

        info!(interval_ms = every.as_millis() as u64, "Starting registry polling");
        // Weak so the loop cannot keep a dropped registry alive.
        let registry = Arc::downgrade(self);
        *poll = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                // First tick completes immediately.
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.refresh_files().await;
            }
        }));
    }

    /// Deterministically cancels the poll loop. Idempotent.
    pub fn stop_polling(&self) {
        let mut poll = self.poll.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = poll.take() {
            info!("Stopping registry polling");
            handle.abort();
        }
    }

    /// Pure local state change; no network effect.
    pub fn set_selected_file_id(&self, id: Option<String>) {
        self.state().selected_file_id = id;
    }

    pub fn selected_file_id(&self) -> Option<String> {
        self.state().selected_file_id.clone()
    }

    pub fn files(&self) -> Vec<ConversionFile> {
        self.state().files.clone()
    }

    pub fn file(&self, file_id: &str) -> Option<ConversionFile> {
        self.state().files.iter().find(|f| f.id == file_id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.state().clone()
    }

    /// Deletes a file on the server, clears a selection that referenced it,
    /// and forces an out-of-band refresh so the list reflects the deletion
    /// before the next timer tick.
    pub async fn delete_file(&self, file_id: &str) -> AppResult<DeleteResponse> {
        let response = self.client.delete_file(file_id).await?;

        {
            let mut state = self.state();
            if state.selected_file_id.as_deref() == Some(file_id) {
                debug!(file_id = %file_id, "Clearing selection of deleted file");
                state.selected_file_id = None;
            }
        }

        self.refresh_files().await;
        Ok(response)
    }
}

impl Drop for FileRegistry {
    fn drop(&mut self) {
        if let Some(handle) = self
            .poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
