//! Per-representation content retrieval state machine.
//!
//! Every change of selected file or representation re-enters `loading` and
//! issues a fresh fetch; a previously viewed representation is never served
//! from cache. A generation counter discards late responses for superseded
//! fetches so a fast double-switch cannot let stale content overwrite newer
//! state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::models::ContentView;

/// Snapshot of the retrieval state for the presentation layer.
///
/// `loading == true` is the loading state; `error.is_some()` the errored
/// state (no content is shown alongside an error); otherwise loaded.
#[derive(Debug, Clone)]
pub struct ContentState {
    pub file_id: Option<String>,
    pub view: ContentView,
    pub markdown: Option<String>,
    pub json: Option<String>,
    /// Representation-independent, shared across both views.
    pub metadata: Option<Value>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for ContentState {
    fn default() -> Self {
        ContentState {
            file_id: None,
            view: ContentView::Markdown,
            markdown: None,
            json: None,
            metadata: None,
            loading: true,
            error: None,
        }
    }
}

pub struct ContentViewer {
    client: Arc<ApiClient>,
    state: Mutex<ContentState>,
    generation: AtomicU64,
}

impl ContentViewer {
    pub fn new(client: Arc<ApiClient>) -> Self {
        ContentViewer {
            client,
            state: Mutex::new(ContentState::default()),
            generation: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ContentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ContentState {
        self.lock().clone()
    }

    /// Re-enters loading and fetches content for the given file and view.
    ///
    /// Starting a newer `show` supersedes any fetch still in flight; the
    /// superseded response is discarded when it lands.
    pub async fn show(&self, file_id: &str, view: ContentView) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
            state.view = view;
            if state.file_id.as_deref() != Some(file_id) {
                // Content cached for another file must not bleed through.
                state.markdown = None;
                state.json = None;
                state.metadata = None;
                state.file_id = Some(file_id.to_string());
            }
        }

        let result = self.client.get_file_content(file_id, view).await;

        let mut state = self.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(file_id = %file_id, view = %view, "Discarding stale content response");
            return;
        }

        match result {
            Ok(payload) => {
                match view {
                    ContentView::Markdown => state.markdown = Some(payload.content),
                    ContentView::Json => state.json = Some(payload.content),
                }
                state.metadata = Some(payload.metadata);
                state.loading = false;
                state.error = None;
            }
            Err(e) => {
                warn!(file_id = %file_id, view = %view, error = %e, "Content fetch failed");
                state.markdown = None;
                state.json = None;
                state.metadata = None;
                state.loading = false;
                state.error = Some(e.to_string());
            }
        }
    }

    /// Switches the active representation for the current file, always
    /// re-fetching even if that representation was viewed before.
    pub async fn set_view(&self, view: ContentView) {
        let file_id = self.lock().file_id.clone();
        match file_id {
            Some(id) => self.show(&id, view).await,
            None => self.lock().view = view,
        }
    }

    /// Content of the active representation, prepared for display. The JSON
    /// view is re-indented; malformed JSON falls back to the raw text rather
    /// than failing or blanking the view.
    pub fn display_content(&self) -> Option<String> {
        let state = self.lock();
        match state.view {
            ContentView::Markdown => state.markdown.clone(),
            ContentView::Json => state.json.as_deref().map(pretty_print_json),
        }
    }
}

/// Two-space re-indentation of a JSON document; returns the input unchanged
/// when it does not parse.
pub fn pretty_print_json(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}
