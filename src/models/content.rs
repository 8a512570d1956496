use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The two renderable output forms of a converted document. Doubles as the
/// `type` query parameter on the content endpoint and the key under which
/// fetched content is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentView {
    Markdown,
    Json,
}

impl ContentView {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentView::Markdown => "markdown",
            ContentView::Json => "json",
        }
    }
}

impl fmt::Display for ContentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converted content for one representation. `content` is required; a 2xx
/// response without it is treated as malformed. Metadata is shared across
/// representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPayload {
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}
