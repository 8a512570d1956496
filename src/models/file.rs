use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conversion lifecycle of a tracked file. Transitions are driven entirely by
/// the remote service; the client only ever observes them through polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Visual treatment for a status row. A fifth status must fail to compile
/// here rather than fall through a string match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    Spinner,
    SpinnerAccent,
    Check,
    Cross,
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Pending => "Pending",
            FileStatus::Processing => "Processing",
            FileStatus::Completed => "Completed",
            FileStatus::Failed => "Failed",
        }
    }

    pub fn indicator(&self) -> StatusIndicator {
        match self {
            FileStatus::Pending => StatusIndicator::Spinner,
            FileStatus::Processing => StatusIndicator::SpinnerAccent,
            FileStatus::Completed => StatusIndicator::Check,
            FileStatus::Failed => StatusIndicator::Cross,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Completed | FileStatus::Failed)
    }

    /// Content-dependent actions (preview, download) are only meaningful for
    /// completed files.
    pub fn is_completed(&self) -> bool {
        matches!(self, FileStatus::Completed)
    }
}

/// Structured metadata extracted by the conversion backend. Every field is
/// optional; which ones are populated depends on the source format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<PositionAnnotation>>,
}

/// Positional annotation for a piece of extracted content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionAnnotation {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// One tracked document. The id is server-assigned and immutable; the client
/// never patches individual fields, it only replaces whole lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionFile {
    pub id: String,
    pub filename: String,
    pub original_type: String,
    pub file_size: u64,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<u64>,
}
