//! Sequential batch upload with coarse progress milestones.
//!
//! Files are submitted one at a time, each awaited before the next begins,
//! so server-visible submission order matches batch order. The first failure
//! aborts the remaining queue; files uploaded before it stay accepted on the
//! server. Progress is synthetic (25/75/100), not a byte-level measurement.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::ConversionFile;
use crate::registry::FileRegistry;
use crate::validate::UploadPolicy;

/// One file queued for submission, already read into memory by the caller.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub filename: String,
    pub data: Bytes,
}

impl UploadCandidate {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        UploadCandidate {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Per-file outcomes of one batch, for the presentation layer to notify on.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Accepted by the server, in submission order.
    pub uploaded: Vec<ConversionFile>,
    /// Failed client-side validation; never submitted.
    pub rejected: Vec<(String, AppError)>,
    /// The first submission failure, which aborted the batch.
    pub failed: Option<(String, AppError)>,
    /// Queued after the failing file; never submitted.
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_none() && self.rejected.is_empty()
    }
}

pub struct UploadOrchestrator {
    client: Arc<ApiClient>,
    registry: Arc<FileRegistry>,
    policy: UploadPolicy,
    progress: watch::Sender<u8>,
    display_hold: Duration,
}

impl UploadOrchestrator {
    pub fn new(client: Arc<ApiClient>, registry: Arc<FileRegistry>, policy: UploadPolicy) -> Self {
        let (progress, _) = watch::channel(0);
        UploadOrchestrator {
            client,
            registry,
            policy,
            progress,
            display_hold: Duration::from_secs(1),
        }
    }

    /// How long the final progress value stays visible before resetting to 0.
    pub fn with_display_hold(mut self, hold: Duration) -> Self {
        self.display_hold = hold;
        self
    }

    /// Progress milestones in percent: 0, 25 (submission started), 75
    /// (accepted), 100 (processed), back to 0 on failure or after the hold.
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    /// Submits the batch sequentially, stopping at the first failure, then
    /// triggers one registry refresh regardless of outcome.
    pub async fn upload_batch(&self, candidates: Vec<UploadCandidate>) -> BatchReport {
        let mut report = BatchReport::default();

        // Allow-list and size-ceiling rejections never reach the wire.
        let mut queue = Vec::new();
        for candidate in candidates {
            match self
                .policy
                .check(&candidate.filename, candidate.data.len() as u64)
            {
                Ok(()) => queue.push(candidate),
                Err(e) => {
                    warn!(filename = %candidate.filename, error = %e, "File rejected before upload");
                    report.rejected.push((candidate.filename, e));
                }
            }
        }

        if queue.is_empty() {
            return report;
        }

        let _ = self.progress.send(0);

        let mut queue = queue.into_iter();
        while let Some(candidate) = queue.next() {
            let _ = self.progress.send(25);
            match self
                .client
                .upload_file(&candidate.filename, candidate.data)
                .await
            {
                Ok(file) => {
                    let _ = self.progress.send(75);
                    info!(
                        filename = %candidate.filename,
                        file_id = %file.id,
                        "Successfully uploaded file"
                    );
                    self.registry.set_selected_file_id(Some(file.id.clone()));
                    let _ = self.progress.send(100);
                    report.uploaded.push(file);
                }
                Err(e) => {
                    error!(
                        filename = %candidate.filename,
                        error = %e,
                        "Upload failed, aborting remaining batch"
                    );
                    let _ = self.progress.send(0);
                    report.failed = Some((candidate.filename, e));
                    report.skipped = queue.map(|c| c.filename).collect();
                    break;
                }
            }
        }

        // Authoritative list after the batch, whether it finished or aborted.
        self.registry.refresh_files().await;

        let progress = self.progress.clone();
        let hold = self.display_hold;
        tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            let _ = progress.send(0);
        });

        info!(
            uploaded = report.uploaded.len(),
            rejected = report.rejected.len(),
            skipped = report.skipped.len(),
            aborted = report.failed.is_some(),
            "Upload batch finished"
        );
        report
    }
}
