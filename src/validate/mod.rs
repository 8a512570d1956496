//! Client-side upload validation. Rejections happen before any request is
//! issued; the server still enforces its own rules.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::util::file_extension;

/// Extensions the conversion service accepts. Not server-trusted; this only
/// saves a round trip for files that would be rejected anyway.
pub static ACCEPTED_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "csv", "docx", "eml", "epub", "html", "jpg", "jpeg", "md", "mobi", "ost", "pst", "pdf",
        "png", "rst", "rtf", "sql", "tar", "tsv", "txt", "wav", "xls",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        UploadPolicy {
            max_bytes: 100 * 1024 * 1024,
        }
    }
}

impl UploadPolicy {
    pub fn new(max_bytes: u64) -> Self {
        UploadPolicy { max_bytes }
    }

    pub fn from_config(config: &Config) -> Self {
        UploadPolicy {
            max_bytes: config.max_upload_bytes(),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Checks a candidate against the allow-list and the size ceiling.
    pub fn check(&self, filename: &str, size: u64) -> AppResult<()> {
        let extension = file_extension(filename);
        if !ACCEPTED_EXTENSIONS.contains(extension.as_str()) {
            return Err(AppError::UnsupportedFileType { extension });
        }
        if size > self.max_bytes {
            return Err(AppError::FileTooLarge {
                size: size / (1024 * 1024),
                limit: self.max_bytes / (1024 * 1024),
            });
        }
        Ok(())
    }
}
