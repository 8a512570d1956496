//! Filename and size helpers shared by the validation policy and the
//! multipart upload path.

/// Lowercased extension of `filename`, or an empty string when there is none.
pub fn file_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// MIME type for the multipart part, by extension. Unknown extensions fall
/// back to `application/octet-stream`.
pub fn mime_type(filename: &str) -> &'static str {
    match file_extension(filename).as_str() {
        "csv" => "text/csv",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "eml" => "message/rfc822",
        "epub" => "application/epub+zip",
        "html" | "htm" => "text/html",
        "jpg" | "jpeg" => "image/jpeg",
        "md" => "text/markdown",
        "mobi" => "application/x-mobipocket-ebook",
        "ost" | "pst" => "application/vnd.ms-outlook",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "rst" => "text/x-rst",
        "rtf" => "application/rtf",
        "sql" => "application/sql",
        "tar" => "application/x-tar",
        "tsv" => "text/tab-separated-values",
        "txt" => "text/plain",
        "wav" => "audio/wav",
        "xls" => "application/vnd.ms-excel",
        _ => "application/octet-stream",
    }
}

/// Human-readable byte count: `1536` formats as `"1.5 KB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}
