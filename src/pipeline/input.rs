//! Input resolution: turn a user-supplied path or URL into an in-memory upload.
//!
//! Extraction works on byte buffers, so both sources end up as an
//! [`UploadedDocument`] holding the file's bytes and a display filename. No
//! content check happens here: a file that is not a PDF is reported by the
//! extraction stage as a skipped document, like any other unreadable upload.

use crate::error::SynthError;
use crate::output::UploadedDocument;
use std::path::Path;
use tracing::{debug, info};

/// Filename used when a URL has no usable last path segment.
const FALLBACK_DOWNLOAD_NAME: &str = "downloaded.pdf";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an uploaded document.
///
/// URLs are downloaded with `timeout_secs` as the whole-request timeout;
/// anything else is read as a local file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<UploadedDocument, SynthError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input.trim().is_empty() {
        Err(SynthError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<UploadedDocument, SynthError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => SynthError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => SynthError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(UploadedDocument::new(filename, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedDocument, SynthError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SynthError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let map_send_err = |e: reqwest::Error| {
        if e.is_timeout() {
            SynthError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            SynthError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(map_send_err)?;

    if !response.status().is_success() {
        return Err(SynthError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(map_send_err)?;
    let filename = filename_from_url(url);

    info!("Downloaded {} ({} bytes)", filename, bytes.len());
    Ok(UploadedDocument::new(filename, bytes.to_vec()))
}

/// Take the last URL path segment as the document's filename.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    FALLBACK_DOWNLOAD_NAME.to_string()
}
