//! PDF enhancement: add a searchable text layer to scanned PDFs.
//!
//! ## Why a separate enhancement pass?
//!
//! Downstream consumers (auditors, the delivery collector) want PDFs they can
//! search and copy from, not just our extracted records. ocrmypdf re-OCRs the
//! whole document and embeds the text layer in place, which also improves the
//! odds for any later text extraction that reads the PDF directly.
//!
//! The enhancer is an external toolchain. Its *absence* is a fatal setup
//! error — a batch must not silently produce zero enhanced files — while a
//! failure or timeout on one document is a normal per-document outcome.

use crate::error::{DocumentError, PipelineError};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Adds a searchable text layer to one PDF.
///
/// Implementations must be cheap to share behind an `Arc` across a batch.
#[async_trait]
pub trait PdfEnhancer: Send + Sync {
    /// Verify the underlying toolchain exists before any batch work starts.
    async fn ensure_available(&self) -> Result<(), PipelineError>;

    /// Enhance `input` into `output` using the given OCR language.
    ///
    /// Failures (tool non-zero exit, timeout) are per-document.
    async fn enhance(
        &self,
        input: &Path,
        output: &Path,
        language: &str,
    ) -> Result<(), DocumentError>;
}

/// Enhancer backed by the `ocrmypdf` command-line tool.
pub struct OcrMyPdfEnhancer {
    timeout: Duration,
}

impl OcrMyPdfEnhancer {
    /// `timeout` bounds a single document's enhancement; expiry is reported
    /// as [`DocumentError::EnhanceTimeout`].
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl PdfEnhancer for OcrMyPdfEnhancer {
    async fn ensure_available(&self) -> Result<(), PipelineError> {
        let probe = Command::new("ocrmypdf").arg("--version").output();
        match tokio::time::timeout(Duration::from_secs(5), probe).await {
            Ok(Ok(out)) if out.status.success() => {
                debug!(
                    "ocrmypdf available: {}",
                    String::from_utf8_lossy(&out.stdout).trim()
                );
                Ok(())
            }
            Ok(Ok(out)) => Err(PipelineError::EnhancerUnavailable {
                detail: format!("`ocrmypdf --version` exited with {}", out.status),
            }),
            Ok(Err(e)) => Err(PipelineError::EnhancerUnavailable {
                detail: e.to_string(),
            }),
            Err(_) => Err(PipelineError::EnhancerUnavailable {
                detail: "`ocrmypdf --version` did not respond within 5s".to_string(),
            }),
        }
    }

    async fn enhance(
        &self,
        input: &Path,
        output: &Path,
        language: &str,
    ) -> Result<(), DocumentError> {
        let name = file_name(input);
        info!("Enhancing {}", name);

        // --force-ocr: always re-OCR, even when a (possibly garbage) text
        // layer already exists in the scan.
        let run = Command::new("ocrmypdf")
            .args(["--language", language, "--force-ocr", "--output-type", "pdf"])
            .arg(input)
            .arg(output)
            .output();

        let out = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result.map_err(|e| DocumentError::Enhance {
                name: name.clone(),
                detail: e.to_string(),
            })?,
            Err(_) => {
                warn!("Enhancement of {} timed out", name);
                return Err(DocumentError::EnhanceTimeout {
                    name,
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if out.status.success() {
            Ok(())
        } else {
            Err(DocumentError::Enhance {
                name,
                detail: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            })
        }
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_taken_from_constructor() {
        let enhancer = OcrMyPdfEnhancer::new(600);
        assert_eq!(enhancer.timeout, Duration::from_secs(600));
    }

    #[test]
    fn file_name_falls_back_to_display() {
        assert_eq!(file_name(Path::new("a/b/c.pdf")), "c.pdf");
        assert_eq!(file_name(Path::new("/")), "/");
    }
}
