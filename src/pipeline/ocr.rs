//! OCR: rasterise PDF pages and recognise their text.
//!
//! ## Why shell out instead of binding a library?
//!
//! Tesseract and Poppler are installed on effectively every machine this
//! pipeline targets, and subprocess isolation means a crash on one corrupt
//! PDF cannot take the batch down with it. Pages are rasterised to PNG in a
//! [`tempfile::TempDir`] that cleans itself up even on early return.
//!
//! Page texts are joined with `--- Page N ---` markers so a human reading
//! the raw text dump can still tell where a value came from; the extraction
//! engine treats the markers as just another line that matches no keyword.

use crate::error::{DocumentError, PipelineError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

use super::enhance::file_name;

/// Recognises the text of one PDF document.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Verify the required binaries exist before any batch work starts.
    async fn ensure_available(&self) -> Result<(), PipelineError>;

    /// Extract the raw text of every page of `pdf`.
    async fn recognize(&self, pdf: &Path) -> Result<String, DocumentError>;
}

/// OCR engine backed by the `pdftoppm` and `tesseract` command-line tools.
pub struct TesseractEngine {
    language: String,
    dpi: u32,
}

impl TesseractEngine {
    pub fn new(language: impl Into<String>, dpi: u32) -> Self {
        Self {
            language: language.into(),
            dpi,
        }
    }

    /// Rasterise every page of `pdf` into `dir` and return the page images
    /// in page order (pdftoppm zero-pads page numbers, so the lexicographic
    /// sort is the page sort).
    async fn rasterize(&self, pdf: &Path, dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
        let name = file_name(pdf);
        let prefix = dir.join("page");

        let out = Command::new("pdftoppm")
            .args(["-png", "-r", &self.dpi.to_string()])
            .arg(pdf)
            .arg(&prefix)
            .output()
            .await
            .map_err(|e| DocumentError::Ocr {
                name: name.clone(),
                detail: format!("pdftoppm: {e}"),
            })?;

        if !out.status.success() {
            return Err(DocumentError::Ocr {
                name,
                detail: format!(
                    "pdftoppm failed: {}",
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            });
        }

        let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| DocumentError::Ocr {
                name: name.clone(),
                detail: e.to_string(),
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        pages.sort();

        if pages.is_empty() {
            return Err(DocumentError::Ocr {
                name,
                detail: "pdftoppm produced no page images".to_string(),
            });
        }
        Ok(pages)
    }

    async fn recognize_page(&self, image: &Path, name: &str) -> Result<String, DocumentError> {
        let out = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .await
            .map_err(|e| DocumentError::Ocr {
                name: name.to_string(),
                detail: format!("tesseract: {e}"),
            })?;

        if out.status.success() {
            Ok(String::from_utf8_lossy(&out.stdout).into_owned())
        } else {
            Err(DocumentError::Ocr {
                name: name.to_string(),
                detail: format!(
                    "tesseract failed: {}",
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            })
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn ensure_available(&self) -> Result<(), PipelineError> {
        for (tool, hint) in [
            ("tesseract", "Install with: apt install tesseract-ocr"),
            ("pdftoppm", "Install with: apt install poppler-utils"),
        ] {
            let found = Command::new("which")
                .arg(tool)
                .output()
                .await
                .map(|out| out.status.success())
                .unwrap_or(false);
            if !found {
                return Err(PipelineError::OcrUnavailable {
                    tool: tool.to_string(),
                    hint: hint.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn recognize(&self, pdf: &Path) -> Result<String, DocumentError> {
        let name = file_name(pdf);
        info!("Running OCR on {}", name);

        let temp_dir = TempDir::new().map_err(|e| DocumentError::Ocr {
            name: name.clone(),
            detail: e.to_string(),
        })?;

        let pages = self.rasterize(pdf, temp_dir.path()).await?;
        debug!("{}: {} pages rasterised", name, pages.len());

        let mut text = String::new();
        for (page_num, image) in pages.iter().enumerate() {
            let page_text = self.recognize_page(image, &name).await?;
            text.push_str(&format!("\n--- Page {} ---\n", page_num + 1));
            text.push_str(&page_text);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_keeps_language_and_dpi() {
        let engine = TesseractEngine::new("spa", 300);
        assert_eq!(engine.language, "spa");
        assert_eq!(engine.dpi, 300);
    }

    #[tokio::test]
    async fn rasterize_reports_missing_pdf_per_document() {
        let engine = TesseractEngine::new("spa", 150);
        let dir = TempDir::new().unwrap();
        let err = engine
            .rasterize(Path::new("/no/such/file.pdf"), dir.path())
            .await;
        // Either pdftoppm is absent (spawn error) or it exits non-zero; both
        // must surface as a per-document OCR error.
        assert!(matches!(err, Err(DocumentError::Ocr { .. })));
    }
}
