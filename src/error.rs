//! Error types for the pdf2invoice library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PipelineError`] — **Fatal**: the invocation cannot proceed at all
//!   (required external tool missing, source path not found, bad
//!   configuration). Returned as `Err(PipelineError)` from the top-level
//!   batch functions and turned into a non-zero exit by the CLI.
//!
//! * [`DocumentError`] — **Non-fatal**: a single document failed (OCR glitch,
//!   enhancement timeout, undecodable text file) while the rest of the batch
//!   is fine. Converted into a [`crate::batch::DocumentReport`] at the
//!   document-processing boundary so callers can inspect partial success
//!   rather than losing a whole batch to one bad scan.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! document failure, log and continue, or collect everything for a post-run
//! summary.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2invoice library.
///
/// Document-level failures use [`DocumentError`] and are stored in
/// [`crate::batch::DocumentReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Setup errors ──────────────────────────────────────────────────────
    /// The PDF enhancer toolchain is not installed or not runnable.
    #[error("ocrmypdf is not available: {detail}\nInstall with: pip install ocrmypdf (also requires Tesseract and Ghostscript)")]
    EnhancerUnavailable { detail: String },

    /// A required OCR binary is missing from PATH.
    #[error("OCR tool '{tool}' is not available.\n{hint}")]
    OcrUnavailable { tool: String, hint: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Source file or directory was not found at the given path.
    #[error("Source not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// The path exists but is not a directory where one was required.
    #[error("Not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Directory enumeration failed.
    #[error("Failed to read directory '{path}': {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// Stored inside [`crate::batch::DocumentReport`] when a document fails.
/// The overall batch continues regardless.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// ocrmypdf exited non-zero for this document.
    #[error("{name}: enhancement failed: {detail}")]
    Enhance { name: String, detail: String },

    /// Enhancement exceeded the configured per-document timeout.
    #[error("{name}: enhancement timed out after {secs}s (file may be too large)")]
    EnhanceTimeout { name: String, secs: u64 },

    /// Rasterisation or character recognition failed.
    #[error("{name}: OCR failed: {detail}")]
    Ocr { name: String, detail: String },

    /// The source text file could not be read or decoded as UTF-8.
    #[error("{name}: read failed: {detail}")]
    Read { name: String, detail: String },

    /// Serialising the extracted record failed.
    #[error("{name}: parse failed: {detail}")]
    Parse { name: String, detail: String },

    /// The record or text output could not be written.
    #[error("{name}: write failed: {detail}")]
    Write { name: String, detail: String },

    /// Network failure sending this file to the collector.
    #[error("{name}: delivery failed: {detail}")]
    Delivery { name: String, detail: String },

    /// The delivery request exceeded its timeout.
    #[error("{name}: delivery timed out after {secs}s")]
    DeliveryTimeout { name: String, secs: u64 },
}

impl DocumentError {
    /// The source document this error belongs to.
    pub fn document(&self) -> &str {
        match self {
            DocumentError::Enhance { name, .. }
            | DocumentError::EnhanceTimeout { name, .. }
            | DocumentError::Ocr { name, .. }
            | DocumentError::Read { name, .. }
            | DocumentError::Parse { name, .. }
            | DocumentError::Write { name, .. }
            | DocumentError::Delivery { name, .. }
            | DocumentError::DeliveryTimeout { name, .. } => name,
        }
    }
}
