//! Parsing session: one document's raw OCR text, from capture to persisted
//! record.
//!
//! A [`ParseSession`] owns the text of exactly one document. It is created
//! once per OCR run (or per text file read), consumed by a single
//! [`ParseSession::persist`] call, and produces a fresh [`InvoiceRecord`]
//! that is never mutated after construction. Output lands in a
//! year-partitioned directory keyed by the source document's filename stem:
//!
//! ```text
//! <record_output_base>/<partition>/<stem>.json
//! ```
//!
//! The partition is an explicit override from the config or the year
//! auto-detected from the source path by [`partition_key_from_path`].

use crate::config::PipelineConfig;
use crate::error::DocumentError;
use crate::extract::assemble;
use crate::record::InvoiceRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fallback partition when no year appears anywhere in the source path.
pub const UNKNOWN_PARTITION: &str = "unknown";

/// Derive the output partition key from a source path.
///
/// Returns the first path component that is a four-digit year between 2000
/// and 2100 inclusive, or [`UNKNOWN_PARTITION`] when there is none. The scan
/// works on individual components, not on substrings, so `2021_backup` or a
/// five-digit id like `44350` never matches.
pub fn partition_key_from_path(path: &Path) -> String {
    for component in path.components() {
        let part = component.as_os_str().to_string_lossy();
        if part.len() == 4 && part.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(year) = part.parse::<u32>() {
                if (2000..=2100).contains(&year) {
                    return part.into_owned();
                }
            }
        }
    }
    UNKNOWN_PARTITION.to_string()
}

/// Owns one document's raw OCR text and drives extraction + persistence.
#[derive(Debug)]
pub struct ParseSession {
    source: PathBuf,
    raw_text: String,
}

impl ParseSession {
    /// Create a session from text already in memory (e.g. straight from the
    /// OCR engine). `source` identifies the originating document and drives
    /// output naming and year detection.
    pub fn new(source: impl Into<PathBuf>, raw_text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            raw_text: raw_text.into(),
        }
    }

    /// Create a session by reading a UTF-8 text file from disk.
    ///
    /// A missing file or invalid encoding is a per-document failure.
    pub async fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let raw_text =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| DocumentError::Read {
                    name: display_name(path),
                    detail: e.to_string(),
                })?;
        Ok(Self::new(path, raw_text))
    }

    /// The source document this session was created for.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Extract the structured record from the session's text.
    ///
    /// Pure and infallible: empty fields are a normal result, not an error.
    pub fn parse(&self, config: &PipelineConfig) -> InvoiceRecord {
        debug!("Parsing {}", self.source.display());
        assemble(&self.raw_text, config.context_lines)
    }

    /// Extract, serialize, and write the record to its partitioned location.
    ///
    /// Returns the record together with the path it was written to. All
    /// failures (serialisation, directory creation, write) are per-document.
    pub async fn persist(
        &self,
        config: &PipelineConfig,
    ) -> Result<(InvoiceRecord, PathBuf), DocumentError> {
        let record = self.parse(config);
        let name = display_name(&self.source);

        let json =
            serde_json::to_string_pretty(&record).map_err(|e| DocumentError::Parse {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        let partition = config
            .partition_override
            .clone()
            .unwrap_or_else(|| partition_key_from_path(&self.source));

        let output_dir = config.record_output_base.join(&partition);
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| DocumentError::Write {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let output_path = output_dir.join(format!("{stem}.json"));

        tokio::fs::write(&output_path, &json)
            .await
            .map_err(|e| DocumentError::Write {
                name,
                detail: e.to_string(),
            })?;

        info!(
            "Wrote record for {} to {}",
            self.source.display(),
            output_path.display()
        );

        Ok((record, output_path))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
