//! Batch driver: sequential per-document processing with per-item reports.
//!
//! ## Why eager sequential processing?
//!
//! Every stage of this pipeline is bottlenecked on an external tool
//! (ocrmypdf and tesseract saturate the CPU on their own; the collector
//! endpoint asks for pacing), so concurrency buys little and complicates the
//! report ordering guarantees. Documents are processed strictly one after
//! another in sorted-filename order, which makes batch output deterministic
//! and reports diffable across runs.
//!
//! Every per-document failure is caught at this boundary and converted into
//! a [`DocumentReport`] with `status: error`; nothing a single document does
//! can abort a batch. Only setup errors (missing tools, missing source
//! directory) escape as [`PipelineError`].

use crate::config::PipelineConfig;
use crate::error::{DocumentError, PipelineError};
use crate::pipeline::deliver::WebhookDelivery;
use crate::pipeline::enhance::PdfEnhancer;
use crate::pipeline::ocr::OcrEngine;
use crate::record::InvoiceRecord;
use crate::session::{partition_key_from_path, ParseSession};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ── Report types ─────────────────────────────────────────────────────────

/// Outcome of one document within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub source: PathBuf,
    pub status: ReportStatus,
    /// Path of the produced artifact (enhanced PDF, text file, or record),
    /// present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Human-readable failure description, present on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Error,
}

impl DocumentReport {
    fn success(source: &Path, output: PathBuf) -> Self {
        Self {
            source: source.to_path_buf(),
            status: ReportStatus::Success,
            output: Some(output),
            message: None,
        }
    }

    fn failure(source: &Path, error: &DocumentError) -> Self {
        Self {
            source: source.to_path_buf(),
            status: ReportStatus::Error,
            output: None,
            message: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReportStatus::Success
    }

    /// File name of the source document, for summaries.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// Aggregate counts over one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failed_files: Vec<String>,
}

impl BatchSummary {
    pub fn from_reports(reports: &[DocumentReport]) -> Self {
        let failed_files: Vec<String> = reports
            .iter()
            .filter(|r| !r.is_success())
            .map(DocumentReport::file_name)
            .collect();
        Self {
            total: reports.len(),
            successful: reports.len() - failed_files.len(),
            failed: failed_files.len(),
            failed_files,
        }
    }
}

// ── Directory listing ────────────────────────────────────────────────────

/// Files with the given extension in `dir`, sorted by name.
///
/// Sorting is what makes batch reports deterministic across runs and
/// filesystems.
fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, PipelineError> {
    if !dir.exists() {
        return Err(PipelineError::SourceNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(PipelineError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// PDF files in `dir`, sorted by name.
pub fn pdf_files_in(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    files_with_extension(dir, "pdf")
}

/// Text files in `dir`, sorted by name.
pub fn txt_files_in(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    files_with_extension(dir, "txt")
}

// ── Single-document operations ───────────────────────────────────────────

fn partition_for(config: &PipelineConfig, source: &Path) -> String {
    config
        .partition_override
        .clone()
        .unwrap_or_else(|| partition_key_from_path(source))
}

async fn prepare_output(
    base: &Path,
    partition: &str,
    file_name: &std::ffi::OsStr,
    source: &Path,
) -> Result<PathBuf, DocumentError> {
    let dir = base.join(partition);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| DocumentError::Write {
            name: source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            detail: e.to_string(),
        })?;
    Ok(dir.join(file_name))
}

/// Enhance one PDF into `<enhanced_output_base>/<partition>/<name>`.
pub async fn enhance_document(
    enhancer: &dyn PdfEnhancer,
    config: &PipelineConfig,
    pdf: &Path,
) -> Result<PathBuf, DocumentError> {
    let partition = partition_for(config, pdf);
    let file_name = pdf.file_name().unwrap_or_else(|| "document.pdf".as_ref());
    let output = prepare_output(&config.enhanced_output_base, &partition, file_name, pdf).await?;

    enhancer.enhance(pdf, &output, &config.language).await?;
    Ok(output)
}

/// OCR one PDF and write the raw text to
/// `<text_output_base>/<partition>/<stem>.txt`. Returns the text and its path.
pub async fn ocr_document(
    engine: &dyn OcrEngine,
    config: &PipelineConfig,
    pdf: &Path,
) -> Result<(String, PathBuf), DocumentError> {
    let text = engine.recognize(pdf).await?;

    let partition = partition_for(config, pdf);
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let txt_name = format!("{stem}.txt");
    let output = prepare_output(
        &config.text_output_base,
        &partition,
        txt_name.as_ref(),
        pdf,
    )
    .await?;

    tokio::fs::write(&output, &text)
        .await
        .map_err(|e| DocumentError::Write {
            name: txt_name,
            detail: e.to_string(),
        })?;

    Ok((text, output))
}

/// Parse one OCR text file into its persisted record.
pub async fn parse_document(
    config: &PipelineConfig,
    txt: &Path,
) -> Result<(InvoiceRecord, PathBuf), DocumentError> {
    let session = ParseSession::from_file(txt).await?;
    session.persist(config).await
}

/// Full chain for one PDF: enhance → OCR → parse. Returns the record path.
///
/// The parse step keys its output partition off the *original* source path,
/// not the enhanced copy, so year detection survives the detour through
/// `<enhanced_output_base>`.
pub async fn process_document(
    enhancer: &dyn PdfEnhancer,
    engine: &dyn OcrEngine,
    config: &PipelineConfig,
    pdf: &Path,
) -> Result<PathBuf, DocumentError> {
    let enhanced = enhance_document(enhancer, config, pdf).await?;
    let (text, _txt_path) = ocr_document(engine, config, &enhanced).await?;

    let session = ParseSession::new(pdf, text);
    let (_record, record_path) = session.persist(config).await?;
    Ok(record_path)
}

// ── Batch operations ─────────────────────────────────────────────────────

/// Drive `files` through `op` one at a time, producing a report per file and
/// firing progress callbacks around each.
macro_rules! sequential_batch {
    ($config:expr, $files:expr, |$file:ident| $op:expr) => {{
        let total = $files.len();
        if let Some(ref cb) = $config.progress_callback {
            cb.on_batch_start(total);
        }

        let mut reports = Vec::with_capacity(total);
        for (idx, $file) in $files.iter().enumerate() {
            let name = $file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Some(ref cb) = $config.progress_callback {
                cb.on_document_start(idx + 1, total, &name);
            }

            let report = match $op {
                Ok(output) => DocumentReport::success($file, output),
                Err(err) => {
                    warn!("{}", err);
                    DocumentReport::failure($file, &err)
                }
            };

            if let Some(ref cb) = $config.progress_callback {
                match report.status {
                    ReportStatus::Success => cb.on_document_complete(idx + 1, total, &name),
                    ReportStatus::Error => cb.on_document_error(
                        idx + 1,
                        total,
                        &name,
                        report.message.clone().unwrap_or_default(),
                    ),
                }
            }
            reports.push(report);
        }

        let summary = BatchSummary::from_reports(&reports);
        if let Some(ref cb) = $config.progress_callback {
            cb.on_batch_complete(summary.total, summary.successful);
        }
        info!(
            "Batch complete: {}/{} succeeded",
            summary.successful, summary.total
        );
        reports
    }};
}

/// Enhance every PDF in `source_dir`.
pub async fn enhance_directory(
    enhancer: &dyn PdfEnhancer,
    config: &PipelineConfig,
    source_dir: &Path,
) -> Result<Vec<DocumentReport>, PipelineError> {
    enhancer.ensure_available().await?;
    let files = pdf_files_in(source_dir)?;
    Ok(sequential_batch!(config, files, |file| enhance_document(
        enhancer, config, file
    )
    .await))
}

/// OCR every PDF in `source_dir` into text files.
pub async fn ocr_directory(
    engine: &dyn OcrEngine,
    config: &PipelineConfig,
    source_dir: &Path,
) -> Result<Vec<DocumentReport>, PipelineError> {
    engine.ensure_available().await?;
    let files = pdf_files_in(source_dir)?;
    Ok(sequential_batch!(config, files, |file| ocr_document(
        engine, config, file
    )
    .await
    .map(|(_, path)| path)))
}

/// Parse every text file in `source_dir` into persisted records.
pub async fn parse_directory(
    config: &PipelineConfig,
    source_dir: &Path,
) -> Result<Vec<DocumentReport>, PipelineError> {
    let files = txt_files_in(source_dir)?;
    Ok(sequential_batch!(config, files, |file| parse_document(
        config, file
    )
    .await
    .map(|(_, path)| path)))
}

/// Run the full enhance → OCR → parse chain over every PDF in `source_dir`.
pub async fn process_directory(
    enhancer: &dyn PdfEnhancer,
    engine: &dyn OcrEngine,
    config: &PipelineConfig,
    source_dir: &Path,
) -> Result<Vec<DocumentReport>, PipelineError> {
    enhancer.ensure_available().await?;
    engine.ensure_available().await?;
    let files = pdf_files_in(source_dir)?;
    Ok(sequential_batch!(config, files, |file| process_document(
        enhancer, engine, config, file
    )
    .await))
}

/// Deliver every PDF in `source_dir` to the collector, pacing items with the
/// configured inter-item delay.
///
/// A collector rejection (non-2xx receipt) counts as a failed document even
/// though the HTTP exchange itself succeeded.
pub async fn deliver_directory(
    delivery: &WebhookDelivery,
    config: &PipelineConfig,
    source_dir: &Path,
) -> Result<Vec<DocumentReport>, PipelineError> {
    let files = pdf_files_in(source_dir)?;
    let total = files.len();

    let mut reports = Vec::with_capacity(total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    for (idx, file) in files.iter().enumerate() {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_start(idx + 1, total, &name);
        }

        let report = match delivery.deliver(file, &HashMap::new()).await {
            Ok(receipt) if receipt.success => DocumentReport::success(file, file.clone()),
            Ok(receipt) => {
                let err = DocumentError::Delivery {
                    name: name.clone(),
                    detail: format!("collector answered HTTP {}", receipt.status_code),
                };
                warn!("{}", err);
                DocumentReport::failure(file, &err)
            }
            Err(err) => {
                warn!("{}", err);
                DocumentReport::failure(file, &err)
            }
        };

        if let Some(ref cb) = config.progress_callback {
            match report.status {
                ReportStatus::Success => cb.on_document_complete(idx + 1, total, &name),
                ReportStatus::Error => cb.on_document_error(
                    idx + 1,
                    total,
                    &name,
                    report.message.clone().unwrap_or_default(),
                ),
            }
        }
        reports.push(report);

        // Pacing, not correctness: skip the pause after the final file.
        if idx + 1 < total && config.delivery_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(config.delivery_delay_ms)).await;
        }
    }

    let summary = BatchSummary::from_reports(&reports);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(summary.total, summary.successful);
    }
    Ok(reports)
}
