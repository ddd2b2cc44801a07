//! # pdf2invoice
//!
//! Convert scanned invoice PDFs into structured customs records.
//!
//! ## Why this crate?
//!
//! Scanned Mexican customs invoices arrive as image-only PDFs: no text
//! layer, no schema, inconsistent layouts. Generic PDF text extractors
//! return nothing, and the OCR text they would need is too noisy for a
//! formal parser. This crate runs the full chain — embed a searchable text
//! layer, OCR the pages, then locate labeled values (importer, pedimento,
//! invoice, supplier, line items) with a keyword-anchored proximity search
//! that tolerates OCR noise — and persists one JSON record per document in
//! year-partitioned directories.
//!
//! ## Pipeline Overview
//!
//! ```text
//! scan.pdf
//!  │
//!  ├─ 1. Enhance  embed searchable text layer via ocrmypdf (per-doc timeout)
//!  ├─ 2. OCR      rasterise via pdftoppm, recognise via tesseract
//!  ├─ 3. Extract  keyword anchoring + section scanning → InvoiceRecord
//!  ├─ 4. Persist  pretty JSON under <base>/<year>/<stem>.json
//!  └─ 5. Deliver  multipart POST of processed PDFs to a collector webhook
//! ```
//!
//! Stages run strictly one document at a time; every per-document failure is
//! caught and reported in the batch summary instead of aborting the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2invoice::{ParseSession, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default();
//!     let session = ParseSession::new(
//!         "data/2021/4435.txt",
//!         "FACTURA No.\nINV-2024-001\nRFC: ABC010101XYZ",
//!     );
//!     let (record, path) = session.persist(&config).await?;
//!     println!("{} -> {}", record.invoice_number, path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2invoice` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2invoice = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{BatchSummary, DocumentReport, ReportStatus};
pub use config::{PipelineConfig, PipelineConfigBuilder, DEFAULT_WEBHOOK_URL};
pub use error::{DocumentError, PipelineError};
pub use pipeline::deliver::{DeliveryReceipt, WebhookDelivery};
pub use pipeline::enhance::{OcrMyPdfEnhancer, PdfEnhancer};
pub use pipeline::ocr::{OcrEngine, TesseractEngine};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{InvoiceRecord, LineItem, Supplier};
pub use session::{partition_key_from_path, ParseSession};
