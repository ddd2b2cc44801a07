//! Configuration types for the invoice-ingestion pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across the CLI subcommands and to diff two runs
//! to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::PipelineError;
use crate::extract::DEFAULT_CONTEXT_LINES;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Default remote collector endpoint.
///
/// Only ever read as the [`PipelineConfig::default`] value for
/// `webhook_url` — never consulted directly by the delivery code, so an
/// override at construction or on the CLI always wins.
pub const DEFAULT_WEBHOOK_URL: &str =
    "https://n8n.jatenx.pro/webhook-test/e37077b5-31c1-4da2-aca9-ce0286b4ea3b";

/// Configuration for enhancement, OCR, parsing, and delivery.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2invoice::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .language("spa")
///     .enhance_timeout_secs(600)
///     .partition_override("2021")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Tesseract language code used for both enhancement and OCR. Default: "spa".
    ///
    /// Invoices in the reference corpus are Mexican customs documents, so
    /// Spanish is the default; pass "spa+eng" for bilingual scans.
    pub language: String,

    /// Look-ahead window for top-level field extraction. Default: 2.
    ///
    /// Label and value are at most two lines apart on the reference corpus;
    /// widening the window makes the proximity heuristic grab text from
    /// unrelated blocks more often than it recovers missing values.
    pub context_lines: usize,

    /// Base directory for persisted JSON records. Default: `invoices_json`.
    pub record_output_base: PathBuf,

    /// Base directory for raw OCR text files. Default: `data_result`.
    pub text_output_base: PathBuf,

    /// Base directory for enhanced (text-layered) PDFs. Default: `ocr_processed`.
    pub enhanced_output_base: PathBuf,

    /// Explicit output partition. Default: None (auto-detect the year from
    /// the source path, falling back to `"unknown"`).
    pub partition_override: Option<String>,

    /// Per-document enhancement timeout in seconds. Default: 300.
    ///
    /// ocrmypdf re-rasterises every page; large multi-page scans routinely
    /// take minutes. Expiry is a per-document failure, never fatal to the
    /// batch.
    pub enhance_timeout_secs: u64,

    /// Rasterisation resolution handed to pdftoppm. Range: 72–600. Default: 300.
    ///
    /// 300 DPI is the Tesseract sweet spot for 10–12 pt invoice print;
    /// lower is faster but loses small tax-ID digits, higher mostly burns
    /// CPU and disk.
    pub ocr_dpi: u32,

    /// Remote collector endpoint for the deliver stage.
    /// Default: [`DEFAULT_WEBHOOK_URL`].
    pub webhook_url: String,

    /// Per-file delivery timeout in seconds. Default: 120.
    pub delivery_timeout_secs: u64,

    /// Pause between delivered files in milliseconds. Default: 1000.
    ///
    /// Pacing only — keeps a burst of uploads from overwhelming the
    /// receiving workflow engine. Not a correctness requirement.
    pub delivery_delay_ms: u64,

    /// Per-document progress events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: "spa".to_string(),
            context_lines: DEFAULT_CONTEXT_LINES,
            record_output_base: PathBuf::from("invoices_json"),
            text_output_base: PathBuf::from("data_result"),
            enhanced_output_base: PathBuf::from("ocr_processed"),
            partition_override: None,
            enhance_timeout_secs: 300,
            ocr_dpi: 300,
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            delivery_timeout_secs: 120,
            delivery_delay_ms: 1000,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("language", &self.language)
            .field("context_lines", &self.context_lines)
            .field("record_output_base", &self.record_output_base)
            .field("text_output_base", &self.text_output_base)
            .field("enhanced_output_base", &self.enhanced_output_base)
            .field("partition_override", &self.partition_override)
            .field("enhance_timeout_secs", &self.enhance_timeout_secs)
            .field("ocr_dpi", &self.ocr_dpi)
            .field("webhook_url", &self.webhook_url)
            .field("delivery_timeout_secs", &self.delivery_timeout_secs)
            .field("delivery_delay_ms", &self.delivery_delay_ms)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into();
        self
    }

    pub fn context_lines(mut self, n: usize) -> Self {
        self.config.context_lines = n;
        self
    }

    pub fn record_output_base(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.record_output_base = dir.into();
        self
    }

    pub fn text_output_base(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.text_output_base = dir.into();
        self
    }

    pub fn enhanced_output_base(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.enhanced_output_base = dir.into();
        self
    }

    pub fn partition_override(mut self, partition: impl Into<String>) -> Self {
        self.config.partition_override = Some(partition.into());
        self
    }

    pub fn enhance_timeout_secs(mut self, secs: u64) -> Self {
        self.config.enhance_timeout_secs = secs;
        self
    }

    pub fn ocr_dpi(mut self, dpi: u32) -> Self {
        self.config.ocr_dpi = dpi.clamp(72, 600);
        self
    }

    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.config.webhook_url = url.into();
        self
    }

    pub fn delivery_timeout_secs(mut self, secs: u64) -> Self {
        self.config.delivery_timeout_secs = secs;
        self
    }

    pub fn delivery_delay_ms(mut self, ms: u64) -> Self {
        self.config.delivery_delay_ms = ms;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.language.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "Language code must not be empty".into(),
            ));
        }
        if c.enhance_timeout_secs == 0 {
            return Err(PipelineError::InvalidConfig(
                "Enhancement timeout must be ≥ 1 second".into(),
            ));
        }
        if c.webhook_url.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "Webhook URL must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_pipeline() {
        let c = PipelineConfig::default();
        assert_eq!(c.language, "spa");
        assert_eq!(c.context_lines, 2);
        assert_eq!(c.enhance_timeout_secs, 300);
        assert_eq!(c.delivery_timeout_secs, 120);
        assert_eq!(c.delivery_delay_ms, 1000);
        assert_eq!(c.webhook_url, DEFAULT_WEBHOOK_URL);
        assert_eq!(c.record_output_base, PathBuf::from("invoices_json"));
    }

    #[test]
    fn builder_overrides_endpoint() {
        let c = PipelineConfig::builder()
            .webhook_url("https://collector.example/hook")
            .build()
            .unwrap();
        assert_eq!(c.webhook_url, "https://collector.example/hook");
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = PipelineConfig::builder()
            .enhance_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn builder_rejects_empty_language() {
        assert!(PipelineConfig::builder().language("").build().is_err());
    }

    #[test]
    fn dpi_is_clamped() {
        let c = PipelineConfig::builder().ocr_dpi(10_000).build().unwrap();
        assert_eq!(c.ocr_dpi, 600);
        let c = PipelineConfig::builder().ocr_dpi(10).build().unwrap();
        assert_eq!(c.ocr_dpi, 72);
    }
}
