//! CLI binary for pdf2invoice.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, dispatches file-vs-directory inputs, and prints
//! per-document ticks plus a batch summary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2invoice::{
    batch, BatchProgressCallback, BatchSummary, DocumentReport, OcrEngine, OcrMyPdfEnhancer,
    ParseSession, PdfEnhancer, PipelineConfig, ProgressCallback, TesseractEngine, WebhookDelivery,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar at the bottom plus one log line per
/// finished document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_documents} files…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, name: &str) {
        self.bar
            .println(format!("  {} [{index}/{total}] {name}", green("✓")));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, name: &str, error: String) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error
        };
        self.bar.println(format!(
            "  {} [{index}/{total}] {name}  {}",
            red("✗"),
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let failed = total_documents.saturating_sub(success_count);
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} files processed successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files processed  ({} failed)",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Add a searchable text layer to every scan in a folder
  pdf2invoice enhance data/2021

  # OCR a folder of (enhanced) PDFs into text files
  pdf2invoice extract ocr_processed/2021

  # Parse OCR text files into JSON records
  pdf2invoice parse data_result/2021

  # Full chain for one scan: enhance + OCR + parse
  pdf2invoice pipeline data/2021/4435.pdf

  # Send processed PDFs to the collector, with a custom endpoint
  pdf2invoice deliver ocr_processed/2021 --webhook-url https://collector.example/hook

  # Force the output partition instead of auto-detecting the year
  pdf2invoice parse scans/loose --partition 2020

OUTPUT LAYOUT:
  ocr_processed/<year>/<name>.pdf   enhanced PDFs
  data_result/<year>/<name>.txt     raw OCR text
  invoices_json/<year>/<name>.json  extracted records

  <year> is detected from a 4-digit path component (2000-2100), falling
  back to "unknown"; --partition overrides it.

REQUIRED TOOLS:
  ocrmypdf    enhance step        pip install ocrmypdf
  pdftoppm    extract step        apt install poppler-utils
  tesseract   extract step        apt install tesseract-ocr

ENVIRONMENT VARIABLES:
  PDF2INVOICE_LANGUAGE      OCR language code (default: spa)
  PDF2INVOICE_OUTPUT        Records output base (default: invoices_json)
  PDF2INVOICE_WEBHOOK_URL   Collector endpoint for deliver
"#;

/// Convert scanned invoice PDFs into structured customs records.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2invoice",
    version,
    about = "Convert scanned invoice PDFs into structured customs records",
    long_about = "Ingest scanned invoice PDFs: embed a searchable text layer (ocrmypdf), \
extract raw text (tesseract), and parse it into fixed-schema JSON records — importer, \
customs declaration, invoice, suppliers, and line items.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// OCR language code passed to ocrmypdf/tesseract.
    #[arg(long, global = true, env = "PDF2INVOICE_LANGUAGE", default_value = "spa")]
    language: String,

    /// Override the output partition (defaults to the year detected from the
    /// source path).
    #[arg(long, global = true, env = "PDF2INVOICE_PARTITION")]
    partition: Option<String>,

    /// Base directory for extracted JSON records.
    #[arg(long, global = true, env = "PDF2INVOICE_OUTPUT", default_value = "invoices_json")]
    output: PathBuf,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "PDF2INVOICE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2INVOICE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2INVOICE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a searchable text layer to scanned PDFs (file or directory).
    Enhance {
        /// PDF file or directory of PDFs.
        input: PathBuf,

        /// Output base directory for enhanced PDFs.
        #[arg(long, default_value = "ocr_processed")]
        output_dir: PathBuf,

        /// Per-document enhancement timeout in seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// OCR PDFs into raw text files (file or directory).
    Extract {
        /// PDF file or directory of PDFs.
        input: PathBuf,

        /// Output base directory for text files.
        #[arg(long, default_value = "data_result")]
        output_dir: PathBuf,

        /// Rasterisation DPI handed to pdftoppm.
        #[arg(long, default_value_t = 300,
              value_parser = clap::value_parser!(u32).range(72..=600))]
        dpi: u32,
    },

    /// Parse OCR text files into JSON records (file or directory).
    Parse {
        /// Text file or directory of .txt files.
        input: PathBuf,
    },

    /// Full chain: enhance + extract + parse (file or directory).
    Pipeline {
        /// PDF file or directory of PDFs.
        input: PathBuf,

        /// Output base directory for enhanced PDFs.
        #[arg(long, default_value = "ocr_processed")]
        enhanced_dir: PathBuf,

        /// Output base directory for text files.
        #[arg(long, default_value = "data_result")]
        text_dir: PathBuf,

        /// Per-document enhancement timeout in seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Send processed PDFs to the remote collector (file or directory).
    Deliver {
        /// PDF file or directory of PDFs.
        input: PathBuf,

        /// Collector endpoint; defaults to the built-in webhook.
        #[arg(long, env = "PDF2INVOICE_WEBHOOK_URL")]
        webhook_url: Option<String>,

        /// Pause between files in milliseconds.
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,

        /// Per-file upload timeout in seconds.
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    run(cli, progress).await
}

async fn run(cli: Cli, progress: Option<ProgressCallback>) -> Result<()> {
    let quiet = cli.quiet;

    match cli.command {
        Command::Enhance {
            ref input,
            ref output_dir,
            timeout,
        } => {
            let config = base_config(&cli, progress)?
                .with(|b| b.enhanced_output_base(output_dir).enhance_timeout_secs(timeout))?;
            let enhancer = OcrMyPdfEnhancer::new(config.enhance_timeout_secs);

            if input.is_file() {
                enhancer
                    .ensure_available()
                    .await
                    .context("Enhancer unavailable")?;
                let path = batch::enhance_document(&enhancer, &config, input)
                    .await
                    .with_context(|| format!("Failed to enhance {}", input.display()))?;
                if !quiet {
                    eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
                }
            } else {
                let reports = batch::enhance_directory(&enhancer, &config, input)
                    .await
                    .context("Enhancement batch failed")?;
                print_summary(&reports, quiet);
            }
        }

        Command::Extract {
            ref input,
            ref output_dir,
            dpi,
        } => {
            let config = base_config(&cli, progress)?
                .with(|b| b.text_output_base(output_dir).ocr_dpi(dpi))?;
            let engine = TesseractEngine::new(config.language.clone(), config.ocr_dpi);

            if input.is_file() {
                engine.ensure_available().await.context("OCR unavailable")?;
                let (_, path) = batch::ocr_document(&engine, &config, input)
                    .await
                    .with_context(|| format!("OCR failed for {}", input.display()))?;
                if !quiet {
                    eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
                }
            } else {
                let reports = batch::ocr_directory(&engine, &config, input)
                    .await
                    .context("OCR batch failed")?;
                print_summary(&reports, quiet);
            }
        }

        Command::Parse { ref input } => {
            let config = base_config(&cli, progress)?.build()?;

            if input.is_file() {
                let session = ParseSession::from_file(input)
                    .await
                    .with_context(|| format!("Failed to read {}", input.display()))?;
                let (record, path) = session
                    .persist(&config)
                    .await
                    .with_context(|| format!("Failed to parse {}", input.display()))?;
                if !quiet {
                    eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
            } else {
                let reports = batch::parse_directory(&config, input)
                    .await
                    .context("Parse batch failed")?;
                print_summary(&reports, quiet);
            }
        }

        Command::Pipeline {
            ref input,
            ref enhanced_dir,
            ref text_dir,
            timeout,
        } => {
            let config = base_config(&cli, progress)?.with(|b| {
                b.enhanced_output_base(enhanced_dir)
                    .text_output_base(text_dir)
                    .enhance_timeout_secs(timeout)
            })?;
            let enhancer = OcrMyPdfEnhancer::new(config.enhance_timeout_secs);
            let engine = TesseractEngine::new(config.language.clone(), config.ocr_dpi);

            if input.is_file() {
                enhancer
                    .ensure_available()
                    .await
                    .context("Enhancer unavailable")?;
                engine.ensure_available().await.context("OCR unavailable")?;
                let path = batch::process_document(&enhancer, &engine, &config, input)
                    .await
                    .with_context(|| format!("Pipeline failed for {}", input.display()))?;
                if !quiet {
                    eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
                }
            } else {
                let reports = batch::process_directory(&enhancer, &engine, &config, input)
                    .await
                    .context("Pipeline batch failed")?;
                print_summary(&reports, quiet);
            }
        }

        Command::Deliver {
            ref input,
            ref webhook_url,
            delay_ms,
            timeout,
        } => {
            let mut builder = base_config(&cli, progress)?
                .builder
                .delivery_delay_ms(delay_ms)
                .delivery_timeout_secs(timeout);
            if let Some(url) = webhook_url {
                builder = builder.webhook_url(url.clone());
            }
            let config = builder.build()?;
            let delivery =
                WebhookDelivery::new(config.webhook_url.clone(), config.delivery_timeout_secs)?;

            if input.is_file() {
                let receipt = delivery
                    .deliver(input, &HashMap::new())
                    .await
                    .with_context(|| format!("Delivery failed for {}", input.display()))?;
                if !quiet {
                    let tick = if receipt.success { green("✔") } else { red("✘") };
                    eprintln!(
                        "{tick} {}  {}",
                        bold(&receipt.file),
                        dim(&format!("HTTP {}", receipt.status_code))
                    );
                }
                if !receipt.success {
                    anyhow::bail!("collector answered HTTP {}", receipt.status_code);
                }
            } else {
                let reports = batch::deliver_directory(&delivery, &config, input)
                    .await
                    .context("Delivery batch failed")?;
                print_summary(&reports, quiet);
            }
        }
    }

    Ok(())
}

// ── Config plumbing ──────────────────────────────────────────────────────

/// Partially-built config carrying the global flags; subcommands append
/// their own settings before building.
struct BaseConfig {
    builder: pdf2invoice::PipelineConfigBuilder,
}

impl BaseConfig {
    fn with(
        self,
        f: impl FnOnce(pdf2invoice::PipelineConfigBuilder) -> pdf2invoice::PipelineConfigBuilder,
    ) -> Result<PipelineConfig> {
        Ok(f(self.builder).build()?)
    }

    fn build(self) -> Result<PipelineConfig> {
        Ok(self.builder.build()?)
    }
}

fn base_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BaseConfig> {
    let mut builder = PipelineConfig::builder()
        .language(cli.language.clone())
        .record_output_base(&cli.output);
    if let Some(ref partition) = cli.partition {
        builder = builder.partition_override(partition.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    Ok(BaseConfig { builder })
}

/// Print the end-of-batch summary block, mirroring the reports the library
/// returned.
fn print_summary(reports: &[DocumentReport], quiet: bool) {
    if quiet {
        return;
    }
    let summary = BatchSummary::from_reports(reports);
    eprintln!(
        "   {} total  /  {} {}  /  {} {}",
        bold(&summary.total.to_string()),
        green(&summary.successful.to_string()),
        dim("ok"),
        red(&summary.failed.to_string()),
        dim("failed"),
    );
    if !summary.failed_files.is_empty() {
        eprintln!("   {}", dim("failed files:"));
        for name in &summary.failed_files {
            eprintln!("     {} {}", red("-"), name);
        }
    }
}
