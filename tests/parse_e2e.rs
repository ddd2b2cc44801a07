//! End-to-end tests for the parse stage and the batch driver.
//!
//! These tests exercise the public API against real files in temporary
//! directories — no external binaries, no network. The OCR and enhancement
//! stages shell out to system tools and are covered by their unit tests plus
//! manual runs; everything from raw text to persisted record is covered here.

use pdf2invoice::{
    batch, BatchProgressCallback, BatchSummary, InvoiceRecord, ParseSession, PipelineConfig,
    ReportStatus,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A config writing records under a throwaway base directory.
fn config_in(dir: &Path) -> PipelineConfig {
    PipelineConfig::builder()
        .record_output_base(dir.join("invoices_json"))
        .build()
        .expect("valid config")
}

fn read_record(path: &Path) -> InvoiceRecord {
    let json = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&json).expect("persisted record must deserialize")
}

// Layout mirrors a typical scan: some labels carry their value on the next
// line, some inline. The RFC label is followed by blank lines so that the
// look-ahead window finds nothing and the inline tail applies.
const SAMPLE_INVOICE: &str = "\
--- Page 1 ---
IMPORTADOR
Comercializadora del Norte S.A. de C.V.
RFC: CNO980312AB1


Pedimento
21 47 3091 1234567
Fecha de pedimento: 15/03/2021


FACTURA No.
INV-2024-001
Lugar de emisión
Monterrey


PROVEEDOR
Nombre: Shenzhen Electronics Co.
Tax ID: 91440300MA5DC
Address: Futian District, Shenzhen

Partida: 1
Secuencia: 001
Valor aduana: 15000.00
Fracción: 8471.30.01
Descripción: computadora portátil
Cantidad: 100
Precio unitario: 150.00
";

// ── Single-document scenarios ────────────────────────────────────────────────

#[tokio::test]
async fn full_invoice_text_produces_populated_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let session = ParseSession::new("data/2021/4435.txt", SAMPLE_INVOICE);
    let (record, path) = session.persist(&config).await.expect("persist succeeds");

    // Values come out lowercase: extraction runs on case-folded text.
    assert_eq!(
        record.importer_name,
        "comercializadora del norte s.a. de c.v."
    );
    assert_eq!(record.importer_tax_id, "cno980312ab1");
    assert_eq!(record.customs_declaration_number, "21 47 3091 1234567");
    assert_eq!(record.customs_declaration_date, "15/03/2021");
    assert_eq!(record.invoice_number, "inv-2024-001");
    assert_eq!(record.invoice_place, "monterrey");

    assert_eq!(record.suppliers.len(), 1);
    assert_eq!(record.suppliers[0].tax_id, "91440300ma5dc");
    assert_eq!(record.suppliers[0].name, "shenzhen electronics co.");
    assert_eq!(record.suppliers[0].address, "futian district, shenzhen");

    assert_eq!(record.line_items.len(), 1);
    assert_eq!(record.line_items[0].item_number, "1");
    assert_eq!(record.line_items[0].customs_value, "15000.00");
    assert_eq!(record.line_items[0].tariff_code, "8471.30.01");
    assert_eq!(record.line_items[0].description, "computadora portátil");
    assert_eq!(record.line_items[0].unit_price, "150.00");

    // Year partition comes from the source path.
    assert_eq!(
        path,
        dir.path().join("invoices_json").join("2021").join("4435.json")
    );

    // What was written is what we got back.
    assert_eq!(read_record(&path), record);
}

#[tokio::test]
async fn accented_text_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let session = ParseSession::new(
        "2020/doc.txt",
        "Lugar\nCiudad de México\nDescripción\ncinturón reforzado",
    );
    let (record, path) = session.persist(&config).await.unwrap();
    assert_eq!(record.invoice_place, "ciudad de méxico");
    assert_eq!(record.line_items[0].description, "cinturón reforzado");

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("ciudad de méxico"), "no escaping to ASCII: {raw}");
    assert!(raw.contains("cinturón reforzado"));
    assert_eq!(read_record(&path), record);
}

#[tokio::test]
async fn keyword_free_text_persists_an_all_empty_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let session = ParseSession::new("misc/blank.txt", "nothing to see\nhere at all");
    let (record, path) = session.persist(&config).await.unwrap();

    assert_eq!(record, InvoiceRecord::default());
    assert!(record.suppliers.is_empty());
    assert!(record.line_items.is_empty());

    // Empty is a normal outcome: the record still lands on disk, under the
    // fallback partition.
    assert!(path.starts_with(dir.path().join("invoices_json").join("unknown")));
    assert_eq!(read_record(&path), InvoiceRecord::default());
}

// ── Batch scenarios ──────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_with_one_bad_file_reports_two_successes_one_failure() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("2021");
    std::fs::create_dir_all(&source).unwrap();

    std::fs::write(source.join("a.txt"), "FACTURA No.\nF-100").unwrap();
    // Invalid UTF-8 → per-document read failure.
    std::fs::write(source.join("b.txt"), [0xff, 0xfe, 0x80, 0x80]).unwrap();
    std::fs::write(source.join("c.txt"), "RFC: XYZ010101AAA").unwrap();

    let config = config_in(dir.path());
    let reports = batch::parse_directory(&config, &source)
        .await
        .expect("batch itself must not fail");

    let summary = BatchSummary::from_reports(&reports);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failed_files, vec!["b.txt"]);

    // Reports come back in sorted-filename order.
    let names: Vec<String> = reports.iter().map(|r| r.file_name()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    assert_eq!(reports[0].status, ReportStatus::Success);
    assert_eq!(reports[1].status, ReportStatus::Error);
    assert!(reports[1].message.as_deref().unwrap_or("").contains("read failed"));

    // The two good records exist on disk.
    for report in reports.iter().filter(|r| r.is_success()) {
        let out = report.output.as_ref().expect("success has an output path");
        assert!(out.exists(), "missing output {}", out.display());
    }
}

#[tokio::test]
async fn batch_over_missing_directory_is_fatal() {
    let config = PipelineConfig::default();
    let err = batch::parse_directory(&config, Path::new("/definitely/not/here"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn partition_override_applies_to_every_document_in_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("loose");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("x.txt"), "FACTURA\nF-1").unwrap();
    std::fs::write(source.join("y.txt"), "FACTURA\nF-2").unwrap();

    let config = PipelineConfig::builder()
        .record_output_base(dir.path().join("invoices_json"))
        .partition_override("2020")
        .build()
        .unwrap();

    let reports = batch::parse_directory(&config, &source).await.unwrap();
    for report in &reports {
        let out = report.output.as_ref().unwrap();
        assert!(
            out.starts_with(dir.path().join("invoices_json").join("2020")),
            "unexpected partition for {}",
            out.display()
        );
    }
}

// ── Progress callbacks ───────────────────────────────────────────────────────

struct TrackingCallback {
    batch_total: AtomicUsize,
    completes: AtomicUsize,
    errors: AtomicUsize,
    error_names: Mutex<Vec<String>>,
    final_successes: AtomicUsize,
}

impl BatchProgressCallback for TrackingCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.batch_total.store(total_documents, Ordering::SeqCst);
    }
    fn on_document_complete(&self, _index: usize, _total: usize, _name: &str) {
        self.completes.fetch_add(1, Ordering::SeqCst);
    }
    fn on_document_error(&self, _index: usize, _total: usize, name: &str, _error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.error_names.lock().unwrap().push(name.to_string());
    }
    fn on_batch_complete(&self, _total: usize, success_count: usize) {
        self.final_successes.store(success_count, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn progress_callbacks_fire_per_document() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("good.txt"), "FACTURA\nF-9").unwrap();
    std::fs::write(source.join("bad.txt"), [0xffu8, 0xfe]).unwrap();

    let tracker = Arc::new(TrackingCallback {
        batch_total: AtomicUsize::new(0),
        completes: AtomicUsize::new(0),
        errors: AtomicUsize::new(0),
        error_names: Mutex::new(Vec::new()),
        final_successes: AtomicUsize::new(0),
    });

    let config = PipelineConfig::builder()
        .record_output_base(dir.path().join("out"))
        .progress_callback(Arc::clone(&tracker) as Arc<dyn BatchProgressCallback>)
        .build()
        .unwrap();

    batch::parse_directory(&config, &source).await.unwrap();

    assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 2);
    assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
    assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    assert_eq!(tracker.final_successes.load(Ordering::SeqCst), 1);
    assert_eq!(*tracker.error_names.lock().unwrap(), vec!["bad.txt"]);
}

// ── Persisted-format compatibility ───────────────────────────────────────────

#[test]
fn record_json_shape_is_stable() {
    let record = InvoiceRecord {
        invoice_number: "f-1".into(),
        ..Default::default()
    };
    let json = serde_json::to_string_pretty(&record).unwrap();

    // Indented key-value document with the nested sequences always present.
    assert!(json.contains("\"invoice_number\": \"f-1\""));
    assert!(json.contains("\"suppliers\": []"));
    assert!(json.contains("\"line_items\": []"));

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value.as_object().unwrap().len(), 10, "8 scalars + 2 sequences");
}

#[test]
fn reports_serialize_for_machine_consumption() {
    let report = pdf2invoice::DocumentReport {
        source: PathBuf::from("a.txt"),
        status: ReportStatus::Error,
        output: None,
        message: Some("read failed".into()),
    };
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"status\":\"error\""));
    // Absent output is omitted, not null.
    assert!(!json.contains("\"output\""));
}
