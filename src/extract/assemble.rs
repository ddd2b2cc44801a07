//! Record assembly: drive the field extractor and section scanner over one
//! document's raw OCR text and fill the fixed output schema.
//!
//! Keyword tables carry the Spanish synonyms (plus the English ones that show
//! up on bilingual invoices) verbatim — they were tuned against real scans
//! and are matched case-insensitively, so the accent-less variants
//! (`direccion`, `razon social`) cover OCR runs that drop diacritics.

use crate::extract::field::{extract_adjacent_field, extract_field};
use crate::extract::section::scan_section;
use crate::record::{InvoiceRecord, LineItem, Supplier};

/// Look-ahead window for top-level fields: label and value are at most two
/// lines apart on the reference corpus.
pub const DEFAULT_CONTEXT_LINES: usize = 2;

/// Supplier blocks rarely exceed a handful of lines; the cap stops the
/// never-resetting section latch from swallowing the rest of the document.
const SUPPLIER_SECTION_CAP: usize = 10;

// ── Top-level keyword tables ─────────────────────────────────────────────

const IMPORTER_NAME: &[&str] = &["importador", "empresa", "razón social", "razon social"];
const IMPORTER_ADDRESS: &[&str] = &[
    "domicilio",
    "dirección",
    "direccion",
    "domicilio del importador",
];
const IMPORTER_TAX_ID: &[&str] = &["rfc", "registro federal", "clave de rfc"];

const DECLARATION_NUMBER: &[&str] = &[
    "pedimento",
    "número de pedimento",
    "numero de pedimento",
    "aduana pedimento",
];
const DECLARATION_DATE: &[&str] = &["fecha pedimento", "fecha de pedimento"];

const INVOICE_NUMBER: &[&str] = &[
    "factura",
    "número de factura",
    "numero de factura",
    "folio factura",
    "invoice",
];
const INVOICE_DATE: &[&str] = &["fecha factura", "fecha de factura", "fecha emisión"];
const INVOICE_PLACE: &[&str] = &["lugar", "lugar de emisión", "lugar de emision"];

// ── Section keyword tables ───────────────────────────────────────────────

const SUPPLIER_SECTION: &[&str] = &["proveedor", "supplier", "vendedor", "exportador"];
const SUPPLIER_TAX_ID: &[&str] = &["id fiscal", "idn", "tax id", "rfc"];
const SUPPLIER_NAME: &[&str] = &["nombre", "company", "empresa"];
const SUPPLIER_ADDRESS: &[&str] = &["domicilio", "dirección", "direccion", "address"];

const LINE_ITEM_SECTION: &[&str] = &["partida", "item", "producto", "descripción"];
const ITEM_NUMBER: &[&str] = &["partida", "item #"];
const ITEM_SEQUENCE: &[&str] = &["secuencia", "sequence"];
const ITEM_CUSTOMS_VALUE: &[&str] = &["valor aduana", "valor", "price"];
const ITEM_TARIFF_CODE: &[&str] = &["fracción", "fraccion", "tariff"];
const ITEM_DESCRIPTION: &[&str] = &["descripción", "descripcion", "description"];
const ITEM_QUANTITY_UNIT: &[&str] = &["cantidad", "qty", "umc"];
const ITEM_COUNTRY_OF_PRODUCTION: &[&str] =
    &["país producción", "pais produccion", "country of origin"];
const ITEM_COUNTRY_OF_ORIGIN: &[&str] = &["país procedencia", "pais procedencia", "country"];
const ITEM_PRICE_PAID: &[&str] = &["precio pagado", "paid price"];
const ITEM_UNIT_PRICE: &[&str] = &["precio unitario", "unit price"];

/// Extract a full [`InvoiceRecord`] from raw OCR text.
///
/// Top-level fields are matched against a case-folded copy of the text, so
/// extracted values come out lowercase. Sections are located on the
/// case-preserved text, then folded before the nested per-field pass.
/// Empty fields are a normal outcome; this function never fails.
pub fn assemble(text: &str, context_lines: usize) -> InvoiceRecord {
    let folded = text.to_lowercase();
    let folded_lines: Vec<&str> = folded.split('\n').collect();
    let original_lines: Vec<&str> = text.split('\n').collect();

    let mut record = InvoiceRecord {
        importer_name: extract_field(&folded_lines, IMPORTER_NAME, context_lines),
        importer_address: extract_field(&folded_lines, IMPORTER_ADDRESS, context_lines),
        importer_tax_id: extract_field(&folded_lines, IMPORTER_TAX_ID, context_lines),
        customs_declaration_number: extract_field(&folded_lines, DECLARATION_NUMBER, context_lines),
        customs_declaration_date: extract_field(&folded_lines, DECLARATION_DATE, context_lines),
        invoice_number: extract_field(&folded_lines, INVOICE_NUMBER, context_lines),
        invoice_date: extract_field(&folded_lines, INVOICE_DATE, context_lines),
        invoice_place: extract_field(&folded_lines, INVOICE_PLACE, context_lines),
        ..Default::default()
    };

    if let Some(supplier) = extract_supplier(&original_lines) {
        record.suppliers.push(supplier);
    }
    if let Some(item) = extract_line_item(&original_lines) {
        record.line_items.push(item);
    }

    record
}

fn extract_supplier(original_lines: &[&str]) -> Option<Supplier> {
    let section = scan_section(original_lines, SUPPLIER_SECTION, Some(SUPPLIER_SECTION_CAP));
    let folded = section.join("\n").to_lowercase();
    let lines: Vec<&str> = folded.split('\n').collect();

    let supplier = Supplier {
        tax_id: extract_adjacent_field(&lines, SUPPLIER_TAX_ID),
        name: extract_adjacent_field(&lines, SUPPLIER_NAME),
        address: extract_adjacent_field(&lines, SUPPLIER_ADDRESS),
    };

    (!supplier.is_empty()).then_some(supplier)
}

fn extract_line_item(original_lines: &[&str]) -> Option<LineItem> {
    let section = scan_section(original_lines, LINE_ITEM_SECTION, None);
    let folded = section.join("\n").to_lowercase();
    let lines: Vec<&str> = folded.split('\n').collect();

    let item = LineItem {
        item_number: extract_adjacent_field(&lines, ITEM_NUMBER),
        sequence: extract_adjacent_field(&lines, ITEM_SEQUENCE),
        customs_value: extract_adjacent_field(&lines, ITEM_CUSTOMS_VALUE),
        tariff_code: extract_adjacent_field(&lines, ITEM_TARIFF_CODE),
        description: extract_adjacent_field(&lines, ITEM_DESCRIPTION),
        quantity_unit: extract_adjacent_field(&lines, ITEM_QUANTITY_UNIT),
        country_of_production: extract_adjacent_field(&lines, ITEM_COUNTRY_OF_PRODUCTION),
        country_of_origin: extract_adjacent_field(&lines, ITEM_COUNTRY_OF_ORIGIN),
        price_paid: extract_adjacent_field(&lines, ITEM_PRICE_PAID),
        unit_price: extract_adjacent_field(&lines, ITEM_UNIT_PRICE),
    };

    (!item.is_empty()).then_some(item)
}
