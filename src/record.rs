//! The structured record extracted from one invoice document.
//!
//! Field order in the serialized JSON follows struct declaration order:
//! importer block, customs declaration block, invoice block, then the
//! repeating entities. Every scalar is always present — absent data is an
//! empty string, never a missing key — so downstream consumers can index
//! fields without existence checks. Accented Spanish text round-trips
//! unescaped (serde_json emits UTF-8, not `\uXXXX`).

use serde::{Deserialize, Serialize};

/// Structured data extracted from one invoice document.
///
/// Produced by [`crate::extract::assemble`] and persisted as pretty-printed
/// JSON by [`crate::session::ParseSession::persist`]. A fresh record is built
/// per parse call and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    #[serde(default)]
    pub importer_name: String,
    #[serde(default)]
    pub importer_address: String,
    #[serde(default)]
    pub importer_tax_id: String,

    /// Pedimento number (Mexican customs declaration).
    #[serde(default)]
    pub customs_declaration_number: String,
    #[serde(default)]
    pub customs_declaration_date: String,

    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub invoice_date: String,
    #[serde(default)]
    pub invoice_place: String,

    /// At most one supplier in current behaviour; kept as a sequence so the
    /// persisted format does not change if multi-supplier scanning lands.
    #[serde(default)]
    pub suppliers: Vec<Supplier>,

    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// Supplier (proveedor/exportador) entity referenced in the invoice.
///
/// Included in [`InvoiceRecord::suppliers`] only when at least one field is
/// non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(default)]
    pub tax_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

impl Supplier {
    /// True when every field is empty — such a supplier is never emitted.
    pub fn is_empty(&self) -> bool {
        self.tax_id.is_empty() && self.name.is_empty() && self.address.is_empty()
    }
}

/// One line item (partida) of the invoice.
///
/// Same inclusion invariant as [`Supplier`]: all-empty items are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub item_number: String,
    #[serde(default)]
    pub sequence: String,
    #[serde(default)]
    pub customs_value: String,
    /// Tariff classification (fracción arancelaria).
    #[serde(default)]
    pub tariff_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity_unit: String,
    #[serde(default)]
    pub country_of_production: String,
    #[serde(default)]
    pub country_of_origin: String,
    #[serde(default)]
    pub price_paid: String,
    #[serde(default)]
    pub unit_price: String,
}

impl LineItem {
    pub fn is_empty(&self) -> bool {
        self.item_number.is_empty()
            && self.sequence.is_empty()
            && self.customs_value.is_empty()
            && self.tariff_code.is_empty()
            && self.description.is_empty()
            && self.quantity_unit.is_empty()
            && self.country_of_production.is_empty()
            && self.country_of_origin.is_empty()
            && self.price_paid.is_empty()
            && self.unit_price.is_empty()
    }
}
