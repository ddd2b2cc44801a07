//! The text-to-structured-record extraction engine.
//!
//! Three layers, leaf-first:
//!
//! ```text
//! raw OCR text
//!  │
//!  ├─ field    keyword-anchored single-value lookup (lookahead + inline tail)
//!  ├─ section  latch-on scanner isolating supplier / line-item blocks
//!  └─ assemble fixed keyword tables → InvoiceRecord
//! ```
//!
//! Everything here is pure string work — no I/O, no async, no failure modes.
//! An empty field or an empty record is a normal result for a bad scan.

pub mod assemble;
pub mod field;
pub mod section;

pub use assemble::{assemble, DEFAULT_CONTEXT_LINES};
pub use field::{clean_text, extract_adjacent_field, extract_field};
pub use section::scan_section;
