//! Keyword-anchored field extraction from noisy OCR text.
//!
//! ## Why keyword anchoring instead of a grammar?
//!
//! OCR output from scanned invoices is noisy and inconsistently laid out:
//! a label and its value may share a line (`RFC: ABC010101XYZ`) or the value
//! may land on the next line (`FACTURA No.` / `INV-2024-001`), depending on
//! how the scan was rasterised. A formal grammar would reject most real
//! documents. Instead, [`extract_field`] anchors on the first line containing
//! any of a set of label keywords and applies a two-step fallback that
//! captures both layouts:
//!
//! 1. scan a short look-ahead window for the first non-empty line distinct
//!    from the matched line;
//! 2. failing that, take the trailing segment of the matched line itself.
//!
//! An empty result is a normal outcome, never an error — partial records are
//! expected for low-quality scans.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace to single spaces and trim both ends.
pub fn clean_text(text: &str) -> String {
    RE_WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Strip the label separators that typically sit between a keyword and its
/// value (`RFC: X`, `Factura - 123`, `No. 42`).
fn strip_label_separators(text: &str) -> &str {
    text.trim_start_matches(|c: char| c == ':' || c == '-' || c == '.' || c.is_whitespace())
}

/// Locate a single labeled value in `lines` given candidate label `keywords`.
///
/// `lines` must already be case-folded (lowercase); keywords are matched as
/// plain substrings, so extracted fallback values come out lowercase too.
///
/// On the first line containing any keyword:
/// 1. look ahead up to `context_lines` lines (inclusive) and return the first
///    line whose trimmed content is non-empty and different from the matched
///    line, cleaned;
/// 2. otherwise split the matched line on the last keyword occurrence and
///    return the trailing segment if non-empty, cleaned;
/// 3. otherwise keep scanning the remaining lines and keywords.
///
/// Returns an empty string when no keyword yields a value anywhere.
pub fn extract_field(lines: &[&str], keywords: &[&str], context_lines: usize) -> String {
    for (i, line) in lines.iter().enumerate() {
        for keyword in keywords {
            if !line.contains(keyword) {
                continue;
            }
            let anchor = line.trim();

            // Value on a following line within the context window. The window
            // starts at the matched line itself; the distinctness check skips
            // it and any OCR duplicate of it.
            let end = (i + context_lines + 1).min(lines.len());
            for candidate in &lines[i..end] {
                let candidate = candidate.trim();
                if !candidate.is_empty() && candidate != anchor {
                    return clean_text(candidate);
                }
            }

            // Value inline, after the label.
            if let Some(tail) = line.rsplit(keyword).next() {
                let tail = strip_label_separators(tail);
                if !tail.is_empty() {
                    return clean_text(tail);
                }
            }
        }
    }
    String::new()
}

/// Single-line variant used inside supplier and line-item sections.
///
/// Returns the trailing segment of the first matched line or, if that is
/// empty, the immediately following line — even when that line is blank.
/// No multi-line look-ahead: section blocks are short and tightly packed, so
/// a wider window would bleed values across fields.
pub fn extract_adjacent_field(lines: &[&str], keywords: &[&str]) -> String {
    for (i, line) in lines.iter().enumerate() {
        for keyword in keywords {
            if !line.contains(keyword) {
                continue;
            }
            if let Some(tail) = line.rsplit(keyword).next() {
                let tail = strip_label_separators(tail);
                if !tail.is_empty() {
                    return clean_text(tail);
                }
            }
            if let Some(next) = lines.get(i + 1) {
                return clean_text(next.trim());
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.split('\n').collect()
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  foo   bar\t baz  "), "foo bar baz");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn value_on_following_line() {
        let text = lines("factura no.\ninv-2024-001\nrfc: abc");
        assert_eq!(extract_field(&text, &["factura"], 2), "inv-2024-001");
    }

    #[test]
    fn blank_lines_are_skipped_inside_window() {
        let text = lines("importador\n\nacme trading s.a.");
        assert_eq!(extract_field(&text, &["importador"], 2), "acme trading s.a.");
    }

    #[test]
    fn value_beyond_window_falls_through() {
        // Value sits 3 lines down but the window only covers 1.
        let text = lines("importador\n\n\nacme trading");
        assert_eq!(extract_field(&text, &["importador"], 1), "");
    }

    #[test]
    fn inline_fallback_strips_label_separators() {
        let text = lines("rfc: abc010101xyz");
        assert_eq!(extract_field(&text, &["rfc"], 2), "abc010101xyz");
    }

    #[test]
    fn inline_fallback_uses_last_keyword_occurrence() {
        let text = lines("rfc del importador rfc: xyz99");
        assert_eq!(extract_field(&text, &["rfc"], 2), "xyz99");
    }

    #[test]
    fn no_keyword_yields_empty_not_error() {
        let text = lines("totally unrelated\ncontent");
        assert_eq!(extract_field(&text, &["factura"], 2), "");
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = lines("factura no.\ninv-1");
        let first = extract_field(&text, &["factura"], 2);
        let second = extract_field(&text, &["factura"], 2);
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_of_anchor_line_is_skipped() {
        let text = lines("factura\nfactura\ninv-7");
        assert_eq!(extract_field(&text, &["factura"], 2), "inv-7");
    }

    #[test]
    fn adjacent_prefers_inline_tail() {
        let text = lines("nombre: acme gmbh\nberlin");
        assert_eq!(extract_adjacent_field(&text, &["nombre"]), "acme gmbh");
    }

    #[test]
    fn adjacent_falls_back_to_next_line() {
        let text = lines("nombre\nacme gmbh");
        assert_eq!(extract_adjacent_field(&text, &["nombre"]), "acme gmbh");
    }

    #[test]
    fn adjacent_returns_blank_next_line_verbatim() {
        // Bare label at end-of-section: the following line is blank and is
        // returned as-is (cleaned to empty), not searched further.
        let text = lines("nombre\n\nacme gmbh");
        assert_eq!(extract_adjacent_field(&text, &["nombre"]), "");
    }

    #[test]
    fn adjacent_no_match_is_empty() {
        let text = lines("nothing here");
        assert_eq!(extract_adjacent_field(&text, &["nombre"]), "");
    }
}
