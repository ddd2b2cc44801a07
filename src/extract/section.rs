//! Section scanning: isolate the block of lines belonging to one repeating
//! entity (supplier, line item).
//!
//! Supplier and line-item blocks begin at a label keyword and extend for a
//! trailing window — no closing delimiter survives OCR reliably, so the
//! scanner latches on at the first keyword hit and collects every subsequent
//! line until a cap (supplier: 10 lines) or end of text (line items).
//!
//! Known limitation, preserved deliberately: the latch never resets. A stray
//! keyword occurrence early in the document pulls unrelated intervening text
//! into the section. Candidate fixes (reset on blank-line runs, close at the
//! next unrelated label) change extraction results on the reference corpus,
//! so the literal behaviour is kept until outputs can be re-validated.

/// Collect the sub-region of `lines` associated with one entity type.
///
/// Matching is case-insensitive; the collected lines keep their original
/// case. `max_lines: None` collects to the end of the document.
pub fn scan_section(lines: &[&str], keywords: &[&str], max_lines: Option<usize>) -> Vec<String> {
    let mut section = Vec::new();
    let mut active = false;

    for line in lines {
        if !active {
            let folded = line.to_lowercase();
            if keywords.iter().any(|k| folded.contains(k)) {
                active = true;
            }
        }
        if active {
            section.push((*line).to_string());
            if let Some(cap) = max_lines {
                if section.len() >= cap {
                    break;
                }
            }
        }
    }

    section
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.split('\n').collect()
    }

    #[test]
    fn starts_at_first_keyword_line() {
        let text = lines("header\nPROVEEDOR:\nAcme GmbH\nBerlin");
        let section = scan_section(&text, &["proveedor"], None);
        assert_eq!(section, vec!["PROVEEDOR:", "Acme GmbH", "Berlin"]);
    }

    #[test]
    fn keyword_match_is_case_insensitive_but_case_is_preserved() {
        let text = lines("Supplier Details\nACME");
        let section = scan_section(&text, &["supplier"], None);
        assert_eq!(section[0], "Supplier Details");
    }

    #[test]
    fn cap_bounds_collected_lines() {
        let text: String = (0..20).map(|i| format!("proveedor {i}\n")).collect();
        let text = lines(text.trim_end());
        let section = scan_section(&text, &["proveedor"], Some(10));
        assert_eq!(section.len(), 10);
    }

    #[test]
    fn unbounded_scan_collects_to_end() {
        let text = lines("x\npartida 1\na\nb\nc");
        let section = scan_section(&text, &["partida"], None);
        assert_eq!(section.len(), 4);
    }

    #[test]
    fn no_keyword_yields_empty_section() {
        let text = lines("nothing\nrelevant");
        assert!(scan_section(&text, &["proveedor"], Some(10)).is_empty());
    }

    #[test]
    fn latch_never_resets_across_unrelated_text() {
        // A keyword early in the document drags the unrelated middle along.
        let text = lines("proveedor mentioned in passing\nunrelated\nProveedor: Acme");
        let section = scan_section(&text, &["proveedor"], Some(10));
        assert_eq!(section.len(), 3);
        assert_eq!(section[1], "unrelated");
    }
}
