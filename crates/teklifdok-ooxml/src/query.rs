//! Label-addressed cell lookup
//!
//! Offer templates place values in fixed table rows, but the number of
//! helper columns between the label and the value varies per template
//! revision. Cells are therefore addressed by the label text in the row's
//! first cell, never by row/column index.

use crate::document::{for_each_table_mut, Block, DocumentPart};

/// Normalize label text for comparison: trim, strip a trailing colon,
/// collapse inner whitespace and lowercase (Turkish dotted/dotless I aware).
pub fn normalize_label(text: &str) -> String {
    let trimmed = text.trim().trim_end_matches(':').trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut last_space = false;
    for c in trimmed.chars() {
        if c.is_whitespace() {
            if !last_space && !out.is_empty() {
                out.push(' ');
            }
            last_space = true;
            continue;
        }
        last_space = false;
        match c {
            // Turkish casing: İ lowers to i, I lowers to ı
            'İ' => out.push('i'),
            'I' => out.push('ı'),
            _ => out.extend(c.to_lowercase()),
        }
    }
    out
}

/// Find the row whose first cell carries `label` and write `value` into
/// that row's value cell. The value cell is the last cell when the row
/// has three or more cells (label / short-code / value convention), the
/// second cell when it has exactly two, and the row's final cell otherwise.
///
/// Returns whether a matching row was found. A missing label is not an
/// error; the caller records it as a warning and the field stays unwritten.
pub fn write_labelled_value(part: &mut DocumentPart, label: &str, value: &str) -> bool {
    let wanted = normalize_label(label);
    let value = value.to_string();
    for_each_table_mut(&mut part.blocks, &mut |table| {
        for row in &mut table.rows {
            let first = match row.cells.first() {
                Some(cell) => cell,
                None => continue,
            };
            if normalize_label(&first.text()) != wanted {
                continue;
            }
            let target = match row.cells.len() {
                0 | 1 => 0,
                2 => 1,
                n => n - 1,
            };
            if let Some(cell) = row.cells.get_mut(target) {
                cell.set_text(value.clone());
                return true;
            }
        }
        false
    })
}

/// Read the value cell addressed by `label`, using the same row convention
/// as [`write_labelled_value`].
pub fn read_labelled_value(part: &DocumentPart, label: &str) -> Option<String> {
    let wanted = normalize_label(label);
    walk_tables(&part.blocks, &mut |rows| {
        for row in rows {
            let first = match row.cells.first() {
                Some(cell) => cell,
                None => continue,
            };
            if normalize_label(&first.text()) != wanted {
                continue;
            }
            let target = match row.cells.len() {
                0 | 1 => 0,
                2 => 1,
                n => n - 1,
            };
            return row.cells.get(target).map(|c| c.text());
        }
        None
    })
}

fn walk_tables<T>(
    blocks: &[Block],
    f: &mut impl FnMut(&[crate::document::TableRow]) -> Option<T>,
) -> Option<T> {
    for block in blocks {
        if let Block::Table(table) = block {
            if let Some(v) = f(&table.rows) {
                return Some(v);
            }
            for row in &table.rows {
                for cell in &row.cells {
                    if let Some(v) = walk_tables(&cell.blocks, f) {
                        return Some(v);
                    }
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentPart, PartKind};

    fn table_doc(rows: &[&[&str]]) -> DocumentPart {
        let mut body = String::from("<w:tbl><w:tblPr/><w:tblGrid/>");
        for row in rows {
            body.push_str("<w:tr>");
            for cell in *row {
                body.push_str(&format!(
                    "<w:tc><w:p><w:r><w:t>{cell}</w:t></w:r></w:p></w:tc>"
                ));
            }
            body.push_str("</w:tr>");
        }
        body.push_str("</w:tbl>");
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        DocumentPart::parse(xml.as_bytes(), PartKind::Document).unwrap()
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Firma Adı : "), "firma adı");
        assert_eq!(normalize_label("TEKLİF NO:"), "teklif no");
        assert_eq!(normalize_label("ISI   KAYNAĞI"), "ısı kaynağı");
        assert_eq!(normalize_label(""), "");
    }

    #[test]
    fn test_two_cell_row_targets_second_cell() {
        let mut doc = table_doc(&[&["Firma Adı:", ""], &["Yetkili:", ""]]);
        assert!(write_labelled_value(&mut doc, "Firma Adı", "ACME A.Ş."));
        assert_eq!(read_labelled_value(&doc, "firma adı").as_deref(), Some("ACME A.Ş."));
        // Other rows untouched
        assert_eq!(read_labelled_value(&doc, "Yetkili").as_deref(), Some(""));
    }

    #[test]
    fn test_wide_row_targets_last_cell() {
        let mut doc = table_doc(&[&["Teklif No:", "TK", "eski", ""]]);
        assert!(write_labelled_value(&mut doc, "teklif no", "TKF-2025-041"));
        let crate::document::Block::Table(t) = &doc.blocks[0] else {
            panic!()
        };
        assert_eq!(t.rows[0].cells[3].text(), "TKF-2025-041");
        // Helper columns are untouched
        assert_eq!(t.rows[0].cells[1].text(), "TK");
    }

    #[test]
    fn test_missing_label_reports_not_found() {
        let mut doc = table_doc(&[&["Firma Adı:", ""]]);
        assert!(!write_labelled_value(&mut doc, "Vergi No", "123"));
    }

    #[test]
    fn test_label_match_is_first_cell_only() {
        // The label text appearing in a non-first cell must not match
        let mut doc = table_doc(&[&["Açıklama", "Firma Adı", ""]]);
        assert!(!write_labelled_value(&mut doc, "Firma Adı", "X"));
    }

    #[test]
    fn test_value_cell_keeps_formatting() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
            <w:tbl><w:tr>
              <w:tc><w:p><w:r><w:t>Durum:</w:t></w:r></w:p></w:tc>
              <w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>eski</w:t></w:r></w:p></w:tc>
            </w:tr></w:tbl>
        </w:body></w:document>"#;
        let mut doc = DocumentPart::parse(xml.as_bytes(), PartKind::Document).unwrap();
        assert!(write_labelled_value(&mut doc, "Durum", "Onaylandı"));
        let crate::document::Block::Table(t) = &doc.blocks[0] else {
            panic!()
        };
        let crate::document::Block::Paragraph(p) = &t.rows[0].cells[1].blocks[0] else {
            panic!()
        };
        let crate::document::ParaChild::Run(r) = &p.children[0] else {
            panic!()
        };
        assert!(r.props.bold);
        assert_eq!(r.text(), "Onaylandı");
    }
}
