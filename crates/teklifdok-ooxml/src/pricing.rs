//! Dynamic pricing table population
//!
//! Finds the offer's pricing table by its header row, resizes the data
//! region to the number of line items, writes per-row values and fills the
//! three summary rows (subtotal, discount, net total). Columns and summary
//! rows are identified by text, never by index; templates prepend title
//! rows and reorder columns between revisions.

use teklifdok_model::{LineItem, OfferTotals};

use crate::document::{for_each_table_mut, DocumentPart, Table, TableCell};
use crate::error::Warning;
use crate::query::normalize_label;

/// Right inset for numeric cells, in twips (~2mm)
const NUMERIC_INSET: u32 = 113;

/// Header rows are searched only near the top of each table
const HEADER_SCAN_ROWS: usize = 3;

/// Resolved column indices of a pricing header row
#[derive(Debug, Default, Clone, Copy)]
struct Columns {
    parametre: Option<usize>,
    metot: Option<usize>,
    adet: Option<usize>,
    birim_fiyat: Option<usize>,
    top_fiyat: Option<usize>,
}

/// Populate the pricing table of `part` with `items` and `totals`.
///
/// When no table carries a pricing header row the document is left
/// untouched and a warning is recorded; narrative offers legitimately
/// have no line-item table.
pub fn fill_pricing_table(
    part: &mut DocumentPart,
    items: &[LineItem],
    totals: &OfferTotals,
    warnings: &mut Vec<Warning>,
) {
    let mut malformed = Vec::new();
    let mut summary_missing: Vec<&'static str> = Vec::new();

    let found = for_each_table_mut(&mut part.blocks, &mut |table| {
        let Some(header_idx) = find_header_row(table) else {
            return false;
        };
        let columns = resolve_columns(table, header_idx);
        populate(
            table,
            header_idx,
            columns,
            items,
            totals,
            &mut malformed,
            &mut summary_missing,
        );
        true
    });

    if !found {
        warnings.push(Warning::PricingTableNotFound);
        return;
    }
    for (field, value) in malformed {
        warnings.push(Warning::MalformedNumeric { field, value });
    }
    for label in summary_missing {
        warnings.push(Warning::SummaryRowNotFound(label));
    }
}

/// A row within the first few rows whose concatenated text mentions both
/// the parameter and the method column is the header row.
fn find_header_row(table: &Table) -> Option<usize> {
    for idx in 0..table.rows.len().min(HEADER_SCAN_ROWS) {
        let text = normalize_label(&table.rows[idx].text());
        if text.contains("parametre") && (text.contains("metot") || text.contains("metod")) {
            return Some(idx);
        }
    }
    None
}

fn resolve_columns(table: &Table, header_idx: usize) -> Columns {
    let mut cols = Columns::default();
    let cells = &table.rows[header_idx].cells;

    for (i, cell) in cells.iter().enumerate() {
        let text = normalize_label(&cell.text());
        if text.is_empty() {
            continue;
        }
        if cols.parametre.is_none() && text.contains("parametre") {
            cols.parametre = Some(i);
        } else if cols.metot.is_none() && (text.contains("metot") || text.contains("metod")) {
            cols.metot = Some(i);
        } else if cols.adet.is_none() && text.contains("adet") {
            cols.adet = Some(i);
        } else if cols.birim_fiyat.is_none() && text.contains("birim") {
            cols.birim_fiyat = Some(i);
        } else if cols.top_fiyat.is_none()
            && (text.contains("toplam") || (text.contains("top") && text.contains("fiyat")))
        {
            cols.top_fiyat = Some(i);
        } else if cols.birim_fiyat.is_none() && text.contains("fiyat") {
            cols.birim_fiyat = Some(i);
        }
    }

    // Positional fallback: unless both money columns resolved by name,
    // the last two columns hold unit price and line total
    let n = cells.len();
    let resolved = usize::from(cols.birim_fiyat.is_some()) + usize::from(cols.top_fiyat.is_some());
    if resolved < 2 && n >= 2 {
        cols.birim_fiyat = Some(n - 2);
        cols.top_fiyat = Some(n - 1);
    }
    cols
}

fn populate(
    table: &mut Table,
    header_idx: usize,
    columns: Columns,
    items: &[LineItem],
    totals: &OfferTotals,
    malformed: &mut Vec<(String, String)>,
    summary_missing: &mut Vec<&'static str>,
) {
    // The first "toplam" row after the header closes the data region
    let mut boundary = table.rows.len();
    for idx in header_idx + 1..table.rows.len() {
        if normalize_label(&table.rows[idx].text()).contains("toplam") {
            boundary = idx;
            break;
        }
    }

    // Resize the data region to items.len()
    let capacity = boundary - (header_idx + 1);
    if items.len() > capacity {
        let template_row = if capacity > 0 {
            table.rows[boundary - 1].clone()
        } else {
            blank_row(table.rows[header_idx].cells.len())
        };
        for _ in 0..items.len() - capacity {
            table.rows.insert(boundary, template_row.clone());
            boundary += 1;
        }
    } else if items.len() < capacity {
        // Delete from the bottom up so earlier indices stay valid
        for idx in (header_idx + 1 + items.len()..boundary).rev() {
            table.rows.remove(idx);
        }
        boundary = header_idx + 1 + items.len();
    }

    // Per-item values
    for (i, item) in items.iter().enumerate() {
        let row = &mut table.rows[header_idx + 1 + i];

        if let Some(col) = columns.parametre {
            if let Some(cell) = row.cells.get_mut(col) {
                cell.set_text(item.parametre.clone());
            }
        }
        if let Some(col) = columns.metot {
            if let Some(cell) = row.cells.get_mut(col) {
                cell.set_text(item.metot.clone());
            }
        }
        if let Some(col) = columns.adet {
            if let Some(cell) = row.cells.get_mut(col) {
                if let Err(raw) = item.adet.resolve() {
                    malformed.push((format!("kalem[{i}].adet"), raw.to_string()));
                }
                set_numeric(cell, format!("{}", item.quantity()));
            }
        }
        if let Some(col) = columns.birim_fiyat {
            if let Some(cell) = row.cells.get_mut(col) {
                if let Err(raw) = item.birim_fiyat.resolve() {
                    malformed.push((format!("kalem[{i}].birimFiyat"), raw.to_string()));
                }
                set_numeric(cell, format_money(item.birim_fiyat.resolve_or_zero()));
            }
        }
        if let Some(col) = columns.top_fiyat {
            if let Some(cell) = row.cells.get_mut(col) {
                set_numeric(cell, format_money(item.line_total()));
            }
        }
    }

    write_summary_rows(table, boundary, totals, summary_missing);
}

/// Write the three summary values into the rows after the data region.
///
/// Discount and net-total labels are matched before the bare "toplam"
/// subtotal label; all three share the "toplam" substring and checking
/// the generic label first would capture the net-total row.
fn write_summary_rows(
    table: &mut Table,
    boundary: usize,
    totals: &OfferTotals,
    summary_missing: &mut Vec<&'static str>,
) {
    let mut iskonto_row = None;
    let mut net_row = None;
    let mut toplam_row = None;

    for idx in boundary..table.rows.len() {
        let text = normalize_label(&table.rows[idx].text());
        if iskonto_row.is_none() && (text.contains("iskonto") || text.contains("indirim")) {
            iskonto_row = Some(idx);
        } else if net_row.is_none()
            && (text.contains("toplam tutar") || text.contains("net toplam"))
        {
            net_row = Some(idx);
        } else if toplam_row.is_none() && text.contains("toplam") {
            toplam_row = Some(idx);
        }
    }

    let writes: [(Option<usize>, f64, &'static str); 3] = [
        (toplam_row, totals.toplam, "toplam"),
        (iskonto_row, totals.iskonto, "iskonto"),
        (net_row, totals.net, "toplam tutar"),
    ];
    for (row, value, label) in writes {
        match row {
            Some(idx) => {
                if let Some(cell) = table.rows[idx].cells.last_mut() {
                    set_numeric(cell, format_money(value));
                }
            }
            None => summary_missing.push(label),
        }
    }
}

fn blank_row(cells: usize) -> crate::document::TableRow {
    crate::document::TableRow {
        props: String::new(),
        cells: (0..cells).map(|_| TableCell::default()).collect(),
    }
}

/// Numeric cells are right-aligned with a fixed right inset
fn set_numeric(cell: &mut TableCell, text: String) {
    cell.set_text(text);
    if let Some(para) = cell.first_paragraph_mut() {
        para.props.justify = Some("right".to_string());
        para.props.indent_right = Some(NUMERIC_INSET);
    }
}

fn format_money(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, DocumentPart, PartKind};
    use teklifdok_model::LineItem;

    fn doc_with_table(rows: &[&[&str]]) -> DocumentPart {
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

    fn pricing_doc() -> DocumentPart {
        doc_with_table(&[
            &["Parametre", "Metodu", "Adet", "Birim Fiyat", "Top. Fiyat"],
            &["", "", "", "", ""],
            &["TOPLAM:", "", "", "", ""],
            &["İSKONTO (TL):", "", "", "", ""],
            &["TOPLAM TUTAR (TL):", "", "", "", ""],
        ])
    }

    fn table(doc: &DocumentPart) -> &Table {
        let Block::Table(t) = &doc.blocks[0] else {
            panic!("Expected table")
        };
        t
    }

    #[test]
    fn test_scenario_single_item() {
        let mut doc = pricing_doc();
        let items = vec![LineItem::new("TOZ", "EPA-5", 3, 100.0)];
        let totals = OfferTotals {
            toplam: 300.0,
            iskonto: 30.0,
            net: 270.0,
        };
        let mut warnings = Vec::new();
        fill_pricing_table(&mut doc, &items, &totals, &mut warnings);
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");

        let t = table(&doc);
        let data = &t.rows[1];
        assert_eq!(data.cells[0].text(), "TOZ");
        assert_eq!(data.cells[1].text(), "EPA-5");
        assert_eq!(data.cells[2].text(), "3");
        assert_eq!(data.cells[3].text(), "100.00");
        assert_eq!(data.cells[4].text(), "300.00");

        // Summary rows: subtotal, discount, net (into the last cell)
        assert_eq!(t.rows[2].cells[4].text(), "300.00");
        assert_eq!(t.rows[3].cells[4].text(), "30.00");
        assert_eq!(t.rows[4].cells[4].text(), "270.00");
    }

    #[test]
    fn test_grows_data_region() {
        let mut doc = pricing_doc();
        let items = vec![
            LineItem::new("TOZ", "EPA-5", 3, 100.0),
            LineItem::new("SO2", "TS ISO 7935", 2, 75.0),
            LineItem::new("NOX", "EPA CTM-022", 1, 120.0),
        ];
        let totals = OfferTotals::from_items(&items, 0.0);
        let mut warnings = Vec::new();
        fill_pricing_table(&mut doc, &items, &totals, &mut warnings);

        let t = table(&doc);
        // header + 3 data + 3 summary
        assert_eq!(t.rows.len(), 7);
        assert_eq!(t.rows[2].cells[0].text(), "SO2");
        assert_eq!(t.rows[3].cells[0].text(), "NOX");
        assert!(normalize_label(&t.rows[4].text()).starts_with("toplam"));
    }

    #[test]
    fn test_shrinks_data_region() {
        let mut doc = doc_with_table(&[
            &["Parametre", "Metodu", "Adet", "Birim Fiyat", "Top. Fiyat"],
            &["a", "", "", "", ""],
            &["b", "", "", "", ""],
            &["c", "", "", "", ""],
            &["TOPLAM:", "", "", "", ""],
        ]);
        let items = vec![LineItem::new("TOZ", "EPA-5", 1, 50.0)];
        let totals = OfferTotals::from_items(&items, 0.0);
        let mut warnings = Vec::new();
        fill_pricing_table(&mut doc, &items, &totals, &mut warnings);

        let t = table(&doc);
        assert_eq!(t.rows.len(), 3);
        assert_eq!(t.rows[1].cells[0].text(), "TOZ");
        assert!(normalize_label(&t.rows[2].text()).contains("toplam"));
    }

    #[test]
    fn test_header_row_not_first() {
        let mut doc = doc_with_table(&[
            &["FİYAT TEKLİFİ"],
            &["Parametre", "Metodu", "Adet", "Birim Fiyat", "Top. Fiyat"],
            &["", "", "", "", ""],
            &["TOPLAM:", "", "", "", ""],
        ]);
        let items = vec![LineItem::new("TOZ", "EPA-5", 2, 10.0)];
        let totals = OfferTotals::from_items(&items, 0.0);
        let mut warnings = Vec::new();
        fill_pricing_table(&mut doc, &items, &totals, &mut warnings);

        let t = table(&doc);
        assert_eq!(t.rows[2].cells[0].text(), "TOZ");
        assert_eq!(t.rows[2].cells[4].text(), "20.00");
    }

    #[test]
    fn test_summary_precedence_shared_substring() {
        // All three labels contain "toplam"; each value must land on its
        // own row.
        let mut doc = doc_with_table(&[
            &["Parametre", "Metot", "Adet", "Birim Fiyat", "Toplam Fiyat"],
            &["", "", "", "", ""],
            &["TOPLAM TUTAR (TL):", ""],
            &["İSKONTO (TL):", ""],
            &["TOPLAM:", ""],
        ]);
        let items = vec![LineItem::new("TOZ", "EPA-5", 1, 100.0)];
        let totals = OfferTotals {
            toplam: 100.0,
            iskonto: 10.0,
            net: 90.0,
        };
        let mut warnings = Vec::new();
        fill_pricing_table(&mut doc, &items, &totals, &mut warnings);

        let t = table(&doc);
        assert_eq!(t.rows[2].cells[1].text(), "90.00");
        assert_eq!(t.rows[3].cells[1].text(), "10.00");
        assert_eq!(t.rows[4].cells[1].text(), "100.00");
    }

    #[test]
    fn test_unnamed_total_column_resolved_by_position() {
        // "Tutar" matches no money-column name; only the unit price
        // resolves by text, so the last two columns take over.
        let mut doc = doc_with_table(&[
            &["Parametre", "Metodu", "Adet", "Birim Fiyat", "Tutar"],
            &["", "", "", "", ""],
            &["TOPLAM:", "", "", "", ""],
            &["İSKONTO (TL):", "", "", "", ""],
            &["TOPLAM TUTAR (TL):", "", "", "", ""],
        ]);
        let items = vec![LineItem::new("TOZ", "EPA-5", 3, 100.0)];
        let totals = OfferTotals {
            toplam: 300.0,
            iskonto: 30.0,
            net: 270.0,
        };
        let mut warnings = Vec::new();
        fill_pricing_table(&mut doc, &items, &totals, &mut warnings);
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");

        let t = table(&doc);
        assert_eq!(t.rows[1].cells[3].text(), "100.00");
        assert_eq!(t.rows[1].cells[4].text(), "300.00");
    }

    #[test]
    fn test_no_pricing_table_warns_and_skips() {
        let mut doc = doc_with_table(&[&["Firma Adı:", ""]]);
        let mut warnings = Vec::new();
        fill_pricing_table(
            &mut doc,
            &[LineItem::new("TOZ", "EPA-5", 1, 1.0)],
            &OfferTotals::default(),
            &mut warnings,
        );
        assert_eq!(warnings, vec![Warning::PricingTableNotFound]);
    }

    #[test]
    fn test_malformed_quantity_warns_and_writes_zero() {
        let mut doc = pricing_doc();
        let items = vec![LineItem {
            parametre: "TOZ".into(),
            metot: "EPA-5".into(),
            adet: teklifdok_model::Numeric::Text("üç".into()),
            birim_fiyat: teklifdok_model::Numeric::Num(100.0),
            top_fiyat: None,
        }];
        let totals = OfferTotals::default();
        let mut warnings = Vec::new();
        fill_pricing_table(&mut doc, &items, &totals, &mut warnings);

        let t = table(&doc);
        assert_eq!(t.rows[1].cells[2].text(), "0");
        assert!(warnings.iter().any(|w| matches!(
            w,
            Warning::MalformedNumeric { field, value }
                if field == "kalem[0].adet" && value == "üç"
        )));
    }

    #[test]
    fn test_missing_summary_rows_warn() {
        let mut doc = doc_with_table(&[
            &["Parametre", "Metot", "Adet", "Birim Fiyat", "Top. Fiyat"],
            &["", "", "", "", ""],
        ]);
        let items = vec![LineItem::new("TOZ", "EPA-5", 1, 100.0)];
        let mut warnings = Vec::new();
        fill_pricing_table(&mut doc, &items, &OfferTotals::default(), &mut warnings);
        assert_eq!(
            warnings,
            vec![
                Warning::SummaryRowNotFound("toplam"),
                Warning::SummaryRowNotFound("iskonto"),
                Warning::SummaryRowNotFound("toplam tutar"),
            ]
        );
    }

    #[test]
    fn test_numeric_cells_right_aligned() {
        let mut doc = pricing_doc();
        let items = vec![LineItem::new("TOZ", "EPA-5", 3, 100.0)];
        let totals = OfferTotals::from_items(&items, 0.0);
        let mut warnings = Vec::new();
        fill_pricing_table(&mut doc, &items, &totals, &mut warnings);

        let Block::Table(t) = &doc.blocks[0] else { panic!() };
        let Block::Paragraph(p) = &t.rows[1].cells[3].blocks[0] else {
            panic!()
        };
        assert_eq!(p.props.justify.as_deref(), Some("right"));
        assert_eq!(p.props.indent_right, Some(NUMERIC_INSET));
    }
}
