//! Parameter detail blocks
//!
//! Appends one formatted sub-report per measured parameter under a chimney:
//! a sub-heading followed by a 6-column grid holding three label/value
//! pairs per row. Known measurement fields come first in a fixed order;
//! anything else follows in encounter order so evolved records still print
//! completely.

use crate::document::{
    Block, DocumentPart, ParaChild, ParaProps, Paragraph, Run, RunContent, RunProps, Table,
    TableCell, TableRow,
};
use crate::query::normalize_label;

/// Label/value pairs per grid row
const PAIRS_PER_ROW: usize = 3;

/// Placeholder for missing or blank values; exported forms must never show
/// an empty cell next to a label
const BLANK_VALUE: &str = "-";

/// Well-known chimney measurement fields, in print order
const PRIORITY_KEYS: &[&str] = &[
    "Yakıt Türü",
    "Isıl Güç",
    "Kaynak Türü",
    "Baca Şekli",
    "Baca Ölçüsü",
    "Çatı Şekli",
    "Yerden Yük.",
    "Çatı Yük.",
    "Rüzgar Hızı",
    "Ort. Sıcaklık",
    "Ort. Nem",
    "Ort. Basınç",
];

/// Append the detail block for one parameter of one chimney.
pub fn append_parameter_block(
    doc: &mut DocumentPart,
    baca_adi: &str,
    parametre_adi: &str,
    values: &[(String, String)],
) {
    doc.blocks.push(Block::Paragraph(heading(baca_adi, parametre_adi)));
    doc.blocks.push(Block::Table(grid(values)));
    doc.blocks.push(Block::Paragraph(Paragraph::spacer()));
}

fn heading(baca_adi: &str, parametre_adi: &str) -> Paragraph {
    Paragraph {
        props: ParaProps {
            spacing_zero: true,
            ..ParaProps::default()
        },
        children: vec![ParaChild::Run(Run {
            props: RunProps {
                bold: true,
                size_half_points: Some(22),
                ..RunProps::default()
            },
            content: vec![RunContent::Text(format!("{baca_adi} - {parametre_adi}"))],
        })],
    }
}

/// Order entries: priority keys first, then the rest as encountered.
fn ordered_entries(values: &[(String, String)]) -> Vec<(String, String)> {
    let mut used = vec![false; values.len()];
    let mut out = Vec::with_capacity(values.len());

    for key in PRIORITY_KEYS {
        let wanted = normalize_label(key);
        for (i, (label, value)) in values.iter().enumerate() {
            if !used[i] && normalize_label(label) == wanted {
                used[i] = true;
                out.push((label.clone(), value.clone()));
                break;
            }
        }
    }
    for (i, entry) in values.iter().enumerate() {
        if !used[i] {
            out.push(entry.clone());
        }
    }
    out
}

fn grid(values: &[(String, String)]) -> Table {
    let entries = ordered_entries(values);
    let mut rows = Vec::new();

    for chunk in entries.chunks(PAIRS_PER_ROW) {
        let mut cells = Vec::with_capacity(PAIRS_PER_ROW * 2);
        for (label, value) in chunk {
            cells.push(grid_cell(format!("{label}:"), true));
            let shown = if value.trim().is_empty() {
                BLANK_VALUE.to_string()
            } else {
                value.clone()
            };
            cells.push(grid_cell(shown, false));
        }
        // Incomplete final rows keep six cells so column borders line up
        while cells.len() < PAIRS_PER_ROW * 2 {
            cells.push(TableCell::default());
        }
        rows.push(TableRow {
            props: String::new(),
            cells,
        });
    }

    Table {
        props: concat!(
            r#"<w:tblPr><w:tblW w:w="5000" w:type="pct"/>"#,
            r#"<w:tblBorders>"#,
            r#"<w:top w:val="single" w:sz="4" w:color="auto"/>"#,
            r#"<w:left w:val="single" w:sz="4" w:color="auto"/>"#,
            r#"<w:bottom w:val="single" w:sz="4" w:color="auto"/>"#,
            r#"<w:right w:val="single" w:sz="4" w:color="auto"/>"#,
            r#"<w:insideH w:val="single" w:sz="4" w:color="auto"/>"#,
            r#"<w:insideV w:val="single" w:sz="4" w:color="auto"/>"#,
            r#"</w:tblBorders></w:tblPr>"#
        )
        .to_string(),
        grid: concat!(
            r#"<w:tblGrid>"#,
            r#"<w:gridCol w:w="1548"/><w:gridCol w:w="1548"/>"#,
            r#"<w:gridCol w:w="1548"/><w:gridCol w:w="1548"/>"#,
            r#"<w:gridCol w:w="1548"/><w:gridCol w:w="1548"/>"#,
            r#"</w:tblGrid>"#
        )
        .to_string(),
        extras: String::new(),
        rows,
    }
}

fn grid_cell(text: String, bold: bool) -> TableCell {
    TableCell {
        props: String::new(),
        blocks: vec![Block::Paragraph(Paragraph {
            props: ParaProps {
                spacing_zero: true,
                ..ParaProps::default()
            },
            children: vec![ParaChild::Run(Run {
                props: RunProps {
                    bold,
                    size_half_points: Some(18),
                    ..RunProps::default()
                },
                content: vec![RunContent::Text(text)],
            })],
        })],
    }
}
