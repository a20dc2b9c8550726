//! WordprocessingML serialization
//!
//! Turns a [`DocumentPart`] tree back into part XML. Interpreted properties
//! are emitted from their typed fields; everything captured verbatim during
//! parsing is written back unchanged.

use crate::document::{
    Block, DocumentPart, ParaChild, Paragraph, PartKind, Run, RunContent, Table,
};

/// Main WordprocessingML namespace
pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// Relationships namespace (r:id, r:embed)
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
/// WordprocessingDrawing namespace (inline anchors)
pub const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";

/// Root attributes for parts created from scratch
pub fn default_root_attrs() -> String {
    format!(r#"xmlns:w="{NS_W}" xmlns:r="{NS_R}" xmlns:wp="{NS_WP}""#)
}

/// Serialize a part tree to XML
pub fn serialize_part(part: &DocumentPart) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');

    let root = match part.kind {
        PartKind::Document => "w:document",
        PartKind::Header => "w:hdr",
        PartKind::Footer => "w:ftr",
    };
    let attrs = if part.root_attrs.is_empty() {
        default_root_attrs()
    } else {
        part.root_attrs.clone()
    };
    xml.push_str(&format!("<{root} {attrs}>"));

    if part.kind == PartKind::Document {
        xml.push_str("<w:body>");
    }
    for block in &part.blocks {
        write_block(&mut xml, block);
    }
    if part.kind == PartKind::Document {
        if let Some(sect_pr) = &part.sect_pr {
            xml.push_str(sect_pr);
        }
        xml.push_str("</w:body>");
    }

    xml.push_str(&format!("</{root}>"));
    xml
}

fn write_block(xml: &mut String, block: &Block) {
    match block {
        Block::Paragraph(p) => write_paragraph(xml, p),
        Block::Table(t) => write_table(xml, t),
        Block::Raw(raw) => xml.push_str(raw),
    }
}

fn write_paragraph(xml: &mut String, para: &Paragraph) {
    xml.push_str("<w:p>");

    let props = &para.props;
    let has_props = props.style_id.is_some()
        || props.justify.is_some()
        || props.indent_right.is_some()
        || props.spacing_zero
        || props.sect_pr.is_some()
        || props.mark_props.is_some()
        || !props.rest.is_empty();
    if has_props {
        xml.push_str("<w:pPr>");
        if let Some(style) = &props.style_id {
            xml.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, escape_xml(style)));
        }
        xml.push_str(&props.rest);
        if props.spacing_zero {
            xml.push_str(r#"<w:spacing w:before="0" w:after="0"/>"#);
        }
        if let Some(right) = props.indent_right {
            xml.push_str(&format!(r#"<w:ind w:right="{right}"/>"#));
        }
        if let Some(jc) = &props.justify {
            xml.push_str(&format!(r#"<w:jc w:val="{}"/>"#, escape_xml(jc)));
        }
        if let Some(rpr) = &props.mark_props {
            xml.push_str(rpr);
        }
        if let Some(sect_pr) = &props.sect_pr {
            xml.push_str(sect_pr);
        }
        xml.push_str("</w:pPr>");
    }

    for child in &para.children {
        match child {
            ParaChild::Run(run) => write_run(xml, run),
            ParaChild::Raw(raw) => xml.push_str(raw),
        }
    }

    xml.push_str("</w:p>");
}

fn write_run(xml: &mut String, run: &Run) {
    xml.push_str("<w:r>");

    let props = &run.props;
    let has_props = props.bold
        || props.size_half_points.is_some()
        || props.color.is_some()
        || !props.rest.is_empty();
    if has_props {
        xml.push_str("<w:rPr>");
        xml.push_str(&props.rest);
        if props.bold {
            xml.push_str("<w:b/>");
        }
        if let Some(color) = &props.color {
            xml.push_str(&format!(r#"<w:color w:val="{}"/>"#, escape_xml(color)));
        }
        if let Some(sz) = props.size_half_points {
            xml.push_str(&format!(r#"<w:sz w:val="{sz}"/><w:szCs w:val="{sz}"/>"#));
        }
        xml.push_str("</w:rPr>");
    }

    for content in &run.content {
        match content {
            RunContent::Text(t) => {
                xml.push_str(r#"<w:t xml:space="preserve">"#);
                xml.push_str(&escape_xml(t));
                xml.push_str("</w:t>");
            }
            RunContent::Tab => xml.push_str("<w:tab/>"),
            RunContent::Break { page: true } => xml.push_str(r#"<w:br w:type="page"/>"#),
            RunContent::Break { page: false } => xml.push_str("<w:br/>"),
            RunContent::FieldChar(kind) => {
                xml.push_str(&format!(r#"<w:fldChar w:fldCharType="{}"/>"#, escape_xml(kind)));
            }
            RunContent::InstrText(t) => {
                xml.push_str(r#"<w:instrText xml:space="preserve">"#);
                xml.push_str(&escape_xml(t));
                xml.push_str("</w:instrText>");
            }
            RunContent::Drawing(raw) | RunContent::Raw(raw) => xml.push_str(raw),
        }
    }

    xml.push_str("</w:r>");
}

fn write_table(xml: &mut String, table: &Table) {
    xml.push_str("<w:tbl>");
    xml.push_str(&table.props);
    xml.push_str(&table.grid);
    xml.push_str(&table.extras);
    for row in &table.rows {
        xml.push_str("<w:tr>");
        xml.push_str(&row.props);
        for cell in &row.cells {
            xml.push_str("<w:tc>");
            xml.push_str(&cell.props);
            if cell.blocks.is_empty() {
                // A cell must end with a paragraph
                xml.push_str("<w:p/>");
            } else {
                for block in &cell.blocks {
                    write_block(xml, block);
                }
            }
            xml.push_str("</w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
}

/// Escape special characters for XML content
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
