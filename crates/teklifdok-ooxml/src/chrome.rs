//! Header and footer synthesis
//!
//! Applied once to the fully merged document, not per fragment: headers
//! and footers belong to the document's sections, and per-fragment chrome
//! would either be dropped by the merge or duplicated.
//!
//! The header becomes a single full-width banner image framed by
//! zero-spacing paragraphs. The footer becomes a borderless 1x3 table:
//! offer number on the left, the company block in the middle, and the form
//! code with a live "page / page count" field pair on the right.

use crate::archive::DocxArchive;
use crate::document::{
    Block, DocumentPart, ParaChild, ParaProps, Paragraph, PartKind, Run, RunContent, RunProps,
    Table, TableCell, TableRow,
};
use crate::error::Result;
use crate::relationships::Relationships;
use crate::writer::serialize_part;

const HEADER_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
const FOOTER_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";

/// Banner extent in EMUs (full A4 text width, fixed banner height)
const BANNER_CX: u64 = 5943600;
const BANNER_CY: u64 = 962025;

const FOOTER_LABEL: &str = "Sayı:";
const FOOTER_COMPANY_LINES: [&str; 3] = [
    "AKARE ÇEVRE LABORATUVAR VE DAN. HİZM. TİC.LTD.ŞTİ Kirazlıyalı Mah. Süleyman Demirel Cad. No:28/A",
    "Körfez V.D 013 065 1290 Körfez-KOCAELİ",
    "info@akarecevre.com  www.akarecevre.com",
];
const FOOTER_FORM_CODE: &str = "AÇ.F.102/Rev04/14.08.2025  ";
/// Footer text: 9pt bold navy
const FOOTER_SIZE: u32 = 18;
const FOOTER_COLOR: &str = "000080";

/// Replace every section's header content with the banner image.
///
/// Existing header parts are overwritten in place; when the document has
/// none, a header part is created and referenced from the section
/// properties.
pub fn apply_header_banner(
    archive: &mut DocxArchive,
    doc: &mut DocumentPart,
    image: &[u8],
    extension: &str,
) -> Result<()> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    let media_path = archive.free_media_path("banner", &ext);
    archive.set(media_path.clone(), image.to_vec());
    archive.ensure_default_content_type(&ext, image_content_type(&ext))?;
    // Target relative to the word/ directory
    let media_target = media_path.trim_start_matches("word/").to_string();

    let headers = archive.header_parts();
    if headers.is_empty() {
        let part_path = free_part_path(archive, "header");
        write_banner_part(archive, &part_path, &media_target)?;
        let rid = register_part(archive, &part_path, Relationships::TYPE_HEADER)?;
        archive.ensure_override_content_type(&format!("/{part_path}"), HEADER_CONTENT_TYPE)?;
        add_section_reference(doc, &format!(r#"<w:headerReference w:type="default" r:id="{rid}"/>"#));
    } else {
        for part_path in headers {
            write_banner_part(archive, &part_path, &media_target)?;
        }
    }
    Ok(())
}

/// Replace every section's footer content with the 1x3 footer table.
pub fn apply_footer_layout(
    archive: &mut DocxArchive,
    doc: &mut DocumentPart,
    offer_no: &str,
) -> Result<()> {
    let footer = footer_part(offer_no);
    let xml = serialize_part(&footer);

    let footers = archive.footer_parts();
    if footers.is_empty() {
        let part_path = free_part_path(archive, "footer");
        archive.set_string(part_path.clone(), xml);
        let rid = register_part(archive, &part_path, Relationships::TYPE_FOOTER)?;
        archive.ensure_override_content_type(&format!("/{part_path}"), FOOTER_CONTENT_TYPE)?;
        add_section_reference(doc, &format!(r#"<w:footerReference w:type="default" r:id="{rid}"/>"#));
    } else {
        for part_path in footers {
            archive.set_string(part_path, xml.clone());
        }
    }
    Ok(())
}

/// Build the footer part: a borderless full-width 1x3 table.
fn footer_part(offer_no: &str) -> DocumentPart {
    let mut left = TableCell::default();
    left.blocks.push(Block::Paragraph(footer_paragraph(
        format!("{FOOTER_LABEL}{offer_no}"),
        None,
    )));

    let mut middle = TableCell::default();
    for line in FOOTER_COMPANY_LINES {
        middle.blocks.push(Block::Paragraph(footer_paragraph(
            line.to_string(),
            Some("center"),
        )));
    }

    let mut right = TableCell::default();
    right.blocks.push(Block::Paragraph(page_field_paragraph()));

    let table = Table {
        props: r#"<w:tblPr><w:tblW w:w="5000" w:type="pct"/><w:tblLayout w:type="fixed"/></w:tblPr>"#
            .to_string(),
        grid: r#"<w:tblGrid><w:gridCol w:w="3096"/><w:gridCol w:w="3096"/><w:gridCol w:w="3096"/></w:tblGrid>"#
            .to_string(),
        extras: String::new(),
        rows: vec![TableRow {
            props: String::new(),
            cells: vec![left, middle, right],
        }],
    };

    DocumentPart {
        kind: PartKind::Footer,
        root_attrs: String::new(),
        blocks: vec![Block::Table(table), Block::Paragraph(Paragraph::spacer())],
        sect_pr: None,
    }
}

fn footer_props() -> RunProps {
    RunProps {
        bold: true,
        size_half_points: Some(FOOTER_SIZE),
        color: Some(FOOTER_COLOR.to_string()),
        rest: String::new(),
    }
}

fn footer_paragraph(text: String, justify: Option<&str>) -> Paragraph {
    Paragraph {
        props: ParaProps {
            justify: justify.map(str::to_string),
            spacing_zero: true,
            ..ParaProps::default()
        },
        children: vec![ParaChild::Run(Run {
            props: footer_props(),
            content: vec![RunContent::Text(text)],
        })],
    }
}

/// Form code followed by live PAGE "/" NUMPAGES fields. All field pieces
/// sit in one run per piece so the merge engine's run handling never
/// splits a begin/instruction/end triple.
fn page_field_paragraph() -> Paragraph {
    let run = |content: RunContent| {
        ParaChild::Run(Run {
            props: footer_props(),
            content: vec![content],
        })
    };
    Paragraph {
        props: ParaProps {
            justify: Some("right".to_string()),
            spacing_zero: true,
            ..ParaProps::default()
        },
        children: vec![
            run(RunContent::Text(FOOTER_FORM_CODE.to_string())),
            run(RunContent::FieldChar("begin".to_string())),
            run(RunContent::InstrText("PAGE".to_string())),
            run(RunContent::FieldChar("end".to_string())),
            run(RunContent::Text("/".to_string())),
            run(RunContent::FieldChar("begin".to_string())),
            run(RunContent::InstrText("NUMPAGES".to_string())),
            run(RunContent::FieldChar("end".to_string())),
        ],
    }
}

/// Banner header: the image paragraph framed by zero-spacing empty
/// paragraphs so the header adds no extra vertical gap.
fn banner_part(image_rid: &str) -> DocumentPart {
    let drawing = banner_drawing_xml(image_rid);
    let image_para = Paragraph {
        props: ParaProps {
            justify: Some("center".to_string()),
            spacing_zero: true,
            ..ParaProps::default()
        },
        children: vec![ParaChild::Run(Run {
            props: RunProps::default(),
            content: vec![RunContent::Drawing(drawing)],
        })],
    };
    DocumentPart {
        kind: PartKind::Header,
        root_attrs: String::new(),
        blocks: vec![
            Block::Paragraph(Paragraph::spacer()),
            Block::Paragraph(image_para),
            Block::Paragraph(Paragraph::spacer()),
        ],
        sect_pr: None,
    }
}

fn banner_drawing_xml(image_rid: &str) -> String {
    format!(
        concat!(
            r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="1" name="Banner"/>"#,
            r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
            r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:nvPicPr><pic:cNvPr id="1" name="Banner"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#
        ),
        cx = BANNER_CX,
        cy = BANNER_CY,
        rid = image_rid
    )
}

/// Overwrite one header part with the banner content and wire its image
/// relationship.
fn write_banner_part(archive: &mut DocxArchive, part_path: &str, media_target: &str) -> Result<()> {
    let rels_path = DocxArchive::rels_path_for(part_path);
    let mut rels = Relationships::parse_or_default(archive.get(&rels_path))?;
    let rid = rels.add_image(media_target);
    archive.set_string(rels_path, rels.to_xml());
    archive.set_string(part_path.to_string(), serialize_part(&banner_part(&rid)));
    Ok(())
}

fn image_content_type(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// First unused word/headerN.xml or word/footerN.xml path
fn free_part_path(archive: &DocxArchive, stem: &str) -> String {
    let mut n = 1;
    loop {
        let path = format!("word/{stem}{n}.xml");
        if !archive.contains(&path) {
            return path;
        }
        n += 1;
    }
}

/// Register a header/footer part in the document relationships and return
/// the relationship ID.
fn register_part(archive: &mut DocxArchive, part_path: &str, rel_type: &str) -> Result<String> {
    let rels_path = DocxArchive::rels_path_for("word/document.xml");
    let mut rels = Relationships::parse_or_default(archive.get(&rels_path))?;
    let target = part_path.trim_start_matches("word/").to_string();
    let rid = rels.add(target, rel_type.to_string());
    archive.set_string(rels_path, rels.to_xml());
    Ok(rid)
}

/// Insert a header/footer reference at the front of the body-level section
/// properties, creating them when the template has none.
fn add_section_reference(doc: &mut DocumentPart, reference: &str) {
    match &mut doc.sect_pr {
        Some(sect_pr) => {
            if let Some(pos) = sect_pr.find('>') {
                sect_pr.insert_str(pos + 1, reference);
            }
        }
        None => {
            doc.sect_pr = Some(format!("<w:sectPr>{reference}</w:sectPr>"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PartKind;

    fn base_archive() -> DocxArchive {
        let mut archive = DocxArchive::empty();
        archive.set_string(
            "[Content_Types].xml",
            r#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#,
        );
        archive.set_string(
            "word/document.xml",
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p/></w:body></w:document>"#,
        );
        archive
    }

    fn parse_doc(archive: &DocxArchive) -> DocumentPart {
        DocumentPart::parse(archive.document_xml().unwrap(), PartKind::Document).unwrap()
    }

    #[test]
    fn test_footer_created_when_none_exists() {
        let mut archive = base_archive();
        let mut doc = parse_doc(&archive);
        apply_footer_layout(&mut archive, &mut doc, "TKF-2025-041").unwrap();

        let footer =
            String::from_utf8(archive.get("word/footer1.xml").unwrap().to_vec()).unwrap();
        assert!(footer.contains("Sayı:TKF-2025-041"));
        assert!(footer.contains("info@akarecevre.com"));
        assert!(footer.contains("AÇ.F.102/Rev04/14.08.2025"));
        assert!(footer.contains(r#"<w:fldChar w:fldCharType="begin"/>"#));
        assert!(footer.contains("PAGE"));
        assert!(footer.contains("NUMPAGES"));
        assert!(footer.contains(r#"<w:color w:val="000080"/>"#));

        // Wired into document rels and section properties
        let rels = String::from_utf8(
            archive
                .get("word/_rels/document.xml.rels")
                .unwrap()
                .to_vec(),
        )
        .unwrap();
        assert!(rels.contains("footer1.xml"));
        assert!(doc.sect_pr.as_ref().unwrap().contains("w:footerReference"));

        // Content type override added
        let ct = String::from_utf8(archive.get("[Content_Types].xml").unwrap().to_vec()).unwrap();
        assert!(ct.contains("/word/footer1.xml"));
    }

    #[test]
    fn test_existing_footers_overwritten() {
        let mut archive = base_archive();
        archive.set_string("word/footer1.xml", "<w:ftr>old</w:ftr>");
        archive.set_string("word/footer2.xml", "<w:ftr>old</w:ftr>");
        let mut doc = parse_doc(&archive);
        apply_footer_layout(&mut archive, &mut doc, "TKF-1").unwrap();

        for part in ["word/footer1.xml", "word/footer2.xml"] {
            let xml = String::from_utf8(archive.get(part).unwrap().to_vec()).unwrap();
            assert!(xml.contains("Sayı:TKF-1"));
        }
        // No new reference injected when footers already exist
        assert!(doc.sect_pr.is_none());
    }

    #[test]
    fn test_header_banner_created() {
        let mut archive = base_archive();
        let mut doc = parse_doc(&archive);
        apply_header_banner(&mut archive, &mut doc, &[0x89, 0x50, 0x4e, 0x47], "png").unwrap();

        assert!(archive.contains("word/media/banner1.png"));
        let header =
            String::from_utf8(archive.get("word/header1.xml").unwrap().to_vec()).unwrap();
        assert!(header.contains("<w:drawing>"));
        assert!(header.contains(r#"r:embed="rId1""#));
        // Framing paragraphs have zero spacing
        assert!(header.contains(r#"<w:spacing w:before="0" w:after="0"/>"#));

        let header_rels = String::from_utf8(
            archive.get("word/_rels/header1.xml.rels").unwrap().to_vec(),
        )
        .unwrap();
        assert!(header_rels.contains("media/banner1.png"));
        assert!(doc.sect_pr.as_ref().unwrap().contains("w:headerReference"));

        let ct = String::from_utf8(archive.get("[Content_Types].xml").unwrap().to_vec()).unwrap();
        assert!(ct.contains(r#"Extension="png""#));
    }

    #[test]
    fn test_existing_header_replaced_with_banner() {
        let mut archive = base_archive();
        archive.set_string(
            "word/header1.xml",
            r#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t>Eski başlık</w:t></w:r></w:p></w:hdr>"#,
        );
        let mut doc = parse_doc(&archive);
        apply_header_banner(&mut archive, &mut doc, &[1, 2, 3], "jpeg").unwrap();

        let header =
            String::from_utf8(archive.get("word/header1.xml").unwrap().to_vec()).unwrap();
        assert!(!header.contains("Eski başlık"));
        assert!(header.contains("<w:drawing>"));
        assert!(archive.contains("word/media/banner1.jpeg"));
    }

    #[test]
    fn test_reference_insertion_into_existing_sect_pr() {
        let mut doc = DocumentPart::empty(PartKind::Document);
        doc.sect_pr = Some(r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#.to_string());
        add_section_reference(&mut doc, r#"<w:footerReference w:type="default" r:id="rId9"/>"#);
        let sect_pr = doc.sect_pr.unwrap();
        // Reference comes before the page geometry
        assert!(sect_pr.find("footerReference").unwrap() < sect_pr.find("pgSz").unwrap());
    }

    #[test]
    fn test_footer_field_runs_form_complete_triples() {
        let part = footer_part("TKF-1");
        let xml = serialize_part(&part);
        assert_eq!(xml.matches(r#"w:fldCharType="begin""#).count(), 2);
        assert_eq!(xml.matches(r#"w:fldCharType="end""#).count(), 2);
        assert_eq!(xml.matches("instrText").count(), 4); // 2 fields, open+close tags
    }
}
