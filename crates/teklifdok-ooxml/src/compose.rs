//! Composition orchestration
//!
//! Drives one export: load template fragments, substitute placeholders,
//! populate the pricing table, merge the fragments, synthesize header and
//! footer on the merged document and serialize the package. Every
//! recoverable problem lands in the warning list; the engine emits the best
//! document it could build.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use teklifdok_model::{build_field_map, Chimney, Offer};

use crate::archive::DocxArchive;
use crate::chrome::{apply_footer_layout, apply_header_banner};
use crate::detail::append_parameter_block;
use crate::document::{for_each_raw_xml_mut, DocumentPart, PartKind};
use crate::error::{DocxError, Result, Warning};
use crate::merge::merge;
use crate::pricing::fill_pricing_table;
use crate::query::write_labelled_value;
use crate::relationships::Relationships;
use crate::substitute::substitute;
use crate::writer::serialize_part;

/// Labelled table rows written besides the placeholder pass; labels are
/// matched against the row's first cell.
const LABELLED_FIELDS: &[(&str, fn(&Offer) -> Option<String>)] = &[
    ("Firma Adı", |o| Some(o.firma_adi.clone())),
    ("Teklif No", |o| Some(o.teklif_no.clone())),
    ("Yetkili", |o| o.yetkili.clone()),
    ("Telefon", |o| o.telefon.clone()),
    ("İl", |o| o.il.clone()),
    ("İlçe", |o| o.ilce.clone()),
];

/// Result of one composition
#[derive(Debug)]
pub struct CompositionResult {
    /// The finished DOCX package
    pub bytes: Vec<u8>,
    /// Derived output file name
    pub file_name: String,
    /// Everything that degraded along the way
    pub warnings: Vec<Warning>,
}

/// One composition run. Holds the optional banner image applied to the
/// merged document's header.
#[derive(Debug, Default)]
pub struct Composer {
    banner: Option<(Vec<u8>, String)>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `image` as the header banner, with its file extension
    /// (e.g. "png").
    pub fn with_banner(mut self, image: Vec<u8>, extension: impl Into<String>) -> Self {
        self.banner = Some((image, extension.into()));
        self
    }

    /// Compose an offer document from the given template fragments.
    ///
    /// Missing templates are skipped with a warning; composing with no
    /// loadable template at all is the one hard failure, since there is
    /// nothing to emit.
    pub fn compose_offer(&self, offer: &Offer, templates: &[PathBuf]) -> Result<CompositionResult> {
        let mut warnings = Vec::new();
        let fields = build_field_map(offer);

        let mut fragments: Vec<(DocxArchive, DocumentPart)> = Vec::new();
        for path in templates {
            match self.load_fragment(path, &mut warnings)? {
                Some(loaded) => fragments.push(loaded),
                None => continue,
            }
        }
        if fragments.is_empty() {
            return Err(DocxError::Other(
                "no template fragment could be loaded".to_string(),
            ));
        }

        // Per-fragment preparation: placeholders, labelled cells, pricing
        let mut pricing_found = false;
        let mut labels_found = vec![false; LABELLED_FIELDS.len()];
        for (archive, doc) in &mut fragments {
            substitute(doc, &fields);
            substitute_chrome_parts(archive, &fields)?;

            for (i, (label, getter)) in LABELLED_FIELDS.iter().enumerate() {
                if let Some(value) = getter(offer) {
                    labels_found[i] |= write_labelled_value(doc, label, &value);
                }
            }

            let mut local = Vec::new();
            fill_pricing_table(doc, &offer.kalemler, &offer.toplamlar, &mut local);
            if !local.contains(&Warning::PricingTableNotFound) {
                pricing_found = true;
                warnings.extend(local);
            }
        }
        if !pricing_found && !offer.kalemler.is_empty() {
            warnings.push(Warning::PricingTableNotFound);
        }
        for (i, (label, getter)) in LABELLED_FIELDS.iter().enumerate() {
            if getter(offer).is_some() && !labels_found[i] {
                debug!("label not present in any fragment: {label}");
                warnings.push(Warning::LabelNotFound(label.to_string()));
            }
        }

        // The first fragment's package becomes the master; media referenced
        // by later fragments is copied over and their relationship IDs are
        // rewritten before the trees are merged.
        let mut iter = fragments.into_iter();
        let Some((mut master_archive, first_doc)) = iter.next() else {
            return Err(DocxError::Other(
                "no template fragment could be loaded".to_string(),
            ));
        };
        let mut parts = vec![first_doc];
        let rels_path = DocxArchive::rels_path_for("word/document.xml");
        let mut master_rels =
            Relationships::parse_or_default(master_archive.document_rels_xml())?;
        for (fragment_archive, mut doc) in iter {
            remap_image_relationships(
                &mut master_archive,
                &mut master_rels,
                &fragment_archive,
                &mut doc,
            );
            parts.push(doc);
        }
        master_archive.set_string(rels_path, master_rels.to_xml());

        let mut merged = merge(parts);

        // Chrome goes on last, once, on the merged document
        apply_footer_layout(&mut master_archive, &mut merged, &offer.teklif_no)?;
        if let Some((image, ext)) = &self.banner {
            apply_header_banner(&mut master_archive, &mut merged, image, ext)?;
        }

        master_archive.set_string("word/document.xml", serialize_part(&merged));
        let bytes = master_archive.to_bytes()?;
        for warning in &warnings {
            warn!("{warning}");
        }
        Ok(CompositionResult {
            bytes,
            file_name: offer.output_file_name(),
            warnings,
        })
    }

    /// Compose a chimney measurement report: one detail block per measured
    /// parameter, appended to the template (or to a blank document).
    pub fn compose_chimney_report(
        &self,
        chimney: &Chimney,
        template: Option<&Path>,
    ) -> Result<CompositionResult> {
        let mut warnings = Vec::new();

        let mut archive = match template {
            Some(path) if path.exists() => DocxArchive::open(path)?,
            Some(path) => {
                warnings.push(Warning::TemplateMissing(path.display().to_string()));
                blank_archive()
            }
            None => blank_archive(),
        };
        let mut doc = DocumentPart::parse(archive.document_xml()?, PartKind::Document)?;

        for reading in &chimney.parametreler {
            append_parameter_block(&mut doc, &chimney.baca_adi, &reading.parametre, &reading.degerler);
        }

        if let Some((image, ext)) = &self.banner {
            apply_header_banner(&mut archive, &mut doc, image, ext)?;
        }

        archive.set_string("word/document.xml", serialize_part(&doc));
        let bytes = archive.to_bytes()?;
        let name: String = chimney
            .baca_adi
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        for warning in &warnings {
            warn!("{warning}");
        }
        Ok(CompositionResult {
            bytes,
            file_name: format!("{name}_baca_raporu.docx"),
            warnings,
        })
    }

    fn load_fragment(
        &self,
        path: &Path,
        warnings: &mut Vec<Warning>,
    ) -> Result<Option<(DocxArchive, DocumentPart)>> {
        if !path.exists() {
            warnings.push(Warning::TemplateMissing(path.display().to_string()));
            return Ok(None);
        }
        debug!("loading template {}", path.display());
        let archive = DocxArchive::open(path)?;
        let doc = DocumentPart::parse(archive.document_xml()?, PartKind::Document)?;
        Ok(Some((archive, doc)))
    }
}

/// Run placeholder substitution over a package's header and footer parts.
fn substitute_chrome_parts(
    archive: &mut DocxArchive,
    fields: &teklifdok_model::FieldMap,
) -> Result<()> {
    let parts: Vec<(String, PartKind)> = archive
        .header_parts()
        .into_iter()
        .map(|p| (p, PartKind::Header))
        .chain(
            archive
                .footer_parts()
                .into_iter()
                .map(|p| (p, PartKind::Footer)),
        )
        .collect();
    for (path, kind) in parts {
        let xml = archive
            .get(&path)
            .ok_or_else(|| DocxError::MissingFile(path.clone()))?
            .to_vec();
        let mut part = DocumentPart::parse(&xml, kind)?;
        if substitute(&mut part, fields) {
            archive.set_string(path, serialize_part(&part));
        }
    }
    Ok(())
}

/// Copy image media referenced by a fragment's document into the master
/// package and rewrite `r:embed` references in the fragment's tree to the
/// newly registered relationship IDs.
fn remap_image_relationships(
    master: &mut DocxArchive,
    master_rels: &mut Relationships,
    fragment: &DocxArchive,
    doc: &mut DocumentPart,
) {
    let fragment_rels = match Relationships::parse_or_default(fragment.document_rels_xml()) {
        Ok(rels) => rels,
        Err(_) => return,
    };

    for (old_id, target) in fragment_rels.image_relationships() {
        let source_path = format!("word/{target}");
        let Some(bytes) = fragment.get(&source_path) else {
            continue;
        };
        let ext = target.rsplit_once('.').map(|(_, e)| e).unwrap_or("png");
        let media_path = master.free_media_path("image", ext);
        master.set(media_path.clone(), bytes.to_vec());
        let new_id = master_rels.add_image(media_path.trim_start_matches("word/"));

        let needle = format!(r#"r:embed="{old_id}""#);
        let replacement = format!(r#"r:embed="{new_id}""#);
        for_each_raw_xml_mut(&mut doc.blocks, &mut |xml| {
            if xml.contains(&needle) {
                *xml = xml.replace(&needle, &replacement);
            }
        });
    }
}

/// Minimal empty DOCX package used when no template is provided.
fn blank_archive() -> DocxArchive {
    let mut archive = DocxArchive::empty();
    archive.set_string(
        "[Content_Types].xml",
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"</Types>"#
        ),
    );
    archive.set_string(
        "_rels/.rels",
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
            r#"</Relationships>"#
        ),
    );
    archive.set_string(
        "word/document.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body><w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#,
            crate::writer::default_root_attrs()
        ),
    );
    archive
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{offer_template, parse_document, sample_offer, write_template};
    use tempfile::TempDir;

    fn compose(offer: &Offer, templates: &[PathBuf]) -> CompositionResult {
        Composer::new().compose_offer(offer, templates).unwrap()
    }

    #[test]
    fn test_offer_composition_end_to_end() {
        let dir = TempDir::new().unwrap();
        let template = write_template(dir.path(), "teklif.docx", &offer_template());
        let offer = sample_offer();
        let result = compose(&offer, &[template]);

        assert_eq!(result.file_name, "ACME_TKF-2025-041_140825_270.00TL.docx");
        let doc = parse_document(&result.bytes);
        let text = doc.plain_text();
        assert!(text.contains("ACME A.Ş."));
        assert!(text.contains("300.00"));
        assert!(text.contains("270.00"));
        assert!(!text.contains("{{"));
    }

    #[test]
    fn test_footer_applied_to_composition() {
        let dir = TempDir::new().unwrap();
        let template = write_template(dir.path(), "teklif.docx", &offer_template());
        let offer = sample_offer();
        let result = compose(&offer, &[template]);

        let archive = DocxArchive::from_reader(std::io::Cursor::new(result.bytes)).unwrap();
        assert_eq!(archive.footer_parts(), vec!["word/footer1.xml".to_string()]);
        let footer = String::from_utf8(archive.get("word/footer1.xml").unwrap().to_vec()).unwrap();
        assert!(footer.contains("Sayı:TKF-2025/041"));
        assert!(footer.contains("NUMPAGES"));
    }

    #[test]
    fn test_missing_template_is_skipped_with_warning() {
        let dir = TempDir::new().unwrap();
        let present = write_template(dir.path(), "var.docx", &offer_template());
        let missing = dir.path().join("yok.docx");
        let offer = sample_offer();
        let result = compose(&offer, &[missing.clone(), present]);

        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::TemplateMissing(p) if p.contains("yok.docx"))));
        // The surviving fragment still composes
        assert!(parse_document(&result.bytes).plain_text().contains("ACME"));
    }

    #[test]
    fn test_all_templates_missing_is_an_error() {
        let dir = TempDir::new().unwrap();
        let offer = sample_offer();
        let err = Composer::new()
            .compose_offer(&offer, &[dir.path().join("a.docx"), dir.path().join("b.docx")])
            .unwrap_err();
        assert!(matches!(err, DocxError::Other(_)));
    }

    #[test]
    fn test_two_fragment_merge_has_one_break() {
        let dir = TempDir::new().unwrap();
        let a = write_template(dir.path(), "a.docx", &offer_template());
        let b = write_template(dir.path(), "b.docx", &offer_template());
        let offer = sample_offer();
        let result = compose(&offer, &[a, b]);

        let doc = parse_document(&result.bytes);
        let mut breaks = 0;
        crate::document::for_each_paragraph(&doc.blocks, &mut |p| {
            if p.has_page_break() {
                breaks += 1;
            }
        });
        assert_eq!(breaks, 1);
    }

    #[test]
    fn test_chimney_report_without_template() {
        use teklifdok_model::{Chimney, ParameterReading};
        let mut reading = ParameterReading::new("TOZ");
        reading.degerler = vec![
            ("Yakıt Türü".to_string(), "Doğalgaz".to_string()),
            ("Isıl Güç".to_string(), String::new()),
        ];
        let chimney = Chimney {
            baca_adi: "BACA-1".to_string(),
            parametreler: vec![reading],
        };
        let result = Composer::new()
            .compose_chimney_report(&chimney, None)
            .unwrap();
        assert_eq!(result.file_name, "BACA-1_baca_raporu.docx");
        let doc = parse_document(&result.bytes);
        assert!(doc.plain_text().contains("BACA-1 - TOZ"));
        assert!(doc.plain_text().contains("-"));
    }
}
