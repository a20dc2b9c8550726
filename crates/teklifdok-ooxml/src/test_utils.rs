//! Shared in-memory DOCX fixtures for the engine tests.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use teklifdok_model::{LineItem, Offer, OfferTotals};

use crate::archive::DocxArchive;
use crate::document::{DocumentPart, PartKind};

/// An offer template package: greeting with both token forms, a labelled
/// firm/offer row, and a pricing table with one data row and three summary
/// rows.
pub fn offer_template() -> DocxArchive {
    let body = concat!(
        r#"<w:p><w:r><w:t>Sayın {{FIRMA_ADI}}</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>Teklifimiz {TEKLIF_NO} / {{TARIH}}</w:t></w:r></w:p>"#,
        r#"<w:tbl><w:tblPr/><w:tblGrid/>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>Firma Adı:</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>Teklif No:</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>"#,
        r#"</w:tbl>"#,
        r#"<w:tbl><w:tblPr/><w:tblGrid/>"#,
        r#"<w:tr>"#,
        r#"<w:tc><w:p><w:r><w:t>Parametre</w:t></w:r></w:p></w:tc>"#,
        r#"<w:tc><w:p><w:r><w:t>Metodu</w:t></w:r></w:p></w:tc>"#,
        r#"<w:tc><w:p><w:r><w:t>Adet</w:t></w:r></w:p></w:tc>"#,
        r#"<w:tc><w:p><w:r><w:t>Birim Fiyat</w:t></w:r></w:p></w:tc>"#,
        r#"<w:tc><w:p><w:r><w:t>Top. Fiyat</w:t></w:r></w:p></w:tc>"#,
        r#"</w:tr>"#,
        r#"<w:tr><w:tc><w:p/></w:tc><w:tc><w:p/></w:tc><w:tc><w:p/></w:tc><w:tc><w:p/></w:tc><w:tc><w:p/></w:tc></w:tr>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>TOPLAM:</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>İSKONTO (TL):</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>TOPLAM TUTAR (TL):</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>"#,
        r#"</w:tbl>"#,
        r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#
    );
    archive_with_body(body)
}

/// A minimal package around the given body XML.
pub fn archive_with_body(body: &str) -> DocxArchive {
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
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}</w:body></w:document>"#
        ),
    );
    archive
}

/// Write an archive to `<dir>/<name>` and return the path.
pub fn write_template(dir: &Path, name: &str, archive: &DocxArchive) -> PathBuf {
    let path = dir.join(name);
    archive.write_to_file(&path).expect("write fixture");
    path
}

/// Parse word/document.xml out of finished package bytes.
pub fn parse_document(bytes: &[u8]) -> DocumentPart {
    let archive = DocxArchive::from_reader(std::io::Cursor::new(bytes.to_vec())).expect("zip");
    DocumentPart::parse(archive.document_xml().expect("document part"), PartKind::Document)
        .expect("parse document")
}

/// The worked offer scenario: one TOZ line at 3 x 100.00, totals
/// 300 / 30 / 270.
pub fn sample_offer() -> Offer {
    Offer {
        firma_adi: "ACME A.Ş.".into(),
        teklif_no: "TKF-2025/041".into(),
        olcum_kodu: Some("EM-2025-12".into()),
        tarih: NaiveDate::from_ymd_opt(2025, 8, 14).unwrap(),
        baslangic_tarihi: Some("18.08.2025".into()),
        bitis_tarihi: Some("22.08.2025".into()),
        baca_sayisi: 2,
        parametreler: Some("TOZ".into()),
        personel: None,
        il: None,
        ilce: None,
        yetkili: None,
        telefon: None,
        durum: None,
        kalemler: vec![LineItem::new("TOZ", "EPA-5", 3, 100.0)],
        toplamlar: OfferTotals {
            toplam: 300.0,
            iskonto: 30.0,
            net: 270.0,
        },
    }
}
