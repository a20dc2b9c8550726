//! Archive handling for DOCX template files
//!
//! DOCX files are ZIP archives containing XML parts and media resources.
//! Templates are opened read-only per composition; all mutation happens on
//! this in-memory copy.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::ZipWriter;
use zip::CompressionMethod;

use crate::error::{DocxError, Result};

/// Represents an unpacked DOCX package
#[derive(Debug, Clone)]
pub struct DocxArchive {
    /// All files in the archive, keyed by path
    files: HashMap<String, Vec<u8>>,
}

impl DocxArchive {
    /// Create an empty archive
    pub fn empty() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    /// Open and unpack a DOCX file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut files = HashMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            files.insert(name, contents);
        }

        Ok(Self { files })
    }

    /// Get a file's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }

    /// Get the main document content (word/document.xml)
    pub fn document_xml(&self) -> Result<&[u8]> {
        self.get("word/document.xml")
            .ok_or_else(|| DocxError::MissingFile("word/document.xml".to_string()))
    }

    /// Get the document relationships (word/_rels/document.xml.rels)
    pub fn document_rels_xml(&self) -> Option<&[u8]> {
        self.get("word/_rels/document.xml.rels")
    }

    /// List header part paths (word/headerN.xml), sorted
    pub fn header_parts(&self) -> Vec<String> {
        self.parts_with_prefix("word/header")
    }

    /// List footer part paths (word/footerN.xml), sorted
    pub fn footer_parts(&self) -> Vec<String> {
        self.parts_with_prefix("word/footer")
    }

    fn parts_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut parts: Vec<String> = self
            .files
            .keys()
            .filter(|k| k.starts_with(prefix) && k.ends_with(".xml") && !k.contains("_rels"))
            .cloned()
            .collect();
        parts.sort();
        parts
    }

    /// Relationship part path for a given document part
    /// (e.g. "word/header1.xml" -> "word/_rels/header1.xml.rels")
    pub fn rels_path_for(part: &str) -> String {
        match part.rsplit_once('/') {
            Some((dir, name)) => format!("{dir}/_rels/{name}.rels"),
            None => format!("_rels/{part}.rels"),
        }
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Set or update a file's contents
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.files.insert(path.into(), contents);
    }

    /// Set a file's contents from a string
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into().into_bytes());
    }

    /// Remove a file from the archive
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    /// Pick an unused media path with the given stem and extension
    /// (e.g. "word/media/banner1.png")
    pub fn free_media_path(&self, stem: &str, ext: &str) -> String {
        let mut n = 1;
        loop {
            let path = format!("word/media/{stem}{n}.{ext}");
            if !self.files.contains_key(&path) {
                return path;
            }
            n += 1;
        }
    }

    /// Ensure `[Content_Types].xml` has a Default entry for an extension
    pub fn ensure_default_content_type(&mut self, extension: &str, content_type: &str) -> Result<()> {
        let needle = format!("Extension=\"{extension}\"");
        let entry = format!("<Default Extension=\"{extension}\" ContentType=\"{content_type}\"/>");
        self.patch_content_types(&needle, &entry)
    }

    /// Ensure `[Content_Types].xml` has an Override entry for a part
    pub fn ensure_override_content_type(&mut self, part_name: &str, content_type: &str) -> Result<()> {
        let needle = format!("PartName=\"{part_name}\"");
        let entry = format!("<Override PartName=\"{part_name}\" ContentType=\"{content_type}\"/>");
        self.patch_content_types(&needle, &entry)
    }

    fn patch_content_types(&mut self, needle: &str, entry: &str) -> Result<()> {
        let bytes = self
            .files
            .get("[Content_Types].xml")
            .ok_or_else(|| DocxError::MissingFile("[Content_Types].xml".to_string()))?;
        let xml = String::from_utf8_lossy(bytes).into_owned();
        if xml.contains(needle) {
            return Ok(());
        }
        let patched = match xml.rfind("</Types>") {
            Some(pos) => {
                let mut s = xml;
                s.insert_str(pos, entry);
                s
            }
            None => {
                return Err(DocxError::InvalidStructure(
                    "[Content_Types].xml has no closing Types element".to_string(),
                ))
            }
        };
        self.files
            .insert("[Content_Types].xml".to_string(), patched.into_bytes());
        Ok(())
    }

    /// Write the archive to a file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Write the archive to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated);

        // Sort keys for deterministic output
        let mut paths: Vec<_> = self.files.keys().collect();
        paths.sort();

        for path in paths {
            let contents = &self.files[path];
            zip.start_file(path, options)?;
            zip.write_all(contents)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Serialize the archive to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }
}
