//! PDF hand-off via the external LibreOffice converter.
//!
//! The engine does not rasterize. Conversion shells out to `soffice`; any
//! failure is reported back as a reason string so the caller can degrade to
//! emitting the DOCX.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

const CONVERTER: &str = "soffice";

/// Convert `docx_path` to a PDF next to it in `output_dir`.
pub fn convert_to_pdf(docx_path: &Path, output_dir: &Path) -> Result<PathBuf, String> {
    debug!("converting {} to pdf", docx_path.display());
    let output = Command::new(CONVERTER)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(output_dir)
        .arg(docx_path)
        .output()
        .map_err(|e| format!("{CONVERTER} çalıştırılamadı: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{CONVERTER} hata kodu {}: {}", output.status, stderr.trim()));
    }

    let pdf_path = output_dir.join(
        docx_path
            .with_extension("pdf")
            .file_name()
            .ok_or_else(|| "geçersiz dosya adı".to_string())?,
    );
    if !pdf_path.exists() {
        return Err(format!("PDF üretilmedi: {}", pdf_path.display()));
    }
    Ok(pdf_path)
}
