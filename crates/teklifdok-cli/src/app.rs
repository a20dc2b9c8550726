//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;

use teklifdok_model::{Chimney, Offer};
use teklifdok_ooxml::{Composer, Warning};

use crate::pdf;

#[derive(Parser)]
#[command(name = "teklifdok")]
#[command(author, version, about = "Teklif ve baca raporu belge üretimi", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose an offer document from a JSON record and template fragments
    Teklif {
        /// Offer record (JSON)
        input: PathBuf,

        /// Template DOCX fragments, merged in order
        #[arg(short, long, required = true, num_args = 1..)]
        template: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Header banner image (png/jpeg)
        #[arg(short, long)]
        banner: Option<PathBuf>,

        /// Also convert the result to PDF via the external converter
        #[arg(long)]
        pdf: bool,
    },

    /// Compose a chimney measurement report from a JSON record
    Baca {
        /// Chimney record (JSON)
        input: PathBuf,

        /// Optional template DOCX the detail blocks are appended to
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Header banner image (png/jpeg)
        #[arg(short, long)]
        banner: Option<PathBuf>,
    },
}

/// Main CLI entry point
pub fn run_cli() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Teklif {
            input,
            template,
            output,
            banner,
            pdf,
        } => {
            let path = teklif_command(&input, &template, &output, banner.as_deref(), pdf)?;
            println!("Oluşturuldu: {}", path.display());
        }
        Commands::Baca {
            input,
            template,
            output,
            banner,
        } => {
            let path = baca_command(&input, template.as_deref(), &output, banner.as_deref())?;
            println!("Oluşturuldu: {}", path.display());
        }
    }
    Ok(())
}

/// Compose an offer document and return the written DOCX path.
pub fn teklif_command(
    input: &Path,
    templates: &[PathBuf],
    output_dir: &Path,
    banner: Option<&Path>,
    pdf: bool,
) -> Result<PathBuf> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("Teklif kaydı okunamadı: {}", input.display()))?;
    let offer: Offer =
        serde_json::from_str(&json).with_context(|| format!("Geçersiz teklif kaydı: {}", input.display()))?;

    let composer = composer_with_banner(banner)?;
    let result = composer
        .compose_offer(&offer, templates)
        .context("Teklif belgesi oluşturulamadı")?;
    report_warnings(&result.warnings);

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Çıktı dizini oluşturulamadı: {}", output_dir.display()))?;
    let docx_path = output_dir.join(&result.file_name);
    fs::write(&docx_path, &result.bytes)
        .with_context(|| format!("Belge yazılamadı: {}", docx_path.display()))?;

    if pdf {
        // Converter failure degrades to the DOCX output, never an error
        match pdf::convert_to_pdf(&docx_path, output_dir) {
            Ok(pdf_path) => println!("PDF: {}", pdf_path.display()),
            Err(reason) => warn!("{}", Warning::ConversionFailed(reason)),
        }
    }

    Ok(docx_path)
}

/// Compose a chimney report and return the written DOCX path.
pub fn baca_command(
    input: &Path,
    template: Option<&Path>,
    output_dir: &Path,
    banner: Option<&Path>,
) -> Result<PathBuf> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("Baca kaydı okunamadı: {}", input.display()))?;
    let chimney: Chimney =
        serde_json::from_str(&json).with_context(|| format!("Geçersiz baca kaydı: {}", input.display()))?;

    let composer = composer_with_banner(banner)?;
    let result = composer
        .compose_chimney_report(&chimney, template)
        .context("Baca raporu oluşturulamadı")?;
    report_warnings(&result.warnings);

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Çıktı dizini oluşturulamadı: {}", output_dir.display()))?;
    let docx_path = output_dir.join(&result.file_name);
    fs::write(&docx_path, &result.bytes)
        .with_context(|| format!("Belge yazılamadı: {}", docx_path.display()))?;
    Ok(docx_path)
}

fn composer_with_banner(banner: Option<&Path>) -> Result<Composer> {
    let mut composer = Composer::new();
    if let Some(path) = banner {
        let image = fs::read(path)
            .with_context(|| format!("Banner görseli okunamadı: {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png")
            .to_string();
        composer = composer.with_banner(image, ext);
    }
    Ok(composer)
}

fn report_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("uyarı: {warning}");
    }
}
