//! teklifdok CLI - Command-line interface library
//!
//! Commands:
//! - `teklif`: compose an offer document from a JSON record and templates
//! - `baca`: compose a chimney measurement report
//!
//! # Binary Usage
//!
//! ```bash
//! # Compose an offer from two template fragments
//! teklifdok teklif teklif.json -t kapak.docx -t teklif.docx -o cikti/
//!
//! # Compose and convert to PDF
//! teklifdok teklif teklif.json -t teklif.docx --pdf
//!
//! # Chimney report
//! teklifdok baca baca.json -o cikti/
//! ```

pub mod app;
pub mod pdf;

pub use app::{baca_command, run_cli, teklif_command};
