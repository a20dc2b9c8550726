//! # teklifdok-ooxml
//!
//! Template-based DOCX composition for laboratory price offers.
//!
//! This crate provides functionality to:
//! - Read and write DOCX template packages
//! - Substitute `{{KEY}}`/`{KEY}` placeholders across body, headers and footers
//! - Populate a pricing table from line items, resizing its data region
//! - Merge independently prepared fragments into one paginated document
//! - Synthesize the banner header and the page-numbered footer
//!
//! ## Example: Composing an Offer
//!
//! ```no_run
//! use teklifdok_ooxml::Composer;
//! # let offer: teklifdok_model::Offer = todo!();
//!
//! let result = Composer::new().compose_offer(&offer, &["teklif.docx".into()])?;
//! std::fs::write(&result.file_name, &result.bytes)?;
//! for warning in &result.warnings {
//!     eprintln!("uyarı: {warning}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod chrome;
pub mod compose;
pub mod detail;
pub mod document;
pub mod error;
pub mod merge;
pub mod pricing;
pub mod query;
pub mod relationships;
pub mod substitute;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_utils;

pub use archive::DocxArchive;
pub use compose::{CompositionResult, Composer};
pub use document::{
    Block, DocumentPart, ParaChild, Paragraph, PartKind, Run, RunContent, Table, TableCell,
    TableRow,
};
pub use error::{DocxError, Result, Warning};
pub use merge::merge;
pub use pricing::fill_pricing_table;
pub use relationships::Relationships;
pub use substitute::substitute;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
