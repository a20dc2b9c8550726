//! Multi-fragment merge
//!
//! Concatenates independently prepared documents into one. Naive tree
//! concatenation either leaves an extra blank page between fragments (the
//! fragment's own trailing empty paragraph plus the injected break) or
//! loses the page transition entirely. The order here is fixed: strip the
//! fragment's own breaks, trim its empty edges, then inject exactly one
//! explicit page break per fragment boundary.

use crate::document::{for_each_paragraph_mut, Block, DocumentPart, Paragraph, PartKind};

/// Merge fragments in order into a single document.
///
/// The first fragment seeds the master document and contributes its page
/// geometry; every later fragment is appended after one injected page
/// break. Merging `k` fragments therefore yields exactly `k-1` explicit
/// page breaks and no residual section-break markers.
pub fn merge(fragments: Vec<DocumentPart>) -> DocumentPart {
    let mut master = DocumentPart::empty(PartKind::Document);
    let mut first = true;

    for mut fragment in fragments {
        let sect_pr = strip_section_breaks(&mut fragment);
        trim_edges(&mut fragment.blocks);

        if first {
            master.root_attrs = fragment.root_attrs;
            master.blocks = fragment.blocks;
            // Master page geometry comes from the first fragment
            master.sect_pr = sect_pr;
            first = false;
        } else {
            master.blocks.push(Block::Paragraph(Paragraph::page_break()));
            master.blocks.append(&mut fragment.blocks);
        }
    }

    master
}

/// Remove document-level and paragraph-level section properties from the
/// fragment; its own geometry must not fight the master's. Returns the
/// body-level properties for the caller to use as master geometry.
fn strip_section_breaks(fragment: &mut DocumentPart) -> Option<String> {
    let sect_pr = fragment.sect_pr.take();
    for_each_paragraph_mut(&mut fragment.blocks, &mut |para| {
        para.props.sect_pr = None;
    });
    sect_pr
}

/// Drop leading and trailing empty paragraphs, then strip residual page
/// breaks from the surviving boundary paragraphs.
///
/// Any all-whitespace paragraph at the edge is treated as removable; an
/// intentionally blank spacer that happens to sit first or last in a
/// fragment is removed too.
fn trim_edges(blocks: &mut Vec<Block>) {
    while matches!(blocks.first(), Some(Block::Paragraph(p)) if !p.has_visible_content()) {
        blocks.remove(0);
    }
    while matches!(blocks.last(), Some(Block::Paragraph(p)) if !p.has_visible_content()) {
        blocks.pop();
    }
    if let Some(Block::Paragraph(p)) = blocks.first_mut() {
        p.strip_page_breaks();
    }
    if blocks.len() > 1 {
        if let Some(Block::Paragraph(p)) = blocks.last_mut() {
            p.strip_page_breaks();
        }
    }
}
