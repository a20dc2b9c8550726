//! Placeholder substitution
//!
//! Replaces `{{KEY}}` and `{KEY}` tokens with field map values everywhere
//! in a part: body paragraphs, table cells (nested tables included) and,
//! when applied to header/footer parts, their content too. Both token
//! syntaxes are accepted because templates were authored inconsistently.
//!
//! Unmatched tokens stay verbatim. Templates are reused across document
//! types and not every token appears in every field map.

use teklifdok_model::FieldMap;

use crate::document::{for_each_paragraph_mut, DocumentPart, Paragraph, RunContent};

/// Fields whose values mark a paragraph as a document title when they
/// appear in substituted text
const TITLE_KEYS: &[&str] = &["FIRMA_ADI", "TEKLIF_NO"];

/// Title restyle size in half-points (12pt)
const TITLE_SIZE: u32 = 24;

/// Replace all placeholder tokens in a part. Reports whether any text
/// changed.
pub fn substitute(part: &mut DocumentPart, fields: &FieldMap) -> bool {
    if fields.is_empty() {
        return false;
    }
    let title_values: Vec<&str> = TITLE_KEYS
        .iter()
        .filter_map(|k| fields.get(*k))
        .map(|v| v.as_str())
        .filter(|v| !v.trim().is_empty())
        .collect();

    let mut changed = false;
    for_each_paragraph_mut(&mut part.blocks, &mut |para| {
        changed |= substitute_paragraph(para, fields, &title_values);
    });
    changed
}

fn substitute_paragraph(para: &mut Paragraph, fields: &FieldMap, title_values: &[&str]) -> bool {
    let mut changed = false;

    // First pass: tokens contained within a single run
    for run in para.runs_mut() {
        for content in &mut run.content {
            if let RunContent::Text(text) = content {
                if let Some(replaced) = replace_tokens(text, fields) {
                    *text = replaced;
                    changed = true;
                }
            }
        }
    }

    // Second pass: tokens split across runs by the editor. The replaced
    // text goes into the first text run and the remaining text runs are
    // emptied; field-code paragraphs are excluded.
    if !para.has_field_codes() {
        let text = para.text();
        if let Some(replaced) = replace_tokens(&text, fields) {
            write_collapsed_text(para, &replaced);
            changed = true;
        }
    }

    if changed && is_title_text(&para.text(), title_values) {
        restyle_title(para);
    }
    changed
}

/// Replace both token forms; `{{KEY}}` before `{KEY}` since the former
/// contains the latter as a substring. Returns `None` when nothing matched.
fn replace_tokens(text: &str, fields: &FieldMap) -> Option<String> {
    if !text.contains('{') {
        return None;
    }
    let mut out = text.to_string();
    for (key, value) in fields {
        let double = format!("{{{{{key}}}}}");
        if out.contains(&double) {
            out = out.replace(&double, value);
        }
        let single = format!("{{{key}}}");
        if out.contains(&single) {
            out = out.replace(&single, value);
        }
    }
    (out != text).then_some(out)
}

/// Write `text` into the first text run and blank the rest. Breaks,
/// drawings and raw children (bookmarks, hyperlinks) stay in place.
fn write_collapsed_text(para: &mut Paragraph, text: &str) {
    let mut first = true;
    for run in para.runs_mut() {
        for content in &mut run.content {
            if let RunContent::Text(t) = content {
                if first {
                    *t = text.to_string();
                    first = false;
                } else {
                    t.clear();
                }
            }
        }
    }
}

fn is_title_text(text: &str, title_values: &[&str]) -> bool {
    !text.trim().is_empty() && title_values.iter().any(|v| text.contains(v))
}

/// Title paragraphs are bold, fixed-size and left-aligned regardless of
/// what the template author styled the placeholder with.
fn restyle_title(para: &mut Paragraph) {
    para.props.justify = Some("left".to_string());
    for run in para.runs_mut() {
        run.props.bold = true;
        run.props.size_half_points = Some(TITLE_SIZE);
    }
}
