//! Document part parsing (word/document.xml, headers, footers)
//!
//! Parses one WordprocessingML part into a mutable tree of paragraphs and
//! tables. Unlike a plain content extractor, this parser must round-trip
//! authored templates: formatting and structures the engine does not
//! interpret (table borders, shading, drawings, bookmarks, hyperlinks) are
//! captured verbatim as raw XML and re-emitted unchanged by the writer.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{DocxError, Result};
use crate::writer::escape_xml;

/// Which kind of part a tree was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// word/document.xml (body wrapped in w:document/w:body)
    Document,
    /// word/headerN.xml (w:hdr)
    Header,
    /// word/footerN.xml (w:ftr)
    Footer,
}

/// A parsed WordprocessingML part
#[derive(Debug, Clone)]
pub struct DocumentPart {
    pub kind: PartKind,
    /// Root element attributes (namespace declarations), verbatim
    pub root_attrs: String,
    /// Block-level content
    pub blocks: Vec<Block>,
    /// Body-level section properties (document geometry), verbatim
    pub sect_pr: Option<String>,
}

/// Block-level elements
#[derive(Debug, Clone)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// Anything else at block level (sdt wrappers, bookmarks), verbatim
    Raw(String),
}

/// A paragraph with interpreted properties and children
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub props: ParaProps,
    pub children: Vec<ParaChild>,
}

/// Paragraph properties; interpreted fields are pulled out, the rest is
/// preserved verbatim
#[derive(Debug, Clone, Default)]
pub struct ParaProps {
    /// Style ID (w:pStyle)
    pub style_id: Option<String>,
    /// Justification (w:jc), e.g. "left", "center", "right"
    pub justify: Option<String>,
    /// Right indent in twips (w:ind w:right), used for numeric cell inset
    pub indent_right: Option<u32>,
    /// Emit zero before/after spacing (used by generated framing paragraphs)
    pub spacing_zero: bool,
    /// Paragraph-level section break (w:sectPr inside w:pPr), verbatim
    pub sect_pr: Option<String>,
    /// Paragraph-mark run properties (w:rPr inside w:pPr), verbatim.
    /// Kept apart from `rest`: the schema requires rPr after jc.
    pub mark_props: Option<String>,
    /// All other pPr children, verbatim
    pub rest: String,
}

/// Child elements of a paragraph
#[derive(Debug, Clone)]
pub enum ParaChild {
    Run(Run),
    /// Hyperlinks, bookmarks, proofing marks and other children, verbatim
    Raw(String),
}

/// A text run
#[derive(Debug, Clone, Default)]
pub struct Run {
    pub props: RunProps,
    pub content: Vec<RunContent>,
}

/// Run properties; interpreted fields pulled out, the rest preserved
#[derive(Debug, Clone, Default)]
pub struct RunProps {
    pub bold: bool,
    /// Font size in half-points (w:sz)
    pub size_half_points: Option<u32>,
    /// Font color hex (w:color), e.g. "000080"
    pub color: Option<String>,
    /// All other rPr children, verbatim
    pub rest: String,
}

/// Content of a run
#[derive(Debug, Clone)]
pub enum RunContent {
    Text(String),
    Tab,
    /// w:br; page break when `page` is set
    Break { page: bool },
    /// w:fldChar with its fldCharType ("begin", "separate", "end")
    FieldChar(String),
    /// w:instrText content (e.g. "PAGE", "NUMPAGES")
    InstrText(String),
    /// w:drawing subtree, verbatim
    Drawing(String),
    /// Anything else inside a run, verbatim
    Raw(String),
}

/// A table
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// w:tblPr element, verbatim
    pub props: String,
    /// w:tblGrid element, verbatim
    pub grid: String,
    /// Other table-level children (emitted after the grid), verbatim
    pub extras: String,
    pub rows: Vec<TableRow>,
}

/// A table row
#[derive(Debug, Clone, Default)]
pub struct TableRow {
    /// w:trPr and any other pre-cell children, verbatim
    pub props: String,
    pub cells: Vec<TableCell>,
}

/// A table cell; cells hold blocks, so tables nest
#[derive(Debug, Clone, Default)]
pub struct TableCell {
    /// w:tcPr element, verbatim
    pub props: String,
    pub blocks: Vec<Block>,
}

impl DocumentPart {
    /// Parse a part from XML bytes
    pub fn parse(xml: &[u8], kind: PartKind) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        // Don't trim text - preserve whitespace in runs
        reader.config_mut().trim_text(false);

        let mut root_attrs = String::new();
        let mut blocks = Vec::new();
        let mut sect_pr = None;
        let mut in_content = kind != PartKind::Document;
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(DocxError::Xml)?;
            match event {
                Event::Start(ref e) => match e.local_name().as_ref() {
                    b"document" | b"hdr" | b"ftr" => {
                        root_attrs = attrs_text(e);
                        if kind != PartKind::Document {
                            in_content = true;
                        }
                    }
                    b"body" => in_content = true,
                    b"p" if in_content => {
                        blocks.push(Block::Paragraph(parse_paragraph(&mut reader)?));
                    }
                    b"tbl" if in_content => {
                        blocks.push(Block::Table(parse_table(&mut reader)?));
                    }
                    b"sectPr" if in_content => {
                        sect_pr = Some(capture_element(&mut reader, e)?);
                    }
                    _ if in_content => {
                        blocks.push(Block::Raw(capture_element(&mut reader, e)?));
                    }
                    _ => {}
                },
                Event::Empty(ref e) if in_content => match e.local_name().as_ref() {
                    b"p" => blocks.push(Block::Paragraph(Paragraph::default())),
                    b"sectPr" => sect_pr = Some(empty_tag(e)),
                    _ => blocks.push(Block::Raw(empty_tag(e))),
                },
                Event::End(ref e) => {
                    if e.local_name().as_ref() == b"body" {
                        in_content = false;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self {
            kind,
            root_attrs,
            blocks,
            sect_pr,
        })
    }

    /// Create an empty part of the given kind
    pub fn empty(kind: PartKind) -> Self {
        Self {
            kind,
            root_attrs: String::new(),
            blocks: Vec::new(),
            sect_pr: None,
        }
    }

    /// Plain text of all paragraphs, top level and inside tables
    pub fn plain_text(&self) -> String {
        let mut out = Vec::new();
        for_each_paragraph(&self.blocks, &mut |p| out.push(p.text()));
        out.join("\n")
    }
}

impl Paragraph {
    /// A paragraph holding a single text run
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            props: ParaProps::default(),
            children: vec![ParaChild::Run(Run::with_text(text))],
        }
    }

    /// A paragraph holding a single explicit page break
    pub fn page_break() -> Self {
        Self {
            props: ParaProps::default(),
            children: vec![ParaChild::Run(Run {
                props: RunProps::default(),
                content: vec![RunContent::Break { page: true }],
            })],
        }
    }

    /// An empty paragraph with zero before/after spacing
    pub fn spacer() -> Self {
        Self {
            props: ParaProps {
                spacing_zero: true,
                ..ParaProps::default()
            },
            children: Vec::new(),
        }
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let ParaChild::Run(run) = child {
                out.push_str(&run.text());
            }
        }
        out
    }

    /// Replace the paragraph content with a single run of `text`,
    /// keeping the first existing run's formatting.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let props = self
            .children
            .iter()
            .find_map(|c| match c {
                ParaChild::Run(r) => Some(r.props.clone()),
                _ => None,
            })
            .unwrap_or_default();
        self.children = vec![ParaChild::Run(Run {
            props,
            content: vec![RunContent::Text(text.into())],
        })];
    }

    /// Whether any run carries a field code (PAGE/NUMPAGES etc.)
    pub fn has_field_codes(&self) -> bool {
        self.children.iter().any(|c| match c {
            ParaChild::Run(r) => r
                .content
                .iter()
                .any(|rc| matches!(rc, RunContent::FieldChar(_) | RunContent::InstrText(_))),
            _ => false,
        })
    }

    /// Whether the paragraph has visible content: non-whitespace text
    /// or an image/drawing
    pub fn has_visible_content(&self) -> bool {
        if !self.text().trim().is_empty() {
            return true;
        }
        self.children.iter().any(|c| match c {
            ParaChild::Run(r) => r
                .content
                .iter()
                .any(|rc| matches!(rc, RunContent::Drawing(_))),
            ParaChild::Raw(xml) => {
                xml.contains("drawing") || xml.contains("pict") || xml.contains("graphic")
            }
        })
    }

    /// Whether any run contains an explicit page break
    pub fn has_page_break(&self) -> bool {
        self.children.iter().any(|c| match c {
            ParaChild::Run(r) => r
                .content
                .iter()
                .any(|rc| matches!(rc, RunContent::Break { page: true })),
            _ => false,
        })
    }

    /// Remove explicit page breaks from all runs
    pub fn strip_page_breaks(&mut self) {
        for child in &mut self.children {
            if let ParaChild::Run(run) = child {
                run.content
                    .retain(|rc| !matches!(rc, RunContent::Break { page: true }));
            }
        }
    }

    /// Iterate runs mutably
    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.children.iter_mut().filter_map(|c| match c {
            ParaChild::Run(r) => Some(r),
            _ => None,
        })
    }
}

impl Run {
    /// A run holding plain text
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            props: RunProps::default(),
            content: vec![RunContent::Text(text.into())],
        }
    }

    /// Concatenated text content
    pub fn text(&self) -> String {
        let mut out = String::new();
        for rc in &self.content {
            match rc {
                RunContent::Text(t) => out.push_str(t),
                RunContent::Tab => out.push('\t'),
                _ => {}
            }
        }
        out
    }
}

impl TableRow {
    /// Concatenated text of all cells
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.text())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TableCell {
    /// Concatenated text of all paragraphs in the cell
    pub fn text(&self) -> String {
        let mut out = Vec::new();
        for block in &self.blocks {
            if let Block::Paragraph(p) = block {
                out.push(p.text());
            }
        }
        out.join(" ")
    }

    /// Replace the cell content with `text`, keeping the first
    /// paragraph's formatting when present.
    pub fn set_text(&mut self, text: impl Into<String>) {
        for block in &mut self.blocks {
            if let Block::Paragraph(p) = block {
                p.set_text(text);
                return;
            }
        }
        self.blocks.push(Block::Paragraph(Paragraph::with_text(text)));
    }

    /// First paragraph, mutable
    pub fn first_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        self.blocks.iter_mut().find_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }
}

/// Visit every table in a block list (nested tables included, depth-first).
/// The visitor returns `true` to stop early; the function reports whether
/// a visitor stopped the walk.
pub fn for_each_table_mut(blocks: &mut [Block], f: &mut impl FnMut(&mut Table) -> bool) -> bool {
    for block in blocks {
        if let Block::Table(table) = block {
            if f(table) {
                return true;
            }
            for row in &mut table.rows {
                for cell in &mut row.cells {
                    if for_each_table_mut(&mut cell.blocks, f) {
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Visit every paragraph in a block list, including paragraphs inside
/// (nested) table cells.
pub fn for_each_paragraph_mut(blocks: &mut [Block], f: &mut impl FnMut(&mut Paragraph)) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => f(p),
            Block::Table(table) => {
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        for_each_paragraph_mut(&mut cell.blocks, f);
                    }
                }
            }
            Block::Raw(_) => {}
        }
    }
}

/// Visit every verbatim XML string in a block list: raw blocks, raw
/// paragraph children, drawings and raw run content, nested tables
/// included. Used to rewrite relationship references when content moves
/// between packages.
pub fn for_each_raw_xml_mut(blocks: &mut [Block], f: &mut impl FnMut(&mut String)) {
    for block in blocks {
        match block {
            Block::Raw(xml) => f(xml),
            Block::Paragraph(p) => raw_xml_in_paragraph(p, f),
            Block::Table(table) => {
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        for_each_raw_xml_mut(&mut cell.blocks, f);
                    }
                }
            }
        }
    }
}

fn raw_xml_in_paragraph(para: &mut Paragraph, f: &mut impl FnMut(&mut String)) {
    for child in &mut para.children {
        match child {
            ParaChild::Raw(xml) => f(xml),
            ParaChild::Run(run) => {
                for content in &mut run.content {
                    if let RunContent::Drawing(xml) | RunContent::Raw(xml) = content {
                        f(xml);
                    }
                }
            }
        }
    }
}

/// Immutable variant of [`for_each_paragraph_mut`]
pub fn for_each_paragraph(blocks: &[Block], f: &mut impl FnMut(&Paragraph)) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => f(p),
            Block::Table(table) => {
                for row in &table.rows {
                    for cell in &row.cells {
                        for_each_paragraph(&cell.blocks, f);
                    }
                }
            }
            Block::Raw(_) => {}
        }
    }
}

// Parsing internals

fn parse_paragraph(reader: &mut Reader<&[u8]>) -> Result<Paragraph> {
    let mut para = Paragraph::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(DocxError::Xml)?;
        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"pPr" => para.props = parse_para_props(reader)?,
                b"r" => para.children.push(ParaChild::Run(parse_run(reader)?)),
                _ => para
                    .children
                    .push(ParaChild::Raw(capture_element(reader, e)?)),
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"pPr" | b"r" => {}
                _ => para.children.push(ParaChild::Raw(empty_tag(e))),
            },
            Event::End(ref e) if e.local_name().as_ref() == b"p" => break,
            Event::Eof => {
                return Err(DocxError::InvalidStructure(
                    "unterminated paragraph".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(para)
}

fn parse_para_props(reader: &mut Reader<&[u8]>) -> Result<ParaProps> {
    let mut props = ParaProps::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(DocxError::Xml)?;
        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"sectPr" => props.sect_pr = Some(capture_element(reader, e)?),
                b"rPr" => props.mark_props = Some(capture_element(reader, e)?),
                b"pStyle" => {
                    props.style_id = get_attr(e, b"w:val");
                    skip_element(reader, b"pStyle")?;
                }
                b"jc" => {
                    props.justify = get_attr(e, b"w:val");
                    skip_element(reader, b"jc")?;
                }
                _ => props.rest.push_str(&capture_element(reader, e)?),
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"sectPr" => props.sect_pr = Some(empty_tag(e)),
                b"rPr" => props.mark_props = Some(empty_tag(e)),
                b"pStyle" => props.style_id = get_attr(e, b"w:val"),
                b"jc" => props.justify = get_attr(e, b"w:val"),
                _ => props.rest.push_str(&empty_tag(e)),
            },
            Event::End(ref e) if e.local_name().as_ref() == b"pPr" => break,
            Event::Eof => {
                return Err(DocxError::InvalidStructure(
                    "unterminated paragraph properties".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(props)
}

fn parse_run(reader: &mut Reader<&[u8]>) -> Result<Run> {
    let mut run = Run::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(DocxError::Xml)?;
        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"rPr" => run.props = parse_run_props(reader)?,
                b"t" => run
                    .content
                    .push(RunContent::Text(read_text(reader, b"t")?)),
                b"instrText" => run
                    .content
                    .push(RunContent::InstrText(read_text(reader, b"instrText")?)),
                b"br" => {
                    let page = get_attr(e, b"w:type").as_deref() == Some("page");
                    run.content.push(RunContent::Break { page });
                    skip_element(reader, b"br")?;
                }
                b"fldChar" => {
                    let kind = get_attr(e, b"w:fldCharType").unwrap_or_default();
                    run.content.push(RunContent::FieldChar(kind));
                    skip_element(reader, b"fldChar")?;
                }
                b"drawing" => run
                    .content
                    .push(RunContent::Drawing(capture_element(reader, e)?)),
                _ => run.content.push(RunContent::Raw(capture_element(reader, e)?)),
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"rPr" => {}
                b"t" => run.content.push(RunContent::Text(String::new())),
                b"tab" => run.content.push(RunContent::Tab),
                b"br" => {
                    let page = get_attr(e, b"w:type").as_deref() == Some("page");
                    run.content.push(RunContent::Break { page });
                }
                b"fldChar" => {
                    let kind = get_attr(e, b"w:fldCharType").unwrap_or_default();
                    run.content.push(RunContent::FieldChar(kind));
                }
                _ => run.content.push(RunContent::Raw(empty_tag(e))),
            },
            Event::End(ref e) if e.local_name().as_ref() == b"r" => break,
            Event::Eof => {
                return Err(DocxError::InvalidStructure("unterminated run".to_string()))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(run)
}

fn parse_run_props(reader: &mut Reader<&[u8]>) -> Result<RunProps> {
    let mut props = RunProps::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(DocxError::Xml)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(&event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"b" => {
                        // w:val="0" / "false" means explicitly NOT bold
                        let is_off = get_attr(e, b"w:val")
                            .map(|v| v == "0" || v == "false")
                            .unwrap_or(false);
                        if is_off {
                            props.rest.push_str(&empty_tag(e));
                        } else {
                            props.bold = true;
                        }
                        if !is_empty {
                            skip_element(reader, b"b")?;
                        }
                    }
                    b"sz" => {
                        props.size_half_points =
                            get_attr(e, b"w:val").and_then(|v| v.parse().ok());
                        if !is_empty {
                            skip_element(reader, b"sz")?;
                        }
                    }
                    b"color" => {
                        props.color = get_attr(e, b"w:val");
                        if !is_empty {
                            skip_element(reader, b"color")?;
                        }
                    }
                    _ => {
                        if is_empty {
                            props.rest.push_str(&empty_tag(e));
                        } else {
                            props.rest.push_str(&capture_element(reader, e)?);
                        }
                    }
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"rPr" => break,
            Event::Eof => {
                return Err(DocxError::InvalidStructure(
                    "unterminated run properties".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(props)
}

fn parse_table(reader: &mut Reader<&[u8]>) -> Result<Table> {
    let mut table = Table::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(DocxError::Xml)?;
        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"tblPr" => table.props = capture_element(reader, e)?,
                b"tblGrid" => table.grid = capture_element(reader, e)?,
                b"tr" => table.rows.push(parse_row(reader)?),
                _ => table.extras.push_str(&capture_element(reader, e)?),
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"tblPr" | b"tblGrid" => {}
                _ => table.extras.push_str(&empty_tag(e)),
            },
            Event::End(ref e) if e.local_name().as_ref() == b"tbl" => break,
            Event::Eof => {
                return Err(DocxError::InvalidStructure(
                    "unterminated table".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(table)
}

fn parse_row(reader: &mut Reader<&[u8]>) -> Result<TableRow> {
    let mut row = TableRow::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(DocxError::Xml)?;
        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"tc" => row.cells.push(parse_cell(reader)?),
                _ => row.props.push_str(&capture_element(reader, e)?),
            },
            Event::Empty(ref e) => row.props.push_str(&empty_tag(e)),
            Event::End(ref e) if e.local_name().as_ref() == b"tr" => break,
            Event::Eof => {
                return Err(DocxError::InvalidStructure(
                    "unterminated table row".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(row)
}

fn parse_cell(reader: &mut Reader<&[u8]>) -> Result<TableCell> {
    let mut cell = TableCell::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(DocxError::Xml)?;
        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"tcPr" => cell.props = capture_element(reader, e)?,
                b"p" => cell
                    .blocks
                    .push(Block::Paragraph(parse_paragraph(reader)?)),
                b"tbl" => cell.blocks.push(Block::Table(parse_table(reader)?)),
                _ => cell.blocks.push(Block::Raw(capture_element(reader, e)?)),
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"tcPr" => {}
                b"p" => cell.blocks.push(Block::Paragraph(Paragraph::default())),
                _ => cell.blocks.push(Block::Raw(empty_tag(e))),
            },
            Event::End(ref e) if e.local_name().as_ref() == b"tc" => break,
            Event::Eof => {
                return Err(DocxError::InvalidStructure(
                    "unterminated table cell".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(cell)
}

/// Read the text content of an element up to its end tag
fn read_text(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(DocxError::Xml)?;
        match event {
            Event::Text(ref e) => {
                let t = e.unescape().map_err(DocxError::Xml)?;
                text.push_str(&t);
            }
            Event::End(ref e) if e.local_name().as_ref() == end => break,
            Event::Eof => {
                return Err(DocxError::InvalidStructure(format!(
                    "unterminated element: {}",
                    String::from_utf8_lossy(end)
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

/// Discard events up to the end tag of an element already started
fn skip_element(reader: &mut Reader<&[u8]>, name: &[u8]) -> Result<()> {
    let mut depth = 1u32;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(DocxError::Xml)?;
        match event {
            Event::Start(ref e) if e.local_name().as_ref() == name => depth += 1,
            Event::End(ref e) if e.local_name().as_ref() == name => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => {
                return Err(DocxError::InvalidStructure(format!(
                    "unterminated element: {}",
                    String::from_utf8_lossy(name)
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Capture an entire element (whose start tag was just read) as verbatim XML
fn capture_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<String> {
    let mut xml = start_tag(start);
    let mut depth = 1u32;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(DocxError::Xml)?;
        match event {
            Event::Start(ref e) => {
                depth += 1;
                xml.push_str(&start_tag(e));
            }
            Event::Empty(ref e) => xml.push_str(&empty_tag(e)),
            Event::End(ref e) => {
                depth -= 1;
                xml.push_str(&format!("</{}>", String::from_utf8_lossy(e.name().as_ref())));
                if depth == 0 {
                    break;
                }
            }
            Event::Text(ref e) => {
                let t = e.unescape().map_err(DocxError::Xml)?;
                xml.push_str(&escape_xml(&t));
            }
            Event::CData(ref e) => {
                xml.push_str(&escape_xml(&String::from_utf8_lossy(e)));
            }
            Event::Eof => {
                return Err(DocxError::InvalidStructure(
                    "unterminated element".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(xml)
}

/// Reconstruct a start tag with its attributes, verbatim
fn start_tag(e: &BytesStart) -> String {
    format!("<{}>", tag_body(e))
}

/// Reconstruct a self-closing tag with its attributes, verbatim
fn empty_tag(e: &BytesStart) -> String {
    format!("<{}/>", tag_body(e))
}

fn tag_body(e: &BytesStart) -> String {
    let mut s = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    for attr in e.attributes().with_checks(false).flatten() {
        s.push(' ');
        s.push_str(&String::from_utf8_lossy(attr.key.as_ref()));
        s.push_str("=\"");
        // attr.value is the raw (still escaped) bytes
        s.push_str(&String::from_utf8_lossy(&attr.value));
        s.push('"');
    }
    s
}

/// Attribute text of a tag, without the element name
fn attrs_text(e: &BytesStart) -> String {
    let mut parts = Vec::new();
    for attr in e.attributes().with_checks(false).flatten() {
        parts.push(format!(
            "{}=\"{}\"",
            String::from_utf8_lossy(attr.key.as_ref()),
            String::from_utf8_lossy(&attr.value)
        ));
    }
    parts.join(" ")
}

fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| String::from_utf8(a.value.to_vec()).ok())
}
