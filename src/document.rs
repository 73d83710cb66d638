//! Plain text to PDF.
//!
//! Every input line becomes exactly one `Tj` operation on a US-Letter page in
//! Helvetica 12pt. Lines are never wrapped, so a long line runs past the right
//! edge. When a page is full the next line starts a new page.

use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::error::{PipelineError, Result};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 40.0;
pub const FONT_SIZE: f32 = 12.0;
pub const LEADING: f32 = FONT_SIZE * 1.2;

/// One line of text at a fixed baseline
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub y: f32,
}

/// Lines that land on one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

/// Number of lines that fit between the top and bottom margins
pub fn lines_per_page() -> usize {
    ((PAGE_HEIGHT - 2.0 * MARGIN) / LEADING) as usize + 1
}

/// Split text into lines and assign each a page and baseline
pub fn layout(text: &str) -> Vec<Page> {
    let per_page = lines_per_page();
    let lines: Vec<&str> = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();

    lines
        .chunks(per_page)
        .map(|chunk| Page {
            lines: chunk
                .iter()
                .enumerate()
                .map(|(i, line)| PlacedLine {
                    text: line.to_string(),
                    y: PAGE_HEIGHT - MARGIN - i as f32 * LEADING,
                })
                .collect(),
        })
        .collect()
}

/// Render text into a complete PDF document
pub fn render_document(text: &str) -> Result<Vec<u8>> {
    let pages = layout(text);
    debug!("Rendering {} line(s) onto {} page(s)", text.split('\n').count(), pages.len());

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in &pages {
        let content = page_content(page);
        let encoded = content.encode().map_err(|e| PipelineError::Render(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(|e| PipelineError::Render(e.to_string()))?;
    Ok(buffer)
}

fn page_content(page: &Page) -> Content {
    let mut operations = Vec::with_capacity(page.lines.len() + 3);
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
    for line in &page.lines {
        // absolute positioning so a line's baseline does not depend on its neighbours
        operations.push(Operation::new(
            "Tm",
            vec![1.into(), 0.into(), 0.into(), 1.into(), MARGIN.into(), line.y.into()],
        ));
        operations.push(Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(&line.text))]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// WinAnsi (cp1252): Latin-1 for the printable range plus the 0x80-0x9F punctuation slots.
/// Anything else becomes '?'.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            0x20..=0x7e | 0xa0..=0xff => c as u8,
            0x09 => b' ',
            _ => win_ansi_high(c).unwrap_or(b'?'),
        })
        .collect()
}

fn win_ansi_high(c: char) -> Option<u8> {
    let byte = match c {
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{0152}' => 0x8c,
        '\u{017d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{0153}' => 0x9c,
        '\u{017e}' => 0x9e,
        '\u{0178}' => 0x9f,
        _ => return None,
    };
    Some(byte)
}
