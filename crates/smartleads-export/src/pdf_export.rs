//! Paginated A4 table report built directly with `lopdf`.
//!
//! Uses the standard Helvetica fonts with `WinAnsiEncoding`, so no font files
//! are embedded. Text is encoded as Latin-1; anything outside it becomes `?`.

use std::ops::Range;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use smartleads_core::CompanyRecord;

use crate::error::ExportError;

pub const PDF_TITLE: &str = "B2B Leads Report";
pub const PDF_HEADERS: [&str; 4] = ["Name", "Email", "Phone", "Website"];

const MISSING: &str = "N/A";

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 40;
const ROW_HEIGHT: i64 = 16;
const TITLE_SIZE: i64 = 16;
const SUBTITLE_SIZE: i64 = 10;
const CELL_SIZE: i64 = 9;

/// Left edge and width of each table column, in points.
const COLUMNS: [(i64, i64); 4] = [(40, 155), (200, 135), (340, 80), (425, 130)];

const TOP: i64 = PAGE_HEIGHT - MARGIN;
const FIRST_HEADER_Y: i64 = TOP - 46;
const NEXT_HEADER_Y: i64 = TOP;

/// Renders `records` as a PDF table report, one row per record in input order.
///
/// # Errors
///
/// Returns [`ExportError::Pdf`] if a content stream or the document cannot be
/// encoded.
pub fn to_pdf(records: &[CompanyRecord]) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for (page_index, rows) in paginate(records.len()).into_iter().enumerate() {
        let first = page_index == 0;
        let operations = page_operations(&records[rows], first, records.len());
        let encoded = Content { operations }
            .encode()
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).map_err(|e| ExportError::Pdf(e.to_string()))?;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(out)
}

fn rows_fitting_below(header_y: i64) -> usize {
    let first_row_y = header_y - ROW_HEIGHT;
    usize::try_from((first_row_y - MARGIN) / ROW_HEIGHT + 1).unwrap_or(1)
}

/// Splits `len` rows into per-page index ranges. Always yields at least one
/// page so an empty report still shows its title and header.
fn paginate(len: usize) -> Vec<Range<usize>> {
    let mut pages = Vec::new();
    let mut start = 0;
    let mut capacity = rows_fitting_below(FIRST_HEADER_Y);
    loop {
        let end = (start + capacity).min(len);
        pages.push(start..end);
        if end >= len {
            return pages;
        }
        start = end;
        capacity = rows_fitting_below(NEXT_HEADER_Y);
    }
}

fn page_operations(rows: &[CompanyRecord], first: bool, total: usize) -> Vec<Operation> {
    let mut ops = Vec::new();

    let header_y = if first {
        text(&mut ops, "F2", TITLE_SIZE, MARGIN, TOP, PDF_TITLE);
        let summary = format!("{total} companies");
        text(&mut ops, "F1", SUBTITLE_SIZE, MARGIN, TOP - 20, &summary);
        FIRST_HEADER_Y
    } else {
        NEXT_HEADER_Y
    };

    for ((x, width), label) in COLUMNS.iter().zip(PDF_HEADERS) {
        text(&mut ops, "F2", CELL_SIZE, *x, header_y, &fit(label, *width));
    }
    rule(&mut ops, header_y - 4);

    let mut y = header_y - ROW_HEIGHT;
    for record in rows {
        let cells = [
            record.name.as_str(),
            record.email.as_deref().unwrap_or(MISSING),
            record.phone.as_deref().unwrap_or(MISSING),
            record.website.as_deref().unwrap_or(MISSING),
        ];
        for ((x, width), cell) in COLUMNS.iter().zip(cells) {
            text(&mut ops, "F1", CELL_SIZE, *x, y, &fit(cell, *width));
        }
        y -= ROW_HEIGHT;
    }

    ops
}

fn text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, value: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
    ));
    ops.push(Operation::new(
        "Td",
        vec![Object::Integer(x), Object::Integer(y)],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(encode_latin1(value))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn rule(ops: &mut Vec<Operation>, y: i64) {
    ops.push(Operation::new("w", vec![Object::Integer(1)]));
    ops.push(Operation::new(
        "m",
        vec![Object::Integer(MARGIN), Object::Integer(y)],
    ));
    ops.push(Operation::new(
        "l",
        vec![Object::Integer(PAGE_WIDTH - MARGIN), Object::Integer(y)],
    ));
    ops.push(Operation::new("S", vec![]));
}

/// Truncates `value` with `...` so it fits `width` points at the cell size.
/// Helvetica averages about half an em per glyph.
fn fit(value: &str, width: i64) -> String {
    let max_chars = usize::try_from(width * 2 / CELL_SIZE).unwrap_or(0).max(4);
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let kept: String = value.chars().take(max_chars - 3).collect();
    format!("{kept}...")
}

fn encode_latin1(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
