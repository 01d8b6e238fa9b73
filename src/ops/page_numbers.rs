use std::path::Path;

use lopdf::Document;
use tracing::info;

use crate::config::job::PageNumberPosition;
use crate::error::PdfMantraError;
use crate::output::ProcessResult;
use crate::pdf::reader::page_size;
use crate::pdf::stamp::PageStamper;
use crate::pdf::text::{TextPlacement, text_height, text_width};
use crate::pdf::writer;

const PAGE_NUMBER_FONT_SIZE: f64 = 12.0;
const PAGE_NUMBER_MARGIN: f64 = 20.0;

/// Expand `{page}` and `{total}` in `format`.
pub fn format_label(format: &str, page: usize, total: usize) -> String {
    format
        .replace("{page}", &page.to_string())
        .replace("{total}", &total.to_string())
}

/// Where to draw `label` on a page of the given size.
pub fn number_placement(
    position: PageNumberPosition,
    label: &str,
    width: f64,
    height: f64,
) -> TextPlacement {
    let size = PAGE_NUMBER_FONT_SIZE;
    let margin = PAGE_NUMBER_MARGIN;
    let text_w = text_width(label, size);
    let text_h = text_height(size);

    let centered = width / 2.0 - text_w / 2.0;
    let right = width - margin - text_w;
    let top = height - margin - text_h;

    let (x, y) = match position {
        PageNumberPosition::BottomCenter => (centered, margin),
        PageNumberPosition::BottomRight => (right, margin),
        PageNumberPosition::BottomLeft => (margin, margin),
        PageNumberPosition::TopCenter => (centered, top),
        PageNumberPosition::TopRight => (right, top),
        PageNumberPosition::TopLeft => (margin, top),
    };

    TextPlacement {
        x,
        y,
        size,
        rotate_deg: 0.0,
        gray: 0.0,
    }
}

/// Number every page. Returns the number of pages stamped.
pub fn number_document(
    doc: &mut Document,
    position: PageNumberPosition,
    format: &str,
) -> crate::error::Result<usize> {
    if format.trim().is_empty() {
        return Err(PdfMantraError::invalid_input("page number format is empty"));
    }

    let page_ids: Vec<_> = doc.get_pages().into_values().collect();
    let total = page_ids.len();
    let sizes = page_ids
        .iter()
        .map(|&id| page_size(doc, id))
        .collect::<crate::error::Result<Vec<_>>>()?;

    let mut stamper = PageStamper::new(doc);
    for (index, (&page_id, &(width, height))) in page_ids.iter().zip(&sizes).enumerate() {
        let label = format_label(format, index + 1, total);
        let placement = number_placement(position, &label, width, height);
        stamper.stamp_text(page_id, &label, &placement, 1.0)?;
    }
    Ok(total)
}

pub fn add_page_numbers(
    input: &Path,
    output: &Path,
    position: PageNumberPosition,
    format: &str,
) -> crate::error::Result<ProcessResult> {
    let mut doc = super::load_document(input)?;
    let pages = number_document(&mut doc, position, format)?;
    let size = writer::save_to_file(&mut doc, output)?;
    info!(pages, ?position, "added page numbers");
    Ok(ProcessResult::new(output, size))
}
