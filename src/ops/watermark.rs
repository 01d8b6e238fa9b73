// 全ページへの透かし文字の描画

use std::path::Path;

use lopdf::Document;
use tracing::info;

use crate::config::job::WatermarkPosition;
use crate::error::PdfMantraError;
use crate::output::ProcessResult;
use crate::pdf::reader::page_size;
use crate::pdf::stamp::PageStamper;
use crate::pdf::text::{TextPlacement, text_width};
use crate::pdf::writer;

/// 斜め以外の配置で使うフォントサイズ。
const WATERMARK_FONT_SIZE: f64 = 24.0;
const CORNER_MARGIN: f64 = 20.0;
const WATERMARK_GRAY: f64 = 0.5;

/// ページ寸法 (width, height) に対する透かしの描画位置を計算する。
///
/// 斜め配置は短辺の 1/10 のサイズで中央から -45° 傾ける。
/// それ以外は 24pt で、四隅は端から 20pt 内側に置く。
pub fn watermark_placement(
    position: WatermarkPosition,
    text: &str,
    width: f64,
    height: f64,
) -> TextPlacement {
    let size = match position {
        WatermarkPosition::Diagonal => width.min(height) / 10.0,
        _ => WATERMARK_FONT_SIZE,
    };
    let text_w = text_width(text, size);
    let text_h = size;

    let (x, y, rotate_deg) = match position {
        WatermarkPosition::Diagonal => (width / 2.0 - text_w / 2.0, height / 2.0, -45.0),
        WatermarkPosition::Center => ((width - text_w) / 2.0, (height - text_h) / 2.0, 0.0),
        WatermarkPosition::TopLeft => (CORNER_MARGIN, height - text_h - CORNER_MARGIN, 0.0),
        WatermarkPosition::TopRight => (
            width - text_w - CORNER_MARGIN,
            height - text_h - CORNER_MARGIN,
            0.0,
        ),
        WatermarkPosition::BottomLeft => (CORNER_MARGIN, CORNER_MARGIN, 0.0),
        WatermarkPosition::BottomRight => (width - text_w - CORNER_MARGIN, CORNER_MARGIN, 0.0),
    };

    TextPlacement {
        x,
        y,
        size,
        rotate_deg,
        gray: WATERMARK_GRAY,
    }
}

/// 全ページに透かしを描画する。戻り値は処理したページ数。
pub fn watermark_document(
    doc: &mut Document,
    text: &str,
    position: WatermarkPosition,
    opacity: f64,
) -> crate::error::Result<usize> {
    if text.trim().is_empty() {
        return Err(PdfMantraError::invalid_input("watermark text is empty"));
    }
    if !(0.0..=1.0).contains(&opacity) {
        return Err(PdfMantraError::invalid_input(format!(
            "opacity must be between 0 and 1, got {opacity}"
        )));
    }

    let page_ids: Vec<_> = doc.get_pages().into_values().collect();
    let sizes = page_ids
        .iter()
        .map(|&id| page_size(doc, id))
        .collect::<crate::error::Result<Vec<_>>>()?;

    let mut stamper = PageStamper::new(doc);
    for (&page_id, &(width, height)) in page_ids.iter().zip(&sizes) {
        let placement = watermark_placement(position, text, width, height);
        stamper.stamp_text(page_id, text, &placement, opacity)?;
    }
    Ok(page_ids.len())
}

pub fn watermark(
    input: &Path,
    output: &Path,
    text: &str,
    position: WatermarkPosition,
    opacity: f64,
) -> crate::error::Result<ProcessResult> {
    let mut doc = super::load_document(input)?;
    let pages = watermark_document(&mut doc, text, position, opacity)?;
    let size = writer::save_to_file(&mut doc, output)?;
    info!(pages, ?position, "applied watermark");
    Ok(ProcessResult::new(output, size))
}
