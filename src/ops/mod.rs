//! One module per user-facing transformation.

pub mod compress;
pub mod image_to_pdf;
pub mod inspect;
pub mod merge;
pub mod page_numbers;
pub mod protect;
pub mod reorder;
pub mod rotate;
pub mod split;
pub mod watermark;

use std::path::Path;

use lopdf::Document;

use crate::error::PdfMantraError;

/// 入力PDFを読み込む。エラーメッセージに入力パスを含める。
pub(crate) fn load_document(path: &Path) -> crate::error::Result<Document> {
    Document::load(path)
        .map_err(|e| PdfMantraError::pdf_read(format!("failed to load {}: {e}", path.display())))
}

/// パスのファイル名部分（表示用）。
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
