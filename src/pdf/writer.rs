use std::path::Path;

use lopdf::{Document, SaveOptions};
use tracing::debug;

use crate::error::PdfMantraError;

/// PDFドキュメントをバイト列として出力する。
pub fn save_to_bytes(doc: &mut Document) -> crate::error::Result<Vec<u8>> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| PdfMantraError::pdf_write(e.to_string()))?;
    Ok(buf)
}

/// 非ストリームオブジェクトをオブジェクトストリームにまとめて出力する。
///
/// オブジェクトストリーム内のオブジェクトは xref テーブルでは表せないため、
/// 相互参照もストリーム形式で書き出す。`level` は ObjStm の zlib 圧縮レベル。
pub fn save_packed_to_bytes(doc: &mut Document, level: u32) -> crate::error::Result<Vec<u8>> {
    let options = SaveOptions::builder()
        .use_object_streams(true)
        .use_xref_streams(true)
        .compression_level(level.clamp(1, 9))
        .build();
    let mut buf = Vec::new();
    doc.save_with_options(&mut buf, options)
        .map_err(|e| PdfMantraError::pdf_write(e.to_string()))?;
    Ok(buf)
}

/// PDFドキュメントをファイルに書き出す。親ディレクトリがなければ作成する。
///
/// 戻り値は書き込んだバイト数。
pub fn save_to_file(doc: &mut Document, path: &Path) -> crate::error::Result<u64> {
    let bytes = save_to_bytes(doc)?;
    write_output(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote PDF");
    Ok(bytes.len() as u64)
}

/// [`save_packed_to_bytes`] の結果をファイルに書き出す。
pub fn save_packed_to_file(doc: &mut Document, path: &Path, level: u32) -> crate::error::Result<u64> {
    let bytes = save_packed_to_bytes(doc, level)?;
    write_output(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote PDF with object streams");
    Ok(bytes.len() as u64)
}

/// 出力ファイルを書き出す。親ディレクトリがなければ作成する。
pub fn write_output(path: &Path, bytes: &[u8]) -> crate::error::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
