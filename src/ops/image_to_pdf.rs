// 画像ファイル群から1画像1ページのPDFを作成する

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, Stream, dictionary};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::PdfMantraError;
use crate::output::ProcessResult;
use crate::pdf::image::{PreparedImage, add_image_xobject, prepare_image, scale_to_fit};
use crate::pdf::text::fmt_num;
use crate::pdf::writer;

/// A4 (pt)
pub const A4_WIDTH: f64 = 595.28;
pub const A4_HEIGHT: f64 = 841.89;
/// 画像とページ端の間の余白（左右・上下の合計）。
const PAGE_INSET: f64 = 40.0;

const IMAGE_RESOURCE: &str = "Im0";

#[derive(Debug, Clone)]
pub struct ImagesToPdfReport {
    pub result: ProcessResult,
    pub embedded: usize,
    /// 読み込めなかった、または未対応形式の画像
    pub skipped: Vec<PathBuf>,
}

/// 画像を A4 ページ内に収めたときの配置 (x, y, width, height)。
///
/// 縦横比を保って (幅-40, 高さ-40) に収まるよう拡大縮小し、ページ中央に置く。
pub fn image_rect(image_width: f64, image_height: f64) -> (f64, f64, f64, f64) {
    let (w, h) = scale_to_fit(
        image_width,
        image_height,
        A4_WIDTH - PAGE_INSET,
        A4_HEIGHT - PAGE_INSET,
    );
    (A4_WIDTH / 2.0 - w / 2.0, A4_HEIGHT / 2.0 - h / 2.0, w, h)
}

/// 準備済みの画像から1画像1ページのドキュメントを組み立てる。
pub fn build_document<'a>(
    images: impl IntoIterator<Item = &'a PreparedImage>,
) -> crate::error::Result<Document> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();

    for image in images {
        let image_id = add_image_xobject(&mut doc, image);
        let (x, y, w, h) = image_rect(f64::from(image.width), f64::from(image.height));
        let ops = format!(
            "q {} 0 0 {} {} {} cm /{IMAGE_RESOURCE} Do Q\n",
            fmt_num(w),
            fmt_num(h),
            fmt_num(x),
            fmt_num(y)
        );
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), ops.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(A4_WIDTH as f32),
                Object::Real(A4_HEIGHT as f32),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { IMAGE_RESOURCE => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    if kids.is_empty() {
        return Err(PdfMantraError::image("none of the selected images could be embedded"));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

/// `images` を順番どおりに1ページずつ配置したPDFを `output` に書き出す。
///
/// 画像の読み込みとデコードは並列に行う。JPEG/PNG 以外や壊れた画像は
/// 警告を出してスキップし、1枚も埋め込めなければエラーにする。
/// `progress` には埋め込みの進捗（%）が渡される。
pub fn images_to_pdf(
    images: &[PathBuf],
    output: &Path,
    progress: &mut dyn FnMut(f64),
) -> crate::error::Result<ImagesToPdfReport> {
    if images.is_empty() {
        return Err(PdfMantraError::invalid_input("select at least one image"));
    }

    let prepared: Vec<(&PathBuf, crate::error::Result<PreparedImage>)> = images
        .par_iter()
        .map(|path| {
            let result = std::fs::read(path)
                .map_err(PdfMantraError::from)
                .and_then(|bytes| prepare_image(&bytes));
            (path, result)
        })
        .collect();

    let mut usable = Vec::with_capacity(prepared.len());
    let mut skipped = Vec::new();
    for (i, (path, result)) in prepared.into_iter().enumerate() {
        match result {
            Ok(image) => {
                debug!(path = %path.display(), width = image.width, height = image.height, "prepared image");
                usable.push(image);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unsupported image");
                skipped.push(path.clone());
            }
        }
        progress((i + 1) as f64 / images.len() as f64 * 80.0);
    }

    let mut doc = build_document(&usable)?;
    let size = writer::save_to_file(&mut doc, output)?;
    info!(embedded = usable.len(), skipped = skipped.len(), "created PDF from images");

    Ok(ImagesToPdfReport {
        result: ProcessResult::new(output, size),
        embedded: usable.len(),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_rect_is_centered() {
        let (x, y, w, h) = image_rect(100.0, 100.0);
        assert!((w - (A4_WIDTH - 40.0)).abs() < 1e-9);
        assert!((w - h).abs() < 1e-9);
        assert!((x - 20.0).abs() < 1e-9);
        assert!((y + h / 2.0 - A4_HEIGHT / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_tall_image_fits_height() {
        let (_, y, _, h) = image_rect(100.0, 10_000.0);
        assert!((h - (A4_HEIGHT - 40.0)).abs() < 1e-9);
        assert!((y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(build_document(std::iter::empty()).is_err());
    }

    #[test]
    fn test_no_images_rejected() {
        let mut progress = |_: f64| {};
        assert!(images_to_pdf(&[], Path::new("out.pdf"), &mut progress).is_err());
    }
}
