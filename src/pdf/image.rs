// 画像XObjectの作成（image-to-pdf）と抽出（extract-images）

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::error::PdfMantraError;

/// PDFに埋め込む準備ができた画像データ。
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub filter: &'static str,
    pub data: Vec<u8>,
    /// アルファチャンネル（DeviceGray 8bit, FlateDecode済み）
    pub alpha: Option<Vec<u8>>,
}

/// 画像バイト列をPDF埋め込み用に変換する。
///
/// JPEG はそのまま DCTDecode として埋め込み、PNG はデコードして
/// FlateDecode で再圧縮する。それ以外の形式はエラー。
pub fn prepare_image(bytes: &[u8]) -> crate::error::Result<PreparedImage> {
    let reader = image::ImageReader::new(std::io::Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format();
    let decoded = reader.decode()?;

    match format {
        Some(ImageFormat::Jpeg) => Ok(PreparedImage {
            width: decoded.width(),
            height: decoded.height(),
            color_space: match decoded.color() {
                ColorType::L8 | ColorType::L16 => "DeviceGray",
                _ => "DeviceRGB",
            },
            filter: "DCTDecode",
            data: bytes.to_vec(),
            alpha: None,
        }),
        Some(ImageFormat::Png) => prepare_png(&decoded),
        other => Err(PdfMantraError::image(format!(
            "unsupported image format: {other:?} (only JPEG and PNG can be embedded)"
        ))),
    }
}

fn prepare_png(decoded: &DynamicImage) -> crate::error::Result<PreparedImage> {
    let (width, height) = (decoded.width(), decoded.height());
    let grayscale = matches!(
        decoded.color(),
        ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16
    );

    let (pixels, alpha, color_space) = if decoded.color().has_alpha() {
        let rgba = decoded.to_rgba8();
        let alpha: Vec<u8> = rgba.pixels().map(|p| p[3]).collect();
        let pixels: Vec<u8> = if grayscale {
            decoded.to_luma8().into_raw()
        } else {
            rgba.pixels().flat_map(|p| [p[0], p[1], p[2]]).collect()
        };
        let alpha = (!alpha.iter().all(|&a| a == 255)).then_some(alpha);
        (pixels, alpha, if grayscale { "DeviceGray" } else { "DeviceRGB" })
    } else if grayscale {
        (decoded.to_luma8().into_raw(), None, "DeviceGray")
    } else {
        (decoded.to_rgb8().into_raw(), None, "DeviceRGB")
    };

    Ok(PreparedImage {
        width,
        height,
        color_space,
        filter: "FlateDecode",
        data: deflate(&pixels)?,
        alpha: alpha.map(|a| deflate(&a)).transpose()?,
    })
}

fn deflate(data: &[u8]) -> crate::error::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// PreparedImage を画像XObjectとしてドキュメントに追加する。
///
/// 戻り値はXObjectのオブジェクトID。
pub fn add_image_xobject(doc: &mut Document, image: &PreparedImage) -> ObjectId {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => image.width as i64,
        "Height" => image.height as i64,
        "ColorSpace" => image.color_space,
        "BitsPerComponent" => 8,
        "Filter" => image.filter,
    };

    if let Some(alpha) = &image.alpha {
        let smask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            alpha.clone(),
        );
        let smask_id = doc.add_object(smask);
        dict.set("SMask", smask_id);
    }

    let mut stream = Stream::new(dict, image.data.clone());
    // 既に圧縮済みのデータなので lopdf 側での再圧縮は不要
    stream.allows_compression = false;
    doc.add_object(stream)
}

/// 画像を (max_width, max_height) に収まるよう縦横比を保って拡大縮小する。
pub fn scale_to_fit(width: f64, height: f64, max_width: f64, max_height: f64) -> (f64, f64) {
    let scale = (max_width / width).min(max_height / height);
    (width * scale, height * scale)
}

/// 抽出した画像の書き出し結果。
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedImage {
    Written(PathBuf),
    /// 未対応のエンコーディング（フィルタ名または色空間）
    Skipped(String),
}

/// 画像XObjectストリームをファイルとして書き出す。
///
/// `stem` に拡張子を付けたパスへ書き込む:
/// - DCTDecode 単独 → `.jpg`（そのまま）
/// - JPXDecode 単独 → `.jp2`（そのまま）
/// - 8bit DeviceRGB/DeviceGray の非圧縮・FlateDecode 単独 → `.png`
///
/// フィルタ連鎖やその他のエンコーディングは `Skipped`。
pub fn write_image_stream(
    stream: &lopdf::Stream,
    dir: &Path,
    stem: &str,
) -> crate::error::Result<ExtractedImage> {
    let dict = &stream.dict;
    let filters = filter_names(dict);

    match filters.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["DCTDecode"] => {
            let path = dir.join(format!("{stem}.jpg"));
            std::fs::write(&path, &stream.content)?;
            return Ok(ExtractedImage::Written(path));
        }
        ["JPXDecode"] => {
            let path = dir.join(format!("{stem}.jp2"));
            std::fs::write(&path, &stream.content)?;
            return Ok(ExtractedImage::Written(path));
        }
        [] | ["FlateDecode"] => {}
        _ => return Ok(ExtractedImage::Skipped(filters.join("+"))),
    }

    let width = dict_u32(dict, b"Width")?;
    let height = dict_u32(dict, b"Height")?;
    let bits = dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8);
    let color_space = dict
        .get(b"ColorSpace")
        .and_then(Object::as_name)
        .map(|n| String::from_utf8_lossy(n).into_owned())
        .unwrap_or_default();
    let channels: usize = match (color_space.as_str(), bits) {
        ("DeviceRGB", 8) => 3,
        ("DeviceGray", 8) => 1,
        _ => return Ok(ExtractedImage::Skipped(format!("{color_space} {bits}bpc"))),
    };

    // 予測子（/DecodeParms /Predictor）は lopdf 側で取り除かれる
    let mut raw = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .map_err(|e| PdfMantraError::image(format!("FlateDecode failed: {e}")))?
    };

    let expected = width as usize * height as usize * channels;
    if raw.len() < expected {
        return Err(PdfMantraError::image(format!(
            "image data too short for {width}x{height}: expected {expected} bytes, got {}",
            raw.len()
        )));
    }
    raw.truncate(expected);

    let image = if channels == 3 {
        image::RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8)
    } else {
        image::GrayImage::from_raw(width, height, raw).map(DynamicImage::ImageLuma8)
    }
    .ok_or_else(|| PdfMantraError::image(format!("invalid image buffer for {width}x{height}")))?;

    let path = dir.join(format!("{stem}.png"));
    image.save_with_format(&path, ImageFormat::Png)?;
    Ok(ExtractedImage::Written(path))
}

fn filter_names(dict: &Dictionary) -> Vec<String> {
    let name = |obj: &Object| obj.as_name().ok().map(|n| String::from_utf8_lossy(n).into_owned());
    match dict.get(b"Filter") {
        // フィルタ連鎖: 復号順に並ぶ
        Ok(Object::Array(arr)) => arr.iter().filter_map(name).collect(),
        Ok(other) => name(other).into_iter().collect(),
        Err(_) => Vec::new(),
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> crate::error::Result<u32> {
    dict.get(key)
        .and_then(Object::as_i64)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            PdfMantraError::image(format!(
                "missing or invalid /{}",
                String::from_utf8_lossy(key)
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_to_fit_downscales() {
        let (w, h) = scale_to_fit(2000.0, 1000.0, 500.0, 800.0);
        assert!((w - 500.0).abs() < 1e-9);
        assert!((h - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_to_fit_upscales() {
        let (w, h) = scale_to_fit(10.0, 20.0, 100.0, 100.0);
        assert!((w - 50.0).abs() < 1e-9);
        assert!((h - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_prepare_image_rejects_garbage() {
        assert!(prepare_image(b"definitely not an image").is_err());
    }
}
