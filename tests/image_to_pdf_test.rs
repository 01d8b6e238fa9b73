mod common;

use lopdf::{Document, Object};
use pdf_mantra::ops::image_to_pdf::{A4_HEIGHT, A4_WIDTH, images_to_pdf};
use pdf_mantra::pdf::image::{add_image_xobject, prepare_image};
use pdf_mantra::pdf::reader::{PdfReader, page_size};
use tempfile::tempdir;

#[test]
fn test_prepare_png_is_flate_rgb() {
    let image = prepare_image(&common::png_bytes(4, 3)).unwrap();
    assert_eq!((image.width, image.height), (4, 3));
    assert_eq!(image.filter, "FlateDecode");
    assert_eq!(image.color_space, "DeviceRGB");
    assert!(image.alpha.is_none(), "opaque PNG needs no soft mask");
}

#[test]
fn test_prepare_translucent_png_has_alpha() {
    let image = prepare_image(&common::translucent_png_bytes(2, 2)).unwrap();
    assert!(image.alpha.is_some());
}

#[test]
fn test_prepare_jpeg_is_passed_through() {
    let bytes = common::jpeg_bytes(8, 8);
    let image = prepare_image(&bytes).unwrap();
    assert_eq!(image.filter, "DCTDecode");
    assert_eq!(image.data, bytes);
}

#[test]
fn test_soft_mask_is_attached() {
    let mut doc = Document::with_version("1.7");
    let image = prepare_image(&common::translucent_png_bytes(2, 2)).unwrap();
    let id = add_image_xobject(&mut doc, &image);
    let stream = doc.get_object(id).unwrap().as_stream().unwrap();
    let smask = stream.dict.get(b"SMask").unwrap().as_reference().unwrap();
    let mask = doc.get_object(smask).unwrap().as_stream().unwrap();
    assert_eq!(mask.dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceGray");
}

#[test]
fn test_images_to_pdf_one_page_per_image() {
    let dir = tempdir().unwrap();
    let png = dir.path().join("a.png");
    let jpg = dir.path().join("b.jpg");
    std::fs::write(&png, common::png_bytes(200, 100)).unwrap();
    std::fs::write(&jpg, common::jpeg_bytes(50, 80)).unwrap();
    let output = dir.path().join("images.pdf");

    let mut progress = Vec::new();
    let report = images_to_pdf(&[png, jpg], &output, &mut |p: f64| progress.push(p)).unwrap();

    assert_eq!(report.embedded, 2);
    assert!(report.skipped.is_empty());
    assert_eq!(progress.len(), 2);

    let reader = PdfReader::open(&output).unwrap();
    assert_eq!(reader.page_count(), 2);
    let (w, h) = reader.page_dimensions(1).unwrap();
    assert!((w - A4_WIDTH).abs() < 0.01);
    assert!((h - A4_HEIGHT).abs() < 0.01);
    assert_eq!(reader.page_image_names(1).unwrap(), vec!["Im0".to_string()]);
    assert_eq!(reader.page_image_names(2).unwrap(), vec!["Im0".to_string()]);
}

#[test]
fn test_images_to_pdf_draws_centered_image() {
    let dir = tempdir().unwrap();
    let png = dir.path().join("square.png");
    std::fs::write(&png, common::png_bytes(10, 10)).unwrap();
    let output = dir.path().join("images.pdf");

    images_to_pdf(&[png], &output, &mut |_: f64| {}).unwrap();

    let doc = Document::load(&output).unwrap();
    let page_id = doc.get_pages()[&1];
    let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();
    // 555.28 x 555.28 を横方向 20pt の位置に配置
    assert!(content.starts_with("q 555.28 0 0 555.28 20 "), "got: {content}");
    assert!(content.contains("/Im0 Do"));
    assert_eq!(page_size(&doc, page_id).unwrap().0 as f32, A4_WIDTH as f32);
}

#[test]
fn test_unsupported_images_are_skipped() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.png");
    let bad = dir.path().join("notes.txt");
    let missing = dir.path().join("missing.png");
    std::fs::write(&good, common::png_bytes(3, 3)).unwrap();
    std::fs::write(&bad, b"plain text, not an image").unwrap();
    let output = dir.path().join("images.pdf");

    let report = images_to_pdf(&[bad.clone(), good, missing.clone()], &output, &mut |_: f64| {})
        .unwrap();

    assert_eq!(report.embedded, 1);
    assert_eq!(report.skipped, vec![bad, missing]);
    assert_eq!(common::page_count(&output), 1);
}

#[test]
fn test_no_usable_images_is_an_error() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("notes.txt");
    std::fs::write(&bad, b"plain text").unwrap();
    let output = dir.path().join("images.pdf");

    assert!(images_to_pdf(&[bad], &output, &mut |_: f64| {}).is_err());
    assert!(!output.exists());
}

#[test]
fn test_image_xobject_dictionary() {
    let mut doc = Document::with_version("1.7");
    let image = prepare_image(&common::png_bytes(6, 5)).unwrap();
    let id = add_image_xobject(&mut doc, &image);
    let stream = doc.get_object(id).unwrap().as_stream().unwrap();
    assert_eq!(stream.dict.get(b"Width").unwrap(), &Object::Integer(6));
    assert_eq!(stream.dict.get(b"Height").unwrap(), &Object::Integer(5));
    assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");
}
