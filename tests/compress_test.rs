mod common;

use lopdf::{Document, Object, Stream, dictionary};
use pdf_mantra::config::job::CompressQuality;
use pdf_mantra::ops::compress::compress;
use pdf_mantra::pdf::optimizer::{compress_streams, delete_unused_objects, optimize};
use tempfile::tempdir;

/// 未圧縮の長いコンテンツストリームと、どこからも参照されない大きなストリームを持つPDF。
fn bulky_pdf() -> Document {
    let mut doc = common::text_pdf(&["Bulky"]);
    let page_id = doc.get_pages()[&1];
    let mut content = String::new();
    for i in 0..400 {
        content.push_str(&format!("BT /F1 10 Tf 72 {} Td (Line number {i}) Tj ET\n", 700 - i));
    }
    let contents_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    doc.get_dictionary_mut(page_id)
        .unwrap()
        .set("Contents", contents_id);
    doc.add_object(Stream::new(dictionary! {}, vec![b'x'; 50_000]));
    doc
}

#[test]
fn test_compress_reduces_size() {
    let dir = tempdir().unwrap();
    let input = common::save(bulky_pdf(), &dir.path().join("bulky.pdf"));
    let output = dir.path().join("compressed.pdf");

    let report = compress(&input, &output, CompressQuality::Medium).unwrap();

    assert_eq!(report.original_size, std::fs::metadata(&input).unwrap().len());
    assert_eq!(report.result.size, std::fs::metadata(&output).unwrap().len());
    assert!(report.result.size < report.original_size);
    assert!(report.reduction_percent > 5.0);
    assert!(!report.already_optimized());

    let texts = common::page_texts(&output);
    assert!(texts[0].contains("Line number 399"));
}

#[test]
fn test_compress_twice_is_already_optimized() {
    let dir = tempdir().unwrap();
    let input = common::save(bulky_pdf(), &dir.path().join("bulky.pdf"));
    let first = dir.path().join("first.pdf");
    let second = dir.path().join("second.pdf");

    compress(&input, &first, CompressQuality::Low).unwrap();
    let report = compress(&first, &second, CompressQuality::Low).unwrap();
    assert!(report.already_optimized(), "reduction was {}", report.reduction_percent);
}

#[test]
fn test_lower_quality_is_not_larger() {
    let dir = tempdir().unwrap();
    let input = common::save(bulky_pdf(), &dir.path().join("bulky.pdf"));
    let low = compress(&input, &dir.path().join("low.pdf"), CompressQuality::Low).unwrap();
    let high = compress(&input, &dir.path().join("high.pdf"), CompressQuality::High).unwrap();
    assert!(low.result.size <= high.result.size);
}

#[test]
fn test_compress_streams_skips_filtered_streams() {
    let mut doc = Document::with_version("1.7");
    let plain = doc.add_object(Stream::new(dictionary! {}, vec![b'a'; 1000]));
    let filtered = doc.add_object(Stream::new(
        dictionary! { "Filter" => "DCTDecode" },
        vec![b'b'; 1000],
    ));

    assert_eq!(compress_streams(&mut doc, 6), 1);

    let plain = doc.get_object(plain).unwrap().as_stream().unwrap();
    assert_eq!(plain.dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");
    assert!(plain.content.len() < 1000);
    let filtered = doc.get_object(filtered).unwrap().as_stream().unwrap();
    assert_eq!(filtered.content.len(), 1000);
}

#[test]
fn test_compress_streams_keeps_incompressible_data() {
    let mut doc = Document::with_version("1.7");
    let id = doc.add_object(Stream::new(dictionary! {}, b"q".to_vec()));
    assert_eq!(compress_streams(&mut doc, 9), 0);
    let stream = doc.get_object(id).unwrap().as_stream().unwrap();
    assert!(stream.dict.get(b"Filter").is_err());
}

#[test]
fn test_delete_unused_objects() {
    let mut doc = common::text_pdf(&["A"]);
    let orphan = doc.add_object(Object::string_literal("orphan"));
    assert!(delete_unused_objects(&mut doc) >= 1);
    assert!(doc.get_object(orphan).is_err());
}

#[test]
fn test_optimize_keeps_document_loadable() {
    let mut doc = bulky_pdf();
    optimize(&mut doc, 6);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    let reloaded = Document::load_mem(&buf).unwrap();
    assert_eq!(reloaded.get_pages().len(), 1);
}

#[test]
fn test_compress_packs_objects_into_object_streams() {
    let dir = tempdir().unwrap();
    let input = common::write_text_pdf(dir.path(), "plain.pdf", &["One", "Two"]);
    let output = dir.path().join("packed.pdf");

    compress(&input, &output, CompressQuality::Medium).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    let has = |needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);
    assert!(has(b"/ObjStm"), "output should contain an object stream");
    assert!(has(b"/XRef"), "object streams need a cross-reference stream");

    assert_eq!(common::page_texts(&output).len(), 2);
    assert!(common::page_texts(&output)[1].contains("Two"));
}
