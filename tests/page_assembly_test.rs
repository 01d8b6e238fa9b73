// 結合・分割・並べ替えのテスト

mod common;

use lopdf::Document;
use pdf_mantra::ops::merge::{merge, merge_documents};
use pdf_mantra::ops::reorder::{reorder, reorder_document, validate_permutation};
use pdf_mantra::ops::split::{split, split_document, validate_selection};
use pdf_mantra::pdf::assembler::PageAssembler;
use pdf_mantra::pdf::reader::{page_rotation, page_size};
use tempfile::tempdir;

fn texts(doc: &Document) -> Vec<String> {
    let count = doc.get_pages().len() as u32;
    (1..=count)
        .map(|n| doc.extract_text(&[n]).unwrap_or_default())
        .collect()
}

// ============================================================
// 1. merge
// ============================================================

#[test]
fn test_merge_preserves_order_and_count() {
    let dir = tempdir().unwrap();
    let a = common::write_text_pdf(dir.path(), "a.pdf", &["Alpha1", "Alpha2"]);
    let b = common::write_text_pdf(dir.path(), "b.pdf", &["Bravo1"]);
    let c = common::write_text_pdf(dir.path(), "c.pdf", &["Charlie1", "Charlie2"]);
    let output = dir.path().join("out/merged.pdf");

    let mut progress = Vec::new();
    let result = merge(&[a, b, c], &output, &mut |p: f64| progress.push(p)).expect("merge should succeed");

    assert_eq!(result.path, output);
    assert!(result.size > 0);
    assert_eq!(result.size, std::fs::metadata(&output).unwrap().len());

    let texts = common::page_texts(&output);
    assert_eq!(texts.len(), 5);
    for (text, expected) in texts.iter().zip(["Alpha1", "Alpha2", "Bravo1", "Charlie1", "Charlie2"]) {
        assert!(text.contains(expected), "expected {expected:?} in {text:?}");
    }

    assert_eq!(progress.len(), 3, "one progress update per input");
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert!(progress.iter().all(|&p| (0.0..=100.0).contains(&p)));
}

#[test]
fn test_merge_requires_two_inputs() {
    let dir = tempdir().unwrap();
    let a = common::write_text_pdf(dir.path(), "a.pdf", &["Only"]);
    let err = merge(&[a], &dir.path().join("m.pdf"), &mut |_: f64| {}).unwrap_err();
    assert!(err.to_string().contains("at least 2"), "got: {err}");
    assert!(!dir.path().join("m.pdf").exists());
}

#[test]
fn test_merge_missing_input_fails_without_output() {
    let dir = tempdir().unwrap();
    let a = common::write_text_pdf(dir.path(), "a.pdf", &["A"]);
    let missing = dir.path().join("missing.pdf");
    let output = dir.path().join("m.pdf");
    let err = merge(&[a, missing], &output, &mut |_: f64| {}).unwrap_err();
    assert!(err.to_string().contains("missing.pdf"), "got: {err}");
    assert!(!output.exists());
}

#[test]
fn test_merge_documents_flattens_inherited_attributes() {
    let merged = merge_documents(vec![
        common::inherited_pdf(&["Inherit1"], 90),
        common::text_pdf(&["Plain1"]),
    ])
    .unwrap();

    let pages = merged.get_pages();
    assert_eq!(pages.len(), 2);
    let first = pages[&1];
    assert_eq!(page_size(&merged, first).unwrap(), (300.0, 400.0));
    assert_eq!(page_rotation(&merged, first), 90);
    let second = pages[&2];
    assert_eq!(page_size(&merged, second).unwrap(), (612.0, 792.0));
    assert_eq!(page_rotation(&merged, second), 0);
}

#[test]
fn test_merged_document_survives_save_and_reload() {
    let mut merged = merge_documents(vec![
        common::inherited_pdf(&["Inherit1", "Inherit2"], 0),
        common::text_pdf(&["Plain1"]),
    ])
    .unwrap();
    let mut buf = Vec::new();
    merged.save_to(&mut buf).unwrap();

    let reloaded = Document::load_mem(&buf).unwrap();
    let texts = texts(&reloaded);
    assert_eq!(texts.len(), 3);
    assert!(texts[1].contains("Inherit2"));
    assert!(texts[2].contains("Plain1"));
}

// ============================================================
// 2. split
// ============================================================

#[test]
fn test_validate_selection() {
    assert!(validate_selection(&[1, 2, 3], 3).is_ok());
    assert!(validate_selection(&[], 3).is_err());
    assert!(validate_selection(&[0], 3).is_err());
    assert!(validate_selection(&[4], 3).is_err());
}

#[test]
fn test_split_writes_one_file_per_range() {
    let dir = tempdir().unwrap();
    let input = common::write_text_pdf(dir.path(), "book.pdf", &["P1", "P2", "P3", "P4", "P5"]);
    let out_dir = dir.path().join("parts");

    let results = split(&input, &[vec![1, 2], vec![3], vec![4, 5]], &out_dir, "part").unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].path, out_dir.join("part_1.pdf"));
    assert_eq!(results[2].path, out_dir.join("part_3.pdf"));
    assert_eq!(common::page_count(&results[0].path), 2);
    assert_eq!(common::page_count(&results[1].path), 1);
    assert_eq!(common::page_count(&results[2].path), 2);

    let last = common::page_texts(&results[2].path);
    assert!(last[0].contains("P4"));
    assert!(last[1].contains("P5"));
}

#[test]
fn test_split_out_of_range_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = common::write_text_pdf(dir.path(), "book.pdf", &["P1", "P2"]);
    let out_dir = dir.path().join("parts");

    let err = split(&input, &[vec![1], vec![2, 3]], &out_dir, "part").unwrap_err();
    assert!(err.to_string().contains("between 1 and 2"), "got: {err}");
    assert!(!out_dir.join("part_1.pdf").exists());
}

#[test]
fn test_split_document_keeps_source_untouched() {
    let source = common::text_pdf(&["S1", "S2", "S3"]);
    let parts = split_document(&source, &[vec![3], vec![1, 2]]).unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].get_pages().len(), 1);
    assert_eq!(parts[1].get_pages().len(), 2);
    assert_eq!(source.get_pages().len(), 3);
}

#[test]
fn test_split_document_requires_ranges() {
    let source = common::text_pdf(&["S1"]);
    assert!(split_document(&source, &[]).is_err());
}

// ============================================================
// 3. reorder
// ============================================================

#[test]
fn test_validate_permutation() {
    assert!(validate_permutation(&[2, 1, 3], 3).is_ok());
    assert!(validate_permutation(&[1, 2], 3).is_err(), "missing page");
    assert!(validate_permutation(&[1, 1, 2], 3).is_err(), "duplicate page");
    assert!(validate_permutation(&[1, 2, 4], 3).is_err(), "out of range");
}

#[test]
fn test_reorder_changes_page_order() {
    let dir = tempdir().unwrap();
    let input = common::write_text_pdf(dir.path(), "doc.pdf", &["First", "Second", "Third"]);
    let output = dir.path().join("reordered.pdf");

    reorder(&input, &[3, 1, 2], &output).unwrap();

    let texts = common::page_texts(&output);
    assert!(texts[0].contains("Third"));
    assert!(texts[1].contains("First"));
    assert!(texts[2].contains("Second"));
}

#[test]
fn test_reorder_document_identity() {
    let doc = reorder_document(common::text_pdf(&["A1", "B2"]), &[1, 2]).unwrap();
    let texts = texts(&doc);
    assert!(texts[0].contains("A1"));
    assert!(texts[1].contains("B2"));
}

// ============================================================
// 4. PageAssembler
// ============================================================

#[test]
fn test_assembler_duplicate_pages_are_distinct_objects() {
    let mut assembler = PageAssembler::new();
    assembler.append_pages(common::text_pdf(&["Dup"]), &[1, 1]).unwrap();
    assert_eq!(assembler.page_count(), 2);

    let doc = assembler.finish().unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 2);
    assert_ne!(pages[&1], pages[&2]);
}

#[test]
fn test_assembler_rejects_missing_page() {
    let mut assembler = PageAssembler::new();
    let err = assembler
        .append_pages(common::text_pdf(&["One"]), &[2])
        .unwrap_err();
    assert!(err.to_string().contains("page 2"), "got: {err}");
}
