use std::path::Path;

use lopdf::Document;
use rayon::prelude::*;
use tracing::info;

use crate::error::PdfMantraError;
use crate::output::ProcessResult;
use crate::pdf::assembler::PageAssembler;
use crate::pdf::writer;

/// Check that every page of `selection` exists in a document of `page_count` pages.
pub fn validate_selection(selection: &[u32], page_count: u32) -> crate::error::Result<()> {
    if selection.is_empty() {
        return Err(PdfMantraError::page_range("no pages selected"));
    }
    if let Some(&bad) = selection.iter().find(|&&p| p < 1 || p > page_count) {
        return Err(PdfMantraError::page_range(format!(
            "page {bad} is out of range: enter pages between 1 and {page_count}"
        )));
    }
    Ok(())
}

/// One new document per page selection. Selections are built in parallel.
pub fn split_document(source: &Document, ranges: &[Vec<u32>]) -> crate::error::Result<Vec<Document>> {
    if ranges.is_empty() {
        return Err(PdfMantraError::page_range("no page ranges given"));
    }
    let page_count = source.get_pages().len() as u32;
    for range in ranges {
        validate_selection(range, page_count)?;
    }

    ranges
        .par_iter()
        .map(|range| {
            let mut assembler = PageAssembler::new();
            assembler.append_pages(source.clone(), range)?;
            assembler.finish()
        })
        .collect()
}

/// Split `input` into `<output_dir>/<prefix>_<n>.pdf`, one file per range.
pub fn split(
    input: &Path,
    ranges: &[Vec<u32>],
    output_dir: &Path,
    prefix: &str,
) -> crate::error::Result<Vec<ProcessResult>> {
    let source = super::load_document(input)?;
    let parts = split_document(&source, ranges)?;

    let mut results = Vec::with_capacity(parts.len());
    for (i, mut part) in parts.into_iter().enumerate() {
        let path = output_dir.join(format!("{prefix}_{}.pdf", i + 1));
        let size = writer::save_to_file(&mut part, &path)?;
        results.push(ProcessResult::new(path, size));
    }
    info!(parts = results.len(), input = %input.display(), "split document");
    Ok(results)
}
