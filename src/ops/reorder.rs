use std::path::Path;

use lopdf::Document;
use tracing::info;

use crate::error::PdfMantraError;
use crate::output::ProcessResult;
use crate::pdf::assembler::PageAssembler;
use crate::pdf::writer;

/// `order` must list every page `1..=page_count` exactly once.
pub fn validate_permutation(order: &[u32], page_count: u32) -> crate::error::Result<()> {
    if order.len() != page_count as usize {
        return Err(PdfMantraError::page_range(format!(
            "new order lists {} pages but the document has {page_count}",
            order.len()
        )));
    }
    let mut seen = vec![false; page_count as usize];
    for &page in order {
        if page < 1 || page > page_count {
            return Err(PdfMantraError::page_range(format!(
                "page {page} is out of range (document has {page_count} pages)"
            )));
        }
        let slot = &mut seen[(page - 1) as usize];
        if *slot {
            return Err(PdfMantraError::page_range(format!(
                "page {page} appears more than once in the new order"
            )));
        }
        *slot = true;
    }
    Ok(())
}

pub fn reorder_document(source: Document, order: &[u32]) -> crate::error::Result<Document> {
    validate_permutation(order, source.get_pages().len() as u32)?;
    let mut assembler = PageAssembler::new();
    assembler.append_pages(source, order)?;
    assembler.finish()
}

pub fn reorder(input: &Path, order: &[u32], output: &Path) -> crate::error::Result<ProcessResult> {
    let source = super::load_document(input)?;
    let mut reordered = reorder_document(source, order)?;
    let size = writer::save_to_file(&mut reordered, output)?;
    info!(pages = order.len(), "reordered pages");
    Ok(ProcessResult::new(output, size))
}
