use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::info;

use crate::error::PdfMantraError;
use crate::output::ProcessResult;
use crate::pdf::assembler::PageAssembler;
use crate::pdf::writer;

/// Concatenate every page of every document, in order.
pub fn merge_documents(documents: Vec<Document>) -> crate::error::Result<Document> {
    if documents.len() < 2 {
        return Err(PdfMantraError::invalid_input(
            "select at least 2 files to merge",
        ));
    }

    let mut assembler = PageAssembler::new();
    for doc in documents {
        assembler.append_document(doc)?;
    }
    assembler.finish()
}

/// Merge the PDFs at `inputs` into `output`.
///
/// `progress` receives a percentage after each input has been loaded.
pub fn merge(
    inputs: &[PathBuf],
    output: &Path,
    progress: &mut dyn FnMut(f64),
) -> crate::error::Result<ProcessResult> {
    if inputs.len() < 2 {
        return Err(PdfMantraError::invalid_input(
            "select at least 2 files to merge",
        ));
    }

    let mut documents = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        documents.push(super::load_document(input)?);
        progress((i + 1) as f64 / inputs.len() as f64 * 90.0);
    }

    let mut merged = merge_documents(documents)?;
    let page_count = merged.get_pages().len();
    let size = writer::save_to_file(&mut merged, output)?;
    info!(files = inputs.len(), pages = page_count, "merged documents");
    Ok(ProcessResult::new(output, size))
}
