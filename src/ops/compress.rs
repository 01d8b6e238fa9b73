use std::path::Path;

use tracing::{info, warn};

use crate::config::job::CompressQuality;
use crate::output::{ProcessResult, format_size};
use crate::pdf::assembler::PageAssembler;
use crate::pdf::{optimizer, writer};

/// Below this reduction (percent) the input is reported as already optimised.
pub const MINIMAL_REDUCTION_PERCENT: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct CompressionReport {
    pub original_size: u64,
    pub result: ProcessResult,
    pub reduction_percent: f64,
}

impl CompressionReport {
    pub fn new(original_size: u64, result: ProcessResult) -> Self {
        let reduction_percent = if original_size > 0 {
            (original_size as f64 - result.size as f64) / original_size as f64 * 100.0
        } else {
            0.0
        };
        Self {
            original_size,
            result,
            reduction_percent,
        }
    }

    pub fn already_optimized(&self) -> bool {
        self.reduction_percent < MINIMAL_REDUCTION_PERCENT
    }

    pub fn summary(&self) -> String {
        format!(
            "original {}, compressed {}, reduction {:.1}%",
            format_size(self.original_size),
            self.result.size_formatted,
            self.reduction_percent
        )
    }
}

/// Repack `input` into a fresh document, Flate-compress its streams and save
/// it with object streams.
///
/// Image streams that already carry a filter are not recompressed.
pub fn compress(
    input: &Path,
    output: &Path,
    quality: CompressQuality,
) -> crate::error::Result<CompressionReport> {
    let original_size = std::fs::metadata(input)?.len();
    let source = super::load_document(input)?;

    // Copying the pages drops every object the page tree no longer reaches.
    let mut assembler = PageAssembler::new();
    assembler.append_document(source)?;
    let mut doc = assembler.finish()?;

    let level = quality.deflate_level();
    optimizer::optimize(&mut doc, level);
    let size = writer::save_packed_to_file(&mut doc, output, level)?;

    let report = CompressionReport::new(original_size, ProcessResult::new(output, size));
    if report.already_optimized() {
        warn!(
            reduction = format!("{:.1}%", report.reduction_percent),
            "document may already be optimized or contain mostly text"
        );
    }
    info!(?quality, "{}", report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction_percent() {
        let report = CompressionReport::new(1000, ProcessResult::new("out.pdf", 600));
        assert!((report.reduction_percent - 40.0).abs() < 1e-9);
        assert!(!report.already_optimized());
    }

    #[test]
    fn test_small_reduction_is_flagged() {
        let report = CompressionReport::new(1000, ProcessResult::new("out.pdf", 980));
        assert!(report.already_optimized());
    }

    #[test]
    fn test_growth_is_negative_reduction() {
        let report = CompressionReport::new(1000, ProcessResult::new("out.pdf", 1100));
        assert!(report.reduction_percent < 0.0);
        assert!(report.already_optimized());
    }

    #[test]
    fn test_empty_original_has_zero_reduction() {
        let report = CompressionReport::new(0, ProcessResult::new("out.pdf", 100));
        assert_eq!(report.reduction_percent, 0.0);
    }
}
