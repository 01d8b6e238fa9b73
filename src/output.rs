use std::path::{Path, PathBuf};

/// A file produced by a job.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProcessResult {
    pub path: PathBuf,
    pub size: u64,
    pub size_formatted: String,
}

impl ProcessResult {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            size_formatted: format_size(size),
        }
    }

    /// Build a result from a file already on disk. A missing file reports size 0.
    pub fn from_file(path: &Path) -> Self {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        Self::new(path, size)
    }
}

/// Format a byte count as `"N B"`, `"x.xx KB"` or `"x.xx MB"`.
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.2} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    }
}
