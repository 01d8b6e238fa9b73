use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::job::CompressQuality;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 出力ファイル名を省略したジョブの出力先ディレクトリ。
    pub output_dir: PathBuf,
    /// 最近使ったファイルの履歴ファイル（output_dirからの相対パス可）。
    pub history_file: PathBuf,
    pub history_limit: usize,
    pub record_history: bool,
    pub parallel_workers: usize,
    pub compress_quality: CompressQuality,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            output_dir: PathBuf::from("."),
            history_file: PathBuf::from("recent_files.json"),
            history_limit: crate::history::DEFAULT_HISTORY_LIMIT,
            record_history: true,
            parallel_workers: 0,
            compress_quality: CompressQuality::Medium,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::PdfMantraError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}
