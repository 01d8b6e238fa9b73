use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PdfMantraError;

/// 履歴の1エントリ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentFile {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    /// UNIX時刻（ミリ秒）
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// JSONファイルに永続化される「最近使ったファイル」一覧。新しい順。
///
/// 同じファイル名のエントリは1つだけ保持し、`limit` 件を超えた古いものは捨てる。
pub struct RecentFiles {
    path: PathBuf,
    limit: usize,
    entries: Vec<RecentFile>,
}

impl RecentFiles {
    /// 履歴ファイルを読み込む。
    ///
    /// ファイルがなければ空。壊れている場合は警告を出して空として扱う。
    pub fn load(path: impl AsRef<Path>, limit: usize) -> crate::error::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<RecentFile>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring unreadable history file");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(PdfMantraError::history(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        Ok(Self {
            path,
            limit,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[RecentFile] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// ファイルを履歴の先頭に追加して保存する。
    pub fn add(&mut self, file_path: &Path, size: Option<u64>) -> crate::error::Result<&RecentFile> {
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.display().to_string());
        let timestamp = now_millis();
        let entry = RecentFile {
            id: timestamp.to_string(),
            name,
            path: file_path.to_path_buf(),
            timestamp,
            size,
        };

        self.entries.retain(|e| e.name != entry.name);
        self.entries.insert(0, entry);
        self.entries.truncate(self.limit);
        self.save()?;

        debug!(path = %file_path.display(), entries = self.entries.len(), "recorded recent file");
        Ok(&self.entries[0])
    }

    /// 履歴ファイルを削除する。存在しなくてもエラーにしない。
    pub fn clear(&mut self) -> crate::error::Result<()> {
        self.entries.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PdfMantraError::history(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// 書き込みはアトミック: 一時ファイルに書いてから rename する。
    fn save(&self) -> crate::error::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| PdfMantraError::history(format!("failed to write {}: {e}", tmp_path.display())))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PdfMantraError::history(format!(
                "failed to replace {}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
