pub mod job;
pub mod merged;
pub mod settings;

use settings::Settings;
use std::path::{Path, PathBuf};

/// ジョブファイルのパスからsettings.yamlを自動検出して読み込む。
///
/// ジョブファイルと同じディレクトリに `settings.yaml` が存在すれば読み込み、
/// 存在しなければデフォルト設定を返す。
pub fn load_settings_for_job(job_file_path: &Path) -> crate::error::Result<Settings> {
    let dir = job_file_path.parent().ok_or_else(|| {
        crate::error::PdfMantraError::config("Cannot determine job file directory")
    })?;
    load_settings_in(dir)
}

/// `dir/settings.yaml` を読み込む。存在しなければデフォルト設定。
pub fn load_settings_in(dir: &Path) -> crate::error::Result<Settings> {
    let settings_path = dir.join("settings.yaml");

    if settings_path.exists() {
        Settings::from_file(&settings_path)
    } else {
        Ok(Settings::default())
    }
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
pub fn resolve_path(base_dir: &Path, path: impl AsRef<Path>) -> PathBuf {
    let p = path.as_ref();
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// 履歴ファイルの場所。`history_file` は `output_dir` を基準に解決する。
pub fn history_path(settings: &Settings, base_dir: &Path) -> PathBuf {
    let output_dir = resolve_path(base_dir, &settings.output_dir);
    resolve_path(&output_dir, &settings.history_file)
}
