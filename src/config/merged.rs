use std::path::{Path, PathBuf};

use super::job::{CompressQuality, Job};
use super::{history_path, resolve_path};
use super::settings::Settings;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub output_dir: PathBuf,
    pub compress_quality: CompressQuality,
    pub history_file: Option<PathBuf>,
    pub history_limit: usize,
}

impl MergedConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    ///
    /// 相対パスは `base_dir`（ジョブファイルのディレクトリ）を基準に解決する。
    pub fn new(settings: &Settings, job: &Job, base_dir: &Path) -> Self {
        let compress_quality = match job {
            Job::Compress(j) => j.quality.unwrap_or(settings.compress_quality),
            _ => settings.compress_quality,
        };
        let output_dir = resolve_path(base_dir, &settings.output_dir);
        let history_file = settings
            .record_history
            .then(|| history_path(settings, base_dir));

        MergedConfig {
            output_dir,
            compress_quality,
            history_file,
            history_limit: settings.history_limit,
        }
    }
}
