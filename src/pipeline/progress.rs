// ジョブの進捗状態: Idle -> Processing -> Success | Error

use serde::Serialize;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Processing,
    Success,
    Error,
}

/// 1ジョブ分の進捗（0..=100）と失敗メッセージを保持する。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressTracker {
    status: JobStatus,
    progress: f64,
    error: Option<String>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 処理開始。進捗とエラーはクリアされる。
    pub fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.progress = 0.0;
        self.error = None;
    }

    /// 進捗を更新する。範囲外の値は 0..=100 に丸める。
    pub fn update(&mut self, progress: f64) {
        self.progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 100.0)
        };
        trace!(progress = self.progress, "progress");
    }

    pub fn complete(&mut self) {
        self.status = JobStatus::Success;
        self.progress = 100.0;
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Error;
        self.progress = 0.0;
        self.error = Some(message.into());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
