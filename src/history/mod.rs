// 最近使ったファイルの履歴（JSON）

pub mod store;

pub use store::{RecentFile, RecentFiles};

/// 履歴に保持する既定の件数。
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
