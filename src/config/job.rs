use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::PdfMantraError;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

/// One transformation. The YAML key `operation` selects the variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum Job {
    Merge(MergeJob),
    Split(SplitJob),
    Reorder(ReorderJob),
    Compress(CompressJob),
    Rotate(RotateJob),
    Watermark(WatermarkJob),
    PageNumbers(PageNumbersJob),
    ImageToPdf(ImageToPdfJob),
    Protect(ProtectJob),
    Unlock(UnlockJob),
    Info(InfoJob),
    ExtractText(ExtractTextJob),
    ExtractImages(ExtractImagesJob),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeJob {
    pub inputs: Vec<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitJob {
    pub input: String,
    /// 出力ファイルごとのページ選択（1-based, 例: `"1-3"`, `"4, 6"`）。
    #[serde(deserialize_with = "deserialize_page_sets")]
    pub ranges: Vec<Vec<u32>>,
    pub output_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderJob {
    pub input: String,
    /// 新しいページ順（1-based, 記述順を保持）。
    #[serde(deserialize_with = "deserialize_page_order")]
    pub order: Vec<u32>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompressJob {
    pub input: String,
    pub quality: Option<CompressQuality>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RotateJob {
    pub input: String,
    /// 回転対象ページ。省略時は全ページ。
    #[serde(default, deserialize_with = "deserialize_optional_pages")]
    pub pages: Option<Vec<u32>>,
    pub direction: Option<RotateDirection>,
    #[serde(default = "default_turns")]
    pub turns: u32,
    /// ページ番号(1-based) → 絶対角度。directionより後に適用される。
    #[serde(default)]
    pub angles: BTreeMap<u32, i64>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatermarkJob {
    pub input: String,
    #[serde(default = "default_watermark_text")]
    pub text: String,
    #[serde(default)]
    pub position: WatermarkPosition,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageNumbersJob {
    pub input: String,
    #[serde(default)]
    pub position: PageNumberPosition,
    /// `{page}` と `{total}` を置換する書式。
    #[serde(default = "default_page_format")]
    pub format: String,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageToPdfJob {
    pub images: Vec<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProtectJob {
    pub input: String,
    pub password: String,
    pub confirm_password: String,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnlockJob {
    pub input: String,
    pub password: String,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfoJob {
    pub input: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractTextJob {
    pub input: String,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractImagesJob {
    pub input: String,
    /// 指定時のみ画像ファイルを書き出す。省略時は解析のみ。
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl CompressQuality {
    /// zlib圧縮レベル。品質が低いほど強く圧縮する。
    pub fn deflate_level(self) -> u32 {
        match self {
            CompressQuality::Low => 9,
            CompressQuality::Medium => 6,
            CompressQuality::High => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotateDirection {
    Left,
    Right,
}

impl RotateDirection {
    /// 1回あたりの回転量（度）。
    pub fn delta(self) -> i64 {
        match self {
            RotateDirection::Left => -90,
            RotateDirection::Right => 90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    #[default]
    Diagonal,
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageNumberPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

fn default_turns() -> u32 {
    1
}

fn default_watermark_text() -> String {
    "CONFIDENTIAL".to_string()
}

fn default_opacity() -> f64 {
    0.3
}

fn default_page_format() -> String {
    "{page}".to_string()
}

impl Job {
    /// Operation name as written in job files.
    pub fn operation(&self) -> &'static str {
        match self {
            Job::Merge(_) => "merge",
            Job::Split(_) => "split",
            Job::Reorder(_) => "reorder",
            Job::Compress(_) => "compress",
            Job::Rotate(_) => "rotate",
            Job::Watermark(_) => "watermark",
            Job::PageNumbers(_) => "page-numbers",
            Job::ImageToPdf(_) => "image-to-pdf",
            Job::Protect(_) => "protect",
            Job::Unlock(_) => "unlock",
            Job::Info(_) => "info",
            Job::ExtractText(_) => "extract-text",
            Job::ExtractImages(_) => "extract-images",
        }
    }

    /// Input paths as written in the job file.
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Job::Merge(j) => j.inputs.iter().map(String::as_str).collect(),
            Job::ImageToPdf(j) => j.images.iter().map(String::as_str).collect(),
            Job::Split(j) => vec![j.input.as_str()],
            Job::Reorder(j) => vec![j.input.as_str()],
            Job::Compress(j) => vec![j.input.as_str()],
            Job::Rotate(j) => vec![j.input.as_str()],
            Job::Watermark(j) => vec![j.input.as_str()],
            Job::PageNumbers(j) => vec![j.input.as_str()],
            Job::Protect(j) => vec![j.input.as_str()],
            Job::Unlock(j) => vec![j.input.as_str()],
            Job::Info(j) => vec![j.input.as_str()],
            Job::ExtractText(j) => vec![j.input.as_str()],
            Job::ExtractImages(j) => vec![j.input.as_str()],
        }
    }

    /// Explicit output path from the job file, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Job::Merge(j) => j.output.as_deref(),
            Job::Reorder(j) => j.output.as_deref(),
            Job::Compress(j) => j.output.as_deref(),
            Job::Rotate(j) => j.output.as_deref(),
            Job::Watermark(j) => j.output.as_deref(),
            Job::PageNumbers(j) => j.output.as_deref(),
            Job::ImageToPdf(j) => j.output.as_deref(),
            Job::Protect(j) => j.output.as_deref(),
            Job::Unlock(j) => j.output.as_deref(),
            Job::ExtractText(j) => j.output.as_deref(),
            Job::Split(_) | Job::Info(_) | Job::ExtractImages(_) => None,
        }
    }

    /// 出力ファイル名を省略した場合の既定ファイル名。
    ///
    /// 入力ファイル名を引き継ぐ操作は `<prefix>_<入力ファイル名>` になる。
    /// 分割・情報表示・画像抽出は単一の出力ファイルを持たないため `None`。
    pub fn default_output_name(&self) -> Option<String> {
        match self {
            Job::Merge(_) => Some("merged.pdf".to_string()),
            Job::Reorder(_) => Some("reordered.pdf".to_string()),
            Job::Compress(_) => Some("compressed.pdf".to_string()),
            Job::Rotate(j) => Some(prefixed_name("rotated", &j.input)),
            Job::Watermark(j) => Some(prefixed_name("watermarked", &j.input)),
            Job::PageNumbers(j) => Some(prefixed_name("numbered", &j.input)),
            Job::ImageToPdf(_) => Some("images.pdf".to_string()),
            Job::Protect(j) => Some(prefixed_name("protected", &j.input)),
            Job::Unlock(j) => Some(prefixed_name("unlocked", &j.input)),
            Job::ExtractText(_) => Some("extracted-text.txt".to_string()),
            Job::Split(_) | Job::Info(_) | Job::ExtractImages(_) => None,
        }
    }
}

fn prefixed_name(prefix: &str, input: &str) -> String {
    let name = Path::new(input)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    format!("{prefix}_{name}")
}

/// ページ範囲文字列の1要素（`"5"` または `"5-10"`）をパースする。
fn parse_range_part(part: &str) -> crate::error::Result<std::ops::RangeInclusive<u32>> {
    let parse_num = |s: &str| -> crate::error::Result<u32> {
        let page: u32 = s
            .trim()
            .parse()
            .map_err(|_| PdfMantraError::page_range(format!("Invalid page number: '{}'", s.trim())))?;
        if page == 0 {
            return Err(PdfMantraError::page_range("Page numbers start at 1"));
        }
        Ok(page)
    };

    if let Some((start_str, end_str)) = part.split_once('-') {
        let start = parse_num(start_str)?;
        let end = parse_num(end_str)?;
        if start > end {
            return Err(PdfMantraError::page_range(format!(
                "Invalid page range: start ({start}) > end ({end})"
            )));
        }
        Ok(start..=end)
    } else {
        let page = parse_num(part)?;
        Ok(page..=page)
    }
}

/// ページ範囲文字列をパースしてページ番号のベクタに変換する。
///
/// 形式:
/// - 単一ページ: `"5"`
/// - 範囲: `"5-10"` (5, 6, 7, 8, 9, 10)
/// - 混合（カンマ区切り）: `"1, 3, 5-10, 15"`
///
/// 結果はソート済み・重複なし。
pub fn parse_page_range(s: &str) -> crate::error::Result<Vec<u32>> {
    let mut pages = parse_page_order(s)?;
    pages.sort();
    pages.dedup();
    Ok(pages)
}

/// ページ順序文字列をパースする。`parse_page_range` と同じ形式だが、
/// 記述順を保持し重複も残す（`"3, 1-2"` → `[3, 1, 2]`）。
pub fn parse_page_order(s: &str) -> crate::error::Result<Vec<u32>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(PdfMantraError::page_range("Page range cannot be empty"));
    }

    let mut pages = Vec::new();
    for part in trimmed.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        pages.extend(parse_range_part(part)?);
    }

    if pages.is_empty() {
        return Err(PdfMantraError::page_range("Page range resolved to empty set"));
    }
    Ok(pages)
}

fn deserialize_page_sets<'de, D>(deserializer: D) -> Result<Vec<Vec<u32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    raw.iter()
        .map(|s| parse_page_range(s).map_err(serde::de::Error::custom))
        .collect()
}

fn deserialize_page_order<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_page_order(&s).map_err(serde::de::Error::custom)
}

fn deserialize_optional_pages<'de, D>(deserializer: D) -> Result<Option<Vec<u32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    s.map(|s| parse_page_range(&s))
        .transpose()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_name_uses_file_name_only() {
        assert_eq!(
            prefixed_name("rotated", "scans/2024/report.pdf"),
            "rotated_report.pdf"
        );
    }

    #[test]
    fn test_parse_range_part_rejects_zero() {
        assert!(parse_range_part("0").is_err());
        assert!(parse_range_part("0-3").is_err());
    }

    #[test]
    fn test_compress_quality_levels_are_monotonic() {
        assert!(CompressQuality::Low.deflate_level() > CompressQuality::Medium.deflate_level());
        assert!(CompressQuality::Medium.deflate_level() > CompressQuality::High.deflate_level());
    }
}
