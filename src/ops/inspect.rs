// 情報表示・テキスト抽出・画像抽出（読み取り専用の操作）

use std::fmt;
use std::path::{Path, PathBuf};

use lopdf::Document;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::output::{ProcessResult, format_size};
use crate::pdf::image::{ExtractedImage, write_image_stream};
use crate::pdf::metadata::DocumentMetadata;
use crate::pdf::reader::PdfReader;
use crate::pdf::writer;

/// 1ページ分の寸法と回転。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    pub number: u32,
    pub width: f64,
    pub height: f64,
    pub rotation: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub file_name: String,
    pub file_size: u64,
    pub file_size_formatted: String,
    pub encrypted: bool,
    pub metadata: DocumentMetadata,
    pub pages: Vec<PageInfo>,
}

impl fmt::Display for DocumentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File:      {}", self.file_name)?;
        writeln!(f, "Size:      {}", self.file_size_formatted)?;
        writeln!(f, "Pages:     {}", self.metadata.page_count)?;
        if self.encrypted {
            writeln!(f, "Encrypted: yes")?;
        }
        let fields = [
            ("Title", &self.metadata.title),
            ("Author", &self.metadata.author),
            ("Subject", &self.metadata.subject),
            ("Keywords", &self.metadata.keywords),
            ("Creator", &self.metadata.creator),
            ("Producer", &self.metadata.producer),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                writeln!(f, "{:<10} {value}", format!("{label}:"))?;
            }
        }
        for page in &self.pages {
            write!(
                f,
                "  page {:>3}: {:.2} x {:.2} pt",
                page.number, page.width, page.height
            )?;
            if page.rotation != 0 {
                write!(f, ", rotated {}", page.rotation)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// ファイルサイズ・メタデータ・ページ寸法を読み取る。
pub fn info(input: &Path) -> crate::error::Result<DocumentInfo> {
    let file_size = std::fs::metadata(input)?.len();
    let reader = PdfReader::open(input)?;

    let mut pages = Vec::with_capacity(reader.page_count() as usize);
    for number in 1..=reader.page_count() {
        let (width, height) = reader.page_dimensions(number)?;
        pages.push(PageInfo {
            number,
            width,
            height,
            rotation: reader.page_rotation(number)?,
        });
    }

    Ok(DocumentInfo {
        file_name: super::display_name(input),
        file_size,
        file_size_formatted: format_size(file_size),
        encrypted: reader.document().is_encrypted(),
        metadata: reader.metadata(),
        pages,
    })
}

/// テキスト抽出の結果。
#[derive(Debug, Clone)]
pub struct TextExtraction {
    pub result: ProcessResult,
    pub page_count: u32,
    /// テキストレイヤーを持つページ数
    pub pages_with_text: u32,
}

/// ヘッダー（ファイル名・ページ数・メタデータ）と各ページのテキストを連結する。
///
/// テキストレイヤーのないページ（スキャン画像など）は空になる。OCRは行わない。
pub fn document_text(doc: &Document, file_name: &str) -> (String, u32) {
    let meta = crate::pdf::metadata::read_metadata(doc);
    let mut out = format!("PDF: {file_name}\nPages: {}\n", meta.page_count);
    if let Some(title) = &meta.title {
        out.push_str(&format!("Title: {title}\n"));
    }
    if let Some(author) = &meta.author {
        out.push_str(&format!("Author: {author}\n"));
    }

    let mut pages_with_text = 0;
    for number in 1..=meta.page_count {
        out.push_str(&format!("\n--- Page {number} ---\n"));
        match doc.extract_text(&[number]) {
            Ok(text) if !text.trim().is_empty() => {
                pages_with_text += 1;
                out.push_str(text.trim_end());
                out.push('\n');
            }
            Ok(_) => out.push_str("[no text layer]\n"),
            Err(e) => {
                warn!(page = number, error = %e, "text extraction failed");
                out.push_str("[no text layer]\n");
            }
        }
    }
    (out, pages_with_text)
}

pub fn extract_text(input: &Path, output: &Path) -> crate::error::Result<TextExtraction> {
    let doc = super::load_document(input)?;
    let (text, pages_with_text) = document_text(&doc, &super::display_name(input));
    let page_count = doc.get_pages().len() as u32;

    writer::write_output(output, text.as_bytes())?;
    if pages_with_text == 0 {
        warn!(input = %input.display(), "no text layer found; scanned pages need OCR");
    }
    info!(pages = page_count, pages_with_text, "extracted text");

    Ok(TextExtraction {
        result: ProcessResult::new(output, text.len() as u64),
        page_count,
        pages_with_text,
    })
}

/// 画像抽出（解析）の結果。
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageAnalysis {
    pub page_count: u32,
    /// ページごとの画像XObject数（index 0 = 1ページ目）
    pub images_per_page: Vec<usize>,
    pub written: Vec<PathBuf>,
    /// 書き出せなかったエンコーディング
    pub skipped: Vec<String>,
}

impl ImageAnalysis {
    pub fn total_images(&self) -> usize {
        self.images_per_page.iter().sum()
    }
}

/// 各ページの画像XObjectを数える。`output_dir` があれば画像ファイルとして書き出す。
///
/// 書き出しファイル名は `page<N>_<XObject名>.<拡張子>`。
pub fn extract_images(
    input: &Path,
    output_dir: Option<&Path>,
) -> crate::error::Result<ImageAnalysis> {
    let reader = PdfReader::open(input)?;
    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut analysis = ImageAnalysis {
        page_count: reader.page_count(),
        ..ImageAnalysis::default()
    };

    for number in 1..=reader.page_count() {
        let streams = reader.page_image_streams(number)?;
        analysis.images_per_page.push(streams.len());

        let Some(dir) = output_dir else {
            continue;
        };
        let mut names: Vec<_> = streams.keys().cloned().collect();
        names.sort();
        for name in names {
            let stem = format!("page{number}_{}", sanitize_stem(&name));
            match write_image_stream(&streams[&name], dir, &stem) {
                Ok(ExtractedImage::Written(path)) => {
                    debug!(path = %path.display(), "wrote image");
                    analysis.written.push(path);
                }
                Ok(ExtractedImage::Skipped(encoding)) => {
                    debug!(page = number, name = %name, %encoding, "skipped image");
                    analysis.skipped.push(encoding);
                }
                // 壊れた画像1つでジョブ全体を失敗させない
                Err(e) => {
                    warn!(page = number, name = %name, error = %e, "could not extract image");
                    analysis.skipped.push(format!("unreadable ({e})"));
                }
            }
        }
    }

    info!(
        pages = analysis.page_count,
        images = analysis.total_images(),
        written = analysis.written.len(),
        "analyzed images"
    );
    Ok(analysis)
}

fn sanitize_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
