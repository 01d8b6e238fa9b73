use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfMantraError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("Page range error: {0}")]
    PageRangeError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("History error: {0}")]
    HistoryError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`PdfMantraError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl PdfMantraError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a PDF read error.
    pdf_read => PdfReadError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
    /// Create a page range error.
    page_range => PageRangeError,
    /// Create an image error.
    image => ImageError,
    /// Create an invalid input error (bad password, empty watermark text, ...).
    invalid_input => InvalidInput,
    /// Create a history error.
    history => HistoryError,
}

impl From<lopdf::Error> for PdfMantraError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<serde_json::Error> for PdfMantraError {
    fn from(e: serde_json::Error) -> Self {
        Self::HistoryError(e.to_string())
    }
}

impl From<serde_yml::Error> for PdfMantraError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<image::ImageError> for PdfMantraError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PdfMantraError>;
