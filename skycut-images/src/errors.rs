#[derive(Debug, thiserror::Error)]
pub enum FitsError {
    #[error("Invalid FITS format: {0}")]
    InvalidFormat(String),

    #[error("Keyword {keyword} not found")]
    KeywordNotFound { keyword: String },

    #[error("Unsupported BITPIX value: {0}")]
    UnsupportedBitpix(i64),

    #[error("Header parsing error: {0}")]
    HeaderParse(String),

    #[error("Invalid keyword value: {keyword} = {value}")]
    InvalidKeywordValue { keyword: String, value: String },

    #[error("No image HDU with data in {0}")]
    NoImageData(String),

    #[error("EOF reached unexpectedly")]
    UnexpectedEof,

    #[error("WCS error: {0}")]
    Wcs(#[from] skycut_wcs::WcsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FitsError {
    pub fn keyword_not_found(keyword: impl Into<String>) -> Self {
        Self::KeywordNotFound {
            keyword: keyword.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FitsError>;
