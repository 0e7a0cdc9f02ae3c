use thiserror::Error;

pub type Result<T> = std::result::Result<T, CutoutError>;

#[derive(Debug, Error)]
pub enum CutoutError {
    #[error("Invalid cutout size: {message}")]
    InvalidSize { message: String },

    #[error("Cutout contains no valid data for any of the {images} input image(s)")]
    NoData { images: usize },

    #[error("No input images given")]
    NoInputs,

    #[error("FITS error in {path}: {source}")]
    Fits {
        path: String,
        #[source]
        source: skycut_images::FitsError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WCS error: {0}")]
    Wcs(#[from] skycut_wcs::WcsError),

    #[error("Coordinate error: {0}")]
    Core(#[from] skycut_core::CoreError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CutoutError {
    pub fn invalid_size(message: impl Into<String>) -> Self {
        Self::InvalidSize {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn fits(path: impl AsRef<std::path::Path>, source: skycut_images::FitsError) -> Self {
        Self::Fits {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
