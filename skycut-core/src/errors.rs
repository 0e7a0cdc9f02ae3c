//! Error type for angle and frame operations.
//!
//! Most functions in this crate cannot fail. The exceptions are frame conversions
//! between systems that have no defined transform and coordinates with non-finite or
//! out-of-range components, which are reported through [`CoreError`].

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate { message: String },

    #[error("No transform from {from} to {to}")]
    UnsupportedTransform { from: String, to: String },

    #[error("Coordinate arrays differ in length: {lon} longitudes, {lat} latitudes")]
    LengthMismatch { lon: usize, lat: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn invalid_coordinate(message: impl Into<String>) -> Self {
        Self::InvalidCoordinate {
            message: message.into(),
        }
    }

    pub fn unsupported_transform(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::UnsupportedTransform {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_frames() {
        let err = CoreError::unsupported_transform("galactic", "altaz");
        let msg = err.to_string();
        assert!(msg.contains("galactic"));
        assert!(msg.contains("altaz"));
    }

    #[test]
    fn test_display_includes_lengths() {
        let err = CoreError::LengthMismatch { lon: 3, lat: 2 };
        assert!(err.to_string().contains("3 longitudes"));
    }
}
