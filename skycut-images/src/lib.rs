//! A small FITS subset: 2-D image HDUs read into `ndarray` arrays and written back as
//! `BITPIX = -64`, plus the bridge between FITS headers and [`skycut_wcs::Wcs`].

pub mod errors;
pub mod header;
pub mod image;
pub mod reader;
pub mod wcs;
pub mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use errors::{FitsError, Result};
pub use header::{Header, HeaderCard, Keyword, KeywordValue};
pub use image::{Bitpix, ImageHdu};
pub use reader::{read_fits, read_image, FitsReader};
pub use wcs::{is_wcs_keyword, set_wcs, wcs_from_header, wcs_keywords};
pub use writer::{write_fits, FitsWriter};
