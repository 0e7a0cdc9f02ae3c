//! Rectangular cutouts of FITS images around a sky position.
//!
//! [`cutout_limits`] turns a sky centre and a [`CutoutSize`] into a 0-based pixel box
//! that may extend past the image edges; [`cutout_wcs`] re-anchors the image WCS on
//! that box. [`fits_cut`] runs both over a list of files and writes the results.
//!
//! ```
//! use skycut::{cutout_limits, CutoutSize};
//! use skycut_core::SkyCoord;
//! use skycut_wcs::WcsBuilder;
//!
//! let wcs = WcsBuilder::new()
//!     .crpix(10.0, 15.0)
//!     .crval(100.0, 20.0)
//!     .cd_matrix([[1.0, 0.0], [0.0, 1.0]])
//!     .proj_code("TAN")
//!     .build()
//!     .unwrap();
//! let limits = cutout_limits(&wcs, &SkyCoord::icrs(100.0, 20.0), &CutoutSize::pixels(10.0)).unwrap();
//! assert_eq!(limits.as_array(), [[4, 14], [9, 19]]);
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod size;

pub use batch::{cut_file, cut_hdu, fits_cut, Cutout, CutoutOutput};
pub use config::{Config, CutoutOptions};
pub use error::{CutoutError, Result};
pub use extract::{extract_cutout, extract_cutout_with_fill, has_valid_data};
pub use geometry::{cutout_limits, cutout_wcs, PixelLimits};
pub use size::{CutoutSize, SizeValue};
