//! FITS World Coordinate System algebra for two-dimensional celestial images.
//!
//! A [`Wcs`] maps pixels to the sky in four steps:
//!
//! ```text
//! pixel ─SIP─▶ distorted offset ─CD─▶ intermediate (x, y) ─projection─▶ native (φ, θ) ─rotation─▶ (lon, lat)
//! ```
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`linear`] | CRPIX and the CD matrix |
//! | [`spherical`] | The 26 implemented projections and the native ⇄ celestial rotation |
//! | [`distortion`] | SIP polynomials |
//! | [`builder`] | [`WcsBuilder`] and header parsing |
//! | [`transform`] | [`PixelTransform`] / [`CutoutTransform`], the 0-based capability traits |
//! | [`fit`] | Fitting a WCS to matched pixel/sky positions |
//!
//! # Example
//!
//! ```
//! use skycut_wcs::{KeywordMap, WcsBuilder};
//!
//! let mut header = KeywordMap::new();
//! header
//!     .set_string("CTYPE1", "RA---TAN")
//!     .set_string("CTYPE2", "DEC--TAN")
//!     .set_float("CRPIX1", 512.0)
//!     .set_float("CRPIX2", 512.0)
//!     .set_float("CRVAL1", 180.0)
//!     .set_float("CRVAL2", 45.0)
//!     .set_float("CDELT1", -0.001)
//!     .set_float("CDELT2", 0.001);
//!
//! let wcs = WcsBuilder::from_header(&header).unwrap().build().unwrap();
//! let (ra, dec) = wcs.pix2world(512.0, 512.0).unwrap();
//! assert!((ra - 180.0).abs() < 1e-12 && (dec - 45.0).abs() < 1e-12);
//! ```

pub mod builder;
pub mod coordinate;
pub mod distortion;
pub mod error;
pub mod fit;
pub mod header;
pub mod linear;
pub mod spherical;
pub mod transform;
mod wcs;

pub use builder::WcsBuilder;
pub use coordinate::{CelestialCoord, IntermediateCoord, NativeCoord, PixelCoord};
pub use distortion::{SipCoefficients, SipPolynomial};
pub use error::{WcsError, WcsResult};
pub use fit::{fit_wcs_from_points, ProjectionPoint, ProjectionSpec, WcsFitter};
pub use header::{KeywordMap, KeywordProvider};
pub use linear::LinearTransform;
pub use spherical::{Projection, ProjectionCode, ProjectionParams, SphericalRotation, PROJECTION_CODES};
pub use transform::{CutoutTransform, PixelTransform};
pub use wcs::{CoordType, Wcs, WcsKeyword, WcsKeywordValue};
