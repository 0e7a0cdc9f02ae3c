//! Angular building blocks shared by the skycut crates.
//!
//! `skycut-core` holds the small amount of spherical astronomy that both the WCS
//! algebra and the cutout engine need: a typed [`Angle`], great-circle geometry on the
//! unit sphere, and celestial reference frames with conversions between them.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`angle`] | [`Angle`] type, degree/radian conversion, wrapping |
//! | [`sphere`] | Angular separation, position angle, directional offset |
//! | [`frame`] | [`Frame`], [`SkyCoord`], [`SkyCoords`] and frame transforms |
//! | [`constants`] | Unit conversions and frame rotation constants |
//! | [`utils`] | Longitude normalisation and branch-cut residual wrapping |
//! | [`errors`] | [`CoreError`] and [`CoreResult`] |
//!
//! # Example
//!
//! ```
//! use skycut_core::{Frame, SkyCoord};
//!
//! let m31 = SkyCoord::icrs(10.684708, 41.268750);
//! let gal = m31.transform_to(Frame::Galactic).unwrap();
//! assert!((gal.lon_deg() - 121.1744).abs() < 1e-3);
//! ```

pub mod angle;
pub mod constants;
pub mod errors;
pub mod frame;
pub mod math;
pub mod sphere;
pub mod utils;

pub use angle::Angle;
pub use errors::{CoreError, CoreResult};
pub use frame::{Frame, SkyCoord, SkyCoords};

pub mod test_helpers;
