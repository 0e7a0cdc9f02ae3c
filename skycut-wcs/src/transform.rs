//! Pixel ⇄ world capability shared by the cutout engine and the fitter.
//!
//! Both traits use 0-based pixel coordinates, so the pixel `(0, 0)` is the centre of
//! the first pixel. [`Wcs`] is the stock implementation; anything else that can map
//! pixels to the sky (a test double, a lookup-table WCS) can stand in for it.

use skycut_core::Frame;

use crate::error::WcsResult;
use crate::wcs::Wcs;

pub trait PixelTransform {
    /// World coordinates in degrees for a 0-based pixel position.
    fn pixel_to_world(&self, x: f64, y: f64) -> WcsResult<(f64, f64)>;

    /// 0-based pixel position for world coordinates in degrees.
    fn world_to_pixel(&self, lon: f64, lat: f64) -> WcsResult<(f64, f64)>;

    /// Sky frame of the world axes, `None` when the axes are not a known frame.
    fn world_frame(&self) -> Option<Frame> {
        None
    }
}

/// A transform that can be re-anchored after cropping.
pub trait CutoutTransform: PixelTransform + Clone {
    /// Degrees per pixel along each axis.
    fn pixel_scales(&self) -> [f64; 2];

    /// Reference pixel, FITS 1-based.
    fn reference_pixel(&self) -> [f64; 2];

    /// Same transform with the reference pixel moved by `-shift` pixels per axis.
    fn shifted(&self, shift: [f64; 2]) -> Self;
}

impl PixelTransform for Wcs {
    fn pixel_to_world(&self, x: f64, y: f64) -> WcsResult<(f64, f64)> {
        self.pix2world(x + 1.0, y + 1.0)
    }

    fn world_to_pixel(&self, lon: f64, lat: f64) -> WcsResult<(f64, f64)> {
        let (x, y) = self.world2pix(lon, lat)?;
        Ok((x - 1.0, y - 1.0))
    }

    fn world_frame(&self) -> Option<Frame> {
        self.frame()
    }
}

impl CutoutTransform for Wcs {
    fn pixel_scales(&self) -> [f64; 2] {
        Wcs::pixel_scales(self)
    }

    fn reference_pixel(&self) -> [f64; 2] {
        self.crpix()
    }

    fn shifted(&self, shift: [f64; 2]) -> Self {
        let [x, y] = self.crpix();
        self.with_crpix([x - shift[0], y - shift[1]])
    }
}
