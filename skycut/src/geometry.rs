//! Pixel bounding boxes for sky-centred cutouts and the WCS that goes with them.
//!
//! Limits are 0-based and half-open, `[min, max)` per axis, and are never clipped to
//! the image: a box hanging off an edge keeps its negative or oversized bounds so the
//! caller can pad with a fill value.

use crate::error::Result;
use crate::size::CutoutSize;
use skycut_core::SkyCoord;
use skycut_wcs::CutoutTransform;
use std::fmt;
use tracing::debug;

/// Slack for deciding that a box edge sits exactly halfway between two pixels.
const TIE_TOLERANCE: f64 = 1e-9;

/// `[[xmin, xmax], [ymin, ymax]]`, 0-based with exclusive upper bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLimits {
    pub x: [i64; 2],
    pub y: [i64; 2],
}

impl PixelLimits {
    pub fn new(x: [i64; 2], y: [i64; 2]) -> Self {
        Self { x, y }
    }

    pub fn as_array(&self) -> [[i64; 2]; 2] {
        [self.x, self.y]
    }

    pub fn min(&self) -> [i64; 2] {
        [self.x[0], self.y[0]]
    }

    pub fn width(&self) -> usize {
        (self.x[1] - self.x[0]).max(0) as usize
    }

    pub fn height(&self) -> usize {
        (self.y[1] - self.y[0]).max(0) as usize
    }

    /// True when the box lies entirely outside a `width × height` image.
    pub fn is_outside(&self, width: usize, height: usize) -> bool {
        self.x[1] <= 0 || self.y[1] <= 0 || self.x[0] >= width as i64 || self.y[0] >= height as i64
    }
}

impl fmt::Display for PixelLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[[{}, {}], [{}, {}]]",
            self.x[0], self.x[1], self.y[0], self.y[1]
        )
    }
}

/// Pixel limits of a cutout of `size` centred on `center`.
///
/// Each axis spans exactly the requested number of pixels. The lower bound is
/// `center - size / 2` rounded to the nearest pixel, with exact halves rounded down so
/// that repeated requests always land on the same box.
pub fn cutout_limits<W: CutoutTransform>(
    wcs: &W,
    center: &SkyCoord,
    size: &CutoutSize,
) -> Result<PixelLimits> {
    let center = match wcs.world_frame() {
        Some(frame) => center.transform_to(frame)?,
        None => *center,
    };
    let (cx, cy) = wcs.world_to_pixel(center.lon_deg(), center.lat_deg())?;
    let [nx, ny] = size.to_pixels(wcs.pixel_scales())?;

    let limits = PixelLimits::new(axis_limits(cx, nx), axis_limits(cy, ny));
    debug!(center_x = cx, center_y = cy, %limits, "cutout limits");
    Ok(limits)
}

fn axis_limits(center: f64, size: i64) -> [i64; 2] {
    let lower = (center - size as f64 / 2.0 - 0.5 - TIE_TOLERANCE).ceil() as i64;
    [lower, lower + size]
}

/// The source WCS re-anchored so that pixel `limits.min()` becomes pixel 0.
pub fn cutout_wcs<W: CutoutTransform>(wcs: &W, limits: &PixelLimits) -> W {
    let [x, y] = limits.min();
    wcs.shifted([x as f64, y as f64])
}
