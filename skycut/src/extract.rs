use crate::geometry::PixelLimits;
use ndarray::{s, Array2};

/// Copies the `limits` box out of `image`, filling pixels beyond the edges with NaN.
///
/// `image` is indexed `[[y, x]]`; so is the result, with shape
/// `(limits.height(), limits.width())`.
pub fn extract_cutout(image: &Array2<f64>, limits: &PixelLimits) -> Array2<f64> {
    extract_cutout_with_fill(image, limits, f64::NAN)
}

pub fn extract_cutout_with_fill(image: &Array2<f64>, limits: &PixelLimits, fill: f64) -> Array2<f64> {
    let mut cutout = Array2::from_elem((limits.height(), limits.width()), fill);
    let (rows, cols) = image.dim();

    let Some((src_x, dst_x)) = overlap(limits.x, cols) else {
        return cutout;
    };
    let Some((src_y, dst_y)) = overlap(limits.y, rows) else {
        return cutout;
    };

    cutout
        .slice_mut(s![dst_y.0..dst_y.1, dst_x.0..dst_x.1])
        .assign(&image.slice(s![src_y.0..src_y.1, src_x.0..src_x.1]));
    cutout
}

type Span = (usize, usize);

/// Source and destination index ranges shared by `[lo, hi)` and `[0, len)`.
fn overlap([lo, hi]: [i64; 2], len: usize) -> Option<(Span, Span)> {
    let start = lo.max(0);
    let end = hi.min(len as i64);
    if start >= end {
        return None;
    }
    let src = (start as usize, end as usize);
    let dst = ((start - lo) as usize, (end - lo) as usize);
    Some((src, dst))
}

/// True when at least one pixel is finite and non-zero.
pub fn has_valid_data(data: &Array2<f64>) -> bool {
    data.iter().any(|&v| v.is_finite() && v != 0.0)
}
