use crate::error::{CutoutError, Result};
use skycut_core::Angle;
use std::fmt;

/// One axis of a requested cutout size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeValue {
    Pixels(f64),
    Angle(Angle),
}

impl SizeValue {
    pub fn degrees(deg: f64) -> Self {
        Self::Angle(Angle::from_degrees(deg))
    }

    pub fn arcseconds(arcsec: f64) -> Self {
        Self::Angle(Angle::from_arcseconds(arcsec))
    }

    /// Whole pixels along an axis with `scale` degrees per pixel, at least one.
    ///
    /// Fractional counts round half to even.
    pub fn to_pixels(self, scale: f64) -> Result<i64> {
        let pixels = match self {
            Self::Pixels(n) => {
                check_positive(n, "pixel size")?;
                n
            }
            Self::Angle(angle) => {
                let deg = angle.degrees();
                check_positive(deg, "angular size")?;
                check_positive(scale, "plate scale")?;
                deg / scale
            }
        };
        Ok((pixels.round_ties_even() as i64).max(1))
    }
}

fn check_positive(value: f64, what: &str) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CutoutError::invalid_size(format!(
            "{what} must be finite and positive, got {value}"
        )))
    }
}

impl fmt::Display for SizeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pixels(n) => write!(f, "{n} px"),
            Self::Angle(a) => write!(f, "{} deg", a.degrees()),
        }
    }
}

impl From<f64> for SizeValue {
    fn from(pixels: f64) -> Self {
        Self::Pixels(pixels)
    }
}

impl From<Angle> for SizeValue {
    fn from(angle: Angle) -> Self {
        Self::Angle(angle)
    }
}

/// Requested cutout size: one value for both axes, or `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutoutSize {
    Square(SizeValue),
    PerAxis([SizeValue; 2]),
}

impl CutoutSize {
    pub fn pixels(n: f64) -> Self {
        Self::Square(SizeValue::Pixels(n))
    }

    pub fn degrees(deg: f64) -> Self {
        Self::Square(SizeValue::degrees(deg))
    }

    pub fn per_axis(x: impl Into<SizeValue>, y: impl Into<SizeValue>) -> Self {
        Self::PerAxis([x.into(), y.into()])
    }

    pub fn axes(&self) -> [SizeValue; 2] {
        match *self {
            Self::Square(v) => [v, v],
            Self::PerAxis(axes) => axes,
        }
    }

    /// Integer pixel extent per axis given the plate scale of each axis in degrees.
    pub fn to_pixels(&self, scales: [f64; 2]) -> Result<[i64; 2]> {
        let [x, y] = self.axes();
        Ok([x.to_pixels(scales[0])?, y.to_pixels(scales[1])?])
    }
}

impl From<SizeValue> for CutoutSize {
    fn from(value: SizeValue) -> Self {
        Self::Square(value)
    }
}

impl From<f64> for CutoutSize {
    fn from(pixels: f64) -> Self {
        Self::pixels(pixels)
    }
}

impl From<[f64; 2]> for CutoutSize {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::per_axis(x, y)
    }
}

impl From<Angle> for CutoutSize {
    fn from(angle: Angle) -> Self {
        Self::Square(SizeValue::Angle(angle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_is_replicated() {
        assert_eq!(CutoutSize::pixels(10.0).to_pixels([1.0, 1.0]).unwrap(), [10, 10]);
    }

    #[test]
    fn test_pixel_sizes_round_and_clamp() {
        let size = CutoutSize::from([10.4, 0.2]);
        assert_eq!(size.to_pixels([1.0, 1.0]).unwrap(), [10, 1]);
        assert_eq!(CutoutSize::pixels(2.5).to_pixels([1.0, 1.0]).unwrap(), [2, 2]);
    }

    #[test]
    fn test_angular_sizes_use_the_axis_scale() {
        let size = CutoutSize::per_axis(SizeValue::degrees(4.0), SizeValue::degrees(5.0));
        assert_eq!(size.to_pixels([1.0, 1.0]).unwrap(), [4, 5]);
        assert_eq!(CutoutSize::degrees(0.1).to_pixels([1.0, 1.0]).unwrap(), [1, 1]);
        assert_eq!(
            CutoutSize::from(Angle::from_arcseconds(36.0))
                .to_pixels([1e-3, 2e-3])
                .unwrap(),
            [10, 5]
        );
    }

    #[test]
    fn test_mixed_units() {
        let size = CutoutSize::per_axis(20.0, SizeValue::degrees(0.01));
        assert_eq!(size.to_pixels([1e-3, 1e-3]).unwrap(), [20, 10]);
    }

    #[test]
    fn test_rejects_bad_sizes() {
        for size in [
            CutoutSize::pixels(0.0),
            CutoutSize::pixels(-3.0),
            CutoutSize::pixels(f64::NAN),
            CutoutSize::degrees(f64::INFINITY),
        ] {
            assert!(matches!(
                size.to_pixels([1.0, 1.0]),
                Err(CutoutError::InvalidSize { .. })
            ));
        }
        assert!(CutoutSize::degrees(1.0).to_pixels([0.0, 1.0]).is_err());
    }
}
