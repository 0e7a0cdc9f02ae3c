//! Typed angles.
//!
//! [`Angle`] stores radians and converts on the way in and out. Cutout sizes, sky
//! positions and position angles all travel through this type so a degree value can
//! never be handed to a function expecting radians.
//!
//! ```
//! use skycut_core::Angle;
//!
//! let a = Angle::from_degrees(90.0);
//! assert!((a.radians() - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
//! assert!((Angle::from_arcseconds(36.0).degrees() - 0.01).abs() < 1e-15);
//! ```

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::constants::{ARCSEC_PER_DEG, TWOPI};

#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Angle {
    rad: f64,
}

impl Angle {
    pub const ZERO: Self = Self { rad: 0.0 };

    #[inline]
    pub const fn from_radians(rad: f64) -> Self {
        Self { rad }
    }

    #[inline]
    pub fn from_degrees(deg: f64) -> Self {
        Self {
            rad: deg.to_radians(),
        }
    }

    #[inline]
    pub fn from_arcminutes(arcmin: f64) -> Self {
        Self::from_degrees(arcmin / 60.0)
    }

    #[inline]
    pub fn from_arcseconds(arcsec: f64) -> Self {
        Self::from_degrees(arcsec / ARCSEC_PER_DEG)
    }

    #[inline]
    pub fn radians(self) -> f64 {
        self.rad
    }

    #[inline]
    pub fn degrees(self) -> f64 {
        self.rad.to_degrees()
    }

    #[inline]
    pub fn arcseconds(self) -> f64 {
        self.degrees() * ARCSEC_PER_DEG
    }

    #[inline]
    pub fn sin(self) -> f64 {
        self.rad.sin()
    }

    #[inline]
    pub fn cos(self) -> f64 {
        self.rad.cos()
    }

    #[inline]
    pub fn sin_cos(self) -> (f64, f64) {
        self.rad.sin_cos()
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self::from_radians(self.rad.abs())
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.rad.is_finite()
    }

    /// Wraps into [0, 2π).
    pub fn wrapped(self) -> Self {
        let mut r = self.rad % TWOPI;
        if r < 0.0 {
            r += TWOPI;
        }
        // -1e-17 % 2π + 2π rounds to exactly 2π
        if r >= TWOPI {
            r = 0.0;
        }
        Self::from_radians(r)
    }
}

impl Add for Angle {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_radians(self.rad + rhs.rad)
    }
}

impl Sub for Angle {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_radians(self.rad - rhs.rad)
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_radians(-self.rad)
    }
}

impl Mul<f64> for Angle {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::from_radians(self.rad * rhs)
    }
}

impl Div<f64> for Angle {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::from_radians(self.rad / rhs)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Angle {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(self.degrees())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Angle {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let deg = <f64 as serde::Deserialize>::deserialize(d)?;
        Ok(Angle::from_degrees(deg))
    }
}
