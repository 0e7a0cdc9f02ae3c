//! Coordinate types for each stage of the WCS pipeline.
//!
//! ```text
//! PixelCoord ─(SIP, CD)─► IntermediateCoord ─(deproject)─► NativeCoord ─(rotate)─► CelestialCoord
//! ```
//!
//! Pixel coordinates follow the FITS convention: the centre of the first pixel is
//! (1, 1). All angular components are in degrees.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCoord {
    x: f64,
    y: f64,
}

impl PixelCoord {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// From 0-based array coordinates (first pixel centre at 0, 0).
    #[inline]
    pub fn from_zero_based(x: f64, y: f64) -> Self {
        Self {
            x: x + 1.0,
            y: y + 1.0,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn to_zero_based(&self) -> (f64, f64) {
        (self.x - 1.0, self.y - 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntermediateCoord {
    x: f64,
    y: f64,
}

impl IntermediateCoord {
    #[inline]
    pub fn new(x_deg: f64, y_deg: f64) -> Self {
        Self { x: x_deg, y: y_deg }
    }

    #[inline]
    pub fn x_deg(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y_deg(&self) -> f64 {
        self.y
    }

    /// Distance from the projection origin, in degrees.
    #[inline]
    pub fn radius_deg(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Native spherical coordinates (φ, θ) of the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeCoord {
    phi: f64,
    theta: f64,
}

impl NativeCoord {
    #[inline]
    pub fn new(phi_deg: f64, theta_deg: f64) -> Self {
        Self {
            phi: phi_deg,
            theta: theta_deg,
        }
    }

    #[inline]
    pub fn from_radians(phi: f64, theta: f64) -> Self {
        Self::new(phi.to_degrees(), theta.to_degrees())
    }

    #[inline]
    pub fn phi_deg(&self) -> f64 {
        self.phi
    }

    #[inline]
    pub fn theta_deg(&self) -> f64 {
        self.theta
    }

    #[inline]
    pub fn phi_rad(&self) -> f64 {
        self.phi.to_radians()
    }

    #[inline]
    pub fn theta_rad(&self) -> f64 {
        self.theta.to_radians()
    }
}

/// Celestial longitude and latitude in the WCS frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CelestialCoord {
    lon: f64,
    lat: f64,
}

impl CelestialCoord {
    #[inline]
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg,
            lat: lat_deg,
        }
    }

    #[inline]
    pub fn lon_deg(&self) -> f64 {
        self.lon
    }

    #[inline]
    pub fn lat_deg(&self) -> f64 {
        self.lat
    }
}
