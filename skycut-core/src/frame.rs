//! Celestial reference frames and sky positions.
//!
//! [`SkyCoord`] is a single position tagged with its [`Frame`]; [`SkyCoords`] is the
//! array form used as fitting input. Transforms go through unit vectors:
//!
//! | From → To | Rotation |
//! |-----------|----------|
//! | ICRS ⇄ FK5 | identity (frame bias below 25 mas is ignored) |
//! | ICRS ⇄ Galactic | [`GALACTIC_TO_ICRS`](crate::constants::GALACTIC_TO_ICRS) |
//! | ICRS ⇄ Ecliptic | rotation about x by the J2000 mean obliquity |

use std::fmt;

use crate::angle::Angle;
use crate::constants::{DEG_TO_RAD, GALACTIC_TO_ICRS, J2000_OBLIQUITY_DEG, RAD_TO_DEG};
use crate::errors::{CoreError, CoreResult};
use crate::math::{lonlat_to_unit, mat_t_vec, mat_vec, unit_to_lonlat};
use crate::sphere;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Frame {
    #[default]
    Icrs,
    Fk5,
    Galactic,
    Ecliptic,
}

impl Frame {
    pub fn name(self) -> &'static str {
        match self {
            Frame::Icrs => "icrs",
            Frame::Fk5 => "fk5",
            Frame::Galactic => "galactic",
            Frame::Ecliptic => "ecliptic",
        }
    }

    pub fn is_equatorial(self) -> bool {
        matches!(self, Frame::Icrs | Frame::Fk5)
    }

    /// Parses the frame names accepted on the command line and in `RADESYS`.
    pub fn parse(name: &str) -> CoreResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "icrs" => Ok(Frame::Icrs),
            "fk5" => Ok(Frame::Fk5),
            "galactic" | "gal" => Ok(Frame::Galactic),
            "ecliptic" | "ecl" => Ok(Frame::Ecliptic),
            other => Err(CoreError::unsupported_transform(other, "icrs")),
        }
    }

    fn to_icrs(self, v: [f64; 3]) -> [f64; 3] {
        match self {
            Frame::Icrs | Frame::Fk5 => v,
            Frame::Galactic => mat_vec(&GALACTIC_TO_ICRS, v),
            Frame::Ecliptic => mat_t_vec(&ecliptic_matrix(), v),
        }
    }

    fn from_icrs(self, v: [f64; 3]) -> [f64; 3] {
        match self {
            Frame::Icrs | Frame::Fk5 => v,
            Frame::Galactic => mat_t_vec(&GALACTIC_TO_ICRS, v),
            Frame::Ecliptic => mat_vec(&ecliptic_matrix(), v),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ICRS → ecliptic rotation.
fn ecliptic_matrix() -> [[f64; 3]; 3] {
    let (s, c) = (J2000_OBLIQUITY_DEG * DEG_TO_RAD).sin_cos();
    [[1.0, 0.0, 0.0], [0.0, c, s], [0.0, -s, c]]
}

fn rotate_lonlat(lon_deg: f64, lat_deg: f64, from: Frame, to: Frame) -> (f64, f64) {
    if from == to || (from.is_equatorial() && to.is_equatorial()) {
        return (lon_deg, lat_deg);
    }
    let v = lonlat_to_unit(lon_deg * DEG_TO_RAD, lat_deg * DEG_TO_RAD);
    let (lon, lat) = unit_to_lonlat(to.from_icrs(from.to_icrs(v)));
    (lon * RAD_TO_DEG, lat * RAD_TO_DEG)
}

fn check_lonlat(lon: f64, lat: f64) -> CoreResult<()> {
    if !lon.is_finite() || !lat.is_finite() {
        return Err(CoreError::invalid_coordinate(format!(
            "non-finite position ({lon}, {lat})"
        )));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(CoreError::invalid_coordinate(format!(
            "latitude {lat} outside [-90, 90]"
        )));
    }
    Ok(())
}

/// A single sky position. Angles are stored in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkyCoord {
    lon: f64,
    lat: f64,
    frame: Frame,
}

impl SkyCoord {
    pub fn new(lon_deg: f64, lat_deg: f64, frame: Frame) -> CoreResult<Self> {
        check_lonlat(lon_deg, lat_deg)?;
        Ok(Self {
            lon: lon_deg,
            lat: lat_deg,
            frame,
        })
    }

    /// Convenience constructor for literal ICRS positions.
    ///
    /// Latitude is clamped into [-90, 90]; use [`SkyCoord::new`] to validate input.
    pub fn icrs(ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            lon: ra_deg,
            lat: dec_deg.clamp(-90.0, 90.0),
            frame: Frame::Icrs,
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

    #[inline]
    pub fn lon(&self) -> Angle {
        Angle::from_degrees(self.lon)
    }

    #[inline]
    pub fn lat(&self) -> Angle {
        Angle::from_degrees(self.lat)
    }

    #[inline]
    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn transform_to(&self, frame: Frame) -> CoreResult<Self> {
        let (lon, lat) = rotate_lonlat(self.lon, self.lat, self.frame, frame);
        Ok(Self {
            lon,
            lat,
            frame,
        })
    }

    pub fn separation(&self, other: &SkyCoord) -> CoreResult<Angle> {
        let other = other.transform_to(self.frame)?;
        Ok(sphere::angular_separation(
            self.lon(),
            self.lat(),
            other.lon(),
            other.lat(),
        ))
    }

    pub fn position_angle(&self, other: &SkyCoord) -> CoreResult<Angle> {
        let other = other.transform_to(self.frame)?;
        Ok(sphere::position_angle(
            self.lon(),
            self.lat(),
            other.lon(),
            other.lat(),
        ))
    }

    pub fn directional_offset_by(&self, position_angle: Angle, separation: Angle) -> Self {
        let (lon, lat) =
            sphere::directional_offset(self.lon(), self.lat(), position_angle, separation);
        Self {
            lon: lon.degrees(),
            lat: lat.degrees(),
            frame: self.frame,
        }
    }
}

impl fmt::Display for SkyCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7}) {}", self.lon, self.lat, self.frame)
    }
}

/// Parallel longitude/latitude arrays sharing one frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkyCoords {
    lon: Vec<f64>,
    lat: Vec<f64>,
    frame: Frame,
}

impl SkyCoords {
    pub fn new(lon_deg: Vec<f64>, lat_deg: Vec<f64>, frame: Frame) -> CoreResult<Self> {
        if lon_deg.len() != lat_deg.len() {
            return Err(CoreError::LengthMismatch {
                lon: lon_deg.len(),
                lat: lat_deg.len(),
            });
        }
        for (&lon, &lat) in lon_deg.iter().zip(&lat_deg) {
            check_lonlat(lon, lat)?;
        }
        Ok(Self {
            lon: lon_deg,
            lat: lat_deg,
            frame,
        })
    }

    pub fn from_coords(coords: &[SkyCoord]) -> CoreResult<Self> {
        let frame = coords.first().map(SkyCoord::frame).unwrap_or_default();
        let mut lon = Vec::with_capacity(coords.len());
        let mut lat = Vec::with_capacity(coords.len());
        for c in coords {
            let c = c.transform_to(frame)?;
            lon.push(c.lon);
            lat.push(c.lat);
        }
        Ok(Self { lon, lat, frame })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lon.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lon.is_empty()
    }

    #[inline]
    pub fn frame(&self) -> Frame {
        self.frame
    }

    #[inline]
    pub fn lon_deg(&self) -> &[f64] {
        &self.lon
    }

    #[inline]
    pub fn lat_deg(&self) -> &[f64] {
        &self.lat
    }

    pub fn get(&self, index: usize) -> Option<SkyCoord> {
        Some(SkyCoord {
            lon: *self.lon.get(index)?,
            lat: *self.lat.get(index)?,
            frame: self.frame,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = SkyCoord> + '_ {
        self.lon
            .iter()
            .zip(&self.lat)
            .map(move |(&lon, &lat)| SkyCoord {
                lon,
                lat,
                frame: self.frame,
            })
    }

    pub fn transform_to(&self, frame: Frame) -> CoreResult<Self> {
        let (lon, lat) = self
            .lon
            .iter()
            .zip(&self.lat)
            .map(|(&lon, &lat)| rotate_lonlat(lon, lat, self.frame, frame))
            .unzip();
        Ok(Self { lon, lat, frame })
    }
}
