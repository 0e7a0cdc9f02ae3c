//! Spherical projections and the native ⇄ celestial rotation.
//!
//! A [`Projection`] maps native spherical coordinates (φ, θ) onto the plane of
//! intermediate world coordinates and back. Projections are grouped by family, one
//! module each, following the FITS WCS Paper II classification:
//!
//! | Family | Codes | Native reference (φ₀, θ₀) |
//! |--------|-------|---------------------------|
//! | zenithal | AZP SZP TAN STG SIN ARC ZEA AIR | (0, 90) |
//! | cylindrical | CYP CEA CAR MER | (0, 0) |
//! | pseudo-cylindrical | SFL PAR MOL AIT | (0, 0) |
//! | conic | COP COE COD COO | (0, θₐ) |
//! | polyconic | BON PCO | (0, 0) |
//! | quad-cube | TSC CSC QSC | (0, 0) |
//! | HEALPix | HPX | (0, 0) |
//!
//! `XPH` is recognised by [`ProjectionCode`] but has no implementation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use skycut_core::utils::normalize_longitude;

use crate::coordinate::{IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

mod conic;
mod cylindrical;
mod healpix;
mod polyconic;
mod pseudocylindrical;
mod quadcube;
mod rotation;
mod zenithal;

pub use rotation::SphericalRotation;

/// The three-letter projection codes of the FITS WCS standard, in canonical order.
pub const PROJECTION_CODES: [&str; 27] = [
    "AZP", "SZP", "TAN", "STG", "SIN", "ARC", "ZEA", "AIR", "CYP", "CEA", "CAR", "MER", "SFL",
    "PAR", "MOL", "AIT", "COP", "COE", "COD", "COO", "BON", "PCO", "TSC", "CSC", "QSC", "HPX",
    "XPH",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionCode {
    Azp,
    Szp,
    Tan,
    Stg,
    Sin,
    Arc,
    Zea,
    Air,
    Cyp,
    Cea,
    Car,
    Mer,
    Sfl,
    Par,
    Mol,
    Ait,
    Cop,
    Coe,
    Cod,
    Coo,
    Bon,
    Pco,
    Tsc,
    Csc,
    Qsc,
    Hpx,
    Xph,
}

impl ProjectionCode {
    pub const ALL: [ProjectionCode; 27] = [
        Self::Azp,
        Self::Szp,
        Self::Tan,
        Self::Stg,
        Self::Sin,
        Self::Arc,
        Self::Zea,
        Self::Air,
        Self::Cyp,
        Self::Cea,
        Self::Car,
        Self::Mer,
        Self::Sfl,
        Self::Par,
        Self::Mol,
        Self::Ait,
        Self::Cop,
        Self::Coe,
        Self::Cod,
        Self::Coo,
        Self::Bon,
        Self::Pco,
        Self::Tsc,
        Self::Csc,
        Self::Qsc,
        Self::Hpx,
        Self::Xph,
    ];

    pub fn as_str(self) -> &'static str {
        PROJECTION_CODES[self as usize]
    }

    pub fn is_zenithal(self) -> bool {
        matches!(
            self,
            Self::Azp
                | Self::Szp
                | Self::Tan
                | Self::Stg
                | Self::Sin
                | Self::Arc
                | Self::Zea
                | Self::Air
        )
    }

    pub fn is_conic(self) -> bool {
        matches!(self, Self::Cop | Self::Coe | Self::Cod | Self::Coo)
    }
}

impl FromStr for ProjectionCode {
    type Err = WcsError;

    fn from_str(s: &str) -> WcsResult<Self> {
        let upper = s.trim().to_ascii_uppercase();
        PROJECTION_CODES
            .iter()
            .position(|&c| c == upper)
            .map(|i| Self::ALL[i])
            .ok_or_else(|| WcsError::unsupported_projection(s.trim()))
    }
}

impl fmt::Display for ProjectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `PVi_m` projection parameters attached to the latitude axis, keyed by `m`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionParams {
    values: BTreeMap<u32, f64>,
}

impl ProjectionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, m: u32, value: f64) -> &mut Self {
        self.values.insert(m, value);
        self
    }

    pub fn get(&self, m: u32) -> Option<f64> {
        self.values.get(&m).copied()
    }

    pub fn get_or(&self, m: u32, default: f64) -> f64 {
        self.get(m).unwrap_or(default)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.values.iter().map(|(&m, &v)| (m, v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, m: u32, code: ProjectionCode) -> WcsResult<f64> {
        self.get(m).ok_or_else(|| {
            WcsError::invalid_parameter(format!("{code} projection requires PV2_{m}"))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Azp(zenithal::Azp),
    Szp(zenithal::Szp),
    Tan,
    Stg,
    Sin { xi: f64, eta: f64 },
    Arc,
    Zea,
    Air(zenithal::Air),
    Cyp { mu: f64, lambda: f64 },
    Cea { lambda: f64 },
    Car,
    Mer,
    Sfl,
    Par,
    Mol,
    Ait,
    Conic(conic::Conic),
    Bon(polyconic::Bonne),
    Pco,
    Tsc,
    Csc,
    Qsc,
    Hpx(healpix::Healpix),
}

impl Projection {
    pub fn tan() -> Self {
        Self::Tan
    }

    /// Builds a projection from its code and `PV2_m` parameters.
    pub fn from_code(code: ProjectionCode, pv: &ProjectionParams) -> WcsResult<Self> {
        let projection = match code {
            ProjectionCode::Azp => {
                Self::Azp(zenithal::Azp::new(pv.get_or(1, 0.0), pv.get_or(2, 0.0))?)
            }
            ProjectionCode::Szp => Self::Szp(zenithal::Szp::new(
                pv.get_or(1, 0.0),
                pv.get_or(2, 0.0),
                pv.get_or(3, 90.0),
            )),
            ProjectionCode::Tan => Self::Tan,
            ProjectionCode::Stg => Self::Stg,
            ProjectionCode::Sin => Self::Sin {
                xi: pv.get_or(1, 0.0),
                eta: pv.get_or(2, 0.0),
            },
            ProjectionCode::Arc => Self::Arc,
            ProjectionCode::Zea => Self::Zea,
            ProjectionCode::Air => Self::Air(zenithal::Air::new(pv.get_or(1, 90.0))?),
            ProjectionCode::Cyp => {
                let (mu, lambda) = (pv.get_or(1, 1.0), pv.get_or(2, 1.0));
                if lambda == 0.0 || mu == -lambda {
                    return Err(WcsError::invalid_parameter(
                        "CYP requires lambda != 0 and mu != -lambda",
                    ));
                }
                Self::Cyp { mu, lambda }
            }
            ProjectionCode::Cea => {
                let lambda = pv.get_or(1, 1.0);
                if lambda <= 0.0 || lambda > 1.0 {
                    return Err(WcsError::invalid_parameter(
                        "CEA requires 0 < lambda <= 1",
                    ));
                }
                Self::Cea { lambda }
            }
            ProjectionCode::Car => Self::Car,
            ProjectionCode::Mer => Self::Mer,
            ProjectionCode::Sfl => Self::Sfl,
            ProjectionCode::Par => Self::Par,
            ProjectionCode::Mol => Self::Mol,
            ProjectionCode::Ait => Self::Ait,
            ProjectionCode::Cop
            | ProjectionCode::Coe
            | ProjectionCode::Cod
            | ProjectionCode::Coo => Self::Conic(conic::Conic::new(
                code,
                pv.require(1, code)?,
                pv.get_or(2, 0.0),
            )?),
            ProjectionCode::Bon => {
                let theta_1 = pv.require(1, code)?;
                if theta_1 == 0.0 {
                    // Bonne's projection degenerates to Sanson-Flamsteed
                    Self::Sfl
                } else {
                    Self::Bon(polyconic::Bonne::new(theta_1)?)
                }
            }
            ProjectionCode::Pco => Self::Pco,
            ProjectionCode::Tsc => Self::Tsc,
            ProjectionCode::Csc => Self::Csc,
            ProjectionCode::Qsc => Self::Qsc,
            ProjectionCode::Hpx => Self::Hpx(healpix::Healpix::new(
                pv.get_or(1, 4.0),
                pv.get_or(2, 3.0),
            )?),
            ProjectionCode::Xph => return Err(WcsError::unsupported_projection("XPH")),
        };
        Ok(projection)
    }

    pub fn code(&self) -> ProjectionCode {
        match self {
            Self::Azp(_) => ProjectionCode::Azp,
            Self::Szp(_) => ProjectionCode::Szp,
            Self::Tan => ProjectionCode::Tan,
            Self::Stg => ProjectionCode::Stg,
            Self::Sin { .. } => ProjectionCode::Sin,
            Self::Arc => ProjectionCode::Arc,
            Self::Zea => ProjectionCode::Zea,
            Self::Air(_) => ProjectionCode::Air,
            Self::Cyp { .. } => ProjectionCode::Cyp,
            Self::Cea { .. } => ProjectionCode::Cea,
            Self::Car => ProjectionCode::Car,
            Self::Mer => ProjectionCode::Mer,
            Self::Sfl => ProjectionCode::Sfl,
            Self::Par => ProjectionCode::Par,
            Self::Mol => ProjectionCode::Mol,
            Self::Ait => ProjectionCode::Ait,
            Self::Conic(c) => c.code(),
            Self::Bon(_) => ProjectionCode::Bon,
            Self::Pco => ProjectionCode::Pco,
            Self::Tsc => ProjectionCode::Tsc,
            Self::Csc => ProjectionCode::Csc,
            Self::Qsc => ProjectionCode::Qsc,
            Self::Hpx(_) => ProjectionCode::Hpx,
        }
    }

    /// Native coordinates (φ₀, θ₀) of the fiducial point, in degrees.
    pub fn native_reference(&self) -> (f64, f64) {
        match self {
            Self::Azp(_)
            | Self::Szp(_)
            | Self::Tan
            | Self::Stg
            | Self::Sin { .. }
            | Self::Arc
            | Self::Zea
            | Self::Air(_) => (0.0, 90.0),
            Self::Conic(c) => (0.0, c.theta_a()),
            _ => (0.0, 0.0),
        }
    }

    pub fn project(&self, native: NativeCoord) -> WcsResult<IntermediateCoord> {
        let (phi, theta) = (native.phi_deg(), native.theta_deg());
        if !(-90.0 - 1e-12..=90.0 + 1e-12).contains(&theta) {
            return Err(WcsError::out_of_bounds(format!(
                "native latitude {theta} outside [-90, 90]"
            )));
        }
        let (x, y) = match self {
            Self::Azp(p) => p.project(phi, theta)?,
            Self::Szp(p) => p.project(phi, theta)?,
            Self::Tan => zenithal::project_tan(phi, theta)?,
            Self::Stg => zenithal::project_stg(phi, theta)?,
            Self::Sin { xi, eta } => zenithal::project_sin(phi, theta, *xi, *eta)?,
            Self::Arc => zenithal::project_arc(phi, theta),
            Self::Zea => zenithal::project_zea(phi, theta),
            Self::Air(p) => p.project(phi, theta)?,
            Self::Cyp { mu, lambda } => cylindrical::project_cyp(phi, theta, *mu, *lambda)?,
            Self::Cea { lambda } => cylindrical::project_cea(phi, theta, *lambda),
            Self::Car => cylindrical::project_car(phi, theta),
            Self::Mer => cylindrical::project_mer(phi, theta)?,
            Self::Sfl => pseudocylindrical::project_sfl(phi, theta),
            Self::Par => pseudocylindrical::project_par(phi, theta),
            Self::Mol => pseudocylindrical::project_mol(phi, theta)?,
            Self::Ait => pseudocylindrical::project_ait(phi, theta),
            Self::Conic(p) => p.project(phi, theta)?,
            Self::Bon(p) => p.project(phi, theta)?,
            Self::Pco => polyconic::project_pco(phi, theta),
            Self::Tsc => quadcube::project_tsc(phi, theta),
            Self::Csc => quadcube::project_csc(phi, theta),
            Self::Qsc => quadcube::project_qsc(phi, theta),
            Self::Hpx(p) => p.project(phi, theta),
        };
        Ok(IntermediateCoord::new(x, y))
    }

    pub fn deproject(&self, inter: IntermediateCoord) -> WcsResult<NativeCoord> {
        let (x, y) = (inter.x_deg(), inter.y_deg());
        if !x.is_finite() || !y.is_finite() {
            return Err(WcsError::out_of_bounds("non-finite intermediate coordinate"));
        }
        let (phi, theta) = match self {
            Self::Azp(p) => p.deproject(x, y)?,
            Self::Szp(p) => p.deproject(x, y)?,
            Self::Tan => zenithal::deproject_tan(x, y),
            Self::Stg => zenithal::deproject_stg(x, y),
            Self::Sin { xi, eta } => zenithal::deproject_sin(x, y, *xi, *eta)?,
            Self::Arc => zenithal::deproject_arc(x, y)?,
            Self::Zea => zenithal::deproject_zea(x, y)?,
            Self::Air(p) => p.deproject(x, y)?,
            Self::Cyp { mu, lambda } => cylindrical::deproject_cyp(x, y, *mu, *lambda)?,
            Self::Cea { lambda } => cylindrical::deproject_cea(x, y, *lambda)?,
            Self::Car => cylindrical::deproject_car(x, y)?,
            Self::Mer => cylindrical::deproject_mer(x, y),
            Self::Sfl => pseudocylindrical::deproject_sfl(x, y)?,
            Self::Par => pseudocylindrical::deproject_par(x, y)?,
            Self::Mol => pseudocylindrical::deproject_mol(x, y)?,
            Self::Ait => pseudocylindrical::deproject_ait(x, y)?,
            Self::Conic(p) => p.deproject(x, y)?,
            Self::Bon(p) => p.deproject(x, y)?,
            Self::Pco => polyconic::deproject_pco(x, y)?,
            Self::Tsc => quadcube::deproject_tsc(x, y)?,
            Self::Csc => quadcube::deproject_csc(x, y)?,
            Self::Qsc => quadcube::deproject_qsc(x, y)?,
            Self::Hpx(p) => p.deproject(x, y)?,
        };
        Ok(NativeCoord::new(normalize_longitude(phi), theta))
    }
}

#[inline]
pub(crate) fn asin_safe(sin_value: f64) -> f64 {
    sin_value.clamp(-1.0, 1.0).asin()
}

/// (φ, R) of a zenithal or conic plane position; φ is 0 at the origin.
#[inline]
pub(crate) fn polar(x: f64, y: f64) -> (f64, f64) {
    let r = x.hypot(y);
    let phi = if r == 0.0 {
        0.0
    } else {
        x.atan2(-y).to_degrees()
    };
    (phi, r)
}

/// Root of a monotonic function on `[lo, hi]` by bisection.
///
/// `f(lo)` and `f(hi)` must bracket zero; returns `None` otherwise.
pub(crate) fn bisect(f: impl Fn(f64) -> f64, mut lo: f64, mut hi: f64) -> Option<f64> {
    let mut f_lo = f(lo);
    let f_hi = f(hi);
    if f_lo == 0.0 {
        return Some(lo);
    }
    if f_hi == 0.0 {
        return Some(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return None;
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if mid == lo || mid == hi {
            break;
        }
        let f_mid = f(mid);
        if f_mid == 0.0 {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}
