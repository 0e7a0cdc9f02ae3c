//! Fitting a WCS to matched pixel and sky positions.
//!
//! The fit runs in two stages over the same least-squares solver:
//!
//! 1. **Linear.** CRVAL is fixed up front (from the data or a caller-supplied point);
//!    the CD matrix and CRPIX are then fitted by minimising sky residuals.
//! 2. **SIP** (optional). CRPIX, CD and the A/B polynomial coefficients are refitted
//!    together against projection-plane residuals.
//!
//! Pixel inputs are 0-based; the returned [`Wcs`] reports CRPIX 1-based as usual.
//!
//! ```
//! use skycut_core::{Frame, SkyCoord, SkyCoords};
//! use skycut_wcs::fit::{fit_wcs_from_points, ProjectionPoint, ProjectionSpec};
//! use skycut_wcs::{PixelTransform, WcsBuilder};
//!
//! let truth = WcsBuilder::new()
//!     .crpix(20.0, 20.0)
//!     .crval(150.0, 2.0)
//!     .cd_matrix([[-1e-3, 0.0], [0.0, 1e-3]])
//!     .proj_code("TAN")
//!     .build()
//!     .unwrap();
//!
//! let (mut xs, mut ys, mut lons, mut lats) = (vec![], vec![], vec![], vec![]);
//! for i in 0..5 {
//!     for j in 0..5 {
//!         let (x, y) = (i as f64 * 10.0, j as f64 * 10.0);
//!         let (lon, lat) = truth.pixel_to_world(x, y).unwrap();
//!         xs.push(x);
//!         ys.push(y);
//!         lons.push(lon);
//!         lats.push(lat);
//!     }
//! }
//! let world = SkyCoords::new(lons, lats, Frame::Icrs).unwrap();
//! let fitted = fit_wcs_from_points(
//!     (&xs, &ys),
//!     &world,
//!     ProjectionPoint::Point(SkyCoord::icrs(150.0, 2.0)),
//!     ProjectionSpec::from("TAN"),
//!     None,
//! )
//! .unwrap();
//! let (lon, lat) = fitted.pixel_to_world(20.0, 20.0).unwrap();
//! let (lon0, lat0) = truth.pixel_to_world(20.0, 20.0).unwrap();
//! assert!((lon - lon0).abs() < 1e-9 && (lat - lat0).abs() < 1e-9);
//! ```

mod linear;
mod sip;
pub mod solver;

use std::str::FromStr;

use skycut_core::utils::wrap_residual;
use skycut_core::{Angle, Frame, SkyCoord, SkyCoords};
use tracing::debug;

use crate::builder::WcsBuilder;
use crate::error::{WcsError, WcsResult};
use crate::spherical::ProjectionCode;
use crate::wcs::{CoordType, Wcs};

pub use solver::{
    Bounds, LeastSquares, LevenbergMarquardt, Residuals, Solution, SolverConfig, Termination,
};

/// Highest accepted `sip_degree`.
pub const MAX_SIP_DEGREE: u32 = 9;

/// Where the fitted CRVAL comes from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ProjectionPoint {
    /// Midpoint of the great circle spanning the extremes of the input positions.
    #[default]
    Center,
    Point(SkyCoord),
}

/// The projection to fit: a bare code, or a WCS whose projection and matrix seed the fit.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionSpec {
    Code(String),
    Template(Wcs),
}

impl Default for ProjectionSpec {
    fn default() -> Self {
        Self::Code("TAN".to_string())
    }
}

impl From<&str> for ProjectionSpec {
    fn from(code: &str) -> Self {
        Self::Code(code.to_string())
    }
}

impl From<Wcs> for ProjectionSpec {
    fn from(template: Wcs) -> Self {
        Self::Template(template)
    }
}

/// Fits with the default [`LevenbergMarquardt`] solver.
///
/// `xy` holds 0-based pixel columns and rows matched element-wise with `world`.
pub fn fit_wcs_from_points(
    xy: (&[f64], &[f64]),
    world: &SkyCoords,
    proj_point: ProjectionPoint,
    projection: ProjectionSpec,
    sip_degree: Option<u32>,
) -> WcsResult<Wcs> {
    WcsFitter::new().fit(xy, world, proj_point, projection, sip_degree)
}

/// Matched samples in the frame of the WCS being fitted.
pub(crate) struct Samples<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
}

impl Samples<'_> {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Per-axis `[min, max]` of the pixel positions, widened to ±0.5 when flat.
    pub fn crpix_bounds(&self) -> [(f64, f64); 2] {
        [extent(self.x), extent(self.y)].map(|(lo, hi)| {
            if hi > lo {
                (lo, hi)
            } else {
                (lo - 0.5, hi + 0.5)
            }
        })
    }
}

fn extent(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// WCS fitter over an injected least-squares solver.
#[derive(Debug, Clone, Default)]
pub struct WcsFitter<S: LeastSquares = LevenbergMarquardt> {
    solver: S,
}

impl WcsFitter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: LeastSquares> WcsFitter<S> {
    pub fn with_solver(solver: S) -> Self {
        Self { solver }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn fit(
        &self,
        xy: (&[f64], &[f64]),
        world: &SkyCoords,
        proj_point: ProjectionPoint,
        projection: ProjectionSpec,
        sip_degree: Option<u32>,
    ) -> WcsResult<Wcs> {
        let (x, y) = xy;
        validate_inputs(x, y, world, &projection, sip_degree)?;

        let frame = match &projection {
            ProjectionSpec::Template(template) => template.frame().unwrap_or(world.frame()),
            ProjectionSpec::Code(_) => world.frame(),
        };
        let world = world.transform_to(frame)?;
        let samples = Samples {
            x,
            y,
            lon: world.lon_deg().to_vec(),
            lat: world.lat_deg().to_vec(),
        };

        let crval = match proj_point {
            ProjectionPoint::Center => center_of(&world)?,
            ProjectionPoint::Point(point) => {
                let p = point.transform_to(frame)?;
                [p.lon_deg(), p.lat_deg()]
            }
        };
        let crpix0 = initial_crpix(&samples, proj_point, crval);
        debug!(?crval, ?crpix0, points = samples.len(), "fitting WCS");

        let (skeleton, seed_cd) = match projection {
            ProjectionSpec::Code(code) => (code_skeleton(&code, frame, crval, crpix0)?, true),
            ProjectionSpec::Template(template) => (
                template
                    .with_sip(None)
                    .with_crval(crval)?
                    .with_crpix([crpix0[0] + 1.0, crpix0[1] + 1.0]),
                false,
            ),
        };

        let fitted = linear::fit_linear(&self.solver, &skeleton, &samples, crpix0, seed_cd)?;

        match sip_degree {
            Some(degree) if degree > 0 => sip::fit_sip(&self.solver, &fitted, &samples, degree as usize),
            _ => Ok(fitted),
        }
    }
}

fn validate_inputs(
    x: &[f64],
    y: &[f64],
    world: &SkyCoords,
    projection: &ProjectionSpec,
    sip_degree: Option<u32>,
) -> WcsResult<()> {
    if x.len() != y.len() || x.len() != world.len() {
        return Err(WcsError::invalid_parameter(format!(
            "mismatched inputs: {} x, {} y, {} sky positions",
            x.len(),
            y.len(),
            world.len()
        )));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(WcsError::invalid_parameter("pixel positions must be finite"));
    }
    if let ProjectionSpec::Code(code) = projection {
        ProjectionCode::from_str(code).map_err(|_| {
            WcsError::invalid_parameter(format!("unknown projection code '{code}'"))
        })?;
    }
    if let Some(degree) = sip_degree {
        if degree > MAX_SIP_DEGREE {
            return Err(WcsError::invalid_parameter(format!(
                "sip_degree {degree} exceeds {MAX_SIP_DEGREE}"
            )));
        }
    }
    if world.is_empty() {
        return Err(WcsError::underdetermined(0, 6));
    }
    Ok(())
}

/// Offsets from the corner of greatest latitude and least longitude halfway towards
/// the opposite corner.
fn center_of(world: &SkyCoords) -> WcsResult<[f64; 2]> {
    let (lon_min, lon_max) = extent(world.lon_deg());
    let (lat_min, lat_max) = extent(world.lat_deg());
    let frame = world.frame();
    let sc1 = SkyCoord::new(lon_min, lat_max, frame)?;
    let sc2 = SkyCoord::new(lon_max, lat_min, frame)?;
    let pa = sc1.position_angle(&sc2)?;
    let sep = sc1.separation(&sc2)?;
    let mid = sc1.directional_offset_by(pa, Angle::from_degrees(sep.degrees() / 2.0));
    Ok([mid.lon_deg(), mid.lat_deg()])
}

fn initial_crpix(samples: &Samples<'_>, proj_point: ProjectionPoint, crval: [f64; 2]) -> [f64; 2] {
    match proj_point {
        ProjectionPoint::Center => {
            let (x_lo, x_hi) = extent(samples.x);
            let (y_lo, y_hi) = extent(samples.y);
            [(x_lo + x_hi) / 2.0, (y_lo + y_hi) / 2.0]
        }
        ProjectionPoint::Point(_) => {
            let nearest = |values: &[f64], target: f64, wrap: bool| {
                values
                    .iter()
                    .map(|&v| {
                        let d = v - target;
                        if wrap { wrap_residual(d).abs() } else { d.abs() }
                    })
                    .enumerate()
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map_or(0, |(i, _)| i)
            };
            let ix = nearest(&samples.lon, crval[0], true);
            let iy = nearest(&samples.lat, crval[1], false);
            [samples.x[ix], samples.y[iy]]
        }
    }
}

fn code_skeleton(code: &str, frame: Frame, crval: [f64; 2], crpix0: [f64; 2]) -> WcsResult<Wcs> {
    let mut builder = WcsBuilder::new()
        .crpix(crpix0[0] + 1.0, crpix0[1] + 1.0)
        .crval(crval[0], crval[1])
        .cd_matrix([[1.0, 0.0], [0.0, 1.0]])
        .proj_code(code)
        .coord_type(CoordType::from_frame(frame));
    match frame {
        Frame::Icrs => builder = builder.radesys("ICRS"),
        Frame::Fk5 => builder = builder.radesys("FK5").equinox(2000.0),
        Frame::Galactic | Frame::Ecliptic => {}
    }
    builder.build()
}
