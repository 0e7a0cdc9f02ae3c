//! Conic projections: perspective (COP), equal area (COE), equidistant (COD) and
//! conformal (COO).
//!
//! All four share the same plane geometry. A native point maps to radius `R(θ)` at
//! polar angle `Cφ` about an apex offset by `Y₀ = R(θₐ)`, so the fiducial point
//! (0, θₐ) lands on the origin. The family differs only in `C` and `R(θ)`. `θₐ`
//! and `η` come from `PV2_1` and `PV2_2`; the standard parallels are θₐ ± η.

use skycut_core::constants::{HALF_PI, RAD_TO_DEG};

use super::{asin_safe, ProjectionCode};
use crate::error::{WcsError, WcsResult};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Perspective { cos_eta: f64 },
    EqualArea { gamma: f64, s1s2: f64 },
    Equidistant { y0_term: f64 },
    Conformal { psi: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conic {
    kind: Kind,
    theta_a: f64,
    c: f64,
    y0: f64,
}

impl Conic {
    pub(crate) fn new(code: ProjectionCode, theta_a_deg: f64, eta_deg: f64) -> WcsResult<Self> {
        if theta_a_deg.abs() >= 90.0 || theta_a_deg == 0.0 {
            return Err(WcsError::invalid_parameter(format!(
                "{code} requires 0 < |theta_a| < 90, got {theta_a_deg}"
            )));
        }
        let theta_a = theta_a_deg.to_radians();
        let eta = eta_deg.to_radians();
        let (theta_1, theta_2) = (theta_a - eta, theta_a + eta);

        let (kind, c) = match code {
            ProjectionCode::Cop => (
                Kind::Perspective {
                    cos_eta: eta.cos(),
                },
                theta_a.sin(),
            ),
            ProjectionCode::Coe => {
                let gamma = theta_1.sin() + theta_2.sin();
                if gamma.abs() < 1e-12 {
                    return Err(WcsError::invalid_parameter("COE standard parallels cancel"));
                }
                (
                    Kind::EqualArea {
                        gamma,
                        s1s2: theta_1.sin() * theta_2.sin(),
                    },
                    gamma / 2.0,
                )
            }
            ProjectionCode::Cod => {
                let (c, y0_term) = if eta.abs() < 1e-12 {
                    (theta_a.sin(), 1.0 / theta_a.tan())
                } else {
                    (
                        theta_a.sin() * eta.sin() / eta,
                        eta / eta.tan() / theta_a.tan(),
                    )
                };
                (Kind::Equidistant { y0_term }, c)
            }
            ProjectionCode::Coo => {
                let tan_half = |t: f64| ((HALF_PI - t) / 2.0).tan();
                let c = if eta.abs() < 1e-12 {
                    theta_1.sin()
                } else {
                    (theta_2.cos() / theta_1.cos()).ln()
                        / (tan_half(theta_2) / tan_half(theta_1)).ln()
                };
                if c == 0.0 || !c.is_finite() {
                    return Err(WcsError::invalid_parameter("COO cone constant is zero"));
                }
                let psi = theta_1.cos() / (c * tan_half(theta_1).powf(c));
                (Kind::Conformal { psi }, c)
            }
            other => {
                return Err(WcsError::unsupported_projection(format!(
                    "{other} is not a conic projection"
                )))
            }
        };

        let mut conic = Self {
            kind,
            theta_a,
            c,
            y0: 0.0,
        };
        conic.y0 = conic.radius(theta_a)?;
        Ok(conic)
    }

    pub(crate) fn code(&self) -> ProjectionCode {
        match self.kind {
            Kind::Perspective { .. } => ProjectionCode::Cop,
            Kind::EqualArea { .. } => ProjectionCode::Coe,
            Kind::Equidistant { .. } => ProjectionCode::Cod,
            Kind::Conformal { .. } => ProjectionCode::Coo,
        }
    }

    pub(crate) fn theta_a(&self) -> f64 {
        self.theta_a.to_degrees()
    }

    /// Dimensionless radius for native latitude `theta` in radians.
    fn radius(&self, theta: f64) -> WcsResult<f64> {
        let r = match self.kind {
            Kind::Perspective { cos_eta } => {
                let d = theta - self.theta_a;
                if d.abs() >= HALF_PI - 1e-12 {
                    return Err(WcsError::singularity("COP undefined 90 degrees from theta_a"));
                }
                cos_eta * (1.0 / self.theta_a.tan() - d.tan())
            }
            Kind::EqualArea { gamma, s1s2 } => {
                let arg = 1.0 + s1s2 - gamma * theta.sin();
                if arg < 0.0 {
                    return Err(WcsError::out_of_bounds("COE: point outside projection"));
                }
                2.0 / gamma * arg.sqrt()
            }
            Kind::Equidistant { y0_term } => self.theta_a - theta + y0_term,
            Kind::Conformal { psi } => {
                let t = ((HALF_PI - theta) / 2.0).tan();
                if t <= 0.0 {
                    if self.c > 0.0 {
                        0.0
                    } else {
                        return Err(WcsError::singularity("COO undefined at the native pole"));
                    }
                } else {
                    psi * t.powf(self.c)
                }
            }
        };
        Ok(r)
    }

    /// Inverse of [`radius`](Self::radius), returning θ in radians.
    fn latitude(&self, r: f64) -> WcsResult<f64> {
        let theta = match self.kind {
            Kind::Perspective { cos_eta } => {
                self.theta_a + (1.0 / self.theta_a.tan() - r / cos_eta).atan()
            }
            Kind::EqualArea { gamma, s1s2 } => {
                let half = r * gamma / 2.0;
                let s = (1.0 + s1s2 - half * half) / gamma;
                if s.abs() > 1.0 + 1e-12 {
                    return Err(WcsError::out_of_bounds("COE: point outside projection"));
                }
                asin_safe(s)
            }
            Kind::Equidistant { y0_term } => self.theta_a + y0_term - r,
            Kind::Conformal { psi } => {
                if r == 0.0 {
                    HALF_PI.copysign(self.c)
                } else {
                    HALF_PI - 2.0 * (r / psi).powf(1.0 / self.c).atan()
                }
            }
        };
        if theta.abs() > HALF_PI + 1e-12 {
            return Err(WcsError::out_of_bounds(format!(
                "{}: native latitude beyond the pole",
                self.code()
            )));
        }
        Ok(theta.clamp(-HALF_PI, HALF_PI))
    }

    pub(crate) fn project(&self, phi: f64, theta: f64) -> WcsResult<(f64, f64)> {
        let r = self.radius(theta.to_radians())?;
        let (s, c) = (self.c * phi.to_radians()).sin_cos();
        Ok((RAD_TO_DEG * r * s, RAD_TO_DEG * (self.y0 - r * c)))
    }

    pub(crate) fn deproject(&self, x: f64, y: f64) -> WcsResult<(f64, f64)> {
        let (x, dy) = (x / RAD_TO_DEG, self.y0 - y / RAD_TO_DEG);
        let r = x.hypot(dy).copysign(self.theta_a);
        let phi = if r == 0.0 {
            0.0
        } else {
            (x / r).atan2(dy / r) / self.c
        };
        Ok((phi.to_degrees(), self.latitude(r)?.to_degrees()))
    }
}
