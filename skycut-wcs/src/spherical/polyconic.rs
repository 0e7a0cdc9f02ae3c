use skycut_core::constants::{HALF_PI, RAD_TO_DEG};

use super::bisect;
use crate::error::{WcsError, WcsResult};

/// Bonne's equal area projection with standard parallel θ₁.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bonne {
    theta_1: f64,
    y0: f64,
}

impl Bonne {
    pub(crate) fn new(theta_1_deg: f64) -> WcsResult<Self> {
        if theta_1_deg.abs() > 90.0 {
            return Err(WcsError::invalid_parameter("BON requires |theta_1| <= 90"));
        }
        let theta_1 = theta_1_deg.to_radians();
        Ok(Self {
            theta_1,
            y0: 1.0 / theta_1.tan() + theta_1,
        })
    }

    pub(crate) fn project(&self, phi: f64, theta: f64) -> WcsResult<(f64, f64)> {
        let theta = theta.to_radians();
        let r = self.y0 - theta;
        if r.abs() < 1e-15 {
            return Ok((0.0, RAD_TO_DEG * self.y0));
        }
        let a = phi.to_radians() * theta.cos() / r;
        let (s, c) = a.sin_cos();
        Ok((RAD_TO_DEG * r * s, RAD_TO_DEG * (self.y0 - r * c)))
    }

    pub(crate) fn deproject(&self, x: f64, y: f64) -> WcsResult<(f64, f64)> {
        let (x, dy) = (x / RAD_TO_DEG, self.y0 - y / RAD_TO_DEG);
        let r = x.hypot(dy).copysign(self.theta_1);
        let theta = self.y0 - r;
        if theta.abs() > HALF_PI + 1e-12 {
            return Err(WcsError::out_of_bounds("BON: native latitude beyond the pole"));
        }
        let theta = theta.clamp(-HALF_PI, HALF_PI);
        let ct = theta.cos();
        let phi = if r == 0.0 || ct.abs() < 1e-15 {
            0.0
        } else {
            (x / r).atan2(dy / r) * r / ct
        };
        if phi.abs() > std::f64::consts::PI + 1e-10 {
            return Err(WcsError::out_of_bounds("BON: point outside projection"));
        }
        Ok((phi.to_degrees(), theta.to_degrees()))
    }
}

pub(crate) fn project_pco(phi: f64, theta: f64) -> (f64, f64) {
    let (phi, theta) = (phi.to_radians(), theta.to_radians());
    if theta.abs() < 1e-15 {
        return (RAD_TO_DEG * phi, 0.0);
    }
    let cot = 1.0 / theta.tan();
    let e = phi * theta.sin();
    (
        RAD_TO_DEG * cot * e.sin(),
        RAD_TO_DEG * (theta + cot * (1.0 - e.cos())),
    )
}

pub(crate) fn deproject_pco(x: f64, y: f64) -> WcsResult<(f64, f64)> {
    let (x, y) = (x / RAD_TO_DEG, y / RAD_TO_DEG);
    if y.abs() < 1e-15 {
        return Ok((x.to_degrees(), 0.0));
    }
    // x² + (y - θ)² - 2(y - θ)cot θ vanishes on the parallel through (x, y)
    let f = |t: f64| x * x + (y - t).powi(2) - 2.0 * (y - t) / t.tan();
    let (lo, hi) = if y > 0.0 {
        (1e-15, y.min(HALF_PI))
    } else {
        (y.max(-HALF_PI), -1e-15)
    };
    let theta = bisect(f, lo, hi)
        .ok_or_else(|| WcsError::out_of_bounds("PCO: point outside projection"))?;
    let tan_t = theta.tan();
    let e = (x * tan_t).atan2(1.0 - (y - theta) * tan_t);
    let phi = e / theta.sin();
    Ok((phi.to_degrees(), theta.to_degrees()))
}
