use skycut_core::constants::{HALF_PI, RAD_TO_DEG};

use super::{asin_safe, bisect, polar};
use crate::error::{WcsError, WcsResult};

type Plane = WcsResult<(f64, f64)>;

#[inline]
fn from_radius(phi: f64, r: f64) -> (f64, f64) {
    let (s, c) = phi.to_radians().sin_cos();
    (r * s, -r * c)
}

pub(crate) fn project_tan(phi: f64, theta: f64) -> Plane {
    let (s, c) = theta.to_radians().sin_cos();
    if s <= 1e-12 {
        return Err(WcsError::singularity(format!(
            "TAN undefined for native latitude {theta}"
        )));
    }
    Ok(from_radius(phi, RAD_TO_DEG * c / s))
}

pub(crate) fn deproject_tan(x: f64, y: f64) -> (f64, f64) {
    let (phi, r) = polar(x, y);
    (phi, RAD_TO_DEG.atan2(r).to_degrees())
}

pub(crate) fn project_stg(phi: f64, theta: f64) -> Plane {
    let (s, c) = theta.to_radians().sin_cos();
    if 1.0 + s < 1e-12 {
        return Err(WcsError::singularity("STG undefined at the native south pole"));
    }
    Ok(from_radius(phi, 2.0 * RAD_TO_DEG * c / (1.0 + s)))
}

pub(crate) fn deproject_stg(x: f64, y: f64) -> (f64, f64) {
    let (phi, r) = polar(x, y);
    (phi, 90.0 - 2.0 * (r / (2.0 * RAD_TO_DEG)).atan().to_degrees())
}

pub(crate) fn project_sin(phi: f64, theta: f64, xi: f64, eta: f64) -> Plane {
    if theta < -1e-12 {
        return Err(WcsError::out_of_bounds(format!(
            "SIN undefined on the far hemisphere (theta = {theta})"
        )));
    }
    let (st, ct) = theta.to_radians().sin_cos();
    let (sp, cp) = phi.to_radians().sin_cos();
    let t = 1.0 - st;
    Ok((
        RAD_TO_DEG * (ct * sp + xi * t),
        -RAD_TO_DEG * (ct * cp - eta * t),
    ))
}

pub(crate) fn deproject_sin(x: f64, y: f64, xi: f64, eta: f64) -> Plane {
    slant_inverse(x / RAD_TO_DEG, y / RAD_TO_DEG, xi, eta, "SIN")
}

/// Shared inverse of the slant orthographic and slant zenithal perspective forms.
///
/// Solves the quadratic in sin θ for the plane point (X, Y) in radians with the
/// projection offset (X', Y'), keeping the root nearest the native pole.
fn slant_inverse(x: f64, y: f64, xp: f64, yp: f64, code: &str) -> Plane {
    let a = xp * xp + yp * yp + 1.0;
    let b = xp * (x - xp) + yp * (y - yp);
    let c = (x - xp).powi(2) + (y - yp).powi(2) - 1.0;
    let disc = b * b - a * c;
    if disc < 0.0 {
        return Err(WcsError::out_of_bounds(format!("{code}: point outside projection")));
    }
    let root = disc.sqrt();
    let (s1, s2) = ((-b + root) / a, (-b - root) / a);
    let mut sin_theta = s1.max(s2);
    if sin_theta > 1.0 {
        sin_theta = if sin_theta - 1.0 < 1e-13 { 1.0 } else { s1.min(s2) };
    }
    if sin_theta < -1.0 && sin_theta + 1.0 > -1e-13 {
        sin_theta = -1.0;
    }
    if !(-1.0..=1.0).contains(&sin_theta) {
        return Err(WcsError::out_of_bounds(format!("{code}: point outside projection")));
    }
    let t = 1.0 - sin_theta;
    let phi = if (x - xp * t) == 0.0 && (y - yp * t) == 0.0 {
        0.0
    } else {
        (x - xp * t).atan2(-(y - yp * t)).to_degrees()
    };
    Ok((phi, sin_theta.asin().to_degrees()))
}

pub(crate) fn project_arc(phi: f64, theta: f64) -> (f64, f64) {
    from_radius(phi, 90.0 - theta)
}

pub(crate) fn deproject_arc(x: f64, y: f64) -> Plane {
    let (phi, r) = polar(x, y);
    if r > 180.0 + 1e-10 {
        return Err(WcsError::out_of_bounds("ARC: radius beyond 180 degrees"));
    }
    Ok((phi, 90.0 - r.min(180.0)))
}

pub(crate) fn project_zea(phi: f64, theta: f64) -> (f64, f64) {
    let half_colat = (90.0 - theta).to_radians() / 2.0;
    from_radius(phi, 2.0 * RAD_TO_DEG * half_colat.sin())
}

pub(crate) fn deproject_zea(x: f64, y: f64) -> Plane {
    let (phi, r) = polar(x, y);
    let w = r / (2.0 * RAD_TO_DEG);
    if w > 1.0 + 1e-12 {
        return Err(WcsError::out_of_bounds("ZEA: radius beyond the antipode"));
    }
    Ok((phi, 90.0 - 2.0 * asin_safe(w).to_degrees()))
}

/// Zenithal perspective, with the source at distance `mu` and the plane tilted by `gamma`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Azp {
    mu: f64,
    gamma: f64,
}

impl Azp {
    pub(crate) fn new(mu: f64, gamma_deg: f64) -> WcsResult<Self> {
        if mu == -1.0 {
            return Err(WcsError::invalid_parameter("AZP requires mu != -1"));
        }
        if gamma_deg.abs() >= 90.0 {
            return Err(WcsError::invalid_parameter("AZP requires |gamma| < 90"));
        }
        Ok(Self {
            mu,
            gamma: gamma_deg.to_radians(),
        })
    }

    pub(crate) fn project(&self, phi: f64, theta: f64) -> Plane {
        let (st, ct) = theta.to_radians().sin_cos();
        let (sp, cp) = phi.to_radians().sin_cos();
        let denom = self.mu + st + ct * cp * self.gamma.tan();
        if denom <= 1e-12 {
            return Err(WcsError::singularity(format!(
                "AZP undefined at native ({phi}, {theta})"
            )));
        }
        let r = RAD_TO_DEG * (self.mu + 1.0) * ct / denom;
        Ok((r * sp, -r * cp / self.gamma.cos()))
    }

    pub(crate) fn deproject(&self, x: f64, y: f64) -> Plane {
        let (sg, cg) = self.gamma.sin_cos();
        let yc = y * cg;
        let r = x.hypot(yc);
        if r == 0.0 {
            return Ok((0.0, 90.0));
        }
        let phi = x.atan2(-yc).to_degrees();
        let rho = r / (RAD_TO_DEG * (self.mu + 1.0) + y * sg);
        let psi = 1.0f64.atan2(rho);
        let arg = rho * self.mu / (rho * rho + 1.0).sqrt();
        if arg.abs() > 1.0 {
            return Err(WcsError::out_of_bounds("AZP: point outside projection"));
        }
        let omega = arg.asin();

        let wrap = |t: f64| {
            let t = t % (2.0 * std::f64::consts::PI);
            if t > std::f64::consts::PI {
                t - 2.0 * std::f64::consts::PI
            } else if t <= -std::f64::consts::PI {
                t + 2.0 * std::f64::consts::PI
            } else {
                t
            }
        };
        let candidates = [wrap(psi - omega), wrap(psi + omega + std::f64::consts::PI)];
        candidates
            .into_iter()
            .filter(|t| t.abs() <= HALF_PI + 1e-12)
            .fold(None, |best: Option<f64>, t| Some(best.map_or(t, |b| b.max(t))))
            .map(|theta| (phi, theta.clamp(-HALF_PI, HALF_PI).to_degrees()))
            .ok_or_else(|| WcsError::out_of_bounds("AZP: no valid native latitude"))
    }
}

/// Slant zenithal perspective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Szp {
    xp: f64,
    yp: f64,
    zp: f64,
}

impl Szp {
    pub(crate) fn new(mu: f64, phi_c: f64, theta_c: f64) -> Self {
        let (sp, cp) = phi_c.to_radians().sin_cos();
        let (st, ct) = theta_c.to_radians().sin_cos();
        Self {
            xp: -mu * ct * sp,
            yp: mu * ct * cp,
            zp: mu * st + 1.0,
        }
    }

    pub(crate) fn project(&self, phi: f64, theta: f64) -> Plane {
        let (st, ct) = theta.to_radians().sin_cos();
        let (sp, cp) = phi.to_radians().sin_cos();
        let s = 1.0 - st;
        let t = self.zp - s;
        if t <= 1e-12 {
            return Err(WcsError::singularity(format!(
                "SZP undefined at native ({phi}, {theta})"
            )));
        }
        Ok((
            RAD_TO_DEG * (self.zp * ct * sp - self.xp * s) / t,
            -RAD_TO_DEG * (self.zp * ct * cp + self.yp * s) / t,
        ))
    }

    pub(crate) fn deproject(&self, x: f64, y: f64) -> Plane {
        let (x, y) = (x / RAD_TO_DEG, y / RAD_TO_DEG);
        let x1 = (x - self.xp) / self.zp;
        let y1 = (y - self.yp) / self.zp;
        slant_inverse(x, y, x1, y1, "SZP")
    }
}

/// Airy's minimum-error zenithal projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Air {
    c_b: f64,
}

impl Air {
    pub(crate) fn new(theta_b: f64) -> WcsResult<Self> {
        if !(theta_b > -90.0 && theta_b <= 90.0) {
            return Err(WcsError::invalid_parameter("AIR requires -90 < theta_b <= 90"));
        }
        let c_b = if theta_b == 90.0 {
            -0.5
        } else {
            let xi_b = (90.0 - theta_b).to_radians() / 2.0;
            xi_b.cos().ln() / xi_b.tan().powi(2)
        };
        Ok(Self { c_b })
    }

    /// Radius for half-colatitude `xi` in radians.
    fn radius(&self, xi: f64) -> f64 {
        if xi < 1e-10 {
            return 0.0;
        }
        let t = xi.tan();
        -2.0 * RAD_TO_DEG * (xi.cos().ln() / t + self.c_b * t)
    }

    pub(crate) fn project(&self, phi: f64, theta: f64) -> Plane {
        if theta <= -90.0 + 1e-10 {
            return Err(WcsError::singularity("AIR undefined at the native south pole"));
        }
        let xi = (90.0 - theta).to_radians() / 2.0;
        Ok(from_radius(phi, self.radius(xi)))
    }

    pub(crate) fn deproject(&self, x: f64, y: f64) -> Plane {
        let (phi, r) = polar(x, y);
        if r == 0.0 {
            return Ok((0.0, 90.0));
        }
        let xi = bisect(|xi| self.radius(xi) - r, 0.0, HALF_PI - 1e-10)
            .ok_or_else(|| WcsError::out_of_bounds("AIR: radius beyond projection"))?;
        Ok((phi, 90.0 - 2.0 * xi.to_degrees()))
    }
}
