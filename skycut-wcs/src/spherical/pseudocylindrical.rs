use skycut_core::constants::{PI, RAD_TO_DEG, SQRT2};

use super::{asin_safe, bisect};
use crate::error::{WcsError, WcsResult};

pub(crate) fn project_sfl(phi: f64, theta: f64) -> (f64, f64) {
    (phi * theta.to_radians().cos(), theta)
}

pub(crate) fn deproject_sfl(x: f64, y: f64) -> WcsResult<(f64, f64)> {
    if y.abs() > 90.0 + 1e-10 {
        return Err(WcsError::out_of_bounds("SFL: |y| exceeds 90"));
    }
    let c = y.to_radians().cos();
    let phi = if c.abs() < 1e-15 { 0.0 } else { x / c };
    if phi.abs() > 180.0 + 1e-10 {
        return Err(WcsError::out_of_bounds("SFL: point outside projection"));
    }
    Ok((phi, y.clamp(-90.0, 90.0)))
}

pub(crate) fn project_par(phi: f64, theta: f64) -> (f64, f64) {
    let t = theta.to_radians() / 3.0;
    (phi * (2.0 * (2.0 * t).cos() - 1.0), 180.0 * t.sin())
}

pub(crate) fn deproject_par(x: f64, y: f64) -> WcsResult<(f64, f64)> {
    let s = y / 180.0;
    if s.abs() > 0.5 + 1e-12 {
        return Err(WcsError::out_of_bounds("PAR: |y| exceeds 90"));
    }
    let theta = 3.0 * asin_safe(s);
    let scale = 1.0 - 4.0 * s * s;
    let phi = if scale.abs() < 1e-15 { 0.0 } else { x / scale };
    Ok((phi, theta.to_degrees()))
}

pub(crate) fn project_mol(phi: f64, theta: f64) -> WcsResult<(f64, f64)> {
    let target = PI * theta.to_radians().sin();
    // 2ψ + sin 2ψ is monotonic on [-π, π]
    let gamma = bisect(|g| g + g.sin() - target, -PI, PI)
        .ok_or_else(|| WcsError::convergence_failure("MOL: auxiliary angle"))?;
    let psi = gamma / 2.0;
    Ok((
        2.0 * SQRT2 / PI * phi * psi.cos(),
        SQRT2 * RAD_TO_DEG * psi.sin(),
    ))
}

pub(crate) fn deproject_mol(x: f64, y: f64) -> WcsResult<(f64, f64)> {
    let s = y / (SQRT2 * RAD_TO_DEG);
    if s.abs() > 1.0 + 1e-12 {
        return Err(WcsError::out_of_bounds("MOL: point outside projection"));
    }
    let psi = asin_safe(s);
    let c = psi.cos();
    let phi = if c.abs() < 1e-15 {
        0.0
    } else {
        PI * x / (2.0 * SQRT2 * c)
    };
    if phi.abs() > 180.0 + 1e-10 {
        return Err(WcsError::out_of_bounds("MOL: point outside projection"));
    }
    let theta = asin_safe((2.0 * psi + (2.0 * psi).sin()) / PI);
    Ok((phi, theta.to_degrees()))
}

pub(crate) fn project_ait(phi: f64, theta: f64) -> (f64, f64) {
    let (st, ct) = theta.to_radians().sin_cos();
    let (sh, ch) = (phi.to_radians() / 2.0).sin_cos();
    let gamma = RAD_TO_DEG * (2.0 / (1.0 + ct * ch)).sqrt();
    (2.0 * gamma * ct * sh, gamma * st)
}

pub(crate) fn deproject_ait(x: f64, y: f64) -> WcsResult<(f64, f64)> {
    let u = x / (4.0 * RAD_TO_DEG);
    let v = y / (2.0 * RAD_TO_DEG);
    let z2 = 1.0 - u * u - v * v;
    if z2 < 0.5 - 1e-12 {
        return Err(WcsError::out_of_bounds("AIT: point outside projection"));
    }
    let z = z2.max(0.5).sqrt();
    let phi = 2.0 * (2.0 * z * u).atan2(2.0 * z * z - 1.0);
    let theta = asin_safe(2.0 * z * v);
    Ok((phi.to_degrees(), theta.to_degrees()))
}
