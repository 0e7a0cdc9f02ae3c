use skycut_core::constants::RAD_TO_DEG;

use super::asin_safe;
use crate::error::{WcsError, WcsResult};

fn check_latitude(theta: f64, code: &str) -> WcsResult<f64> {
    if theta.abs() > 90.0 + 1e-10 {
        return Err(WcsError::out_of_bounds(format!(
            "{code}: native latitude {theta} beyond the pole"
        )));
    }
    Ok(theta.clamp(-90.0, 90.0))
}

pub(crate) fn project_car(phi: f64, theta: f64) -> (f64, f64) {
    (phi, theta)
}

pub(crate) fn deproject_car(x: f64, y: f64) -> WcsResult<(f64, f64)> {
    Ok((x, check_latitude(y, "CAR")?))
}

pub(crate) fn project_mer(phi: f64, theta: f64) -> WcsResult<(f64, f64)> {
    if theta.abs() >= 90.0 - 1e-10 {
        return Err(WcsError::singularity("MER undefined at the native poles"));
    }
    let y = (std::f64::consts::FRAC_PI_4 + theta.to_radians() / 2.0)
        .tan()
        .ln();
    Ok((phi, y * RAD_TO_DEG))
}

pub(crate) fn deproject_mer(x: f64, y: f64) -> (f64, f64) {
    let theta = 2.0 * (y / RAD_TO_DEG).exp().atan() - std::f64::consts::FRAC_PI_2;
    (x, theta.to_degrees())
}

pub(crate) fn project_cea(phi: f64, theta: f64, lambda: f64) -> (f64, f64) {
    (phi, RAD_TO_DEG * theta.to_radians().sin() / lambda)
}

pub(crate) fn deproject_cea(x: f64, y: f64, lambda: f64) -> WcsResult<(f64, f64)> {
    let sin_theta = lambda * y / RAD_TO_DEG;
    if sin_theta.abs() > 1.0 + 1e-12 {
        return Err(WcsError::out_of_bounds("CEA: |lambda * y| exceeds 1"));
    }
    Ok((x, asin_safe(sin_theta).to_degrees()))
}

pub(crate) fn project_cyp(phi: f64, theta: f64, mu: f64, lambda: f64) -> WcsResult<(f64, f64)> {
    let (st, ct) = theta.to_radians().sin_cos();
    let denom = mu + ct;
    if denom.abs() < 1e-12 {
        return Err(WcsError::singularity("CYP undefined where mu + cos(theta) = 0"));
    }
    Ok((lambda * phi, RAD_TO_DEG * (mu + lambda) * st / denom))
}

pub(crate) fn deproject_cyp(x: f64, y: f64, mu: f64, lambda: f64) -> WcsResult<(f64, f64)> {
    let eta = y / (RAD_TO_DEG * (mu + lambda));
    let arg = eta * mu / (eta * eta + 1.0).sqrt();
    if arg.abs() > 1.0 + 1e-12 {
        return Err(WcsError::out_of_bounds("CYP: point outside projection"));
    }
    let theta = eta.atan2(1.0) + asin_safe(arg);
    Ok((x / lambda, theta.to_degrees()))
}
