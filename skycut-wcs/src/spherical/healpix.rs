use crate::error::{WcsError, WcsResult};

/// HEALPix projection with `h` facets in longitude and `k` in latitude.
///
/// Only odd `k` is supported, which keeps the polar facets aligned with the
/// equatorial ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Healpix {
    h: f64,
    k: f64,
    theta_x: f64,
}

impl Healpix {
    pub(crate) fn new(h: f64, k: f64) -> WcsResult<Self> {
        if h < 1.0 || h.fract() != 0.0 {
            return Err(WcsError::invalid_parameter(format!(
                "HPX requires a positive integer H, got {h}"
            )));
        }
        if k < 1.0 || k.fract() != 0.0 || k % 2.0 == 0.0 {
            return Err(WcsError::invalid_parameter(format!(
                "HPX supports odd integer K only, got {k}"
            )));
        }
        Ok(Self {
            h,
            k,
            theta_x: ((k - 1.0) / k).asin().to_degrees(),
        })
    }

    /// Longitude of the centre of the polar facet containing `phi`.
    fn facet_centre(&self, phi: f64) -> f64 {
        let index = ((phi + 180.0) * self.h / 360.0).floor().clamp(0.0, self.h - 1.0);
        -180.0 + (2.0 * index + 1.0) * 180.0 / self.h
    }

    pub(crate) fn project(&self, phi: f64, theta: f64) -> (f64, f64) {
        if theta.abs() <= self.theta_x {
            return (phi, 90.0 * self.k / self.h * theta.to_radians().sin());
        }
        let sigma = (self.k * (1.0 - theta.to_radians().sin().abs())).sqrt();
        let phi_c = self.facet_centre(phi);
        let y = 180.0 / self.h * ((self.k + 1.0) / 2.0 - sigma);
        (phi_c + (phi - phi_c) * sigma, y.copysign(theta))
    }

    pub(crate) fn deproject(&self, x: f64, y: f64) -> WcsResult<(f64, f64)> {
        if x.abs() > 180.0 + 1e-10 {
            return Err(WcsError::out_of_bounds("HPX: |x| exceeds 180"));
        }
        let y_x = 90.0 * (self.k - 1.0) / self.h;
        if y.abs() <= y_x {
            let theta = (y * self.h / (90.0 * self.k)).asin().to_degrees();
            return Ok((x, theta));
        }
        let sigma = (self.k + 1.0) / 2.0 - y.abs() * self.h / 180.0;
        if sigma < -1e-12 {
            return Err(WcsError::out_of_bounds("HPX: |y| beyond the pole"));
        }
        let phi_c = self.facet_centre(x);
        if sigma <= 1e-12 {
            return Ok((phi_c, 90.0f64.copysign(y)));
        }
        if (x - phi_c).abs() > sigma * 180.0 / self.h + 1e-10 {
            return Err(WcsError::out_of_bounds("HPX: point in a polar gap"));
        }
        let phi = phi_c + (x - phi_c) / sigma;
        let theta = (1.0 - sigma * sigma / self.k).clamp(-1.0, 1.0).asin().to_degrees();
        Ok((phi, theta.copysign(y)))
    }
}
