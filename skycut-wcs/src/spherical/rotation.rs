use skycut_core::constants::HALF_PI;
use skycut_core::utils::normalize_longitude;

use super::asin_safe;
use crate::coordinate::{CelestialCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

/// Rotation between native spherical and celestial coordinates.
///
/// Fixed by the celestial coordinates of the native pole (αₚ, δₚ) and the native
/// longitude of the celestial pole φₚ (`LONPOLE`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalRotation {
    alpha_p: f64,
    delta_p: f64,
    phi_p: f64,
    sin_delta_p: f64,
    cos_delta_p: f64,
}

impl SphericalRotation {
    /// All angles in degrees.
    pub fn new(alpha_p: f64, delta_p: f64, phi_p: f64) -> Self {
        let delta_p = delta_p.to_radians();
        let (sin_delta_p, cos_delta_p) = delta_p.sin_cos();
        Self {
            alpha_p: alpha_p.to_radians(),
            delta_p,
            phi_p: phi_p.to_radians(),
            sin_delta_p,
            cos_delta_p,
        }
    }

    /// Default `LONPOLE`: φ₀ when δ₀ ≥ θ₀, otherwise φ₀ + 180°.
    pub fn default_lonpole(delta_0: f64, native_reference: (f64, f64)) -> f64 {
        let (phi_0, theta_0) = native_reference;
        if delta_0 >= theta_0 {
            phi_0
        } else {
            phi_0 + 180.0
        }
    }

    /// Solves for the native pole so that the fiducial point `native_reference`
    /// lands on `crval`. `latpole` (default +90°) picks between the two solutions
    /// for δₚ when both are valid.
    pub fn from_reference(
        crval: [f64; 2],
        native_reference: (f64, f64),
        lonpole: Option<f64>,
        latpole: Option<f64>,
    ) -> WcsResult<Self> {
        let [alpha_0, delta_0] = crval;
        let (phi_0, theta_0) = native_reference;
        let phi_p =
            lonpole.unwrap_or_else(|| Self::default_lonpole(delta_0, native_reference));

        if theta_0 == 90.0 {
            return Ok(Self::new(alpha_0, delta_0, phi_p));
        }

        let latpole = latpole.unwrap_or(90.0).to_radians();
        let (sin_t0, cos_t0) = theta_0.to_radians().sin_cos();
        let d_phi = (phi_p - phi_0).to_radians();
        let (sin_dphi, cos_dphi) = d_phi.sin_cos();
        let sin_d0 = delta_0.to_radians().sin();

        let delta_p = Self::solve_delta_p(sin_d0, sin_t0, cos_t0, sin_dphi, cos_dphi, latpole)?;

        let (sin_dp, cos_dp) = delta_p.sin_cos();
        let alpha_p = if cos_dp.abs() < 1e-15 && cos_t0.abs() < 1e-15 {
            alpha_0.to_radians()
        } else {
            alpha_0.to_radians()
                - (cos_t0 * sin_dphi).atan2(sin_t0 * cos_dp - cos_t0 * sin_dp * cos_dphi)
        };

        Ok(Self::new(
            normalize_longitude(alpha_p.to_degrees()),
            delta_p.to_degrees(),
            phi_p,
        ))
    }

    fn solve_delta_p(
        sin_d0: f64,
        sin_t0: f64,
        cos_t0: f64,
        sin_dphi: f64,
        cos_dphi: f64,
        latpole: f64,
    ) -> WcsResult<f64> {
        let denom = (1.0 - (cos_t0 * sin_dphi).powi(2)).sqrt();
        if denom < 1e-15 {
            if sin_d0.abs() < 1e-15 {
                return Ok(latpole);
            }
            return Err(WcsError::invalid_parameter(
                "no native pole satisfies CRVAL with this LONPOLE",
            ));
        }
        let arg = sin_d0 / denom;
        if arg.abs() > 1.0 + 1e-12 {
            return Err(WcsError::invalid_parameter(
                "no native pole satisfies CRVAL with this LONPOLE",
            ));
        }
        let base = sin_t0.atan2(cos_t0 * cos_dphi);
        let spread = arg.clamp(-1.0, 1.0).acos();

        let in_range = |d: f64| d.abs() <= HALF_PI + 1e-12;
        let candidates = [base + spread, base - spread];
        candidates
            .into_iter()
            .filter(|&d| in_range(d))
            .min_by(|a, b| (a - latpole).abs().total_cmp(&(b - latpole).abs()))
            .map(|d| d.clamp(-HALF_PI, HALF_PI))
            .ok_or_else(|| WcsError::invalid_parameter("native pole latitude outside [-90, 90]"))
    }

    pub fn native_to_celestial(&self, native: NativeCoord) -> CelestialCoord {
        let (sin_t, cos_t) = native.theta_rad().sin_cos();
        let (sin_d, cos_d) = (native.phi_rad() - self.phi_p).sin_cos();

        let lat = asin_safe(sin_t * self.sin_delta_p + cos_t * self.cos_delta_p * cos_d);
        let lon = self.alpha_p
            + (-cos_t * sin_d).atan2(sin_t * self.cos_delta_p - cos_t * self.sin_delta_p * cos_d);

        CelestialCoord::new(normalize_longitude(lon.to_degrees()), lat.to_degrees())
    }

    pub fn celestial_to_native(&self, celestial: CelestialCoord) -> NativeCoord {
        let (sin_l, cos_l) = celestial.lat_deg().to_radians().sin_cos();
        let (sin_d, cos_d) = (celestial.lon_deg().to_radians() - self.alpha_p).sin_cos();

        let theta = asin_safe(sin_l * self.sin_delta_p + cos_l * self.cos_delta_p * cos_d);
        let phi = self.phi_p
            + (-cos_l * sin_d).atan2(sin_l * self.cos_delta_p - cos_l * self.sin_delta_p * cos_d);

        NativeCoord::new(normalize_longitude(phi.to_degrees()), theta.to_degrees())
    }

    pub fn alpha_p_degrees(&self) -> f64 {
        self.alpha_p.to_degrees()
    }

    pub fn delta_p_degrees(&self) -> f64 {
        self.delta_p.to_degrees()
    }

    pub fn phi_p_degrees(&self) -> f64 {
        self.phi_p.to_degrees()
    }
}
