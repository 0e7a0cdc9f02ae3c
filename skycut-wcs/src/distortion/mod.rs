//! Simple Imaging Polynomial (SIP) distortion.
//!
//! SIP corrects pixel offsets `(u, v)` from CRPIX before the CD matrix is applied:
//!
//! ```text
//! u' = u + Σ A_p_q u^p v^q
//! v' = v + Σ B_p_q u^p v^q
//! ```
//!
//! The polynomial stores no reference pixel of its own. It always works on offsets
//! from the owning [`Wcs`](crate::Wcs)'s CRPIX, so shifting CRPIX re-anchors it.

pub mod polynomial;

use crate::error::{WcsError, WcsResult};

use polynomial::{newton_raphson_2d, power_term};

const NEWTON_MAX_ITER: usize = 20;
const NEWTON_TOLERANCE: f64 = 1e-12;

/// A dense `(order+1) × (order+1)` coefficient grid indexed `[p][q]`.
///
/// Entries with `p + q > order` are kept at zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SipCoefficients {
    order: usize,
    grid: Vec<f64>,
}

impl SipCoefficients {
    pub fn zeros(order: usize) -> Self {
        Self {
            order,
            grid: vec![0.0; (order + 1) * (order + 1)],
        }
    }

    /// Builds from a square grid; entries above the order diagonal must be zero.
    pub fn from_grid(grid: &[Vec<f64>]) -> WcsResult<Self> {
        let n = grid.len();
        if n == 0 || grid.iter().any(|row| row.len() != n) {
            return Err(WcsError::invalid_parameter(
                "SIP coefficient grid must be square and non-empty",
            ));
        }
        let mut coeffs = Self::zeros(n - 1);
        for (p, row) in grid.iter().enumerate() {
            for (q, &value) in row.iter().enumerate() {
                if value != 0.0 {
                    coeffs.set(p, q, value)?;
                }
            }
        }
        Ok(coeffs)
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn get(&self, p: usize, q: usize) -> f64 {
        if p > self.order || q > self.order {
            return 0.0;
        }
        self.grid[p * (self.order + 1) + q]
    }

    pub fn set(&mut self, p: usize, q: usize, value: f64) -> WcsResult<()> {
        if p + q > self.order {
            return Err(WcsError::invalid_parameter(format!(
                "SIP term ({p}, {q}) exceeds order {}",
                self.order
            )));
        }
        self.grid[p * (self.order + 1) + q] = value;
        Ok(())
    }

    pub fn to_grid(&self) -> Vec<Vec<f64>> {
        (0..=self.order)
            .map(|p| (0..=self.order).map(|q| self.get(p, q)).collect())
            .collect()
    }

    /// Non-zero terms as `(p, q, value)` in row-major order.
    pub fn terms(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.order + 1;
        self.grid
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(move |(k, &v)| (k / n, k % n, v))
    }

    pub fn eval(&self, u: f64, v: f64) -> f64 {
        self.terms().map(|(p, q, c)| c * power_term(u, v, p, q)).sum()
    }

    /// `(∂/∂u, ∂/∂v)` of the polynomial.
    pub fn gradient(&self, u: f64, v: f64) -> (f64, f64) {
        self.terms().fold((0.0, 0.0), |(du, dv), (p, q, c)| {
            let du_term = if p > 0 {
                c * p as f64 * power_term(u, v, p - 1, q)
            } else {
                0.0
            };
            let dv_term = if q > 0 {
                c * q as f64 * power_term(u, v, p, q - 1)
            } else {
                0.0
            };
            (du + du_term, dv + dv_term)
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SipPolynomial {
    a: SipCoefficients,
    b: SipCoefficients,
    ap: Option<SipCoefficients>,
    bp: Option<SipCoefficients>,
}

impl SipPolynomial {
    pub fn new(a: SipCoefficients, b: SipCoefficients) -> Self {
        Self {
            a,
            b,
            ap: None,
            bp: None,
        }
    }

    /// Attaches reverse (AP, BP) coefficients used as the inverse starting point.
    pub fn with_inverse(mut self, ap: SipCoefficients, bp: SipCoefficients) -> Self {
        self.ap = Some(ap);
        self.bp = Some(bp);
        self
    }

    pub fn a(&self) -> &SipCoefficients {
        &self.a
    }

    pub fn b(&self) -> &SipCoefficients {
        &self.b
    }

    pub fn ap(&self) -> Option<&SipCoefficients> {
        self.ap.as_ref()
    }

    pub fn bp(&self) -> Option<&SipCoefficients> {
        self.bp.as_ref()
    }

    pub fn order(&self) -> usize {
        self.a.order().max(self.b.order())
    }

    /// Distorted offsets `(u + f, v + g)` for CRPIX-relative `(u, v)`.
    #[inline]
    pub fn distort(&self, u: f64, v: f64) -> (f64, f64) {
        (u + self.a.eval(u, v), v + self.b.eval(u, v))
    }

    /// Recovers `(u, v)` from distorted offsets.
    pub fn undistort(&self, u: f64, v: f64) -> WcsResult<(f64, f64)> {
        let guess = match (&self.ap, &self.bp) {
            (Some(ap), Some(bp)) => (u + ap.eval(u, v), v + bp.eval(u, v)),
            _ => (u, v),
        };
        newton_raphson_2d(
            (u, v),
            guess,
            |x, y| {
                let (fu, fv) = self.a.gradient(x, y);
                let (gu, gv) = self.b.gradient(x, y);
                (self.distort(x, y), [[1.0 + fu, fv], [gu, 1.0 + gv]])
            },
            NEWTON_MAX_ITER,
            NEWTON_TOLERANCE,
        )
        .map_err(|e| WcsError::convergence_failure(format!("SIP inverse: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic() -> SipPolynomial {
        let mut a = SipCoefficients::zeros(2);
        a.set(2, 0, 1e-6).unwrap();
        a.set(1, 1, -2e-6).unwrap();
        let mut b = SipCoefficients::zeros(2);
        b.set(0, 2, 3e-6).unwrap();
        SipPolynomial::new(a, b)
    }

    #[test]
    fn test_zero_grid_is_identity() {
        let sip = SipPolynomial::new(SipCoefficients::zeros(3), SipCoefficients::zeros(3));
        assert_eq!(sip.distort(12.0, -7.0), (12.0, -7.0));
    }

    #[test]
    fn test_forward_matches_hand_evaluation() {
        let (u, v) = (100.0, 50.0);
        let (du, dv) = quadratic().distort(u, v);
        assert_eq!(du, u + 1e-6 * u * u - 2e-6 * u * v);
        assert_eq!(dv, v + 3e-6 * v * v);
    }

    #[test]
    fn test_terms_beyond_order_are_rejected() {
        let mut a = SipCoefficients::zeros(2);
        assert!(a.set(2, 1, 1.0).is_err());
        assert!(a.set(0, 2, 1.0).is_ok());
    }

    #[test]
    fn test_grid_roundtrip_keeps_layout() {
        let grid = vec![
            vec![0.0, 0.0, 4.0],
            vec![0.0, 5.0, 0.0],
            vec![6.0, 0.0, 0.0],
        ];
        let coeffs = SipCoefficients::from_grid(&grid).unwrap();
        assert_eq!(coeffs.order(), 2);
        assert_eq!(coeffs.get(0, 2), 4.0);
        assert_eq!(coeffs.get(2, 0), 6.0);
        assert_eq!(coeffs.to_grid(), grid);
        let terms: Vec<_> = coeffs.terms().collect();
        assert_eq!(terms, vec![(0, 2, 4.0), (1, 1, 5.0), (2, 0, 6.0)]);
    }

    #[test]
    fn test_non_square_grid_is_rejected() {
        assert!(SipCoefficients::from_grid(&[vec![0.0, 1.0]]).is_err());
        assert!(SipCoefficients::from_grid(&[]).is_err());
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let sip = quadratic();
        let (u, v, h) = (80.0, -40.0, 1e-4);
        let (gu, gv) = sip.a().gradient(u, v);
        let fd_u = (sip.a().eval(u + h, v) - sip.a().eval(u - h, v)) / (2.0 * h);
        let fd_v = (sip.a().eval(u, v + h) - sip.a().eval(u, v - h)) / (2.0 * h);
        assert!((gu - fd_u).abs() < 1e-9);
        assert!((gv - fd_v).abs() < 1e-9);
    }

    #[test]
    fn test_inverse_without_reverse_coefficients() {
        let sip = quadratic();
        let (du, dv) = sip.distort(150.0, -90.0);
        let (u, v) = sip.undistort(du, dv).unwrap();
        assert!((u - 150.0).abs() < 1e-10);
        assert!((v + 90.0).abs() < 1e-10);
    }

    #[test]
    fn test_inverse_starts_from_reverse_coefficients() {
        let mut a = SipCoefficients::zeros(2);
        a.set(1, 0, 1e-5).unwrap();
        let mut b = SipCoefficients::zeros(2);
        b.set(0, 1, 1e-5).unwrap();
        let mut ap = SipCoefficients::zeros(2);
        ap.set(1, 0, -1e-5).unwrap();
        let mut bp = SipCoefficients::zeros(2);
        bp.set(0, 1, -1e-5).unwrap();
        let sip = SipPolynomial::new(a, b).with_inverse(ap, bp);

        let (du, dv) = sip.distort(50.0, 50.0);
        let (u, v) = sip.undistort(du, dv).unwrap();
        assert!((u - 50.0).abs() < 1e-10);
        assert!((v - 50.0).abs() < 1e-10);
    }
}
