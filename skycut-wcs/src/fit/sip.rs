use skycut_core::utils::wrap_residual;
use tracing::debug;

use super::solver::{LeastSquares, Residuals};
use super::Samples;
use crate::coordinate::CelestialCoord;
use crate::distortion::polynomial::power_term;
use crate::distortion::{SipCoefficients, SipPolynomial};
use crate::error::WcsResult;
use crate::wcs::Wcs;

/// Free `(p, q)` terms of a degree-`d` SIP polynomial: `2 ≤ p + q ≤ d`, row-major.
pub(crate) fn sip_terms(degree: usize) -> Vec<(usize, usize)> {
    (0..=degree)
        .flat_map(|p| (0..=degree).map(move |q| (p, q)))
        .filter(|&(p, q)| (2..=degree).contains(&(p + q)))
        .collect()
}

/// Plane residuals for `[crpix1, crpix2, cd11, cd12, cd21, cd22, A…, B…]`.
struct SipProblem<'a> {
    x: &'a [f64],
    y: &'a [f64],
    plane: Vec<(f64, f64)>,
    terms: Vec<(usize, usize)>,
}

impl SipProblem<'_> {
    fn polynomial(&self, coeffs: &[f64], u: f64, v: f64) -> f64 {
        self.terms
            .iter()
            .zip(coeffs)
            .map(|(&(p, q), c)| c * power_term(u, v, p, q))
            .sum()
    }
}

impl Residuals for SipProblem<'_> {
    fn num_residuals(&self) -> usize {
        2 * self.plane.len()
    }

    fn evaluate(&self, p: &[f64]) -> WcsResult<Vec<f64>> {
        let n = self.plane.len();
        let t = self.terms.len();
        let (a, b) = p[6..].split_at(t);
        let mut residuals = vec![0.0; 2 * n];
        for k in 0..n {
            let u = self.x[k] - p[0];
            let v = self.y[k] - p[1];
            let du = u + self.polynomial(a, u, v);
            let dv = v + self.polynomial(b, u, v);
            let (px, py) = self.plane[k];
            residuals[k] = wrap_residual(px - (p[2] * du + p[3] * dv));
            residuals[n + k] = wrap_residual(py - (p[4] * du + p[5] * dv));
        }
        Ok(residuals)
    }
}

pub(crate) fn fit_sip<S: LeastSquares>(
    solver: &S,
    linear: &Wcs,
    samples: &Samples<'_>,
    degree: usize,
) -> WcsResult<Wcs> {
    let plane = samples
        .lon
        .iter()
        .zip(&samples.lat)
        .map(|(&lon, &lat)| {
            linear
                .celestial_to_intermediate(CelestialCoord::new(lon, lat))
                .map(|i| (i.x_deg(), i.y_deg()))
        })
        .collect::<WcsResult<Vec<_>>>()?;

    let terms = sip_terms(degree);
    let t = terms.len();
    let [crpix1, crpix2] = linear.crpix();
    let cd = linear.cd();

    let mut initial = vec![0.0; 6 + 2 * t];
    initial[..6].copy_from_slice(&[crpix1 - 1.0, crpix2 - 1.0, cd[0][0], cd[0][1], cd[1][0], cd[1][1]]);

    let problem = SipProblem {
        x: samples.x,
        y: samples.y,
        plane,
        terms,
    };
    let solution = solver.minimize(&problem, &initial, None)?;
    let p = &solution.params;
    debug!(degree, cost = solution.cost, iterations = solution.iterations, "SIP stage done");

    let mut a = SipCoefficients::zeros(degree);
    let mut b = SipCoefficients::zeros(degree);
    for (i, &(pi, qi)) in problem.terms.iter().enumerate() {
        a.set(pi, qi, p[6 + i])?;
        b.set(pi, qi, p[6 + t + i])?;
    }

    Ok(linear
        .with_linear([p[0] + 1.0, p[1] + 1.0], [[p[2], p[3]], [p[4], p[5]]])?
        .with_sip(Some(SipPolynomial::new(a, b))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WcsBuilder;
    use crate::fit::solver::{Bounds, Solution, Termination};
    use crate::transform::PixelTransform;
    use std::cell::Cell;

    /// Returns the initial guess and remembers whether bounds were passed.
    #[derive(Default)]
    struct RecordingSolver {
        bounded: Cell<Option<bool>>,
    }

    impl LeastSquares for RecordingSolver {
        fn minimize<R: Residuals + ?Sized>(
            &self,
            _problem: &R,
            initial: &[f64],
            bounds: Option<&Bounds>,
        ) -> WcsResult<Solution> {
            self.bounded.set(Some(bounds.is_some()));
            Ok(Solution {
                params: initial.to_vec(),
                cost: 0.0,
                iterations: 0,
                termination: Termination::ZeroCost,
            })
        }
    }

    #[test]
    fn test_sip_stage_leaves_crpix_unbounded() {
        let linear = WcsBuilder::new()
            .crpix(50.0, 40.0)
            .crval(150.0, 2.0)
            .cd_matrix([[-1e-3, 0.0], [0.0, 1e-3]])
            .proj_code("TAN")
            .build()
            .unwrap();
        let x = [0.0, 20.0, 45.0, 70.0, 99.0, 10.0, 60.0, 85.0];
        let y = [0.0, 70.0, 35.0, 10.0, 79.0, 50.0, 65.0, 20.0];
        let (lon, lat): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(&y)
            .map(|(&px, &py)| linear.pixel_to_world(px, py).unwrap())
            .unzip();
        let samples = Samples { x: &x, y: &y, lon, lat };

        let solver = RecordingSolver::default();
        let fitted = fit_sip(&solver, &linear, &samples, 2).unwrap();
        assert_eq!(solver.bounded.get(), Some(false));
        assert_eq!(fitted.crpix(), linear.crpix());
        assert!(fitted.sip().is_some());
    }

    #[test]
    fn test_term_layout() {
        assert_eq!(sip_terms(2), vec![(0, 2), (1, 1), (2, 0)]);
        assert_eq!(sip_terms(3).len(), 7);
        assert!(sip_terms(1).is_empty());
        assert_eq!(sip_terms(9).len(), 52);
    }
}
