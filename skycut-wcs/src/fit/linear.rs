use nalgebra::{DMatrix, DVector};
use skycut_core::utils::wrap_residual;
use tracing::debug;

use super::solver::{Bounds, LeastSquares, Residuals};
use super::Samples;
use crate::coordinate::{CelestialCoord, IntermediateCoord};
use crate::error::WcsResult;
use crate::wcs::Wcs;

const CD_FALLBACK_EPSILON: f64 = 1e-15;

/// Sky residuals for `[cd11, cd12, cd21, cd22, crpix1, crpix2]` with 0-based CRPIX.
struct LinearProblem<'a> {
    wcs: &'a Wcs,
    samples: &'a Samples<'a>,
}

impl Residuals for LinearProblem<'_> {
    fn num_residuals(&self) -> usize {
        2 * self.samples.len()
    }

    fn evaluate(&self, p: &[f64]) -> WcsResult<Vec<f64>> {
        let n = self.samples.len();
        let mut residuals = vec![0.0; 2 * n];
        for k in 0..n {
            let dx = self.samples.x[k] - p[4];
            let dy = self.samples.y[k] - p[5];
            let inter = IntermediateCoord::new(p[0] * dx + p[1] * dy, p[2] * dx + p[3] * dy);
            let sky = self.wcs.intermediate_to_celestial(inter)?;
            residuals[k] = wrap_residual(self.samples.lon[k] - sky.lon_deg());
            residuals[n + k] = wrap_residual(self.samples.lat[k] - sky.lat_deg());
        }
        Ok(residuals)
    }
}

pub(crate) fn fit_linear<S: LeastSquares>(
    solver: &S,
    skeleton: &Wcs,
    samples: &Samples<'_>,
    crpix0: [f64; 2],
    seed_cd: bool,
) -> WcsResult<Wcs> {
    let cd = if seed_cd {
        seed_cd_matrix(skeleton, samples, crpix0)?
    } else {
        skeleton.cd()
    };

    let [(x_lo, x_hi), (y_lo, y_hi)] = samples.crpix_bounds();
    let mut bounds = Bounds::unbounded(6);
    bounds.set(4, x_lo, x_hi)?;
    bounds.set(5, y_lo, y_hi)?;

    let initial = [cd[0][0], cd[0][1], cd[1][0], cd[1][1], crpix0[0], crpix0[1]];
    let problem = LinearProblem {
        wcs: skeleton,
        samples,
    };
    let solution = solver.minimize(&problem, &initial, Some(&bounds))?;
    let p = &solution.params;
    debug!(cost = solution.cost, iterations = solution.iterations, "linear stage done");

    skeleton.with_linear([p[4] + 1.0, p[5] + 1.0], [[p[0], p[1]], [p[2], p[3]]])
}

/// Least-squares CD from projection-plane coordinates against offsets from `crpix0`.
fn seed_cd_matrix(skeleton: &Wcs, samples: &Samples<'_>, crpix0: [f64; 2]) -> WcsResult<[[f64; 2]; 2]> {
    let n = samples.len();
    let mut offsets = DMatrix::zeros(n, 2);
    let mut plane_x = DVector::zeros(n);
    let mut plane_y = DVector::zeros(n);
    for k in 0..n {
        let inter = skeleton
            .celestial_to_intermediate(CelestialCoord::new(samples.lon[k], samples.lat[k]))?;
        offsets[(k, 0)] = samples.x[k] - crpix0[0];
        offsets[(k, 1)] = samples.y[k] - crpix0[1];
        plane_x[k] = inter.x_deg();
        plane_y[k] = inter.y_deg();
    }

    let svd = offsets.svd(true, true);
    let rows = svd
        .solve(&plane_x, CD_FALLBACK_EPSILON)
        .and_then(|r1| svd.solve(&plane_y, CD_FALLBACK_EPSILON).map(|r2| (r1, r2)));
    let cd = match rows {
        Ok((r1, r2)) => [[r1[0], r1[1]], [r2[0], r2[1]]],
        Err(_) => [[1.0, 0.0], [0.0, 1.0]],
    };

    let det = cd[0][0] * cd[1][1] - cd[0][1] * cd[1][0];
    if !det.is_finite() || det.abs() < CD_FALLBACK_EPSILON {
        debug!("degenerate seed CD, starting from the identity");
        return Ok([[1.0, 0.0], [0.0, 1.0]]);
    }
    Ok(cd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WcsBuilder;
    use crate::fit::solver::LevenbergMarquardt;
    use crate::transform::PixelTransform;

    fn truth() -> Wcs {
        WcsBuilder::new()
            .crpix(21.0, 31.0)
            .crval(45.0, 30.0)
            .cd_matrix([[-2e-3, 1e-4], [2e-4, 2e-3]])
            .proj_code("TAN")
            .build()
            .unwrap()
    }

    #[test]
    fn test_seed_matches_exact_matrix_when_crpix_is_right() {
        let truth = truth();
        let xs: Vec<f64> = (0..6).flat_map(|i| (0..6).map(move |_| i as f64 * 8.0)).collect();
        let ys: Vec<f64> = (0..6).flat_map(|_| (0..6).map(|j| j as f64 * 8.0)).collect();
        let (lon, lat): (Vec<f64>, Vec<f64>) = xs
            .iter()
            .zip(&ys)
            .map(|(&x, &y)| truth.pixel_to_world(x, y).unwrap())
            .unzip();
        let samples = Samples {
            x: &xs,
            y: &ys,
            lon,
            lat,
        };
        let cd = seed_cd_matrix(&truth, &samples, [20.0, 30.0]).unwrap();
        for (row, expected) in cd.iter().zip(truth.cd()) {
            for (a, b) in row.iter().zip(expected) {
                assert!((a - b).abs() < 1e-12, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_linear_fit_recovers_matrix() {
        let truth = truth();
        let xs: Vec<f64> = (0..6).flat_map(|i| (0..6).map(move |_| i as f64 * 8.0)).collect();
        let ys: Vec<f64> = (0..6).flat_map(|_| (0..6).map(|j| j as f64 * 8.0)).collect();
        let (lon, lat): (Vec<f64>, Vec<f64>) = xs
            .iter()
            .zip(&ys)
            .map(|(&x, &y)| truth.pixel_to_world(x, y).unwrap())
            .unzip();
        let samples = Samples {
            x: &xs,
            y: &ys,
            lon,
            lat,
        };
        let skeleton = truth.with_linear([17.0, 27.0], [[1.0, 0.0], [0.0, 1.0]]).unwrap();
        let fitted =
            fit_linear(&LevenbergMarquardt::default(), &skeleton, &samples, [16.0, 26.0], true)
                .unwrap();
        assert!((fitted.crpix()[0] - 21.0).abs() < 1e-6);
        assert!((fitted.crpix()[1] - 31.0).abs() < 1e-6);
    }
}
