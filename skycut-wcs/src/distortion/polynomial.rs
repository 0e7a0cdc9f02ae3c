use crate::error::{WcsError, WcsResult};

#[inline]
pub fn power_term(u: f64, v: f64, p: usize, q: usize) -> f64 {
    u.powi(p as i32) * v.powi(q as i32)
}

/// Solves `f(x, y) = target` by Newton–Raphson.
///
/// `f` returns the value and its Jacobian `[[∂fx/∂x, ∂fx/∂y], [∂fy/∂x, ∂fy/∂y]]`.
pub fn newton_raphson_2d<F>(
    target: (f64, f64),
    initial_guess: (f64, f64),
    f: F,
    max_iter: usize,
    tolerance: f64,
) -> WcsResult<(f64, f64)>
where
    F: Fn(f64, f64) -> ((f64, f64), [[f64; 2]; 2]),
{
    let (tx, ty) = target;
    let (mut x, mut y) = initial_guess;

    for _ in 0..max_iter {
        let ((fx, fy), jac) = f(x, y);
        let (rx, ry) = (fx - tx, fy - ty);
        if rx.abs() < tolerance && ry.abs() < tolerance {
            return Ok((x, y));
        }
        let (dx, dy) = solve_2x2(jac, rx, ry)?;
        x -= dx;
        y -= dy;
    }

    let ((fx, fy), _) = f(x, y);
    if (fx - tx).abs() < tolerance && (fy - ty).abs() < tolerance {
        return Ok((x, y));
    }
    Err(WcsError::convergence_failure(format!(
        "Newton-Raphson did not reach {tolerance:e} in {max_iter} iterations"
    )))
}

fn solve_2x2(m: [[f64; 2]; 2], b1: f64, b2: f64) -> WcsResult<(f64, f64)> {
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    if det.abs() < 1e-15 {
        return Err(WcsError::singularity("singular Jacobian in Newton-Raphson"));
    }
    Ok((
        (m[1][1] * b1 - m[0][1] * b2) / det,
        (m[0][0] * b2 - m[1][0] * b1) / det,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_term_values() {
        assert_eq!(power_term(2.0, 3.0, 0, 0), 1.0);
        assert_eq!(power_term(2.0, 3.0, 2, 1), 12.0);
    }

    #[test]
    fn test_newton_inverts_a_quadratic_map() {
        let f = |x: f64, y: f64| {
            (
                (x + 0.1 * x * x, y + 0.05 * x * y),
                [[1.0 + 0.2 * x, 0.0], [0.05 * y, 1.0 + 0.05 * x]],
            )
        };
        let target = f(1.5, -2.0).0;
        let (x, y) = newton_raphson_2d(target, target, f, 20, 1e-12).unwrap();
        assert!((x - 1.5).abs() < 1e-10);
        assert!((y + 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_singular_jacobian_is_reported() {
        let f = |_: f64, _: f64| ((1.0, 1.0), [[0.0, 0.0], [0.0, 0.0]]);
        let err = newton_raphson_2d((0.0, 0.0), (0.0, 0.0), f, 5, 1e-12).unwrap_err();
        assert!(matches!(err, WcsError::Singularity { .. }));
    }
}
