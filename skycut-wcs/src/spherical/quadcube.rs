//! Quad-cube projections: tangential (TSC), COBE (CSC) and quadrilateralized
//! spherical cube (QSC).
//!
//! The sphere is projected onto six cube faces laid out in the plane as
//!
//! ```text
//!       0
//!       1  2  3  4
//!       5
//! ```
//!
//! with face 1 centred on the origin and each face 90° wide.

use skycut_core::constants::SQRT2;

use super::asin_safe;
use crate::error::{WcsError, WcsResult};

/// Face centres in the plane, in degrees.
const FACE_CENTRES: [(f64, f64); 6] = [
    (0.0, 90.0),
    (0.0, 0.0),
    (90.0, 0.0),
    (180.0, 0.0),
    (270.0, 0.0),
    (0.0, -90.0),
];

/// Direction cosines (l, m, n) → face frame (ξ, η, ζ).
fn to_face(face: usize, l: f64, m: f64, n: f64) -> (f64, f64, f64) {
    match face {
        0 => (m, -l, n),
        1 => (m, n, l),
        2 => (-l, n, m),
        3 => (-m, n, -l),
        4 => (l, n, -m),
        _ => (m, l, -n),
    }
}

/// Face frame (ξ, η, ζ) → direction cosines (l, m, n).
fn from_face(face: usize, xi: f64, eta: f64, zeta: f64) -> (f64, f64, f64) {
    match face {
        0 => (-eta, xi, zeta),
        1 => (zeta, xi, eta),
        2 => (-xi, zeta, eta),
        3 => (-zeta, -xi, eta),
        4 => (xi, -zeta, eta),
        _ => (eta, xi, -zeta),
    }
}

/// Picks the face the native direction points through, returning (face, ξ, η, ζ).
fn select_face(phi: f64, theta: f64) -> (usize, f64, f64, f64) {
    let (st, ct) = theta.to_radians().sin_cos();
    let (sp, cp) = phi.to_radians().sin_cos();
    let (l, m, n) = (ct * cp, ct * sp, st);
    let face = [n, l, m, -l, -m, -n]
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &z)| {
            if z > best.1 {
                (i, z)
            } else {
                best
            }
        })
        .0;
    let (xi, eta, zeta) = to_face(face, l, m, n);
    (face, xi, eta, zeta)
}

/// Locates the face containing a plane point, returning (face, x − x_c, y − y_c).
fn locate_face(x: f64, y: f64, code: &str) -> WcsResult<(usize, f64, f64)> {
    let mut x = x;
    if x < -45.0 {
        x += 360.0;
    }
    let face = if y > 45.0 {
        0
    } else if y < -45.0 {
        5
    } else if x < 45.0 {
        1
    } else if x < 135.0 {
        2
    } else if x < 225.0 {
        3
    } else {
        4
    };
    let (xc, yc) = FACE_CENTRES[face];
    let (dx, dy) = (x - xc, y - yc);
    if dx.abs() > 45.0 + 1e-10 || dy.abs() > 45.0 + 1e-10 {
        return Err(WcsError::out_of_bounds(format!(
            "{code}: ({x}, {y}) lies outside the cube faces"
        )));
    }
    Ok((face, dx, dy))
}

fn to_native(face: usize, xi: f64, eta: f64, zeta: f64) -> (f64, f64) {
    let (l, m, n) = from_face(face, xi, eta, zeta);
    let phi = if l == 0.0 && m == 0.0 {
        0.0
    } else {
        m.atan2(l).to_degrees()
    };
    (phi, asin_safe(n).to_degrees())
}

fn offset(face: usize, dx: f64, dy: f64) -> (f64, f64) {
    let (xc, yc) = FACE_CENTRES[face];
    (xc + dx, yc + dy)
}

pub(crate) fn project_tsc(phi: f64, theta: f64) -> (f64, f64) {
    let (face, xi, eta, zeta) = select_face(phi, theta);
    offset(face, 45.0 * xi / zeta, 45.0 * eta / zeta)
}

pub(crate) fn deproject_tsc(x: f64, y: f64) -> WcsResult<(f64, f64)> {
    let (face, dx, dy) = locate_face(x, y, "TSC")?;
    let (chi, psi) = (dx / 45.0, dy / 45.0);
    let zeta = 1.0 / (1.0 + chi * chi + psi * psi).sqrt();
    Ok(to_native(face, chi * zeta, psi * zeta, zeta))
}

fn csc_forward(chi: f64, psi: f64) -> f64 {
    const GAMMA_STAR: f64 = 1.37484847732;
    const M: f64 = 0.004869491981;
    const GAMMA: f64 = -0.13161671474;
    const OMEGA_1: f64 = -0.159596235474;
    const C: [[f64; 3]; 3] = [
        [0.141189631152, -0.281528535557, 0.106959469314],
        [0.0809701286525, 0.15384112876, 0.0],
        [-0.178251207466, 0.0, 0.0],
    ];
    const D: [f64; 2] = [0.0759196200467, -0.0217762490699];

    let (x2, y2) = (chi * chi, psi * psi);
    let mut sum_c = 0.0;
    for (i, row) in C.iter().enumerate() {
        for (j, c) in row.iter().take(3 - i).enumerate() {
            sum_c += c * x2.powi(i as i32) * y2.powi(j as i32);
        }
    }
    let sum_d = D[0] + D[1] * x2;

    chi * GAMMA_STAR
        + chi * x2 * (1.0 - GAMMA_STAR)
        + chi * y2 * (1.0 - x2) * (GAMMA + (M - GAMMA) * x2 + (1.0 - y2) * sum_c)
        + chi * x2 * (1.0 - x2) * (OMEGA_1 - (1.0 - x2) * sum_d)
}

fn csc_inverse(x: f64, y: f64) -> f64 {
    // P[i][j] multiplies X^2i Y^2j
    const P: [[f64; 7]; 7] = [
        [
            -0.27292696,
            -0.02819452,
            0.27058160,
            -0.60441560,
            0.93412077,
            -0.63915306,
            0.14381585,
        ],
        [
            -0.07629969,
            -0.01471565,
            -0.56800938,
            1.50880086,
            -1.41601920,
            0.52032238,
            0.0,
        ],
        [
            -0.22797056,
            0.48051509,
            0.30803317,
            -0.93678576,
            0.33887446,
            0.0,
            0.0,
        ],
        [0.54852384, -1.74114454, 0.98938102, 0.08693841, 0.0, 0.0, 0.0],
        [-0.62930065, 1.71547508, -0.83180469, 0.0, 0.0, 0.0, 0.0],
        [0.25795794, -0.53022337, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.02584375, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    ];

    let (x2, y2) = (x * x, y * y);
    let sum: f64 = P
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            row.iter()
                .take(7 - i)
                .enumerate()
                .map(move |(j, p)| p * x2.powi(i as i32) * y2.powi(j as i32))
        })
        .sum();
    x + x * (1.0 - x2) * sum
}

pub(crate) fn project_csc(phi: f64, theta: f64) -> (f64, f64) {
    let (face, xi, eta, zeta) = select_face(phi, theta);
    let (chi, psi) = (xi / zeta, eta / zeta);
    offset(
        face,
        45.0 * csc_forward(chi, psi),
        45.0 * csc_forward(psi, chi),
    )
}

pub(crate) fn deproject_csc(x: f64, y: f64) -> WcsResult<(f64, f64)> {
    let (face, dx, dy) = locate_face(x, y, "CSC")?;
    let (u, v) = (dx / 45.0, dy / 45.0);
    let (chi, psi) = (csc_inverse(u, v), csc_inverse(v, u));
    let zeta = 1.0 / (1.0 + chi * chi + psi * psi).sqrt();
    Ok(to_native(face, chi * zeta, psi * zeta, zeta))
}

/// Forward QSC on one face for the dominant component `major` and the other `minor`.
///
/// Returns (u, v) in degrees, `u` along the dominant axis.
fn qsc_face(major: f64, minor: f64, zeta: f64) -> (f64, f64) {
    if major == 0.0 {
        return (0.0, 0.0);
    }
    let omega = minor / major;
    let u = 45.0_f64.copysign(major)
        * ((1.0 - zeta) / (1.0 - 1.0 / (2.0 + omega * omega).sqrt())).sqrt();
    let v = u / 15.0
        * (omega.atan() - asin_safe(omega / (2.0 * (1.0 + omega * omega)).sqrt())).to_degrees();
    (u, v)
}

pub(crate) fn project_qsc(phi: f64, theta: f64) -> (f64, f64) {
    let (face, xi, eta, zeta) = select_face(phi, theta);
    if xi.abs() >= eta.abs() {
        let (u, v) = qsc_face(xi, eta, zeta);
        offset(face, u, v)
    } else {
        let (u, v) = qsc_face(eta, xi, zeta);
        offset(face, v, u)
    }
}

/// Inverse of [`qsc_face`], returning (major, minor, ζ).
fn qsc_unface(u: f64, v: f64) -> (f64, f64, f64) {
    if u == 0.0 {
        return (0.0, 0.0, 1.0);
    }
    let t = (15.0 * v / u).to_radians();
    let omega = t.sin() / (t.cos() - 1.0 / SQRT2);
    let zeta = 1.0 - (u / 45.0).powi(2) * (1.0 - 1.0 / (2.0 + omega * omega).sqrt());
    let major = ((1.0 - zeta * zeta).max(0.0) / (1.0 + omega * omega))
        .sqrt()
        .copysign(u);
    (major, omega * major, zeta)
}

pub(crate) fn deproject_qsc(x: f64, y: f64) -> WcsResult<(f64, f64)> {
    let (face, dx, dy) = locate_face(x, y, "QSC")?;
    let (xi, eta, zeta) = if dx.abs() >= dy.abs() {
        qsc_unface(dx, dy)
    } else {
        let (eta, xi, zeta) = qsc_unface(dy, dx);
        (xi, eta, zeta)
    };
    Ok(to_native(face, xi, eta, zeta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faces_are_chosen_by_largest_direction_cosine() {
        assert_eq!(select_face(0.0, 0.0).0, 1);
        assert_eq!(select_face(90.0, 0.0).0, 2);
        assert_eq!(select_face(180.0, 0.0).0, 3);
        assert_eq!(select_face(-90.0, 0.0).0, 4);
        assert_eq!(select_face(0.0, 80.0).0, 0);
        assert_eq!(select_face(0.0, -80.0).0, 5);
    }

    #[test]
    fn test_face_centres_map_to_layout() {
        for (phi, theta, expected) in [
            (0.0, 90.0, (0.0, 90.0)),
            (90.0, 0.0, (90.0, 0.0)),
            (180.0, 0.0, (180.0, 0.0)),
            (-90.0, 0.0, (270.0, 0.0)),
            (0.0, -90.0, (0.0, -90.0)),
        ] {
            let (x, y) = project_tsc(phi, theta);
            assert!((x - expected.0).abs() < 1e-10, "x {x} for ({phi}, {theta})");
            assert!((y - expected.1).abs() < 1e-10, "y {y} for ({phi}, {theta})");
        }
    }

    #[test]
    fn test_qsc_face_corner_reaches_45_degrees() {
        let s = 1.0 / 3.0f64.sqrt();
        let (u, v) = qsc_face(s, s, s);
        assert!((u - 45.0).abs() < 1e-9);
        assert!((v - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_qsc_roundtrip_on_every_face() {
        for &(phi, theta) in &[
            (10.0, 70.0),
            (20.0, -10.0),
            (100.0, 30.0),
            (-170.0, 5.0),
            (-80.0, -30.0),
            (-45.0, -75.0),
        ] {
            let (x, y) = project_qsc(phi, theta);
            let (p, t) = deproject_qsc(x, y).unwrap();
            assert!((p - phi).abs() < 1e-9, "phi {p} vs {phi}");
            assert!((t - theta).abs() < 1e-9, "theta {t} vs {theta}");
        }
    }

    #[test]
    fn test_tsc_roundtrip_across_the_wrap() {
        let (x, y) = project_tsc(-60.0, 10.0);
        assert!(x > 225.0);
        let (p, t) = deproject_tsc(x - 360.0, y).unwrap();
        assert!((p + 60.0).abs() < 1e-9);
        assert!((t - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_csc_is_close_to_inverse() {
        for &(phi, theta) in &[(5.0, 5.0), (30.0, -20.0), (120.0, 10.0)] {
            let (x, y) = project_csc(phi, theta);
            let (p, t) = deproject_csc(x, y).unwrap();
            assert!((p - phi).abs() < 1e-2, "phi {p} vs {phi}");
            assert!((t - theta).abs() < 1e-2, "theta {t} vs {theta}");
        }
    }

    #[test]
    fn test_outside_layout_is_rejected() {
        assert!(deproject_tsc(100.0, 60.0).is_err());
    }
}
