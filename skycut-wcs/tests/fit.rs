use skycut_core::{assert_close, Frame, SkyCoord, SkyCoords};
use skycut_wcs::fit::{fit_wcs_from_points, LevenbergMarquardt, ProjectionPoint, ProjectionSpec, SolverConfig, WcsFitter};
use skycut_wcs::{CoordType, PixelTransform, ProjectionCode, SipCoefficients, SipPolynomial, Wcs, WcsBuilder, WcsError};

const CRVAL: [f64; 2] = [150.0, 2.2];
const CD: [[f64; 2]; 2] = [[-2.8e-4, 1.0e-5], [1.2e-5, 2.8e-4]];

fn truth(code: &str) -> Wcs {
    WcsBuilder::new()
        .crpix(55.0, 48.0)
        .crval(CRVAL[0], CRVAL[1])
        .cd_matrix(CD)
        .proj_code(code)
        .build()
        .unwrap()
}

fn grid() -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for i in 0..=10 {
        for j in 0..=10 {
            xs.push(i as f64 * 10.0);
            ys.push(j as f64 * 10.0);
        }
    }
    (xs, ys)
}

fn observe(wcs: &Wcs, xs: &[f64], ys: &[f64], frame: Frame) -> SkyCoords {
    let (lon, lat) = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| wcs.pixel_to_world(x, y).unwrap())
        .unzip();
    SkyCoords::new(lon, lat, frame).unwrap()
}

fn reference_point() -> ProjectionPoint {
    ProjectionPoint::Point(SkyCoord::icrs(CRVAL[0], CRVAL[1]))
}

#[test]
fn test_linear_fit_recovers_crval_crpix_and_cd() {
    let truth = truth("TAN");
    let (xs, ys) = grid();
    let world = observe(&truth, &xs, &ys, Frame::Icrs);

    let fitted = fit_wcs_from_points(
        (&xs, &ys),
        &world,
        reference_point(),
        ProjectionSpec::from("TAN"),
        None,
    )
    .unwrap();

    assert_eq!(fitted.crval(), CRVAL);
    assert_close!(fitted.crpix()[0], 55.0, 1e-6);
    assert_close!(fitted.crpix()[1], 48.0, 1e-6);
    for (row, expected) in fitted.cd().iter().zip(CD) {
        for (&a, b) in row.iter().zip(expected) {
            assert_close!(a, b, 1e-8 * b.abs(), "cd {a} vs {b}");
        }
    }
    assert_eq!(fitted.ctype(), ["RA---TAN".to_string(), "DEC--TAN".to_string()]);
    assert_eq!(fitted.radesys(), Some("ICRS"));
    assert!(fitted.sip().is_none());
}

#[test]
fn test_center_reference_reproduces_positions() {
    let truth = truth("TAN");
    let (xs, ys) = grid();
    let world = observe(&truth, &xs, &ys, Frame::Icrs);

    let fitted = fit_wcs_from_points(
        (&xs, &ys),
        &world,
        ProjectionPoint::Center,
        ProjectionSpec::default(),
        Some(0),
    )
    .unwrap();

    for (k, (&x, &y)) in xs.iter().zip(&ys).enumerate() {
        let (lon, lat) = fitted.pixel_to_world(x, y).unwrap();
        assert_close!(lon, world.lon_deg()[k], 1e-8);
        assert_close!(lat, world.lat_deg()[k], 1e-8);
    }
}

#[test]
fn test_sip_fit_recovers_distortion() {
    let mut a = SipCoefficients::zeros(2);
    a.set(2, 0, 5e-6).unwrap();
    a.set(1, 1, -3e-6).unwrap();
    a.set(0, 2, 2e-6).unwrap();
    let mut b = SipCoefficients::zeros(2);
    b.set(2, 0, -1e-6).unwrap();
    b.set(1, 1, 4e-6).unwrap();
    b.set(0, 2, 1.5e-6).unwrap();
    let truth = truth("TAN").with_sip(Some(SipPolynomial::new(a.clone(), b.clone())));

    let (xs, ys) = grid();
    let world = observe(&truth, &xs, &ys, Frame::Icrs);

    let fitted = fit_wcs_from_points(
        (&xs, &ys),
        &world,
        reference_point(),
        ProjectionSpec::from("TAN"),
        Some(2),
    )
    .unwrap();

    let sip = fitted.sip().expect("SIP attached");
    for p in 0..=2 {
        for q in 0..=2 - p {
            assert_close!(sip.a().get(p, q), a.get(p, q), 1e-10, "A_{p}_{q}");
            assert_close!(sip.b().get(p, q), b.get(p, q), 1e-10, "B_{p}_{q}");
        }
    }
    assert_close!(fitted.crpix()[0], 55.0, 1e-5);
    assert_close!(fitted.crpix()[1], 48.0, 1e-5);
    for (row, expected) in fitted.cd().iter().zip(CD) {
        for (&v, e) in row.iter().zip(expected) {
            assert_close!(v, e, 1e-7 * e.abs());
        }
    }
    assert_eq!(fitted.ctype(), ["RA---TAN-SIP".to_string(), "DEC--TAN-SIP".to_string()]);
}

#[test]
fn test_template_fit_keeps_projection_parameters() {
    let truth = WcsBuilder::new()
        .crpix(40.0, 60.0)
        .crval(210.0, -45.0)
        .cd_matrix([[-1e-3, 0.0], [0.0, 1e-3]])
        .projection(ProjectionCode::Sin)
        .pv(1, 0.1)
        .pv(2, -0.05)
        .build()
        .unwrap();
    let template = WcsBuilder::new()
        .crpix(1.0, 1.0)
        .crval(0.0, 0.0)
        .cd_matrix([[-9e-4, 0.0], [0.0, 9e-4]])
        .projection(ProjectionCode::Sin)
        .pv(1, 0.1)
        .pv(2, -0.05)
        .build()
        .unwrap();

    let (xs, ys) = grid();
    let world = observe(&truth, &xs, &ys, Frame::Icrs);
    let fitted = fit_wcs_from_points(
        (&xs, &ys),
        &world,
        ProjectionPoint::Point(SkyCoord::icrs(210.0, -45.0)),
        ProjectionSpec::Template(template),
        None,
    )
    .unwrap();

    assert_eq!(fitted.projection_code(), ProjectionCode::Sin);
    assert_eq!(fitted.pv().get(1), Some(0.1));
    assert_close!(fitted.crpix()[0], 40.0, 1e-6);
    assert_close!(fitted.crpix()[1], 60.0, 1e-6);
}

#[test]
fn test_galactic_input_gives_galactic_axes() {
    let truth = WcsBuilder::new()
        .crpix(50.0, 50.0)
        .crval(120.0, 10.0)
        .cd_matrix([[-5e-4, 0.0], [0.0, 5e-4]])
        .proj_code("CAR")
        .coord_type(CoordType::Galactic)
        .build()
        .unwrap();
    let (xs, ys) = grid();
    let world = observe(&truth, &xs, &ys, Frame::Galactic);

    let fitted = fit_wcs_from_points(
        (&xs, &ys),
        &world,
        ProjectionPoint::Point(SkyCoord::new(120.0, 10.0, Frame::Galactic).unwrap()),
        ProjectionSpec::from("CAR"),
        None,
    )
    .unwrap();

    assert_eq!(fitted.coord_type(), CoordType::Galactic);
    assert_eq!(fitted.ctype()[0], "GLON-CAR");
    assert_close!(fitted.crpix()[0], 50.0, 1e-6);
}

#[test]
fn test_iteration_cap_surfaces_as_convergence_failure() {
    let truth = truth("TAN");
    let (xs, ys) = grid();
    let world = observe(&truth, &xs, &ys, Frame::Icrs);

    let fitter = WcsFitter::with_solver(LevenbergMarquardt::new(
        SolverConfig::default().with_max_iterations(1),
    ));
    let err = fitter
        .fit(
            (&xs, &ys),
            &world,
            ProjectionPoint::Center,
            ProjectionSpec::from("TAN"),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, WcsError::ConvergenceFailure { .. }));
}
