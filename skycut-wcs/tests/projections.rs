use std::str::FromStr;

use skycut_core::assert_close;
use skycut_wcs::{ProjectionCode, Wcs, WcsBuilder, WcsError, PROJECTION_CODES};

fn wcs_for(code: ProjectionCode) -> Result<Wcs, WcsError> {
    let mut builder = WcsBuilder::new()
        .crpix(32.5, 32.5)
        .crval(30.0, 20.0)
        .cd_matrix([[-0.01, 0.002], [0.001, 0.01]])
        .projection(code);
    if code.is_conic() {
        builder = builder.pv(1, 45.0).pv(2, 10.0);
    }
    if code == ProjectionCode::Bon {
        builder = builder.pv(1, 30.0);
    }
    builder.build()
}

#[test]
fn test_every_implemented_projection_roundtrips_pixels() {
    for name in PROJECTION_CODES {
        let code = ProjectionCode::from_str(name).unwrap();
        // CSC is a polynomial approximation with no exact inverse.
        if matches!(code, ProjectionCode::Xph | ProjectionCode::Csc) {
            continue;
        }
        let wcs = wcs_for(code).unwrap();
        let (lon0, lat0) = wcs.pix2world(32.5, 32.5).unwrap();
        assert_close!(lon0, 30.0, 1e-9, "{name} reference lon");
        assert_close!(lat0, 20.0, 1e-9, "{name} reference lat");

        for &(x, y) in &[(1.0, 1.0), (64.0, 10.0), (20.0, 50.5), (40.0, 33.0)] {
            let (lon, lat) = wcs.pix2world(x, y).unwrap();
            let (x2, y2) = wcs.world2pix(lon, lat).unwrap();
            assert_close!(x2, x, 1e-6, "{name} x at ({x}, {y})");
            assert_close!(y2, y, 1e-6, "{name} y at ({x}, {y})");
        }
    }
}

#[test]
fn test_xph_is_reported_as_unsupported() {
    let err = wcs_for(ProjectionCode::Xph).unwrap_err();
    assert!(matches!(err, WcsError::UnsupportedProjection { .. }));
}

#[test]
fn test_csc_roundtrip_is_approximate() {
    let wcs = wcs_for(ProjectionCode::Csc).unwrap();
    let (lon, lat) = wcs.pix2world(40.0, 20.0).unwrap();
    let (x, y) = wcs.world2pix(lon, lat).unwrap();
    assert!((x - 40.0).abs() < 2.0);
    assert!((y - 20.0).abs() < 2.0);
}
