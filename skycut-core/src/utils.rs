//! Small angle helpers used across the workspace.
//!
//! | Function | Input | Output Range |
//! |----------|-------|--------------|
//! | [`normalize_longitude`] | degrees | (-180°, 180°] |
//! | [`normalize_longitude_positive`] | degrees | [0°, 360°) |
//! | [`wrap_residual`] | degrees | longitude residual with the 360° branch cut removed |

/// Normalizes longitude to the range (-180°, 180°].
#[inline]
pub fn normalize_longitude(lon: f64) -> f64 {
    let mut normalized = lon % 360.0;
    if normalized > 180.0 {
        normalized -= 360.0;
    } else if normalized <= -180.0 {
        normalized += 360.0;
    }
    normalized
}

/// Normalizes longitude to the range [0°, 360°).
#[inline]
pub fn normalize_longitude_positive(lon: f64) -> f64 {
    let mut normalized = lon % 360.0;
    if normalized < 0.0 {
        normalized += 360.0;
    }
    if normalized >= 360.0 {
        normalized = 0.0;
    }
    normalized
}

/// Removes the 0°/360° branch cut from a fit residual.
///
/// A residual above 180° has 360° subtracted and one below -180° has 360° added.
/// Residuals already inside [-180°, 180°] are returned unchanged.
///
/// ```
/// use skycut_core::utils::wrap_residual;
///
/// assert_eq!(wrap_residual(359.5), -0.5);
/// assert_eq!(wrap_residual(-359.5), 0.5);
/// assert_eq!(wrap_residual(12.0), 12.0);
/// ```
#[inline]
pub fn wrap_residual(residual: f64) -> f64 {
    if residual > 180.0 {
        residual - 360.0
    } else if residual < -180.0 {
        residual + 360.0
    } else {
        residual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_longitude_range() {
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(-180.0), 180.0);
        assert_eq!(normalize_longitude(540.0), 180.0);
    }

    #[test]
    fn test_normalize_longitude_positive_range() {
        assert_eq!(normalize_longitude_positive(-10.0), 350.0);
        assert_eq!(normalize_longitude_positive(370.0), 10.0);
        assert_eq!(normalize_longitude_positive(0.0), 0.0);
        assert_eq!(normalize_longitude_positive(-1e-20), 0.0);
    }

    #[test]
    fn test_residual_wrapping_only_touches_branch_cut() {
        assert_eq!(wrap_residual(180.0), 180.0);
        assert_eq!(wrap_residual(-180.0), -180.0);
        assert_eq!(wrap_residual(200.0), -160.0);
        assert_eq!(wrap_residual(-200.0), 160.0);
    }
}
