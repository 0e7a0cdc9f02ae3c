//! Float comparison helpers shared by the workspace test suites.

#[inline]
pub fn f64_to_ordered_u64(x: f64) -> u64 {
    let bits = x.to_bits();
    if bits & 0x8000_0000_0000_0000 != 0 {
        !bits
    } else {
        bits | 0x8000_0000_0000_0000
    }
}

#[inline]
pub fn ulp_diff(a: f64, b: f64) -> u64 {
    f64_to_ordered_u64(a).abs_diff(f64_to_ordered_u64(b))
}

#[track_caller]
pub fn assert_ulp_le(a: f64, b: f64, max_ulp: u64, ctx: &str) {
    if a == 0.0 && b == 0.0 {
        return;
    }
    assert!(
        a.is_finite() && b.is_finite(),
        "non-finite value in {}",
        ctx
    );
    let d = ulp_diff(a, b);
    assert!(
        d <= max_ulp,
        "{}: ULP={} exceeds {}, a={} b={}",
        ctx,
        d,
        max_ulp,
        a,
        b
    );
}

/// Asserts `|a - b| <= tol`, reporting both values on failure.
#[track_caller]
pub fn assert_close(a: f64, b: f64, tol: f64, ctx: &str) {
    assert!(
        (a - b).abs() <= tol,
        "{}: |{} - {}| = {:e} exceeds {:e}",
        ctx,
        a,
        b,
        (a - b).abs(),
        tol
    );
}

#[macro_export]
macro_rules! assert_ulp_lt {
    ($a:expr, $b:expr, $max_ulp:expr) => {
        $crate::test_helpers::assert_ulp_le(
            $a,
            $b,
            $max_ulp,
            &format!(
                "ULP check failed: {} vs {} (max_ulp={})",
                stringify!($a),
                stringify!($b),
                $max_ulp
            ),
        )
    };
    ($a:expr, $b:expr, $max_ulp:expr, $($arg:tt)*) => {
        $crate::test_helpers::assert_ulp_le($a, $b, $max_ulp, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! assert_close {
    ($a:expr, $b:expr, $tol:expr) => {
        $crate::test_helpers::assert_close(
            $a,
            $b,
            $tol,
            &format!("{} vs {}", stringify!($a), stringify!($b)),
        )
    };
    ($a:expr, $b:expr, $tol:expr, $($arg:tt)*) => {
        $crate::test_helpers::assert_close($a, $b, $tol, &format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_floats_are_one_ulp_apart() {
        let a = 1.0_f64;
        let b = f64::from_bits(a.to_bits() + 1);
        assert_eq!(ulp_diff(a, b), 1);
    }

    #[test]
    fn test_ulp_distance_spans_zero() {
        let tiny = f64::from_bits(1);
        assert_eq!(ulp_diff(tiny, -tiny), 3);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn test_close_assert_reports_failure() {
        assert_close!(1.0, 1.1, 1e-3);
    }
}
