//! Safe arithmetic primitives
//!
//! Every function here is total: it takes numbers or loosely typed input plus a
//! caller-supplied fallback, and never panics, divides by zero, or returns a
//! non-finite value. All numeric work in the reducer goes through this module.

/// Binary operation understood by [`safe_op`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Values that may or may not hold a usable number
///
/// Implemented for plain floats, strings as returned by providers, and
/// optional wrappers of either.
pub trait Numeric {
    /// Returns the value as a finite `f64`, or `None` if it is not one
    fn to_finite(&self) -> Option<f64>;
}

impl Numeric for f64 {
    fn to_finite(&self) -> Option<f64> {
        self.is_finite().then_some(*self)
    }
}

impl Numeric for u64 {
    fn to_finite(&self) -> Option<f64> {
        (*self as f64).to_finite()
    }
}

impl Numeric for str {
    fn to_finite(&self) -> Option<f64> {
        let trimmed = self.trim();
        let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
        trimmed.parse::<f64>().ok()?.to_finite()
    }
}

impl Numeric for String {
    fn to_finite(&self) -> Option<f64> {
        self.as_str().to_finite()
    }
}

impl<T: Numeric + ?Sized> Numeric for &T {
    fn to_finite(&self) -> Option<f64> {
        (**self).to_finite()
    }
}

impl<T: Numeric> Numeric for Option<T> {
    fn to_finite(&self) -> Option<f64> {
        self.as_ref().and_then(Numeric::to_finite)
    }
}

/// Applies `op` to `a` and `b`, returning `fallback` instead of any
/// non-finite operand, zero divisor, or non-finite result.
pub fn safe_op(op: SafeOp, a: f64, b: f64, fallback: f64) -> f64 {
    if !a.is_finite() || !b.is_finite() {
        return fallback;
    }

    let result = match op {
        SafeOp::Add => a + b,
        SafeOp::Sub => a - b,
        SafeOp::Mul => a * b,
        SafeOp::Div | SafeOp::Mod if b == 0.0 => return fallback,
        SafeOp::Div => a / b,
        SafeOp::Mod => a % b,
    };

    if result.is_finite() {
        result
    } else {
        fallback
    }
}

/// Parses a finite number out of `value`
pub fn parse_number<N: Numeric + ?Sized>(value: &N) -> Option<f64> {
    value.to_finite()
}

/// Returns true if `value` holds a finite number
pub fn is_valid_number<N: Numeric + ?Sized>(value: &N) -> bool {
    value.to_finite().is_some()
}

/// Parses a percentage, returning `default` when the input is not finite
pub fn parse_percentage<N: Numeric + ?Sized>(value: &N, default: f64) -> f64 {
    value.to_finite().unwrap_or(default)
}

/// Parses a finite, non-negative number
///
/// Logs a warning tagged with `label` when the value is rejected.
pub fn parse_non_negative<N: Numeric + ?Sized>(value: &N, label: &str) -> Option<f64> {
    match value.to_finite() {
        // abs() folds -0.0 into 0.0
        Some(n) if n >= 0.0 => Some(n.abs()),
        other => {
            tracing::warn!(label = label, parsed = ?other, "Rejected non-finite or negative value");
            None
        }
    }
}

/// Rounds to `decimals` places
pub fn round(value: f64, decimals: u32, fallback: f64) -> f64 {
    let Ok(exp) = i32::try_from(decimals) else {
        return fallback;
    };
    let factor = 10f64.powi(exp);
    let scaled = safe_op(SafeOp::Mul, value, factor, f64::NAN);
    safe_op(SafeOp::Div, scaled.round(), factor, fallback)
}

/// Clamps `value` into `[min, max]`; NaN maps to `min`
///
/// Unlike `f64::clamp` this never panics, even if `min > max`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

/// `value` as a percentage of `total`
pub fn calculate_percentage(value: f64, total: f64, fallback: f64) -> f64 {
    if total == 0.0 {
        return fallback;
    }
    safe_op(SafeOp::Mul, safe_op(SafeOp::Div, value, total, 0.0), 100.0, fallback)
}

/// Applies `percentage` percent to `value`
pub fn apply_percentage(value: f64, percentage: f64, fallback: f64) -> f64 {
    safe_op(SafeOp::Mul, value, safe_op(SafeOp::Div, percentage, 100.0, 0.0), fallback)
}

/// 1 basis point = 0.01%
pub fn basis_points_to_percent(basis_points: f64, fallback: f64) -> f64 {
    safe_op(SafeOp::Div, basis_points, 10_000.0, fallback)
}

pub fn percent_to_basis_points(percent: f64, fallback: f64) -> f64 {
    safe_op(SafeOp::Mul, percent, 10_000.0, fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OPS: [SafeOp; 5] = [SafeOp::Add, SafeOp::Sub, SafeOp::Mul, SafeOp::Div, SafeOp::Mod];

    #[test]
    fn test_division_by_zero_returns_fallback() {
        for a in [0.0, 1.0, -3.5, 1e300, f64::MIN_POSITIVE] {
            assert_eq!(safe_op(SafeOp::Div, a, 0.0, 7.0), 7.0);
            assert_eq!(safe_op(SafeOp::Mod, a, 0.0, 7.0), 7.0);
            assert_eq!(safe_op(SafeOp::Div, a, -0.0, 7.0), 7.0);
        }
    }

    #[test]
    fn test_non_finite_operands_return_fallback() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            for op in ALL_OPS {
                assert_eq!(safe_op(op, bad, 2.0, -1.0), -1.0);
                assert_eq!(safe_op(op, 2.0, bad, -1.0), -1.0);
            }
        }
    }

    #[test]
    fn test_overflow_returns_fallback() {
        assert_eq!(safe_op(SafeOp::Mul, f64::MAX, 2.0, 0.0), 0.0);
        assert_eq!(safe_op(SafeOp::Add, f64::MAX, f64::MAX, 3.0), 3.0);
        assert_eq!(safe_op(SafeOp::Div, 1e300, 1e-300, 5.0), 5.0);
    }

    #[test]
    fn test_regular_operations() {
        assert_eq!(safe_op(SafeOp::Add, 2.0, 3.0, 0.0), 5.0);
        assert_eq!(safe_op(SafeOp::Sub, 2.0, 3.0, 0.0), -1.0);
        assert_eq!(safe_op(SafeOp::Mul, 2.0, 3.0, 0.0), 6.0);
        assert_eq!(safe_op(SafeOp::Div, 3.0, 2.0, 0.0), 1.5);
        assert_eq!(safe_op(SafeOp::Mod, 7.0, 4.0, 0.0), 3.0);
    }

    #[test]
    fn test_parsing() {
        assert_eq!(parse_number("0.0044"), Some(0.0044));
        assert_eq!(parse_number(" 12 "), Some(12.0));
        assert_eq!(parse_number("1.39%"), Some(1.39));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(&None::<String>), None);
        assert_eq!(parse_number(&Some(2.5)), Some(2.5));
        assert!(is_valid_number("-4"));
        assert!(!is_valid_number(&f64::INFINITY));
    }

    #[test]
    fn test_parse_percentage_defaults() {
        assert_eq!(parse_percentage("-2.75", 0.0), -2.75);
        assert_eq!(parse_percentage("", 9.0), 9.0);
        assert_eq!(parse_percentage(&f64::NAN, 9.0), 9.0);
    }

    #[test]
    fn test_parse_non_negative() {
        assert_eq!(parse_non_negative("0", "price"), Some(0.0));
        assert_eq!(parse_non_negative("0.004377", "price"), Some(0.004377));
        assert_eq!(parse_non_negative("-1", "price"), None);
        assert_eq!(parse_non_negative("Infinity", "price"), None);
        assert_eq!(parse_non_negative("n/a", "price"), None);
    }

    #[test]
    fn test_round() {
        assert_eq!(round(14.872000000000002, 2, 0.0), 14.87);
        assert_eq!(round(1.005, 0, 0.0), 1.0);
        assert_eq!(round(-2.5, 0, 0.0), -3.0);
        assert_eq!(round(f64::NAN, 2, 4.0), 4.0);
        assert_eq!(round(f64::MAX, 10, 4.0), 4.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
        assert_eq!(clamp(f64::NAN, 0.0, 1.0), 0.0);
        assert_eq!(clamp(f64::INFINITY, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_percentages_and_basis_points() {
        assert_eq!(calculate_percentage(25.0, 200.0, 0.0), 12.5);
        assert_eq!(calculate_percentage(25.0, 0.0, -1.0), -1.0);
        assert_eq!(apply_percentage(200.0, 10.0, 0.0), 20.0);
        assert_eq!(basis_points_to_percent(150.0, 0.0), 0.015);
        assert_eq!(percent_to_basis_points(0.015, 0.0), 150.0);
        assert_eq!(percent_to_basis_points(f64::NAN, 1.0), 1.0);
    }
}
