//! Fixed-point proportional rescaling.
//!
//! Every sibling group stores its sizes as integers that sum to [`NORMAL`].
//! [`rescale`] maps a vector between two totals while keeping the sum exact:
//! values are floored and the flooring loss is handed back one unit at a time,
//! earliest element first.

use crate::error::{InvariantViolation, Result};

/// Size of an item in scale units.
pub type Size = i64;

/// The fixed total every group's sizes sum to.
pub const NORMAL: Size = 1000;

/// Passing this as `old_total` asks [`rescale`] to infer it from the values.
pub const INFER_TOTAL: Size = 0;

/// Sum a slice of sizes.
#[must_use]
pub fn total(values: &[Size]) -> Size {
    values.iter().sum()
}

/// Fail unless `values` sums to `expected`.
pub fn check_scale(values: &[Size], expected: Size) -> Result<()> {
    let actual = total(values);
    if actual != expected {
        return Err(InvariantViolation::ScaleMismatch { expected, actual });
    }
    Ok(())
}

/// Rescale `values` in place from `old_total` to `new_total`.
///
/// `old_total == INFER_TOTAL` infers the old total from the current sum.
/// Any other claimed total must match the sum exactly.
///
/// The result always sums to `new_total`. Elements are floored first; the
/// remaining units are spread cyclically starting at index 0, so earlier
/// elements win ties. A vector summing to zero carries no proportions, so
/// the new total is spread evenly by the same rule.
pub fn rescale(values: &mut [Size], old_total: Size, new_total: Size) -> Result<()> {
    let actual = total(values);
    let old_total = if old_total == INFER_TOTAL {
        actual
    } else {
        check_scale(values, old_total)?;
        old_total
    };

    if values.is_empty() {
        if new_total == 0 {
            return Ok(());
        }
        return Err(InvariantViolation::EmptyScale { target: new_total });
    }

    tracing::trace!(old_total, new_total, len = values.len(), "rescaling");

    if old_total == 0 {
        values.fill(0);
    } else {
        for value in values.iter_mut() {
            *value = floor_div(
                i128::from(*value) * i128::from(new_total),
                i128::from(old_total),
            ) as Size;
        }
    }

    let remainder = new_total - total(values);
    distribute(values, remainder);
    Ok(())
}

/// Spread `remainder` cyclically over `values`, starting at index 0.
fn distribute(values: &mut [Size], remainder: Size) {
    let len = values.len() as Size;
    if len == 0 || remainder == 0 {
        return;
    }
    let base = remainder.div_euclid(len);
    let extra = remainder.rem_euclid(len) as usize;
    for (i, value) in values.iter_mut().enumerate() {
        *value += base + Size::from(i < extra);
    }
}

fn floor_div(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    if numerator % denominator != 0 && ((numerator < 0) != (denominator < 0)) {
        quotient - 1
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_exact_sum_with_front_bias() {
        let mut values = vec![1, 1, 1];
        rescale(&mut values, 3, NORMAL).unwrap();
        assert_eq!(values, vec![334, 333, 333]);
    }

    #[test]
    fn rescale_infers_old_total() {
        let mut values = vec![640, 1280];
        rescale(&mut values, INFER_TOTAL, NORMAL).unwrap();
        assert_eq!(values, vec![334, 666]);
        check_scale(&values, NORMAL).unwrap();
    }

    #[test]
    fn rescale_rejects_wrong_claimed_total() {
        let mut values = vec![10, 20];
        let err = rescale(&mut values, 40, NORMAL).unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::ScaleMismatch {
                expected: 40,
                actual: 30
            }
        );
        // Untouched on failure.
        assert_eq!(values, vec![10, 20]);
    }

    #[test]
    fn rescale_down_to_zero() {
        let mut values = vec![400, 100];
        rescale(&mut values, 500, 0).unwrap();
        assert_eq!(values, vec![0, 0]);
    }

    #[test]
    fn rescale_zero_total_spreads_evenly() {
        let mut values = vec![0, 0, 0];
        rescale(&mut values, INFER_TOTAL, 10).unwrap();
        assert_eq!(values, vec![4, 3, 3]);
    }

    #[test]
    fn rescale_empty() {
        let mut values: Vec<Size> = Vec::new();
        rescale(&mut values, INFER_TOTAL, 0).unwrap();
        assert_eq!(
            rescale(&mut values, INFER_TOTAL, NORMAL).unwrap_err(),
            InvariantViolation::EmptyScale { target: NORMAL }
        );
    }

    #[test]
    fn rescale_handles_negative_entries() {
        // Surpluses can dip below zero when an item sits under its floor.
        let mut values = vec![-50, 150];
        rescale(&mut values, 100, 33).unwrap();
        assert_eq!(total(&values), 33);
        assert_eq!(values, vec![-16, 49]);
    }

    #[test]
    fn check_scale_reports_actual() {
        assert!(check_scale(&[500, 500], NORMAL).is_ok());
        assert_eq!(
            check_scale(&[500, 499], NORMAL).unwrap_err(),
            InvariantViolation::ScaleMismatch {
                expected: NORMAL,
                actual: 999
            }
        );
    }
}
