//! The rebalancing primitive shared by flexing and update absorption.

use std::cmp::Ordering;

use crate::error::Result;
use crate::scale::{INFER_TOTAL, Size, rescale, total};

/// Absorb `delta` into `sizes`, respecting `mins` when shrinking.
///
/// Growth (`delta > 0`) is spread proportionally to the current sizes and is
/// always fully absorbed. Shrinking (`delta < 0`) only takes from the
/// surplus above each floor; when the surplus runs out the shortfall is
/// returned (always `<= 0`). Items already under their floor are lifted back
/// to it, and that lift is accounted for in the returned shortfall.
///
/// With no sizes to absorb into, the whole delta comes back unabsorbed.
pub fn rebalance(sizes: &mut [Size], mins: &[Size], delta: Size) -> Result<Size> {
    debug_assert_eq!(sizes.len(), mins.len(), "one floor per size");

    match delta.cmp(&0) {
        Ordering::Equal => Ok(0),
        Ordering::Greater => {
            if sizes.is_empty() {
                return Ok(delta);
            }
            let mut growth = sizes.to_vec();
            rescale(&mut growth, INFER_TOTAL, delta)?;
            for (size, grow) in sizes.iter_mut().zip(growth) {
                *size += grow;
            }
            Ok(0)
        }
        Ordering::Less => {
            let mut surpluses: Vec<Size> = sizes
                .iter()
                .zip(mins)
                .map(|(size, min)| size - min)
                .collect();
            let old_surplus = total(&surpluses);
            let mut new_surplus = old_surplus + delta;
            let mut remainder = 0;
            if new_surplus < 0 {
                remainder = new_surplus;
                new_surplus = 0;
            }
            tracing::debug!(delta, old_surplus, new_surplus, remainder, "shrinking");

            rescale(&mut surpluses, old_surplus, new_surplus)?;
            for ((size, min), surplus) in sizes.iter_mut().zip(mins).zip(surpluses) {
                *size = min + surplus;
            }
            Ok(remainder)
        }
    }
}
