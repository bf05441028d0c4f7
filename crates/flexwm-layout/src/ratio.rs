//! Rational approximations converted onto the fixed-point scale.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scale::{NORMAL, Size, rescale};

/// Fractional approximation of the golden ratio: `fib(44) / fib(45)`.
pub const GOLDEN_RATIO: Ratio = Ratio::new(1_134_903_170, 1_836_311_903);

/// A fraction `dividend / divisor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[Size; 2]", into = "[Size; 2]")]
pub struct Ratio {
    pub dividend: Size,
    pub divisor: Size,
}

impl Ratio {
    #[must_use]
    pub const fn new(dividend: Size, divisor: Size) -> Self {
        Self { dividend, divisor }
    }

    /// The dividend as if the divisor were [`NORMAL`].
    ///
    /// The pair `(dividend, divisor - dividend)` is rescaled together, so
    /// the dividend picks up the first rounding unit.
    pub fn normalize(self) -> Result<Size> {
        let mut pair = [self.dividend, self.divisor - self.dividend];
        rescale(&mut pair, self.divisor, NORMAL)?;
        Ok(pair[0])
    }
}

impl From<[Size; 2]> for Ratio {
    fn from([dividend, divisor]: [Size; 2]) -> Self {
        Self::new(dividend, divisor)
    }
}

impl From<Ratio> for [Size; 2] {
    fn from(ratio: Ratio) -> Self {
        [ratio.dividend, ratio.divisor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_ratio_rounds_up() {
        // 618.03 floors to 618, the complement floors to 381, and the lost
        // unit goes to the dividend.
        assert_eq!(GOLDEN_RATIO.normalize().unwrap(), 619);
    }

    #[test]
    fn simple_fractions() {
        assert_eq!(Ratio::new(9, 10).normalize().unwrap(), 900);
        assert_eq!(Ratio::new(1, 2).normalize().unwrap(), 500);
        assert_eq!(Ratio::new(1, 10).normalize().unwrap(), 100);
        assert_eq!(Ratio::new(1, 20).normalize().unwrap(), 50);
        assert_eq!(Ratio::new(1, 3).normalize().unwrap(), 334);
    }

    #[test]
    fn serde_as_pair() {
        let ratio: Ratio = serde_json::from_str("[1, 20]").unwrap();
        assert_eq!(ratio, Ratio::new(1, 20));
        assert_eq!(serde_json::to_string(&ratio).unwrap(), "[1,20]");
    }
}
