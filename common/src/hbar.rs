//! Native currency amounts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tinybars per hbar.
pub const TINYBARS_PER_HBAR: i64 = 100_000_000;

/// Native currency amount, stored in tinybars.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hbar(i64);

impl Hbar {
    /// Zero hbar.
    pub const ZERO: Hbar = Hbar(0);

    /// Whole hbars.
    pub const fn new(hbars: i64) -> Self {
        Self(hbars.saturating_mul(TINYBARS_PER_HBAR))
    }

    /// Amount in tinybars.
    pub const fn from_tinybars(tinybars: i64) -> Self {
        Self(tinybars)
    }

    /// Amount in tinybars.
    pub const fn to_tinybars(self) -> i64 {
        self.0
    }

    /// Amount in hbars, truncated toward zero.
    pub const fn to_hbars(self) -> i64 {
        self.0 / TINYBARS_PER_HBAR
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: Hbar) -> Option<Hbar> {
        self.0.checked_sub(other.0).map(Hbar)
    }

    /// Checked addition.
    pub fn checked_add(self, other: Hbar) -> Option<Hbar> {
        self.0.checked_add(other.0).map(Hbar)
    }
}

impl fmt::Display for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % TINYBARS_PER_HBAR == 0 {
            write!(f, "{} ℏ", self.to_hbars())
        } else {
            write!(f, "{} tℏ", self.0)
        }
    }
}

impl fmt::Debug for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hbar({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Hbar::new(2).to_tinybars(), 200_000_000);
        assert_eq!(Hbar::from_tinybars(150_000_000).to_hbars(), 1);
        assert!(Hbar::new(10) > Hbar::from_tinybars(999_999_999));
    }

    #[test]
    fn test_display() {
        assert_eq!(Hbar::new(5).to_string(), "5 ℏ");
        assert_eq!(Hbar::from_tinybars(42).to_string(), "42 tℏ");
    }
}
