use std::fmt;
use std::iter::Sum;

use serde::{Deserialize, Serialize};

/// A non-negative monetary value in the smallest unit of the currency
/// (wei-scale). Callers are responsible for converting display-formatted
/// values into this unit before reaching the engine.
///
/// `Amount` is unsigned and only exposes checked arithmetic: an aggregate
/// can never silently go negative or wrap.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// The raw value in smallest units.
    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }
}

impl Sum for Amount {
    /// Sums by saturating; callers that must detect overflow use
    /// `checked_add` in a fold instead.
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        Amount(iter.fold(0u128, |acc, a| acc.saturating_add(a.0)))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl From<u128> for Amount {
    fn from(raw: u128) -> Self {
        Amount(raw)
    }
}
