use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{helpers::is_all_digits, op};

pub const XRP_CURRENCY_CODE: &str = "XRP";
/// The number of drops in one XRP.
pub const DROPS_PER_XRP: u64 = 1_000_000;
const DROPS_DECIMALS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Not a whole number: {0}")]
    NotAnInteger(String),
    #[error("Amount is too large to be represented: {0}")]
    Overflow(String),
    #[error("Token scale {0} is out of range")]
    InvalidScale(u32),
}

//--------------------------------------        Drops        ---------------------------------------------------------
/// An amount of the ledger's native currency, in its smallest indivisible unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Drops(u64);

op!(binary Drops, Add, add);
op!(inplace Drops, AddAssign, add_assign);

impl Sum for Drops {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, d| Self(acc.0.saturating_add(d.0)))
    }
}

impl From<u64> for Drops {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for Drops {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !is_all_digits(s) {
            return Err(AmountError::NotAnInteger(s.to_string()));
        }
        s.parse::<u64>().map(Self).map_err(|_| AmountError::Overflow(s.to_string()))
    }
}

impl Display for Drops {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Drops {
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Converts a whole number of XRP into drops. Fails rather than wrapping on overflow.
    pub fn from_whole_xrp(xrp: u64) -> Result<Self, AmountError> {
        xrp.checked_mul(DROPS_PER_XRP).map(Self).ok_or_else(|| AmountError::Overflow(xrp.to_string()))
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// The display representation in XRP, e.g. `1500000` drops is `"1.5"`.
    pub fn to_display(&self) -> String {
        let whole = self.0 / DROPS_PER_XRP;
        let frac = self.0 % DROPS_PER_XRP;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{frac:0width$}", width = DROPS_DECIMALS);
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }
}

/// Converts a drops digit string into its XRP display string.
pub fn drops_to_display(drops: &str) -> Result<String, AmountError> {
    drops.parse::<Drops>().map(|d| d.to_display())
}

/// Converts a whole XRP digit string into the equivalent number of drops, as a digit string.
pub fn display_to_drops(whole: &str) -> Result<String, AmountError> {
    let whole = whole.trim();
    if !is_all_digits(whole) {
        return Err(AmountError::NotAnInteger(whole.to_string()));
    }
    let xrp = whole.parse::<u64>().map_err(|_| AmountError::Overflow(whole.to_string()))?;
    Drops::from_whole_xrp(xrp).map(|d| d.to_string())
}
