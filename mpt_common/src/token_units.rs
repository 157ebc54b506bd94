use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{helpers::is_all_digits, AmountError};

pub const DEFAULT_TOKEN_SCALE: u8 = 2;
/// u64 cannot hold 10^20, so anything above 19 decimals is rejected.
pub const MAX_TOKEN_SCALE: u8 = 19;

/// The number of decimal places an MPT issuance carries. Ledger amounts are whole units multiplied by 10^scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenScale(u8);

impl Default for TokenScale {
    fn default() -> Self {
        Self(DEFAULT_TOKEN_SCALE)
    }
}

impl Display for TokenScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for TokenScale {
    type Error = AmountError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value > u32::from(MAX_TOKEN_SCALE) {
            return Err(AmountError::InvalidScale(value));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(value as u8))
    }
}

impl TokenScale {
    pub fn value(&self) -> u8 {
        self.0
    }

    fn factor(&self) -> u64 {
        // MAX_TOKEN_SCALE guarantees this fits
        10u64.pow(u32::from(self.0))
    }

    /// Converts a whole number of token units into the ledger's integer amount string.
    pub fn to_ledger_value(&self, units: &str) -> Result<String, AmountError> {
        let units = units.trim();
        if !is_all_digits(units) {
            return Err(AmountError::NotAnInteger(units.to_string()));
        }
        let n = units.parse::<u64>().map_err(|_| AmountError::Overflow(units.to_string()))?;
        n.checked_mul(self.factor()).map(|v| v.to_string()).ok_or_else(|| AmountError::Overflow(units.to_string()))
    }

    /// Converts a raw ledger amount back to whole units, discarding any fractional part.
    /// Unparseable input reads as `"0"`.
    pub fn from_ledger_value(&self, raw: &str) -> String {
        let raw = raw.trim();
        if !is_all_digits(raw) {
            return "0".to_string();
        }
        match raw.parse::<u64>() {
            Ok(v) => (v / self.factor()).to_string(),
            Err(_) => "0".to_string(),
        }
    }
}
