//! The purchase-intent memo carried by a buyer's payment.
//!
//! The memo text is `PAY-CROWN|<issuanceId>|<nonce>|<units>`, hex-encoded into the payment's `MemoData`.
use std::{fmt::Display, str::FromStr};

use ledger_tools::{data_objects::MemoWrapper, decode_hex_utf8, encode_hex_utf8};
use log::*;
use mpt_common::is_all_digits;
use thiserror::Error;

pub const PURCHASE_MEMO_TAG: &str = "PAY-CROWN";
const FIELD_SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseMemo {
    pub issuance_id: String,
    pub nonce: String,
    /// Whole token units, as a decimal digit string.
    pub units: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoError {
    #[error("Memo is not a purchase memo")]
    WrongTag,
    #[error("Purchase memo must have exactly 4 fields, found {0}")]
    WrongFieldCount(usize),
    #[error("Purchase memo has an empty {0}")]
    EmptyField(&'static str),
    #[error("Purchase memo units are not a whole number: {0}")]
    UnitsNotInteger(String),
}

impl PurchaseMemo {
    pub fn new<S: Into<String>>(issuance_id: S, nonce: S, units: S) -> Self {
        Self { issuance_id: issuance_id.into(), nonce: nonce.into(), units: units.into() }
    }

    /// The hex-encoded memo entry to attach to a payment.
    pub fn to_memo(&self) -> MemoWrapper {
        MemoWrapper::with_data(encode_hex_utf8(&self.to_string()))
    }
}

impl Display for PurchaseMemo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{PURCHASE_MEMO_TAG}|{}|{}|{}", self.issuance_id, self.nonce, self.units)
    }
}

impl FromStr for PurchaseMemo {
    type Err = MemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let fields = text.split(FIELD_SEPARATOR).collect::<Vec<&str>>();
        if fields[0] != PURCHASE_MEMO_TAG {
            return Err(MemoError::WrongTag);
        }
        if fields.len() != 4 {
            return Err(MemoError::WrongFieldCount(fields.len()));
        }
        let (issuance_id, nonce, units) = (fields[1], fields[2], fields[3]);
        if issuance_id.is_empty() {
            return Err(MemoError::EmptyField("issuance id"));
        }
        if nonce.is_empty() {
            return Err(MemoError::EmptyField("nonce"));
        }
        if !is_all_digits(units) {
            return Err(MemoError::UnitsNotInteger(units.to_string()));
        }
        Ok(Self::new(issuance_id, nonce, units))
    }
}

/// Finds the first well-formed purchase memo among a transaction's memos.
///
/// Entries that are not valid hex, not UTF-8, not tagged as a purchase, or malformed are skipped.
pub fn parse_purchase_memo(memos: &[MemoWrapper]) -> Option<PurchaseMemo> {
    memos.iter().filter_map(|m| m.memo.memo_data.as_deref()).find_map(|hex| {
        let text = decode_hex_utf8(hex)?;
        let text = text.trim();
        if !text.starts_with(PURCHASE_MEMO_TAG) {
            return None;
        }
        text.parse::<PurchaseMemo>()
            .map_err(|e| debug!("🧾️ Skipping malformed purchase memo '{text}': {e}"))
            .ok()
    })
}
