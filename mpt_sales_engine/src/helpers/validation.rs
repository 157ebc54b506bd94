use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static CLASSIC_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^r[1-9A-HJ-NP-Za-km-z]{25,34}$").expect("address regex is valid"));
static ISSUANCE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F-]{8,}$").expect("issuance regex is valid"));
static TX_HASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Fa-f0-9]{64}$").expect("hash regex is valid"));
static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("uuid regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Invalid XRPL address: {0}")]
    InvalidAddress(String),
    #[error("Invalid MPT issuance id: {0}")]
    InvalidIssuanceId(String),
    #[error("Invalid transaction hash: {0}")]
    InvalidHash(String),
    #[error("Invalid uuid: {0}")]
    InvalidUuid(String),
    #[error("Amount must be a non-negative integer string: {0}")]
    AmountNotInteger(String),
    #[error("Amount must be > 0")]
    AmountIsZero,
    #[error("{0} required")]
    MissingField(&'static str),
}

pub fn assert_address(addr: &str) -> Result<(), InputError> {
    if CLASSIC_ADDRESS.is_match(addr) {
        Ok(())
    } else {
        Err(InputError::InvalidAddress(addr.to_string()))
    }
}

pub fn assert_issuance_id(id: &str) -> Result<(), InputError> {
    if ISSUANCE_ID.is_match(id) {
        Ok(())
    } else {
        Err(InputError::InvalidIssuanceId(id.to_string()))
    }
}

pub fn assert_tx_hash(hash: &str) -> Result<(), InputError> {
    if TX_HASH.is_match(hash) {
        Ok(())
    } else {
        Err(InputError::InvalidHash(hash.to_string()))
    }
}

pub fn assert_uuid(uuid: &str) -> Result<(), InputError> {
    if UUID.is_match(uuid) {
        Ok(())
    } else {
        Err(InputError::InvalidUuid(uuid.to_string()))
    }
}

/// A whole, strictly positive number of token units.
pub fn assert_whole_amount(v: &str) -> Result<(), InputError> {
    if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InputError::AmountNotInteger(v.to_string()));
    }
    if v.bytes().all(|b| b == b'0') {
        return Err(InputError::AmountIsZero);
    }
    Ok(())
}
