mod xrpl;

pub use xrpl::XrplLedger;
