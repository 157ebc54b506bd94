mod drops;
mod helpers;
mod token_units;

pub mod op;
mod secret;

pub use drops::{drops_to_display, display_to_drops, AmountError, Drops, DROPS_PER_XRP, XRP_CURRENCY_CODE};
pub use helpers::{is_all_digits, parse_boolean_flag};
pub use secret::Secret;
pub use token_units::{TokenScale, DEFAULT_TOKEN_SCALE, MAX_TOKEN_SCALE};
