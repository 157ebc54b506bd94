pub mod api_objects;
pub mod errors;
pub mod issuance_api;
pub mod listener;
pub mod optin_api;
pub mod settlement_api;
