mod helpers;
mod issuance;
mod mocks;
mod optin;
mod sales;
