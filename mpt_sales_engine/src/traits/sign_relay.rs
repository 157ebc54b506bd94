use ledger_tools::{data_objects::TxJson, PayloadStatus, SignRequestResponse, XummApi, XummError};

/// A service that forwards transactions to a user's wallet for signing.
#[allow(async_fn_in_trait)]
pub trait SignRelay: Clone {
    async fn create_sign_request(
        &self,
        txjson: &TxJson,
        expires_in: Option<u64>,
    ) -> Result<SignRequestResponse, XummError>;

    async fn payload_status(&self, uuid: &str) -> Result<PayloadStatus, XummError>;
}

impl SignRelay for XummApi {
    async fn create_sign_request(
        &self,
        txjson: &TxJson,
        expires_in: Option<u64>,
    ) -> Result<SignRequestResponse, XummError> {
        XummApi::create_sign_request(self, txjson, expires_in).await
    }

    async fn payload_status(&self, uuid: &str) -> Result<PayloadStatus, XummError> {
        XummApi::payload_status(self, uuid).await
    }
}
