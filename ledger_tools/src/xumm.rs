use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Response,
    StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{data_objects::TxJson, XummConfig, XummError};

pub const XUMM_PAYLOAD_URL: &str = "https://xumm.app/api/v1/platform/payload";
const MAX_ERROR_BODY: usize = 500;

/// QR and status references for a sign request. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignRequestRefs {
    pub qr_png: Option<String>,
    pub qr_svg: Option<String>,
    pub qr_matrix: Option<Vec<Vec<u8>>>,
    pub websocket_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignRequestResponse {
    pub uuid: String,
    pub refs: SignRequestRefs,
    pub next_always: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadStatus {
    pub uuid: String,
    pub resolved: bool,
    pub signed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

#[derive(Deserialize)]
struct CreateWire {
    uuid: Option<String>,
    #[serde(default)]
    refs: SignRequestRefs,
    next: Option<NextWire>,
}

#[derive(Deserialize)]
struct NextWire {
    always: Option<String>,
}

#[derive(Default, Deserialize)]
struct StatusWire {
    meta: Option<StatusMetaWire>,
    response: Option<StatusResponseWire>,
}

#[derive(Default, Deserialize)]
struct StatusMetaWire {
    uuid: Option<String>,
    #[serde(default)]
    resolved: bool,
}

#[derive(Default, Deserialize)]
struct StatusResponseWire {
    #[serde(default)]
    signed: bool,
    txid: Option<String>,
    account: Option<String>,
}

/// REST client for the Xumm (Xaman) payload API, used to ask a holder's wallet to sign a transaction.
#[derive(Clone)]
pub struct XummApi {
    base_url: String,
    client: Arc<Client>,
}

impl XummApi {
    pub fn new(config: XummConfig) -> Result<Self, XummError> {
        Self::with_base_url(config, XUMM_PAYLOAD_URL)
    }

    pub fn with_base_url(config: XummConfig, base_url: &str) -> Result<Self, XummError> {
        if !config.has_credentials() {
            return Err(XummError::MissingCredentials);
        }
        let mut headers = HeaderMap::with_capacity(3);
        let key = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| XummError::Initialization(e.to_string()))?;
        let secret = HeaderValue::from_str(config.api_secret.reveal().as_str())
            .map_err(|e| XummError::Initialization(e.to_string()))?;
        headers.insert("X-API-Key", key);
        headers.insert("X-API-Secret", secret);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| XummError::Initialization(e.to_string()))?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), client: Arc::new(client) })
    }

    /// Creates a sign request for `txjson`. The signed transaction is submitted by the wallet.
    pub async fn create_sign_request(
        &self,
        txjson: &TxJson,
        expires_in: Option<u64>,
    ) -> Result<SignRequestResponse, XummError> {
        let mut body = json!({ "txjson": txjson, "options": { "submit": true } });
        if let Some(expire) = expires_in {
            body["options"]["expire"] = expire.into();
        }
        trace!("📲️ Creating sign request for {:?}", txjson.transaction_type);
        let response = self.client.post(&self.base_url).json(&body).send().await.map_err(request_error)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = truncated_text(response).await;
            return Err(XummError::QueryError { status, message });
        }
        let wire = response.json::<CreateWire>().await.map_err(|e| XummError::JsonError(e.to_string()))?;
        let uuid = wire.uuid.ok_or(XummError::MissingField("uuid"))?;
        let next_always = wire.next.and_then(|n| n.always).ok_or(XummError::MissingField("next.always"))?;
        info!("📲️ Sign request {uuid} created");
        Ok(SignRequestResponse { uuid, refs: wire.refs, next_always })
    }

    pub async fn payload_status(&self, uuid: &str) -> Result<PayloadStatus, XummError> {
        let url = format!("{}/{uuid}", self.base_url);
        let response = self.client.get(url).send().await.map_err(request_error)?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => return Err(XummError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => return Err(XummError::RateLimited),
            s if !s.is_success() => {
                let status = s.as_u16();
                let message = truncated_text(response).await;
                return Err(XummError::QueryError { status, message });
            },
            _ => {},
        }
        let wire = response.json::<StatusWire>().await.map_err(|e| XummError::JsonError(e.to_string()))?;
        let meta = wire.meta.unwrap_or_default();
        let resp = wire.response.unwrap_or_default();
        Ok(PayloadStatus {
            uuid: meta.uuid.unwrap_or_else(|| uuid.to_string()),
            resolved: meta.resolved,
            signed: resp.signed,
            txid: resp.txid,
            account: resp.account,
        })
    }
}

fn request_error(e: reqwest::Error) -> XummError {
    if e.is_timeout() {
        XummError::Timeout
    } else {
        XummError::Unreachable(e.to_string())
    }
}

async fn truncated_text(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    text.chars().take(MAX_ERROR_BODY).collect()
}

#[cfg(test)]
mod test {
    use mpt_common::Secret;

    use super::*;

    #[test]
    fn requires_credentials() {
        let config = XummConfig::default();
        assert!(matches!(XummApi::new(config), Err(XummError::MissingCredentials)));
        let config = XummConfig {
            api_key: Secret::new("key".into()),
            api_secret: Secret::new("secret".into()),
            ..Default::default()
        };
        assert!(XummApi::new(config).is_ok());
    }

    #[test]
    fn wire_formats() {
        let wire: CreateWire = serde_json::from_value(json!({
            "uuid": "f2b8c3a8-8d4b-4c2e-9b0e-1a2b3c4d5e6f",
            "refs": {"qr_matrix": [[1, 0], [0, 1]], "websocket_status": "wss://xumm.app/sign/x"},
            "next": {"always": "https://xumm.app/sign/x"}
        }))
        .unwrap();
        assert_eq!(wire.refs.qr_matrix.as_ref().map(|m| m.len()), Some(2));
        assert!(wire.refs.qr_png.is_none());

        let status: StatusWire =
            serde_json::from_value(json!({"meta": {"resolved": true}, "response": {"signed": true, "txid": null}}))
                .unwrap();
        assert!(status.meta.unwrap().resolved);
        assert!(status.response.unwrap().txid.is_none());
    }
}
