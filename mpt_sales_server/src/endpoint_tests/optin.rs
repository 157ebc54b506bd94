use actix_web::{http::StatusCode, web, web::ServiceConfig};
use ledger_tools::{
    data_objects::{TxJson, TxResponse, TX_TYPE_MPT_AUTHORIZE},
    PayloadStatus,
    SignRequestRefs,
    SignRequestResponse,
    XummError,
};
use mockall::predicate::eq;
use mpt_common::TokenScale;
use mpt_sales_engine::{
    test_utils::{random_tx_hash, FakeRelay, HOLDER, ISSUANCE_ID},
    IssuanceApi,
    OptInApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{get_request, post_request},
    mocks::MockLedger,
};
use crate::routes::{OptInQrRoute, OptInStatusRoute, VerifyOptInRoute};

const UUID: &str = "6b1c9c4e-3f0a-4d8e-9a55-0c2f1e7b8d21";

fn sign_request(refs: SignRequestRefs) -> SignRequestResponse {
    SignRequestResponse { uuid: UUID.to_string(), refs, next_always: format!("https://xumm.app/sign/{UUID}") }
}

/// Registers the opt-in routes. The ledger mock backs verification; issuance lookups only read the preset id.
fn configure(ledger: MockLedger, relay: Option<FakeRelay>) -> impl FnOnce(&mut ServiceConfig) {
    let _ = env_logger::try_init();
    let optin = web::Data::new(OptInApi::new(ledger, relay));
    let issuance =
        web::Data::new(IssuanceApi::new(MockLedger::new(), TokenScale::default(), Some(ISSUANCE_ID.to_string())));
    move |cfg: &mut ServiceConfig| {
        cfg.service(OptInQrRoute::<MockLedger, FakeRelay>::new())
            .service(OptInStatusRoute::<MockLedger, FakeRelay>::new())
            .service(VerifyOptInRoute::<MockLedger, FakeRelay>::new())
            .app_data(optin)
            .app_data(issuance);
    }
}

fn opt_in_tx(account: &str, issuance_id: &str, validated: bool) -> TxResponse {
    let mut tx = TxJson::new(TX_TYPE_MPT_AUTHORIZE, account);
    tx.mpt_issuance_id = Some(issuance_id.to_string());
    TxResponse { tx_json: Some(tx), validated, ..Default::default() }
}

//----------------------------------------------   QR sign requests  ----------------------------------------------

#[actix_web::test]
async fn qr_request_returns_the_relay_png() {
    let refs = SignRequestRefs {
        qr_png: Some(format!("https://xumm.app/sign/{UUID}_q.png")),
        websocket_status: Some(format!("wss://xumm.app/sign/{UUID}")),
        ..Default::default()
    };
    let relay = FakeRelay::new(Ok(sign_request(refs)));
    let req = json!({ "holderAddress": HOLDER, "expiresIn": 120 });
    let (status, body) =
        post_request("/mpt/authorize/qr", &req, configure(MockLedger::new(), Some(relay.clone()))).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["uuid"], UUID);
    assert_eq!(body["qr_png"], format!("https://xumm.app/sign/{UUID}_q.png"));
    assert!(body["qr_svg"].is_null());
    assert_eq!(body["txjson"]["TransactionType"], TX_TYPE_MPT_AUTHORIZE);
    assert_eq!(body["txjson"]["MPTokenIssuanceID"], ISSUANCE_ID);
    assert!(body["txjson"].get("Issuer").is_none());

    let requests = relay.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1, Some(120));
}

#[actix_web::test]
async fn qr_request_renders_a_module_matrix() {
    let refs = SignRequestRefs { qr_matrix: Some(vec![vec![1, 0], vec![0, 1]]), ..Default::default() };
    let relay = FakeRelay::new(Ok(sign_request(refs)));
    let req = json!({ "holderAddress": HOLDER });
    let (status, body) = post_request("/mpt/authorize/qr", &req, configure(MockLedger::new(), Some(relay))).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert!(body["qr_svg"].as_str().unwrap().starts_with("data:image/svg+xml;utf8,"));
}

#[actix_web::test]
async fn qr_request_without_a_qr_code_is_a_gateway_error() {
    let relay = FakeRelay::new(Ok(sign_request(SignRequestRefs::default())));
    let req = json!({ "holderAddress": HOLDER });
    let (status, _) = post_request("/mpt/authorize/qr", &req, configure(MockLedger::new(), Some(relay))).await.unwrap();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn qr_request_when_the_relay_is_rate_limited() {
    let relay = FakeRelay::new(Err(XummError::RateLimited));
    let req = json!({ "holderAddress": HOLDER });
    let (status, body) = post_request("/mpt/authorize/qr", &req, configure(MockLedger::new(), Some(relay))).await.unwrap();
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "rate_limited");
}

#[actix_web::test]
async fn qr_request_needs_a_configured_relay() {
    let req = json!({ "holderAddress": HOLDER });
    let (status, body) = post_request("/mpt/authorize/qr", &req, configure(MockLedger::new(), None)).await.unwrap();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "The sign relay is not configured");
}

//----------------------------------------------   Sign request status  ----------------------------------------------

#[actix_web::test]
async fn status_of_a_signed_request() {
    let relay = FakeRelay::new(Err(XummError::NotFound));
    let txid = random_tx_hash();
    relay.set_status(PayloadStatus {
        uuid: UUID.to_string(),
        resolved: true,
        signed: true,
        txid: Some(txid.clone()),
        account: Some(HOLDER.to_string()),
    });
    let (status, body) =
        get_request(&format!("/mpt/authorize/status/{UUID}"), configure(MockLedger::new(), Some(relay))).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["signed"], true);
    assert_eq!(body["txid"], txid);
    assert_eq!(body["account"], HOLDER);
}

#[actix_web::test]
async fn status_rejects_a_malformed_uuid() {
    let relay = FakeRelay::new(Err(XummError::NotFound));
    let (status, body) =
        get_request("/mpt/authorize/status/not-a-uuid", configure(MockLedger::new(), Some(relay))).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "Invalid uuid: not-a-uuid");
}

#[actix_web::test]
async fn status_of_an_unknown_request_is_not_found() {
    let relay = FakeRelay::new(Err(XummError::NotFound));
    let (status, body) =
        get_request(&format!("/mpt/authorize/status/{UUID}"), configure(MockLedger::new(), Some(relay))).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "not_found");
}

//----------------------------------------------   Verification  ----------------------------------------------

#[actix_web::test]
async fn verify_accepts_a_validated_opt_in() {
    let txid = random_tx_hash();
    let mut ledger = MockLedger::new();
    ledger
        .expect_fetch_transaction()
        .with(eq(txid.clone()))
        .times(1)
        .returning(|_| Ok(opt_in_tx(HOLDER, ISSUANCE_ID, true)));
    let req = json!({ "txid": txid, "account": HOLDER });
    let (status, body) = post_request("/mpt/authorize/verify", &req, configure(ledger, None)).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true}"#);
}

#[actix_web::test]
async fn verify_reports_failures_in_the_body() {
    let other = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";
    let cases = [
        (opt_in_tx(HOLDER, ISSUANCE_ID, false), "Opt-in verification failed: Transaction not validated yet".to_string()),
        (
            opt_in_tx(other, ISSUANCE_ID, true),
            format!("Opt-in verification failed: Account mismatch: expected {HOLDER}, got {other}"),
        ),
        (
            opt_in_tx(HOLDER, "0000000AA407AF5856CCF3C42619DAA925813FC955C72983", true),
            format!(
                "Opt-in verification failed: Issuance mismatch: expected {ISSUANCE_ID}, got \
                 0000000AA407AF5856CCF3C42619DAA925813FC955C72983"
            ),
        ),
    ];
    for (response, expected) in cases {
        let mut ledger = MockLedger::new();
        ledger.expect_fetch_transaction().times(1).return_once(move |_| Ok(response));
        let req = json!({ "txid": random_tx_hash(), "account": HOLDER });
        let (status, body) = post_request("/mpt/authorize/verify", &req, configure(ledger, None)).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], expected);
    }
}

#[actix_web::test]
async fn verify_rejects_a_malformed_txid_without_a_lookup() {
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_transaction().never();
    let req = json!({ "txid": "abc", "account": HOLDER });
    let (status, body) = post_request("/mpt/authorize/verify", &req, configure(ledger, None)).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":false,"error":"Invalid transaction hash: abc"}"#);
}
