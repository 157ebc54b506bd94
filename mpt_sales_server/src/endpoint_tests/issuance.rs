use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use ledger_tools::{
    data_objects::{MpTokenIssuanceNode, MpTokenNode, TxJson, LSF_MPT_AUTHORIZED, TEC_NO_AUTH},
    LedgerError,
};
use mockall::predicate::eq;
use mpt_common::TokenScale;
use mpt_sales_engine::{
    events::EventProducers,
    mpt_api::issuance_api::REQUIRED_ISSUANCE_FLAGS,
    test_utils::{HOLDER, ISSUANCE_ID, ISSUER},
    traits::{GrantOutcome, NewIssuance},
    IngestionEngine,
    IssuanceApi,
    PaymentListener,
    RescanConfig,
    SalesStore,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::{
    helpers::{post_raw, post_request},
    mocks::MockLedger,
};
use crate::routes::{
    AuthorizeHolderRoute,
    ClawbackMptRoute,
    CreateIssuanceRoute,
    MptBalanceRoute,
    PrepareOptInRoute,
    SendMptRoute,
};

const NEW_ISSUANCE_ID: &str = "0000000AA407AF5856CCF3C42619DAA925813FC955C72983";
const TX_HASH: &str = "C53ECF838647FA5A4C780377025FEC7999AB4182590510CA461444B207AB74A9";

// A listener whose stream ends straight away. Routes that autostart the listener only need the subscription to succeed.
fn idle_listener() -> PaymentListener<MockLedger> {
    let mut ledger = MockLedger::new();
    ledger.expect_subscribe().returning(|_| {
        let (_sender, receiver) = mpsc::channel(1);
        Ok(receiver)
    });
    let engine = IngestionEngine::new(SalesStore::new(), ISSUER.to_string(), EventProducers::default());
    PaymentListener::new(ledger, engine, RescanConfig::default())
}

fn configure(ledger: MockLedger, preset: Option<&str>) -> impl FnOnce(&mut ServiceConfig) {
    let _ = env_logger::try_init();
    let api = web::Data::new(IssuanceApi::new(ledger, TokenScale::default(), preset.map(String::from)));
    let listener = web::Data::new(idle_listener());
    move |cfg: &mut ServiceConfig| {
        cfg.service(CreateIssuanceRoute::<MockLedger>::new())
            .service(AuthorizeHolderRoute::<MockLedger>::new())
            .service(PrepareOptInRoute::<MockLedger>::new())
            .service(SendMptRoute::<MockLedger>::new())
            .service(ClawbackMptRoute::<MockLedger>::new())
            .service(MptBalanceRoute::<MockLedger>::new())
            .app_data(api)
            .app_data(listener);
    }
}

fn token(flags: u32, amount: Option<&str>) -> MpTokenNode {
    MpTokenNode {
        account: Some(HOLDER.to_string()),
        mpt_issuance_id: Some(ISSUANCE_ID.to_string()),
        mpt_amount: amount.map(String::from),
        flags,
    }
}

fn issuance(id: &str, flags: u32, sequence: u32) -> MpTokenIssuanceNode {
    MpTokenIssuanceNode { mpt_issuance_id: Some(id.to_string()), flags, sequence, ..Default::default() }
}

//----------------------------------------------   Create issuance  ----------------------------------------------

#[actix_web::test]
async fn create_issuance_returns_the_configured_issuance() {
    let (status, body) =
        post_request("/mpt/create-issuance", &json!({}), configure(MockLedger::new(), Some(ISSUANCE_ID))).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!(r#"{{"mptIssuanceId":"{ISSUANCE_ID}","created":false}}"#));
}

#[actix_web::test]
async fn create_issuance_reuses_an_issuance_with_clawback() {
    let mut ledger = MockLedger::new();
    ledger.expect_list_issuances().times(1).returning(|| {
        Ok(vec![issuance(NEW_ISSUANCE_ID, 0, 9), issuance(ISSUANCE_ID, REQUIRED_ISSUANCE_FLAGS, 4)])
    });
    ledger.expect_create_issuance().never();
    let (status, body) = post_raw("/mpt/create-issuance", "", configure(ledger, None)).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["mptIssuanceId"], ISSUANCE_ID);
    assert_eq!(body["created"], false);
}

#[actix_web::test]
async fn create_issuance_creates_one_when_none_is_usable() {
    let mut ledger = MockLedger::new();
    let calls = Arc::new(AtomicUsize::new(0));
    ledger.expect_list_issuances().times(2).returning(move || {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(vec![issuance(ISSUANCE_ID, 0, 4)])
        } else {
            Ok(vec![issuance(ISSUANCE_ID, 0, 4), issuance(NEW_ISSUANCE_ID, REQUIRED_ISSUANCE_FLAGS, 10)])
        }
    });
    ledger
        .expect_create_issuance()
        .withf(|params: &NewIssuance, flags: &u32| {
            params.asset_scale == Some(0) && params.transfer_fee == Some(0) && *flags == REQUIRED_ISSUANCE_FLAGS
        })
        .times(1)
        .returning(|_, _| Ok(TX_HASH.to_string()));
    let (status, body) =
        post_request("/mpt/create-issuance", &json!({ "assetScale": 0 }), configure(ledger, None)).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, format!(r#"{{"mptIssuanceId":"{NEW_ISSUANCE_ID}","created":true}}"#));
}

//----------------------------------------------   Authorize holder  ----------------------------------------------

#[actix_web::test]
async fn authorize_holder_requires_an_issuance() {
    let (status, body) =
        post_request("/mpt/authorize-holder", &json!({ "holder": HOLDER }), configure(MockLedger::new(), None))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "mptIssuanceId required");
}

#[actix_web::test]
async fn authorize_holder_skips_an_authorized_holder() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_mpt_token_entry()
        .with(eq(ISSUANCE_ID), eq(HOLDER))
        .times(1)
        .returning(|_, _| Ok(Some(token(LSF_MPT_AUTHORIZED, None))));
    ledger.expect_grant_holder().never();
    let req = json!({ "mptIssuanceId": ISSUANCE_ID, "holder": HOLDER });
    let (status, body) = post_request("/mpt/authorize-holder", &req, configure(ledger, None)).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"optIn":true,"granted":true,"skipped":true}"#);
}

#[actix_web::test]
async fn authorize_holder_waits_for_the_opt_in() {
    let mut ledger = MockLedger::new();
    ledger.expect_mpt_token_entry().returning(|_, _| Ok(None));
    ledger.expect_grant_holder().never();
    let req = json!({ "holder": HOLDER });
    let (status, body) = post_request("/mpt/authorize-holder", &req, configure(ledger, Some(ISSUANCE_ID))).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"optIn":false,"granted":false}"#);
}

#[actix_web::test]
async fn authorize_holder_that_does_not_stick_is_a_gateway_error() {
    let mut ledger = MockLedger::new();
    ledger.expect_mpt_token_entry().times(2).returning(|_, _| Ok(Some(token(0, None))));
    ledger.expect_grant_holder().times(1).returning(|_, _| Ok(GrantOutcome::AlreadyGranted));
    let req = json!({ "mptIssuanceId": ISSUANCE_ID, "holder": HOLDER });
    let (status, _) = post_request("/mpt/authorize-holder", &req, configure(ledger, None)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn prepare_opt_in_returns_the_unsigned_transaction() {
    let mut ledger = MockLedger::new();
    ledger.expect_prepare_holder_opt_in().with(eq(ISSUANCE_ID), eq(HOLDER)).returning(|id, holder| {
        let mut tx = TxJson::new("MPTokenAuthorize", holder);
        tx.mpt_issuance_id = Some(id.to_string());
        Ok(tx)
    });
    let req = json!({ "mptIssuanceId": ISSUANCE_ID, "holder": HOLDER });
    let (status, body) = post_request("/mpt/optin/prepare", &req, configure(ledger, None)).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["txJSON"]["TransactionType"], "MPTokenAuthorize");
    assert_eq!(body["txJSON"]["Account"], HOLDER);
    assert_eq!(body["txJSON"]["MPTokenIssuanceID"], ISSUANCE_ID);
}

//----------------------------------------------   Send, clawback, balance  -----------------------------------------

#[actix_web::test]
async fn send_scales_whole_units() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_send_mpt()
        .with(eq(ISSUANCE_ID), eq(HOLDER), eq("1200"))
        .times(1)
        .returning(|_, _, _| Ok(TX_HASH.to_string()));
    let req = json!({ "destination": HOLDER, "units": "12" });
    let (status, body) = post_request("/mpt/send", &req, configure(ledger, Some(ISSUANCE_ID))).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, format!(r#"{{"mptIssuanceId":"{ISSUANCE_ID}","hash":"{TX_HASH}"}}"#));
}

#[actix_web::test]
async fn send_to_a_holder_without_authorization() {
    let mut ledger = MockLedger::new();
    ledger.expect_send_mpt().returning(|_, _, _| Err(LedgerError::Submit(TEC_NO_AUTH.to_string())));
    let req = json!({ "destination": HOLDER, "units": "1", "mptIssuanceId": ISSUANCE_ID });
    let (status, body) = post_request("/mpt/send", &req, configure(ledger, None)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "holder_not_authorized");
    assert!(body["error"].as_str().unwrap().starts_with("tecNO_AUTH"));
}

#[actix_web::test]
async fn send_rejects_bad_amounts() {
    for (units, message) in [("0", "Amount must be > 0"), ("1.5", "Amount must be a non-negative integer string: 1.5")] {
        let mut ledger = MockLedger::new();
        ledger.expect_send_mpt().never();
        let req = json!({ "destination": HOLDER, "units": units });
        let (status, body) = post_request("/mpt/send", &req, configure(ledger, Some(ISSUANCE_ID))).await.unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"], message);
    }
}

#[actix_web::test]
async fn clawback_accepts_the_legacy_field_names() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_clawback_mpt()
        .with(eq(ISSUANCE_ID), eq(HOLDER), eq("500"))
        .times(1)
        .returning(|_, _, _| Ok(TX_HASH.to_string()));
    let req = json!({ "holder": HOLDER, "amount": "5", "mptIssuanceId": ISSUANCE_ID });
    let (status, body) = post_request("/mpt/clawback", &req, configure(ledger, None)).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["hash"], TX_HASH);
}

#[actix_web::test]
async fn balance_reads_whole_units() {
    let mut ledger = MockLedger::new();
    ledger.expect_mpt_token_entry().returning(|_, _| Ok(Some(token(LSF_MPT_AUTHORIZED, Some("4200")))));
    let req = json!({ "account": HOLDER, "mptIssuanceId": ISSUANCE_ID });
    let (status, body) = post_request("/mpt/balance", &req, configure(ledger, None)).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, format!(r#"{{"account":"{HOLDER}","mptIssuanceId":"{ISSUANCE_ID}","balance":"42"}}"#));
}

#[actix_web::test]
async fn balance_of_an_account_without_a_token_entry_is_zero() {
    let mut ledger = MockLedger::new();
    ledger.expect_mpt_token_entry().returning(|_, _| Ok(None));
    let req = json!({ "account": HOLDER });
    let (status, body) = post_request("/mpt/balance", &req, configure(ledger, Some(ISSUANCE_ID))).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["balance"], "0");
}

#[actix_web::test]
async fn balance_propagates_ledger_failures() {
    let mut ledger = MockLedger::new();
    ledger.expect_mpt_token_entry().returning(|_, _| Err(LedgerError::Timeout(20_000)));
    let req = json!({ "account": HOLDER });
    let (status, body) = post_request("/mpt/balance", &req, configure(ledger, Some(ISSUANCE_ID))).await.unwrap();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "ledger_error");
}
