use actix_web::{http::StatusCode, web, web::ServiceConfig};
use ledger_tools::LedgerError;
use mpt_common::TokenScale;
use mpt_sales_engine::{
    events::EventProducers,
    helpers::PurchaseMemo,
    test_utils::{purchase_tx, random_nonce, random_tx_hash, FakeLedger, HOLDER, ISSUANCE_ID, ISSUER},
    IngestionEngine,
    PaymentListener,
    RescanConfig,
    SalesStore,
    SettlementApi,
};
use serde_json::{json, Value};

use super::helpers::{get_request, post_raw, post_request};
use crate::routes::{
    health,
    sales_store_stats,
    IngestSaleRoute,
    InspectTxRoute,
    ListSalesRoute,
    RescanSalesRoute,
    SettleSaleRoute,
    StartListenerRoute,
};

struct Gateway {
    ledger: FakeLedger,
    store: SalesStore,
    listener: web::Data<PaymentListener<FakeLedger>>,
    settlement: web::Data<SettlementApi<FakeLedger>>,
}

impl Gateway {
    fn new() -> Self {
        let _ = env_logger::try_init();
        let ledger = FakeLedger::new(ISSUER);
        let store = SalesStore::new();
        let engine = IngestionEngine::new(store.clone(), ISSUER.to_string(), EventProducers::default());
        let listener = PaymentListener::new(ledger.clone(), engine, RescanConfig::default());
        let settlement =
            SettlementApi::new(ledger.clone(), store.clone(), TokenScale::default(), EventProducers::default());
        Self { ledger, store, listener: web::Data::new(listener), settlement: web::Data::new(settlement) }
    }

    fn configure(&self) -> impl FnOnce(&mut ServiceConfig) {
        let listener = self.listener.clone();
        let settlement = self.settlement.clone();
        let store = web::Data::new(self.store.clone());
        move |cfg: &mut ServiceConfig| {
            cfg.service(health)
                .service(sales_store_stats)
                .service(ListSalesRoute::<FakeLedger>::new())
                .service(IngestSaleRoute::<FakeLedger>::new())
                .service(RescanSalesRoute::<FakeLedger>::new())
                .service(SettleSaleRoute::<FakeLedger>::new())
                .service(StartListenerRoute::<FakeLedger>::new())
                .service(InspectTxRoute::<FakeLedger>::new())
                .app_data(listener)
                .app_data(settlement)
                .app_data(store);
        }
    }

    /// Puts a validated purchase on the fake ledger and returns its hash. The price is 1 XRP per unit.
    fn purchase(&self, units: &str, drops: &str) -> String {
        let hash = random_tx_hash();
        let memo = PurchaseMemo::new(ISSUANCE_ID.to_string(), random_nonce(), units.to_string());
        self.ledger.add_transaction(&hash, purchase_tx(HOLDER, ISSUER, drops, &memo), true);
        hash
    }

    async fn ingest(&self, hash: &str) -> Value {
        let (status, body) =
            post_request("/mpt/sales/ingest", &json!({ "hash": hash }), self.configure()).await.expect("ingest failed");
        assert_eq!(status, StatusCode::OK, "{body}");
        serde_json::from_str(&body).expect("ingest response is not JSON")
    }
}

#[actix_web::test]
async fn health_check() {
    let gw = Gateway::new();
    let (status, body) = get_request("/health", gw.configure()).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn ingest_accepts_a_correctly_priced_payment() {
    let gw = Gateway::new();
    let hash = gw.purchase("3", "3000000");
    let result = gw.ingest(&hash).await;
    assert_eq!(result["outcome"], "accepted");
    assert_eq!(result["pendingSales"], 1);
    let sale = &result["sale"];
    assert_eq!(sale["units"], "3");
    assert_eq!(sale["amountNative"], "3000000");
    assert_eq!(sale["amountDisplay"], "3");
    assert_eq!(sale["holder"], HOLDER);
    assert_eq!(sale["paymentTx"], hash.to_uppercase());

    let again = gw.ingest(&hash).await;
    assert_eq!(again["outcome"], "duplicate");
    assert_eq!(again["pendingSales"], 1);
}

#[actix_web::test]
async fn ingest_reports_a_price_mismatch_without_failing() {
    let gw = Gateway::new();
    let hash = gw.purchase("5", "500000");
    let result = gw.ingest(&hash).await;
    assert_eq!(result["outcome"], "rejected");
    assert!(result["reason"].as_str().unwrap().starts_with("price_mismatch"));
    assert!(result.get("sale").is_none());
    assert_eq!(gw.store.stats().unwrap().pending_sales, 0);
}

#[actix_web::test]
async fn ingest_rejects_a_malformed_hash() {
    let gw = Gateway::new();
    let (status, body) =
        post_request("/mpt/sales/ingest", &json!({ "hash": "not-a-hash" }), gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "bad_request");
    assert_eq!(body["error"], "Invalid transaction hash: not-a-hash");
}

#[actix_web::test]
async fn ingest_of_an_unknown_transaction_is_not_found() {
    let gw = Gateway::new();
    let (status, _) =
        post_request("/mpt/sales/ingest", &json!({ "hash": random_tx_hash() }), gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let gw = Gateway::new();
    let (status, body) = post_raw("/mpt/sales/ingest", "{\"hash\": ", gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Could not read request body"), "{body}");
}

#[actix_web::test]
async fn listing_sales_starts_the_listener() {
    let gw = Gateway::new();
    for units in ["1", "2"] {
        let hash = gw.purchase(units, &format!("{units}000000"));
        gw.ingest(&hash).await;
    }
    let (status, body) = get_request("/mpt/sales/list", gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(gw.ledger.subscriptions(), 1);
    assert!(gw.listener.is_running());

    get_request("/mpt/sales/list", gw.configure()).await.unwrap();
    assert_eq!(gw.ledger.subscriptions(), 1);
}

#[actix_web::test]
async fn listener_start_is_idempotent() {
    let gw = Gateway::new();
    let (status, body) = post_request("/listener/start", &json!({}), gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true,"started":true,"alreadyRunning":false}"#);
    let (_, body) = post_request("/listener/start", &json!({}), gw.configure()).await.unwrap();
    assert_eq!(body, r#"{"ok":true,"started":false,"alreadyRunning":true}"#);
}

#[actix_web::test]
async fn settle_delivers_once() {
    let gw = Gateway::new();
    gw.ledger.opt_in(ISSUANCE_ID, HOLDER);
    let hash = gw.purchase("4", "4000000");
    gw.ingest(&hash).await;

    let (status, body) = post_request("/mpt/sales/settle", &json!({ "paymentTx": hash }), gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let receipt: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(receipt["units"], "4");
    assert_eq!(receipt["holder"], HOLDER);
    assert!(receipt["hash"].as_str().is_some_and(|h| h.len() == 64));
    assert_eq!(gw.ledger.sends(), vec![(ISSUANCE_ID.to_string(), HOLDER.to_string(), "400".to_string())]);

    let (status, body) = post_request("/mpt/sales/settle", &json!({ "paymentTx": hash }), gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "not_found");
    assert_eq!(gw.ledger.sends().len(), 1);
}

#[actix_web::test]
async fn settle_without_opt_in_keeps_the_sale() {
    let gw = Gateway::new();
    let hash = gw.purchase("1", "1000000");
    gw.ingest(&hash).await;
    let (status, body) = post_request("/mpt/sales/settle", &json!({ "paymentTx": hash }), gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body}");
    assert_eq!(gw.store.stats().unwrap().pending_sales, 1);
}

#[actix_web::test]
async fn rescan_adds_only_new_payments() {
    let gw = Gateway::new();
    let old = gw.purchase("2", "2000000");
    gw.ingest(&old).await;
    let memo = PurchaseMemo::new(ISSUANCE_ID.to_string(), random_nonce(), "2".to_string());
    gw.ledger.add_history(&old, purchase_tx(HOLDER, ISSUER, "2000000", &memo));
    let new = random_tx_hash();
    let memo = PurchaseMemo::new(ISSUANCE_ID.to_string(), random_nonce(), "6".to_string());
    gw.ledger.add_history(&new, purchase_tx(HOLDER, ISSUER, "6000000", &memo));

    let (status, body) =
        post_request("/mpt/sales/rescan", &json!({ "lookbackLedgers": 1000 }), gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, r#"{"scanned":2,"added":1,"failed":0,"min":99000,"max":100000}"#);
    assert_eq!(gw.store.stats().unwrap().pending_sales, 2);
}

#[actix_web::test]
async fn rescan_body_is_optional() {
    let gw = Gateway::new();
    let (status, body) = post_raw("/mpt/sales/rescan", "", gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["max"], 100_000);
    assert_eq!(body["min"], 95_000);
}

#[actix_web::test]
async fn interrupted_rescan_still_reports_progress() {
    let gw = Gateway::new();
    for units in ["1", "2", "3"] {
        let memo = PurchaseMemo::new(ISSUANCE_ID.to_string(), random_nonce(), units.to_string());
        gw.ledger.add_history(&random_tx_hash(), purchase_tx(HOLDER, ISSUER, &format!("{units}000000"), &memo));
    }
    gw.ledger.fail_history_page(1, LedgerError::Connection("reset by peer".into()));
    let (status, body) = post_raw("/mpt/sales/rescan", "", gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["added"], 2);
    assert_eq!(body["interrupted"], "Could not connect to the ledger: reset by peer");
    assert_eq!(gw.store.stats().unwrap().pending_sales, 2);
}

#[actix_web::test]
async fn inspect_does_not_record_the_sale() {
    let gw = Gateway::new();
    let hash = gw.purchase("3", "3000000");
    let (status, body) = get_request(&format!("/debug/inspect-tx?hash={hash}"), gw.configure()).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let inspection: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(inspection["outcome"], "accepted");
    assert_eq!(inspection["destinationOk"], true);
    assert_eq!(inspection["amountDisplay"], "3");

    let (_, body) = get_request("/debug/sales-store", gw.configure()).await.unwrap();
    let stats: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stats["pendingSales"], 0);
}
