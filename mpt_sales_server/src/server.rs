use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::FutureExt;
use ledger_tools::XummApi;
use log::*;
use mpt_sales_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    IngestionEngine,
    IssuanceApi,
    OptInApi,
    PaymentListener,
    SalesStore,
    SettlementApi,
    XrplLedger,
};

use crate::{
    config::ServerConfig,
    data_objects::IssuerInfo,
    errors::ServerError,
    listener_worker::start_listener_worker,
    routes::{
        health,
        issuer_info,
        sales_store_stats,
        AuthorizeHolderRoute,
        ClawbackMptRoute,
        CreateIssuanceRoute,
        IngestSaleRoute,
        InspectTxRoute,
        ListSalesRoute,
        MptBalanceRoute,
        OptInQrRoute,
        OptInStatusRoute,
        PrepareOptInRoute,
        RescanSalesRoute,
        SendMptRoute,
        SettleSaleRoute,
        StartListenerRoute,
        VerifyOptInRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;
    let ledger = XrplLedger::new(config.ledger.clone());
    let relay = create_sign_relay(&config)?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let store = SalesStore::new();
    let engine = IngestionEngine::new(store.clone(), config.ledger.issuer_address.clone(), producers.clone());
    let listener = PaymentListener::new(ledger.clone(), engine, config.rescan.clone());
    if config.autostart_listener {
        // The worker runs detached. Routes that need the listener retry the start on their own.
        let _handle = start_listener_worker(listener.clone());
    }
    let srv = create_server_instance(config, ledger, relay, store, listener, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

fn create_sign_relay(config: &ServerConfig) -> Result<Option<XummApi>, ServerError> {
    if !config.xumm.has_credentials() {
        return Ok(None);
    }
    let relay = XummApi::new(config.xumm.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    Ok(Some(relay))
}

/// Logging hooks for sale events. Everything that should happen when a sale is received or settled is wired up here.
pub fn create_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_sale_received(|ev| {
        async move {
            let sale = ev.sale;
            info!(
                "📬️ New pending sale via {}: {} units of {} for {} ({} XRP, payment {})",
                ev.source, sale.units, sale.issuance_id, sale.holder, sale.amount_display, sale.payment_tx
            );
        }
        .boxed()
    });
    hooks.on_sale_settled(|ev| {
        async move {
            let sale = ev.sale;
            info!(
                "📬️ Sale {} settled: {} units delivered to {} in {}",
                sale.payment_tx, sale.units, sale.holder, ev.delivery_tx
            );
        }
        .boxed()
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    ledger: XrplLedger,
    relay: Option<XummApi>,
    store: SalesStore,
    listener: PaymentListener<XrplLedger>,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let issuer = IssuerInfo { network: config.ledger.network.clone(), issuer: config.ledger.issuer_address.clone() };
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let settlement_api = SettlementApi::new(ledger.clone(), store.clone(), config.asset_scale, producers.clone());
        let issuance_api = IssuanceApi::new(ledger.clone(), config.asset_scale, config.issuance_id.clone());
        let optin_api = OptInApi::new(ledger.clone(), relay.clone());
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
        let api_scope = web::scope("/api")
            .service(ListSalesRoute::<XrplLedger>::new())
            .service(IngestSaleRoute::<XrplLedger>::new())
            .service(RescanSalesRoute::<XrplLedger>::new())
            .service(SettleSaleRoute::<XrplLedger>::new())
            .service(CreateIssuanceRoute::<XrplLedger>::new())
            .service(AuthorizeHolderRoute::<XrplLedger>::new())
            .service(PrepareOptInRoute::<XrplLedger>::new())
            .service(SendMptRoute::<XrplLedger>::new())
            .service(ClawbackMptRoute::<XrplLedger>::new())
            .service(MptBalanceRoute::<XrplLedger>::new())
            .service(OptInQrRoute::<XrplLedger, XummApi>::new())
            .service(OptInStatusRoute::<XrplLedger, XummApi>::new())
            .service(VerifyOptInRoute::<XrplLedger, XummApi>::new())
            .service(StartListenerRoute::<XrplLedger>::new())
            .service(InspectTxRoute::<XrplLedger>::new())
            .service(sales_store_stats)
            .service(issuer_info);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mpt::access_log"))
            .app_data(json_config)
            .app_data(web::Data::new(listener.clone()))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(issuance_api))
            .app_data(web::Data::new(optin_api))
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(issuer.clone()))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
