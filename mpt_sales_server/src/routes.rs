//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: parse the body, call the engine API, shape the reply.
//! Anything longer belongs in `mpt_sales_engine`.
//!
//! Handlers must not block the worker thread. Every ledger or relay call is awaited, so a slow rippled node delays
//! only the request that is waiting on it.
//!
//! Most handlers are generic over the ledger backend, which lets the endpoint tests run them against mocks.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use mpt_sales_engine::{
    traits::{LedgerBackend, NewIssuance, SignRelay},
    IssuanceApi,
    IssuanceApiError,
    OptInApi,
    PaymentListener,
    SettlementApi,
    SalesStore,
};

use crate::{
    data_objects::{
        BalanceRequest,
        BalanceResponse,
        HolderRequest,
        IngestRequest,
        IngestResponse,
        InspectQuery,
        IssuerInfo,
        ListenerStartResponse,
        OptInQrRequest,
        PreparedOptIn,
        RescanRequest,
        RescanResponse,
        SalesList,
        SettleRequest,
        TransferRequest,
        VerifyOptInRequest,
        VerifyOptInResponse,
    },
    errors::ServerError,
    listener_worker::autostart_listener,
};

// actix-web cannot register generic handlers directly, so each generic route gets a small service type via `route!`
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

fn store_error<E: std::fmt::Display>(e: E) -> ServerError {
    error!("🗃️ Sales store is unavailable. {e}");
    ServerError::BackendError(e.to_string())
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Sales  ----------------------------------------------------
route!(list_sales => Get "/mpt/sales/list" impl LedgerBackend);
/// All pending sales, newest first. Touching this route starts the payment listener if it is not running yet.
pub async fn list_sales<B: LedgerBackend>(
    listener: web::Data<PaymentListener<B>>,
) -> Result<HttpResponse, ServerError> {
    autostart_listener(&listener).await;
    let items = listener.engine().store().list_pending().map_err(store_error)?;
    debug!("💻️ GET sales list ({} items)", items.len());
    Ok(HttpResponse::Ok().json(SalesList { items }))
}

route!(ingest_sale => Post "/mpt/sales/ingest" impl LedgerBackend);
/// Looks up a payment by hash and runs it through the ingestion engine.
///
/// Rejected payments still produce a `200` response. The body carries the outcome and the rejection reason.
pub async fn ingest_sale<B: LedgerBackend>(
    body: web::Json<IngestRequest>,
    listener: web::Data<PaymentListener<B>>,
) -> Result<HttpResponse, ServerError> {
    let hash = body.into_inner().hash;
    debug!("💻️ POST ingest for {hash}");
    let outcome = listener.ingest_by_hash(&hash).await?;
    let pending = listener.engine().store().stats().map_err(store_error)?.pending_sales;
    info!("💻️ Manual ingest of {hash}: {}", outcome.label());
    Ok(HttpResponse::Ok().json(IngestResponse::new(outcome, pending)))
}

route!(rescan_sales => Post "/mpt/sales/rescan" impl LedgerBackend);
/// Re-reads recent issuer history. The body is optional; `lookbackLedgers` is clamped to the configured window.
pub async fn rescan_sales<B: LedgerBackend>(
    body: Option<web::Json<RescanRequest>>,
    listener: web::Data<PaymentListener<B>>,
) -> Result<HttpResponse, ServerError> {
    let lookback = body.and_then(|b| b.into_inner().lookback_ledgers);
    debug!("💻️ POST rescan (lookback {lookback:?})");
    let summary = listener.rescan(lookback).await?;
    Ok(HttpResponse::Ok().json(RescanResponse::from(summary)))
}

route!(settle_sale => Post "/mpt/sales/settle" impl LedgerBackend);
pub async fn settle_sale<B: LedgerBackend>(
    body: web::Json<SettleRequest>,
    api: web::Data<SettlementApi<B>>,
    listener: web::Data<PaymentListener<B>>,
) -> Result<HttpResponse, ServerError> {
    autostart_listener(&listener).await;
    let payment_tx = body.into_inner().payment_tx;
    debug!("💻️ POST settle for {payment_tx}");
    let receipt = api.settle(&payment_tx).await.map_err(|e| {
        warn!("💻️ Could not settle {payment_tx}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(receipt))
}

//----------------------------------------------   Issuance  ----------------------------------------------------
route!(create_issuance => Post "/mpt/create-issuance" impl LedgerBackend);
/// Returns the issuance sales are made in, creating one if the issuer has none with the required flags.
pub async fn create_issuance<B: LedgerBackend>(
    body: Option<web::Json<NewIssuance>>,
    api: web::Data<IssuanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.map(|b| b.into_inner()).unwrap_or_default();
    debug!("💻️ POST create-issuance with {params:?}");
    let result = api.create_issuance(params).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(authorize_holder => Post "/mpt/authorize-holder" impl LedgerBackend);
pub async fn authorize_holder<B: LedgerBackend>(
    body: web::Json<HolderRequest>,
    api: web::Data<IssuanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let HolderRequest { mpt_issuance_id, holder } = body.into_inner();
    let issuance = api.resolve_issuance(mpt_issuance_id.as_deref()).map_err(IssuanceApiError::from)?;
    debug!("💻️ POST authorize-holder for {holder} on {issuance}");
    let result = api.authorize_holder(&issuance, &holder).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(prepare_opt_in => Post "/mpt/optin/prepare" impl LedgerBackend);
/// An unsigned, autofilled `MPTokenAuthorize` for the holder to sign in their own wallet.
pub async fn prepare_opt_in<B: LedgerBackend>(
    body: web::Json<HolderRequest>,
    api: web::Data<IssuanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let HolderRequest { mpt_issuance_id, holder } = body.into_inner();
    let issuance = api.resolve_issuance(mpt_issuance_id.as_deref()).map_err(IssuanceApiError::from)?;
    let tx_json = api.prepare_opt_in(&issuance, &holder).await?;
    Ok(HttpResponse::Ok().json(PreparedOptIn { tx_json }))
}

route!(send_mpt => Post "/mpt/send" impl LedgerBackend);
pub async fn send_mpt<B: LedgerBackend>(
    body: web::Json<TransferRequest>,
    api: web::Data<IssuanceApi<B>>,
    listener: web::Data<PaymentListener<B>>,
) -> Result<HttpResponse, ServerError> {
    autostart_listener(&listener).await;
    let TransferRequest { destination, units, mpt_issuance_id } = body.into_inner();
    debug!("💻️ POST send {units} units to {destination}");
    let result = api.send(&destination, &units, mpt_issuance_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(clawback_mpt => Post "/mpt/clawback" impl LedgerBackend);
pub async fn clawback_mpt<B: LedgerBackend>(
    body: web::Json<TransferRequest>,
    api: web::Data<IssuanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let TransferRequest { destination: holder, units, mpt_issuance_id } = body.into_inner();
    debug!("💻️ POST clawback {units} units from {holder}");
    let result = api.clawback(&holder, &units, mpt_issuance_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(mpt_balance => Post "/mpt/balance" impl LedgerBackend);
pub async fn mpt_balance<B: LedgerBackend>(
    body: web::Json<BalanceRequest>,
    api: web::Data<IssuanceApi<B>>,
    listener: web::Data<PaymentListener<B>>,
) -> Result<HttpResponse, ServerError> {
    autostart_listener(&listener).await;
    let BalanceRequest { account, mpt_issuance_id } = body.into_inner();
    let issuance = api.resolve_issuance(mpt_issuance_id.as_deref()).map_err(IssuanceApiError::from)?;
    let balance = api.balance(&issuance, &account).await?;
    trace!("💻️ Balance of {account} in {issuance} is {balance}");
    Ok(HttpResponse::Ok().json(BalanceResponse { account, mpt_issuance_id: issuance, balance }))
}

//----------------------------------------------   Holder opt-in  ----------------------------------------------
route!(opt_in_qr => Post "/mpt/authorize/qr" impl LedgerBackend, SignRelay);
/// Creates a wallet sign request for the holder's opt-in and returns its QR code.
pub async fn opt_in_qr<B: LedgerBackend, S: SignRelay>(
    body: web::Json<OptInQrRequest>,
    api: web::Data<OptInApi<B, S>>,
    issuance: web::Data<IssuanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let OptInQrRequest { holder_address, issuance_id, expires_in } = body.into_inner();
    let issuance_id = issuance.resolve_issuance(issuance_id.as_deref()).map_err(IssuanceApiError::from)?;
    debug!("💻️ POST opt-in QR for {holder_address} on {issuance_id}");
    let qr = api.create_opt_in_request(&holder_address, &issuance_id, expires_in).await?;
    Ok(HttpResponse::Ok().json(qr))
}

route!(opt_in_status => Get "/mpt/authorize/status/{uuid}" impl LedgerBackend, SignRelay);
pub async fn opt_in_status<B: LedgerBackend, S: SignRelay>(
    path: web::Path<String>,
    api: web::Data<OptInApi<B, S>>,
) -> Result<HttpResponse, ServerError> {
    let uuid = path.into_inner();
    let status = api.opt_in_status(&uuid).await?;
    Ok(HttpResponse::Ok().json(status))
}

route!(verify_opt_in => Post "/mpt/authorize/verify" impl LedgerBackend, SignRelay);
/// Checks a signed opt-in on the ledger. Failures are reported in the body as `{ok: false, error}` with status 200.
pub async fn verify_opt_in<B: LedgerBackend, S: SignRelay>(
    body: web::Json<VerifyOptInRequest>,
    api: web::Data<OptInApi<B, S>>,
    issuance: web::Data<IssuanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let VerifyOptInRequest { txid, account, issuance_id } = body.into_inner();
    let issuance_id = match issuance.resolve_issuance(issuance_id.as_deref()) {
        Ok(id) => id,
        Err(e) => return Ok(HttpResponse::Ok().json(VerifyOptInResponse::failure(e))),
    };
    let response = match api.verify_signed_opt_in(&txid, &account, &issuance_id).await {
        Ok(()) => {
            info!("💻️ Opt-in {txid} by {account} verified");
            VerifyOptInResponse::success()
        },
        Err(e) => {
            debug!("💻️ Opt-in {txid} by {account} did not verify. {e}");
            VerifyOptInResponse::failure(e)
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Listener & debug  ----------------------------------------------
route!(start_listener => Post "/listener/start" impl LedgerBackend);
pub async fn start_listener<B: LedgerBackend>(
    listener: web::Data<PaymentListener<B>>,
) -> Result<HttpResponse, ServerError> {
    let outcome = listener.ensure_started().await?;
    info!("💻️ Listener start requested: {outcome:?}");
    Ok(HttpResponse::Ok().json(ListenerStartResponse::from(outcome)))
}

#[get("/debug/sales-store")]
pub async fn sales_store_stats(store: web::Data<SalesStore>) -> Result<HttpResponse, ServerError> {
    let stats = store.stats().map_err(store_error)?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/debug/issuer")]
pub async fn issuer_info(info: web::Data<IssuerInfo>) -> impl Responder {
    HttpResponse::Ok().json(info.get_ref())
}

route!(inspect_tx => Get "/debug/inspect-tx" impl LedgerBackend);
/// Explains how the gateway would treat a transaction, without ingesting it.
pub async fn inspect_tx<B: LedgerBackend>(
    query: web::Query<InspectQuery>,
    listener: web::Data<PaymentListener<B>>,
) -> Result<HttpResponse, ServerError> {
    let inspection = listener.inspect(&query.hash).await?;
    Ok(HttpResponse::Ok().json(inspection))
}
