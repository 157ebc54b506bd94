use log::*;
use mpt_sales_engine::{api_objects::StartOutcome, traits::LedgerBackend, PaymentListener};
use tokio::task::JoinHandle;

/// Starts the live payment listener in the background when the server boots. Do not await the returned handle before
/// the server runs; a slow ledger connection would hold up startup.
pub fn start_listener_worker<B: LedgerBackend + 'static>(listener: PaymentListener<B>) -> JoinHandle<()> {
    actix_web::rt::spawn(async move {
        info!("👂️ Starting the payment listener");
        autostart_listener(&listener).await;
    })
}

/// Makes sure the live listener is running. Failures are logged and otherwise ignored so that the route which
/// triggered the start can still do its own work. The next trigger tries again.
pub async fn autostart_listener<B: LedgerBackend>(listener: &PaymentListener<B>) {
    match listener.ensure_started().await {
        Ok(StartOutcome::Started) => info!("👂️ Payment listener started"),
        Ok(StartOutcome::AlreadyRunning) => {},
        Err(e) => warn!("👂️ Could not start the payment listener. {e}"),
    }
}
