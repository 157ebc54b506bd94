//! Holder opt-in through a wallet sign relay.
//!
//! The holder must create their MPToken entry with a transaction signed by their own key. The gateway builds that
//! transaction, forwards it to the relay and hands the resulting QR code back to the caller. Once the holder has
//! signed, [`OptInApi::verify_signed_opt_in`] checks the result on the ledger.
use std::fmt::Write;

use ledger_tools::{
    data_objects::{TxJson, TX_TYPE_MPT_AUTHORIZE},
    PayloadStatus,
};
use log::*;

use crate::{
    helpers::{assert_address, assert_issuance_id, assert_tx_hash, assert_uuid},
    mpt_api::{api_objects::OptInQr, errors::OptInApiError},
    traits::{LedgerQuery, SignRelay},
};

pub const DEFAULT_SIGN_REQUEST_EXPIRY: u64 = 300;
const QR_MODULE_SIZE: usize = 6;
const QR_MARGIN: usize = 2;

/// The unsigned `MPTokenAuthorize` a holder submits to opt in. The holder's wallet fills in the rest.
pub fn build_holder_authorize_tx(holder: &str, issuance_id: &str) -> TxJson {
    let mut tx = TxJson::new(TX_TYPE_MPT_AUTHORIZE, holder);
    tx.mpt_issuance_id = Some(issuance_id.to_string());
    tx
}

/// Renders a QR module matrix (non-zero is dark) as an SVG document.
pub fn qr_matrix_to_svg(matrix: &[Vec<u8>]) -> String {
    let n = matrix.len();
    let size = (n + QR_MARGIN * 2) * QR_MODULE_SIZE;
    let mut rects = String::new();
    for (y, row) in matrix.iter().enumerate() {
        for (x, _) in row.iter().enumerate().filter(|(_, v)| **v != 0) {
            let rx = (x + QR_MARGIN) * QR_MODULE_SIZE;
            let ry = (y + QR_MARGIN) * QR_MODULE_SIZE;
            let _ = write!(rects, r#"<rect x="{rx}" y="{ry}" width="{QR_MODULE_SIZE}" height="{QR_MODULE_SIZE}" />"#);
        }
    }
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {size} {size}" shape-rendering="crispEdges">{rects}</svg>"#
    )
}

pub fn svg_data_url(svg: &str) -> String {
    format!("data:image/svg+xml;utf8,{}", urlencoding::encode(svg))
}

pub struct OptInApi<L, S> {
    ledger: L,
    relay: Option<S>,
}

impl<L, S> OptInApi<L, S> {
    /// `relay` is `None` when no sign relay credentials are configured. Ledger verification still works then.
    pub fn new(ledger: L, relay: Option<S>) -> Self {
        Self { ledger, relay }
    }

    fn relay(&self) -> Result<&S, OptInApiError> {
        self.relay.as_ref().ok_or(OptInApiError::RelayNotConfigured)
    }
}

impl<L, S> OptInApi<L, S>
where
    L: LedgerQuery,
    S: SignRelay,
{
    /// Asks the holder's wallet to sign the opt-in transaction. `expires_in` is in seconds and defaults to
    /// [`DEFAULT_SIGN_REQUEST_EXPIRY`].
    pub async fn create_opt_in_request(
        &self,
        holder: &str,
        issuance_id: &str,
        expires_in: Option<u64>,
    ) -> Result<OptInQr, OptInApiError> {
        assert_address(holder)?;
        assert_issuance_id(issuance_id)?;
        let relay = self.relay()?;
        let txjson = build_holder_authorize_tx(holder, issuance_id);
        let expiry = expires_in.filter(|e| *e > 0).unwrap_or(DEFAULT_SIGN_REQUEST_EXPIRY);
        let response = relay.create_sign_request(&txjson, Some(expiry)).await?;
        let refs = response.refs;
        let (qr_png, qr_svg) = match (refs.qr_png, refs.qr_svg, refs.qr_matrix) {
            (Some(png), _, _) => (Some(png), None),
            (None, Some(svg), _) => (None, Some(svg)),
            (None, None, Some(matrix)) if !matrix.is_empty() => (None, Some(svg_data_url(&qr_matrix_to_svg(&matrix)))),
            _ => {
                warn!("📲️ Sign request {} came back without a QR code", response.uuid);
                return Err(OptInApiError::QrUnavailable);
            },
        };
        info!("📲️ Opt-in sign request {} created for {holder} on {issuance_id}", response.uuid);
        Ok(OptInQr {
            uuid: response.uuid,
            qr_png,
            qr_svg,
            websocket_status: refs.websocket_status,
            next_url: response.next_always,
            txjson,
        })
    }

    pub async fn opt_in_status(&self, uuid: &str) -> Result<PayloadStatus, OptInApiError> {
        assert_uuid(uuid)?;
        let status = self.relay()?.payload_status(uuid).await?;
        trace!("📲️ Sign request {uuid}: resolved={} signed={}", status.resolved, status.signed);
        Ok(status)
    }

    /// Confirms that `txid` is a validated `MPTokenAuthorize` from `account` for `issuance_id`.
    pub async fn verify_signed_opt_in(
        &self,
        txid: &str,
        account: &str,
        issuance_id: &str,
    ) -> Result<(), OptInApiError> {
        assert_tx_hash(txid)?;
        assert_address(account)?;
        assert_issuance_id(issuance_id)?;
        let response = self.ledger.fetch_transaction(txid).await?;
        if !response.validated {
            return Err(OptInApiError::Verification("Transaction not validated yet".into()));
        }
        let tx = response.transaction();
        if !tx.is_type(TX_TYPE_MPT_AUTHORIZE) {
            let found = tx.transaction_type.as_deref().unwrap_or("unknown");
            return Err(OptInApiError::Verification(format!(
                "Wrong transaction type: expected {TX_TYPE_MPT_AUTHORIZE}, got {found}"
            )));
        }
        if tx.account.as_deref() != Some(account) {
            let found = tx.account.as_deref().unwrap_or("none");
            return Err(OptInApiError::Verification(format!("Account mismatch: expected {account}, got {found}")));
        }
        if tx.mpt_issuance_id.as_deref() != Some(issuance_id) {
            let found = tx.mpt_issuance_id.as_deref().unwrap_or("none");
            return Err(OptInApiError::Verification(format!(
                "Issuance mismatch: expected {issuance_id}, got {found}"
            )));
        }
        info!("📲️ Verified opt-in of {account} to {issuance_id} in {txid}");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use ledger_tools::{SignRequestRefs, SignRequestResponse, XummError};

    use super::*;
    use crate::test_utils::{purchase_tx, random_tx_hash, FakeLedger, FakeRelay, HOLDER, ISSUANCE_ID, ISSUER};

    const UUID: &str = "5e69d2a8-8a0b-4d3e-9f3c-2c6c1d7c8e11";

    fn relay_with(refs: SignRequestRefs) -> FakeRelay {
        FakeRelay::new(Ok(SignRequestResponse {
            uuid: UUID.into(),
            refs,
            next_always: format!("https://xumm.app/sign/{UUID}"),
        }))
    }

    #[test]
    fn matrix_renders_dark_modules_only() {
        let svg = qr_matrix_to_svg(&[vec![1, 0], vec![0, 1]]);
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 36 36""#));
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains(r#"<rect x="12" y="12" width="6" height="6" />"#));
        assert!(svg.contains(r#"<rect x="18" y="18" width="6" height="6" />"#));
        let url = svg_data_url(&svg);
        assert!(url.starts_with("data:image/svg+xml;utf8,%3Csvg%20xmlns%3D"));
    }

    #[tokio::test]
    async fn png_is_preferred() {
        let refs = SignRequestRefs {
            qr_png: Some("https://xumm.app/sign/qr.png".into()),
            qr_svg: Some("<svg/>".into()),
            ..Default::default()
        };
        let relay = relay_with(refs);
        let api = OptInApi::new(FakeLedger::new(ISSUER), Some(relay.clone()));
        let qr = api.create_opt_in_request(HOLDER, ISSUANCE_ID, None).await.unwrap();
        assert_eq!(qr.uuid, UUID);
        assert!(qr.qr_png.is_some());
        assert!(qr.qr_svg.is_none());
        assert_eq!(qr.txjson, build_holder_authorize_tx(HOLDER, ISSUANCE_ID));
        let requests = relay.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, Some(DEFAULT_SIGN_REQUEST_EXPIRY));
    }

    #[tokio::test]
    async fn matrix_fallback_and_missing_qr() {
        let refs = SignRequestRefs { qr_matrix: Some(vec![vec![1]]), ..Default::default() };
        let api = OptInApi::new(FakeLedger::new(ISSUER), Some(relay_with(refs)));
        let qr = api.create_opt_in_request(HOLDER, ISSUANCE_ID, Some(60)).await.unwrap();
        assert!(qr.qr_svg.unwrap().starts_with("data:image/svg+xml;utf8,"));

        let api = OptInApi::new(FakeLedger::new(ISSUER), Some(relay_with(SignRequestRefs::default())));
        let err = api.create_opt_in_request(HOLDER, ISSUANCE_ID, None).await.unwrap_err();
        assert!(matches!(err, OptInApiError::QrUnavailable));
    }

    #[tokio::test]
    async fn relay_must_be_configured() {
        let api = OptInApi::<FakeLedger, FakeRelay>::new(FakeLedger::new(ISSUER), None);
        let err = api.create_opt_in_request(HOLDER, ISSUANCE_ID, None).await.unwrap_err();
        assert!(matches!(err, OptInApiError::RelayNotConfigured));
    }

    #[tokio::test]
    async fn status_checks_uuid_and_maps_not_found() {
        let relay = relay_with(SignRequestRefs::default());
        let api = OptInApi::new(FakeLedger::new(ISSUER), Some(relay.clone()));
        assert!(matches!(api.opt_in_status("not-a-uuid").await, Err(OptInApiError::Input(_))));
        assert!(matches!(api.opt_in_status(UUID).await, Err(OptInApiError::Relay(XummError::NotFound))));
        let status = PayloadStatus { uuid: UUID.into(), resolved: true, signed: true, txid: None, account: None };
        relay.set_status(status.clone());
        assert_eq!(api.opt_in_status(UUID).await.unwrap(), status);
    }

    #[tokio::test]
    async fn verify_signed_opt_in() {
        let ledger = FakeLedger::new(ISSUER);
        let api = OptInApi::<FakeLedger, FakeRelay>::new(ledger.clone(), None);
        let good = random_tx_hash();
        ledger.add_transaction(&good, build_holder_authorize_tx(HOLDER, ISSUANCE_ID), true);
        api.verify_signed_opt_in(&good, HOLDER, ISSUANCE_ID).await.unwrap();

        let other_issuance = "0000000000000000000000000000000000000000000000AB";
        let err = api.verify_signed_opt_in(&good, HOLDER, other_issuance).await.unwrap_err();
        assert!(matches!(err, OptInApiError::Verification(m) if m.starts_with("Issuance mismatch")));

        let pending = random_tx_hash();
        ledger.add_transaction(&pending, build_holder_authorize_tx(HOLDER, ISSUANCE_ID), false);
        let err = api.verify_signed_opt_in(&pending, HOLDER, ISSUANCE_ID).await.unwrap_err();
        assert!(matches!(err, OptInApiError::Verification(_)));

        let payment = random_tx_hash();
        let memo = crate::helpers::PurchaseMemo::new(ISSUANCE_ID, "N1", "1");
        ledger.add_transaction(&payment, purchase_tx(HOLDER, ISSUER, "1000000", &memo), true);
        let err = api.verify_signed_opt_in(&payment, HOLDER, ISSUANCE_ID).await.unwrap_err();
        assert!(matches!(err, OptInApiError::Verification(m) if m.starts_with("Wrong transaction type")));

        let err = api.verify_signed_opt_in(&random_tx_hash(), HOLDER, ISSUANCE_ID).await.unwrap_err();
        assert!(matches!(err, OptInApiError::Ledger(_)));
    }
}
