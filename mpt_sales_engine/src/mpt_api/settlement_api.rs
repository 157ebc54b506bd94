use std::fmt::Debug;

use log::*;
use mpt_common::TokenScale;

use crate::{
    events::{EventProducers, SaleSettledEvent},
    mpt_api::{api_objects::SettlementReceipt, errors::SettlementError},
    sale_types::PaymentTxHash,
    store::SalesStore,
    traits::{GrantOutcome, IssuerOperations},
};

/// `SettlementApi` delivers the tokens a buyer paid for and closes out the pending sale.
pub struct SettlementApi<L> {
    ledger: L,
    store: SalesStore,
    scale: TokenScale,
    producers: EventProducers,
}

impl<L> Debug for SettlementApi<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi(scale={})", self.scale)
    }
}

impl<L> SettlementApi<L> {
    pub fn new(ledger: L, store: SalesStore, scale: TokenScale, producers: EventProducers) -> Self {
        Self { ledger, store, scale, producers }
    }

    pub fn store(&self) -> &SalesStore {
        &self.store
    }
}

impl<L> SettlementApi<L>
where L: IssuerOperations
{
    /// Settles the pending sale funded by `payment_tx`:
    /// 1. the holder must be whitelisted,
    /// 2. the issuer authorizes the holder (a holder that is already authorized is fine),
    /// 3. the sale's units, scaled to ledger value, are sent to the holder,
    /// 4. the sale is removed and the delivery hash returned.
    ///
    /// Any failure before step 4 leaves the sale pending, so settlement can simply be retried. Only one settlement
    /// per sale can be in flight; a concurrent attempt fails with [`SettlementError::InProgress`].
    pub async fn settle(&self, payment_tx: &str) -> Result<SettlementReceipt, SettlementError> {
        let hash = PaymentTxHash::new(payment_tx);
        let Some(_claim) = self.store.claim_settlement(&hash)? else {
            return Err(SettlementError::InProgress(hash.to_string()));
        };
        let sale = self.store.get(&hash)?.ok_or_else(|| SettlementError::NotFound(hash.to_string()))?;
        if !self.store.is_whitelisted(&sale.holder)? {
            warn!("🚚️ Refusing to settle {hash}. Holder {} is not whitelisted", sale.holder);
            return Err(SettlementError::HolderNotWhitelisted(sale.holder));
        }
        let ledger_value = self.scale.to_ledger_value(&sale.units)?;
        match self.ledger.grant_holder(&sale.issuance_id, &sale.holder).await? {
            GrantOutcome::Granted(tx) => debug!("🚚️ Authorized {} for {} in {tx}", sale.holder, sale.issuance_id),
            GrantOutcome::AlreadyGranted => trace!("🚚️ {} was already authorized", sale.holder),
        }
        let delivery = self.ledger.send_mpt(&sale.issuance_id, &sale.holder, &ledger_value).await?;
        self.store.complete_settlement(&hash)?;
        info!("🚚️ Sale {hash} settled. {} units delivered to {} in {delivery}", sale.units, sale.holder);
        let receipt = SettlementReceipt {
            payment_tx: hash,
            hash: delivery.clone(),
            holder: sale.holder.clone(),
            issuance_id: sale.issuance_id.clone(),
            units: sale.units.clone(),
        };
        self.producers.publish_sale_settled(SaleSettledEvent::new(sale, delivery)).await;
        Ok(receipt)
    }
}
