use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::*;
use mpt_common::Drops;
use serde::Serialize;
use thiserror::Error;

use crate::sale_types::{PaymentTxHash, PendingSale};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("The sales store lock is poisoned. A thread panicked while holding it.")]
    LockPoisoned,
}

/// Counters describing the store contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub pending_sales: usize,
    pub used_nonces: usize,
    pub whitelisted: usize,
    pub settling: usize,
    pub settled_sales: usize,
    pub pending_drops: Drops,
}

/// The data behind the store's lock. Methods here assume the caller already holds the appropriate guard, so that
/// check-then-insert sequences can run atomically via [`SalesStore::write`].
#[derive(Debug, Default)]
pub struct SalesState {
    pending: HashMap<PaymentTxHash, PendingSale>,
    used_nonces: HashSet<String>,
    whitelist: HashSet<String>,
    settling: HashSet<PaymentTxHash>,
    settled: HashSet<PaymentTxHash>,
}

impl SalesState {
    /// Inserts the sale under its payment hash and marks its nonce as used.
    pub fn add_pending(&mut self, sale: PendingSale) {
        self.used_nonces.insert(sale.nonce.clone());
        self.pending.insert(sale.payment_tx.clone(), sale);
    }

    pub fn get(&self, hash: &PaymentTxHash) -> Option<&PendingSale> {
        self.pending.get(hash)
    }

    pub fn has_payment_tx(&self, hash: &PaymentTxHash) -> bool {
        self.pending.contains_key(hash)
    }

    /// True once the payment's sale has been delivered. A settled payment never becomes a sale again.
    pub fn is_settled(&self, hash: &PaymentTxHash) -> bool {
        self.settled.contains(hash)
    }

    pub fn has_nonce(&self, nonce: &str) -> bool {
        self.used_nonces.contains(nonce)
    }

    pub fn find_by_nonce(&self, nonce: &str) -> Option<&PendingSale> {
        self.pending.values().find(|s| s.nonce == nonce)
    }

    pub fn is_whitelisted(&self, holder: &str) -> bool {
        self.whitelist.contains(holder)
    }

    pub fn stats(&self) -> StoreStats {
        let pending_drops = self.pending.values().filter_map(|s| s.amount_native.parse::<Drops>().ok()).sum();
        StoreStats {
            pending_sales: self.pending.len(),
            used_nonces: self.used_nonces.len(),
            whitelisted: self.whitelist.len(),
            settling: self.settling.len(),
            settled_sales: self.settled.len(),
            pending_drops,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SalesStore {
    state: Arc<RwLock<SalesState>>,
}

impl SalesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, SalesState>, StoreError> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    /// Exclusive access to the store. Never hold the guard across an `.await`.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, SalesState>, StoreError> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }

    pub fn add_pending(&self, sale: PendingSale) -> Result<(), StoreError> {
        self.write()?.add_pending(sale);
        Ok(())
    }

    pub fn get(&self, hash: &PaymentTxHash) -> Result<Option<PendingSale>, StoreError> {
        Ok(self.read()?.get(hash).cloned())
    }

    /// Removes the sale. Its nonce stays consumed.
    pub fn delete(&self, hash: &PaymentTxHash) -> Result<Option<PendingSale>, StoreError> {
        Ok(self.write()?.pending.remove(hash))
    }

    /// Removes the delivered sale and remembers its payment hash, so that ingesting the payment again is a duplicate.
    pub fn complete_settlement(&self, hash: &PaymentTxHash) -> Result<Option<PendingSale>, StoreError> {
        let mut state = self.write()?;
        state.settled.insert(hash.clone());
        Ok(state.pending.remove(hash))
    }

    pub fn is_settled(&self, hash: &PaymentTxHash) -> Result<bool, StoreError> {
        Ok(self.read()?.is_settled(hash))
    }

    pub fn has_payment_tx(&self, hash: &PaymentTxHash) -> Result<bool, StoreError> {
        Ok(self.read()?.has_payment_tx(hash))
    }

    pub fn has_nonce(&self, nonce: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.has_nonce(nonce))
    }

    pub fn find_by_nonce(&self, nonce: &str) -> Result<Option<PendingSale>, StoreError> {
        Ok(self.read()?.find_by_nonce(nonce).cloned())
    }

    pub fn is_whitelisted(&self, holder: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.is_whitelisted(holder))
    }

    pub fn whitelist_add(&self, holder: &str) -> Result<(), StoreError> {
        if self.write()?.whitelist.insert(holder.to_string()) {
            debug!("🗃️ {holder} added to the holder whitelist");
        }
        Ok(())
    }

    /// All pending sales, newest first.
    pub fn list_pending(&self) -> Result<Vec<PendingSale>, StoreError> {
        let mut sales = self.read()?.pending.values().cloned().collect::<Vec<_>>();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales)
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(self.read()?.stats())
    }

    /// Marks the sale as being settled. Returns `None` if another settlement of the same sale is already in flight.
    /// The claim is released when the returned guard is dropped.
    pub fn claim_settlement(&self, hash: &PaymentTxHash) -> Result<Option<SettlementClaim>, StoreError> {
        let claimed = self.write()?.settling.insert(hash.clone());
        Ok(claimed.then(|| SettlementClaim { store: self.clone(), hash: hash.clone() }))
    }
}

/// Exclusive right to settle one sale.
#[derive(Debug)]
pub struct SettlementClaim {
    store: SalesStore,
    hash: PaymentTxHash,
}

impl SettlementClaim {
    pub fn payment_tx(&self) -> &PaymentTxHash {
        &self.hash
    }
}

impl Drop for SettlementClaim {
    fn drop(&mut self) {
        match self.store.state.write() {
            Ok(mut state) => {
                state.settling.remove(&self.hash);
            },
            Err(_) => error!("🗃️ Could not release the settlement claim on {}. The store lock is poisoned.", self.hash),
        }
    }
}
