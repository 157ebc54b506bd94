//! Issuer-side administration of an MPT issuance: creating it, authorizing holders, moving tokens and reading
//! balances.
//!
//! Amounts at this boundary are whole token units. They are scaled to raw ledger values with the configured
//! [`TokenScale`] before anything is submitted.
use std::fmt::Debug;

use ledger_tools::data_objects::{
    TxJson,
    TEC_NO_AUTH,
    TF_MPT_CAN_CLAWBACK,
    TF_MPT_CAN_TRANSFER,
    TF_MPT_REQUIRE_AUTH,
};
use log::*;
use mpt_common::TokenScale;

use crate::{
    helpers::{assert_address, assert_issuance_id, assert_whole_amount, InputError},
    mpt_api::{
        api_objects::{AuthorizeHolderResult, IssuanceResult, MptTransfer},
        errors::IssuanceApiError,
    },
    traits::{GrantOutcome, IssuerOperations, NewIssuance},
};

/// Every issuance this gateway manages must allow transfers and clawback, and require issuer authorization.
pub const REQUIRED_ISSUANCE_FLAGS: u32 = TF_MPT_CAN_TRANSFER | TF_MPT_REQUIRE_AUTH | TF_MPT_CAN_CLAWBACK;
pub const DEFAULT_MAXIMUM_AMOUNT: &str = "9223372036854775807";

pub struct IssuanceApi<L> {
    ledger: L,
    scale: TokenScale,
    preset_issuance: Option<String>,
}

impl<L> Debug for IssuanceApi<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IssuanceApi(scale={}, preset={:?})", self.scale, self.preset_issuance)
    }
}

impl<L> IssuanceApi<L> {
    pub fn new(ledger: L, scale: TokenScale, preset_issuance: Option<String>) -> Self {
        let preset_issuance = preset_issuance.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self { ledger, scale, preset_issuance }
    }

    pub fn scale(&self) -> TokenScale {
        self.scale
    }

    /// The issuance to act on: the one given, else the configured one.
    pub fn resolve_issuance(&self, requested: Option<&str>) -> Result<String, InputError> {
        let id = requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or(self.preset_issuance.as_deref())
            .ok_or(InputError::MissingField("mptIssuanceId"))?;
        assert_issuance_id(id)?;
        Ok(id.to_string())
    }
}

impl<L> IssuanceApi<L>
where L: IssuerOperations
{
    /// Returns the issuance to sell, creating it only if needed. In order of preference:
    /// * the configured issuance id,
    /// * an existing issuance of the issuer that carries [`REQUIRED_ISSUANCE_FLAGS`],
    /// * a freshly created issuance.
    pub async fn create_issuance(&self, params: NewIssuance) -> Result<IssuanceResult, IssuanceApiError> {
        if let Some(id) = &self.preset_issuance {
            debug!("🪙️ Using configured issuance {id}");
            return Ok(IssuanceResult { mpt_issuance_id: id.clone(), created: false });
        }
        let existing = self.ledger.list_issuances().await?;
        if let Some(id) = existing.iter().filter(|i| i.has_flags(REQUIRED_ISSUANCE_FLAGS)).find_map(|i| i.id()) {
            debug!("🪙️ Reusing existing issuance {id}");
            return Ok(IssuanceResult { mpt_issuance_id: id.to_string(), created: false });
        }
        let params = NewIssuance {
            asset_scale: params.asset_scale.or(Some(self.scale.value())),
            maximum_amount: params.maximum_amount.or_else(|| Some(DEFAULT_MAXIMUM_AMOUNT.to_string())),
            transfer_fee: params.transfer_fee.or(Some(0)),
            metadata_hex: params.metadata_hex,
        };
        let hash = self.ledger.create_issuance(&params, REQUIRED_ISSUANCE_FLAGS).await?;
        let after = self.ledger.list_issuances().await?;
        let id = after
            .iter()
            .filter(|i| i.id().is_some())
            .max_by_key(|i| i.sequence)
            .and_then(|i| i.id())
            .ok_or(IssuanceApiError::IssuanceNotFound)?;
        info!("🪙️ Created MPT issuance {id} in {hash}");
        Ok(IssuanceResult { mpt_issuance_id: id.to_string(), created: true })
    }

    /// Grants `holder` the issuer's authorization, provided the holder has opted in.
    pub async fn authorize_holder(
        &self,
        issuance_id: &str,
        holder: &str,
    ) -> Result<AuthorizeHolderResult, IssuanceApiError> {
        assert_issuance_id(issuance_id)?;
        assert_address(holder)?;
        let before = self.ledger.mpt_token_entry(issuance_id, holder).await?;
        let Some(entry) = before else {
            debug!("🪙️ {holder} has not opted in to {issuance_id} yet");
            return Ok(AuthorizeHolderResult { opt_in: false, granted: false, skipped: false });
        };
        if entry.is_authorized() {
            return Ok(AuthorizeHolderResult { opt_in: true, granted: true, skipped: true });
        }
        if let GrantOutcome::Granted(hash) = self.ledger.grant_holder(issuance_id, holder).await? {
            debug!("🪙️ Authorization of {holder} validated in {hash}");
        }
        let after = self.ledger.mpt_token_entry(issuance_id, holder).await?;
        if !after.is_some_and(|e| e.is_authorized()) {
            warn!("🪙️ {holder} is still not authorized for {issuance_id} after MPTokenAuthorize");
            return Err(IssuanceApiError::AuthorizationIneffective);
        }
        info!("🪙️ {holder} is authorized to hold {issuance_id}");
        Ok(AuthorizeHolderResult { opt_in: true, granted: true, skipped: false })
    }

    /// An unsigned opt-in transaction for the holder to sign in their own wallet.
    pub async fn prepare_opt_in(&self, issuance_id: &str, holder: &str) -> Result<TxJson, IssuanceApiError> {
        assert_issuance_id(issuance_id)?;
        assert_address(holder)?;
        Ok(self.ledger.prepare_holder_opt_in(issuance_id, holder).await?)
    }

    pub async fn send(
        &self,
        destination: &str,
        units: &str,
        issuance_id: Option<&str>,
    ) -> Result<MptTransfer, IssuanceApiError> {
        assert_address(destination)?;
        assert_whole_amount(units)?;
        let issuance_id = self.resolve_issuance(issuance_id)?;
        let value = self.scale.to_ledger_value(units)?;
        match self.ledger.send_mpt(&issuance_id, destination, &value).await {
            Ok(hash) => {
                info!("🪙️ Sent {units} units of {issuance_id} to {destination} in {hash}");
                Ok(MptTransfer { mpt_issuance_id: issuance_id, hash })
            },
            Err(e) if e.engine_result() == Some(TEC_NO_AUTH) => {
                Err(IssuanceApiError::HolderNotAuthorized(destination.to_string()))
            },
            Err(e) => Err(e.into()),
        }
    }

    pub async fn clawback(
        &self,
        holder: &str,
        units: &str,
        issuance_id: Option<&str>,
    ) -> Result<MptTransfer, IssuanceApiError> {
        assert_address(holder)?;
        assert_whole_amount(units)?;
        let issuance_id = self.resolve_issuance(issuance_id)?;
        let value = self.scale.to_ledger_value(units)?;
        let hash = self.ledger.clawback_mpt(&issuance_id, holder, &value).await?;
        info!("🪙️ Clawed back {units} units of {issuance_id} from {holder} in {hash}");
        Ok(MptTransfer { mpt_issuance_id: issuance_id, hash })
    }

    /// The account's balance in whole units. An account without an MPToken entry holds `"0"`.
    pub async fn balance(&self, issuance_id: &str, account: &str) -> Result<String, IssuanceApiError> {
        assert_issuance_id(issuance_id)?;
        assert_address(account)?;
        let entry = self.ledger.mpt_token_entry(issuance_id, account).await?;
        let balance = entry
            .and_then(|e| e.mpt_amount)
            .map(|raw| self.scale.from_ledger_value(&raw))
            .unwrap_or_else(|| "0".to_string());
        Ok(balance)
    }
}
