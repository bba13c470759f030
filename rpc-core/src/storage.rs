//! Typed views over decoded storage values.
//!
//! A [`StorageValue`] wraps the value tree the decoder produced. Each `to_*`
//! projection is checked and returns `None` when the value does not have the
//! requested shape; call sites that want the zero value on a miss write
//! `.unwrap_or_default()`.

use crate::{
    codec::decode_hex,
    types::{
        AccountData, AccountInfo, ActiveEraInfo, AuraPreDigest, BabePreDigest, BalanceLock,
        EraRewardPoints, EventRecord, Exposure, Proposal, ReferendumInfo, Registration,
        StakingLedger, ValidatorPrefs, ValidatorPrefsLegacy,
    },
};
use core::str::FromStr;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct StorageValue(Value);

impl From<Value> for StorageValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl StorageValue {
    /// Wrap the textual form of a value. Text that is not JSON is kept as a
    /// plain string, and so are numbers that do not fit a 64-bit integer:
    /// as JSON numbers they would be rounded to an `f64`.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(Value::Number(n)) if n.is_f64() => Self(Value::String(text.trim().to_string())),
            Ok(value) => Self(value),
            Err(_) => Self(Value::String(text.to_string())),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// The canonical textual form: strings bare, everything else as JSON.
    pub fn to_text(&self) -> String {
        match &self.0 {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Deserialize into any shape.
    pub fn project<T: DeserializeOwned>(&self) -> Option<T> {
        T::deserialize(&self.0).ok()
    }

    pub fn to_string_value(&self) -> Option<String> {
        match &self.0 {
            Value::Null => None,
            _ => Some(self.to_text()),
        }
    }

    pub fn to_string_vec(&self) -> Option<Vec<String>> {
        self.project()
    }

    pub fn to_string_map(&self) -> Option<BTreeMap<String, String>> {
        self.project()
    }

    pub fn to_map(&self) -> Option<Map<String, Value>> {
        self.0.as_object().cloned()
    }

    pub fn to_i64(&self) -> Option<i64> {
        match &self.0 {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn to_u64(&self) -> Option<u64> {
        match &self.0 {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn to_u128(&self) -> Option<u128> {
        match &self.0 {
            Value::Number(n) => n.as_u64().map(u128::from),
            Value::String(s) => s.trim().trim_matches('"').parse().ok(),
            _ => None,
        }
    }

    /// Some transports quote numbers and some do not; literal `"` characters
    /// are dropped before parsing so both give the same value.
    pub fn to_decimal(&self) -> Option<Decimal> {
        if self.is_null() {
            return None;
        }
        let text = self.to_text().replace('"', "");
        let text = text.trim();
        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .ok()
    }

    /// The first four bytes of a hex-encoded value, read little-endian.
    pub fn to_u32_from_codec(&self) -> Option<u32> {
        let bytes = decode_hex(self.0.as_str()?).ok()?;
        let head: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(u32::from_le_bytes(head))
    }

    pub fn to_account_data(&self) -> Option<AccountData> {
        self.project()
    }

    pub fn to_account_info(&self) -> Option<AccountInfo> {
        self.project()
    }

    pub fn to_balance_locks(&self) -> Option<Vec<BalanceLock>> {
        self.project()
    }

    pub fn to_staking_ledger(&self) -> Option<StakingLedger> {
        self.project()
    }

    pub fn to_exposure(&self) -> Option<Exposure> {
        self.project()
    }

    pub fn to_era_reward_points(&self) -> Option<EraRewardPoints> {
        self.project()
    }

    pub fn to_active_era_info(&self) -> Option<ActiveEraInfo> {
        self.project()
    }

    pub fn to_validator_prefs(&self) -> Option<ValidatorPrefs> {
        self.project()
    }

    pub fn to_validator_prefs_legacy(&self) -> Option<ValidatorPrefsLegacy> {
        self.project()
    }

    pub fn to_registration(&self) -> Option<Registration> {
        self.project()
    }

    pub fn to_proposal(&self) -> Option<Proposal> {
        self.project()
    }

    pub fn to_referendum_info(&self) -> Option<ReferendumInfo> {
        self.project()
    }

    pub fn to_aura_pre_digest(&self) -> Option<AuraPreDigest> {
        self.project()
    }

    pub fn to_babe_pre_digest(&self) -> Option<BabePreDigest> {
        BabePreDigest::from_value(&self.0)
    }

    pub fn to_event_records(&self) -> Option<Vec<EventRecord>> {
        self.project()
    }
}
