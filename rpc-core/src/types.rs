//! Typed shapes of common storage values, digests and events.
//!
//! Every shape deserializes from the value tree produced by the decoder.
//! Missing or `null` fields fall back to zero values, since the same item
//! carries different fields across runtime versions.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Balance = u128;

/// Balances travel as JSON numbers when they fit a `u64` and as (sometimes
/// quoted) decimal text otherwise.
pub(crate) mod lenient_u128 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(n: &u128, s: S) -> Result<S::Ok, S::Error> {
        match u64::try_from(*n) {
            Ok(small) => s.serialize_u64(small),
            Err(_) => s.serialize_str(&n.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        match Option::<Repr>::deserialize(d)? {
            None => Ok(0),
            Some(Repr::Int(n)) => Ok(u128::from(n)),
            Some(Repr::Text(text)) => text
                .trim()
                .trim_matches('"')
                .parse()
                .map_err(de::Error::custom),
        }
    }
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AccountData {
    #[serde(with = "lenient_u128")]
    pub free: Balance,
    #[serde(with = "lenient_u128")]
    pub reserved: Balance,
    #[serde(with = "lenient_u128")]
    pub misc_frozen: Balance,
    #[serde(with = "lenient_u128")]
    pub fee_frozen: Balance,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AccountInfo {
    pub nonce: u32,
    /// Single reference counter of older runtimes.
    pub refcount: u32,
    pub consumers: u32,
    pub providers: u32,
    pub sufficients: u32,
    pub data: AccountData,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BalanceLock {
    pub id: String,
    #[serde(with = "lenient_u128")]
    pub amount: Balance,
    pub reasons: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UnlockChunk {
    #[serde(with = "lenient_u128")]
    pub value: Balance,
    pub era: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StakingLedger {
    pub stash: String,
    #[serde(with = "lenient_u128")]
    pub total: Balance,
    #[serde(with = "lenient_u128")]
    pub active: Balance,
    #[serde(deserialize_with = "null_as_default")]
    pub unlocking: Vec<UnlockChunk>,
    #[serde(deserialize_with = "null_as_default")]
    pub claimed_rewards: Vec<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct IndividualExposure {
    pub who: String,
    #[serde(with = "lenient_u128")]
    pub value: Balance,
}

/// A validator's stake for one era: its own bond plus its nominators'.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Exposure {
    #[serde(with = "lenient_u128")]
    pub total: Balance,
    #[serde(with = "lenient_u128")]
    pub own: Balance,
    #[serde(deserialize_with = "null_as_default")]
    pub others: Vec<IndividualExposure>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EraRewardPoints {
    pub total: u32,
    /// Points per validator, keyed by hex account id.
    #[serde(deserialize_with = "null_as_default")]
    pub individual: BTreeMap<String, u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ActiveEraInfo {
    pub index: u32,
    /// Milliseconds timestamp of the era start, once known.
    pub start: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ValidatorPrefs {
    /// Parts per billion.
    pub commission: u32,
    pub blocked: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ValidatorPrefsLegacy {
    pub unstake_threshold: u32,
    #[serde(with = "lenient_u128")]
    pub validator_payment: Balance,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub enum Judgement {
    #[default]
    Unknown,
    FeePaid(#[serde(with = "lenient_u128")] Balance),
    Reasonable,
    KnownGood,
    OutOfDate,
    LowQuality,
    Erroneous,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub enum IdentityData {
    #[default]
    None,
    Raw(String),
    BlakeTwo256(String),
    Sha256(String),
    Keccak256(String),
    ShaThree256(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct IdentityInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub additional: Vec<(IdentityData, IdentityData)>,
    pub display: IdentityData,
    pub legal: IdentityData,
    pub web: IdentityData,
    pub riot: IdentityData,
    pub email: IdentityData,
    pub pgp_fingerprint: Option<String>,
    pub image: IdentityData,
    pub twitter: IdentityData,
}

/// An identity registration with its registrar judgements.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Registration {
    #[serde(deserialize_with = "null_as_default")]
    pub judgements: Vec<(u32, Judgement)>,
    #[serde(with = "lenient_u128")]
    pub deposit: Balance,
    pub info: IdentityInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CallParam {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: Value,
}

/// A decoded governance proposal, i.e. a call.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Proposal {
    pub call_index: String,
    pub call_module: String,
    pub call_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub params: Vec<CallParam>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Tally {
    #[serde(with = "lenient_u128")]
    pub ayes: Balance,
    #[serde(with = "lenient_u128")]
    pub nays: Balance,
    #[serde(with = "lenient_u128")]
    pub turnout: Balance,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ReferendumStatus {
    pub end: u32,
    pub proposal_hash: String,
    pub threshold: String,
    pub delay: u32,
    pub tally: Tally,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ReferendumFinished {
    pub approved: bool,
    pub end: u32,
}

/// Exactly one of the two is set for a well-formed value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ReferendumInfo {
    #[serde(rename = "Ongoing")]
    pub ongoing: Option<ReferendumStatus>,
    #[serde(rename = "Finished")]
    pub finished: Option<ReferendumFinished>,
}

/// The slot claim carried by an Aura pre-runtime digest.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuraPreDigest {
    pub slot_number: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BabePrimaryPreDigest {
    pub authority_index: u32,
    pub slot_number: u64,
    pub vrf_output: String,
    pub vrf_proof: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BabeSecondaryPlainPreDigest {
    pub authority_index: u32,
    pub slot_number: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BabeSecondaryVrfPreDigest {
    pub authority_index: u32,
    pub slot_number: u64,
    pub vrf_output: String,
    pub vrf_proof: String,
}

/// The slot claim carried by a BABE pre-runtime digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BabePreDigest {
    Primary(BabePrimaryPreDigest),
    Secondary(BabeSecondaryPlainPreDigest),
    Vrf(BabeSecondaryVrfPreDigest),
}

impl BabePreDigest {
    /// Read a claim from a decoded value. The decoder always yields a single
    /// variant; value trees from elsewhere may carry several, in which case
    /// `Primary` wins over `Secondary`, which wins over `VRF`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let claim = value.as_object()?;
        let populated = |key: &str| claim.get(key).filter(|v| v.is_object());
        if let Some(v) = populated("Primary") {
            return BabePrimaryPreDigest::deserialize(v).ok().map(Self::Primary);
        }
        if let Some(v) = populated("Secondary") {
            return BabeSecondaryPlainPreDigest::deserialize(v)
                .ok()
                .map(Self::Secondary);
        }
        if let Some(v) = populated("VRF") {
            return BabeSecondaryVrfPreDigest::deserialize(v).ok().map(Self::Vrf);
        }
        None
    }

    pub fn authority_index(&self) -> u32 {
        match self {
            Self::Primary(d) => d.authority_index,
            Self::Secondary(d) => d.authority_index,
            Self::Vrf(d) => d.authority_index,
        }
    }

    pub fn slot_number(&self) -> u64 {
        match self {
            Self::Primary(d) => d.slot_number,
            Self::Secondary(d) => d.slot_number,
            Self::Vrf(d) => d.slot_number,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EventParam {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: Value,
}

/// One entry of `System::Events`, as rendered by the event decoder.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EventRecord {
    pub phase: u8,
    pub extrinsic_idx: Option<u32>,
    /// Hex of the module and event index bytes.
    #[serde(rename = "type")]
    pub event_index: String,
    pub module_id: String,
    pub event_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub params: Vec<EventParam>,
    #[serde(deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn balances_accept_numbers_and_text() {
        let data: AccountData = serde_json::from_value(json!({
            "free": 10,
            "reserved": "340282366920938463463374607431768211455",
            "misc_frozen": "\"7\"",
            "fee_frozen": null
        }))
        .unwrap();
        assert_eq!(data.free, 10);
        assert_eq!(data.reserved, u128::MAX);
        assert_eq!(data.misc_frozen, 7);
        assert_eq!(data.fee_frozen, 0);
    }

    #[test]
    fn large_balances_serialize_as_text() {
        let data = AccountData { free: u128::MAX, reserved: 1, ..Default::default() };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["free"], json!(u128::MAX.to_string()));
        assert_eq!(value["reserved"], json!(1));
    }

    #[test]
    fn babe_claims_prefer_primary() {
        let value = json!({
            "Secondary": { "authority_index": 2, "slot_number": 10 },
            "Primary": { "authority_index": 0, "slot_number": 10 }
        });
        let claim = BabePreDigest::from_value(&value).unwrap();
        assert!(matches!(claim, BabePreDigest::Primary(_)));
        assert_eq!(claim.authority_index(), 0);

        let value = json!({ "Phantom": null, "VRF": { "authority_index": 4, "slot_number": 11 } });
        let claim = BabePreDigest::from_value(&value).unwrap();
        assert_eq!((claim.authority_index(), claim.slot_number()), (4, 11));

        assert_eq!(BabePreDigest::from_value(&json!({ "Phantom": null })), None);
        assert_eq!(BabePreDigest::from_value(&json!(3)), None);
    }

    #[test]
    fn judgements_read_both_unit_forms() {
        let judgements: Vec<(u32, Judgement)> = serde_json::from_value(json!([
            [0, { "FeePaid": "12" }],
            [1, { "Reasonable": null }],
            [2, "KnownGood"]
        ]))
        .unwrap();
        assert_eq!(
            judgements,
            vec![
                (0, Judgement::FeePaid(12)),
                (1, Judgement::Reasonable),
                (2, Judgement::KnownGood)
            ]
        );
    }
}
