//! Block author resolution from consensus pre-runtime digests.
//!
//! Aura and BABE both record the block producer's slot claim in a
//! `PreRuntime` digest item. Aura authors follow the slot number round-robin
//! over the validator set, while BABE claims name the authority index outright.

use crate::{
    codec::{decode_hex, ScaleDecoder, TypeRegistry},
    storage::StorageValue,
    LOG_TARGET,
};
use parity_scale_codec::Decode;
use serde::Deserialize;
use serde_json::Value;
use sp_runtime::{generic::DigestItem, ConsensusEngineId};

pub const AURA_ENGINE_ID: ConsensusEngineId = *b"aura";
pub const BABE_ENGINE_ID: ConsensusEngineId = *b"BABE";

/// The engine id and opaque payload of a `PreRuntime` digest item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreRuntimeDigest {
    pub engine: ConsensusEngineId,
    pub data: Vec<u8>,
}

/// The JSON form of a pre-runtime digest: the engine id as a little-endian
/// `u32` and the payload as hex.
#[derive(Deserialize)]
struct PreRuntimeJson {
    engine: u32,
    data: String,
}

impl PreRuntimeDigest {
    /// Parse a SCALE-encoded digest item. Items other than `PreRuntime` give
    /// `None`.
    pub fn from_scale(raw: &[u8]) -> Option<Self> {
        let item = DigestItem::decode(&mut &raw[..])
            .map_err(|e| log::debug!(target: LOG_TARGET, "malformed digest item: {e}"))
            .ok()?;
        let (engine, data) = item.as_pre_runtime()?;
        Some(Self {
            engine,
            data: data.to_vec(),
        })
    }

    pub fn from_json(json: &[u8]) -> Option<Self> {
        Self::from_json_value(&serde_json::from_slice(json).ok()?)
    }

    pub fn from_json_value(value: &Value) -> Option<Self> {
        let digest = PreRuntimeJson::deserialize(value).ok()?;
        Some(Self {
            engine: digest.engine.to_le_bytes(),
            data: decode_hex(&digest.data).ok()?,
        })
    }

    pub fn is_aura(&self) -> bool {
        self.engine == AURA_ENGINE_ID
    }

    pub fn is_babe(&self) -> bool {
        self.engine == BABE_ENGINE_ID
    }

    /// Pick the author out of `validators`, decoding the slot claim with
    /// `decoder`.
    pub fn author<D, V>(&self, decoder: &D, validators: &[V]) -> Option<V>
    where
        D: ScaleDecoder + ?Sized,
        V: Clone,
    {
        if validators.is_empty() {
            return None;
        }
        let index = if self.is_aura() {
            let claim = self.decode_claim(decoder, "RawAuraPreDigest")?;
            let slot = claim.to_aura_pre_digest()?.slot_number;
            // The remainder is below the validator count, which fits usize.
            (slot % validators.len() as u64) as usize
        } else if self.is_babe() {
            let claim = self.decode_claim(decoder, "RawBabePreDigest")?;
            usize::try_from(claim.to_babe_pre_digest()?.authority_index()).ok()?
        } else {
            log::debug!(
                target: LOG_TARGET,
                "no author rule for engine {}",
                String::from_utf8_lossy(&self.engine)
            );
            return None;
        };
        validators.get(index).cloned()
    }

    fn decode_claim<D: ScaleDecoder + ?Sized>(&self, decoder: &D, ty: &str) -> Option<StorageValue> {
        decoder
            .decode(&self.data, ty, None)
            .map(StorageValue::from)
            .map_err(|e| log::debug!(target: LOG_TARGET, "undecodable {ty}: {e}"))
            .ok()
    }
}

/// Resolve the author of a block from one of its SCALE-encoded digest items.
/// Returns `None` when the item is not a pre-runtime digest of a known engine
/// or names no validator in the set.
pub fn extract_author<V: Clone>(raw_digest: &[u8], validators: &[V]) -> Option<V> {
    extract_author_with(TypeRegistry::builtin(), raw_digest, validators)
}

pub fn extract_author_with<D, V>(decoder: &D, raw_digest: &[u8], validators: &[V]) -> Option<V>
where
    D: ScaleDecoder + ?Sized,
    V: Clone,
{
    if validators.is_empty() {
        return None;
    }
    PreRuntimeDigest::from_scale(raw_digest)?.author(decoder, validators)
}

/// Like [`extract_author`], starting from the JSON form
/// `{"engine": <u32>, "data": "0x.."}`.
pub fn extract_author_from_json<V: Clone>(json: &[u8], validators: &[V]) -> Option<V> {
    if validators.is_empty() {
        return None;
    }
    PreRuntimeDigest::from_json(json)?.author(TypeRegistry::builtin(), validators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec::DecodeError, metadata::RuntimeMetadata};
    use parity_scale_codec::Encode;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;
    use serde_json::json;

    const VALIDATORS: [&str; 3] = ["A", "B", "C"];

    fn pre_runtime(engine: ConsensusEngineId, data: Vec<u8>) -> Vec<u8> {
        DigestItem::PreRuntime(engine, data).encode()
    }

    fn babe_primary(authority_index: u32, slot: u64) -> Vec<u8> {
        (1u8, authority_index, slot, [0u8; 32], [0u8; 64]).encode()
    }

    #[test]
    fn aura_author_follows_the_slot() {
        let raw = pre_runtime(AURA_ENGINE_ID, 7u64.encode());
        assert_eq!(extract_author(&raw, &VALIDATORS), Some("B"));

        let raw = pre_runtime(AURA_ENGINE_ID, 9u64.encode());
        assert_eq!(extract_author(&raw, &VALIDATORS), Some("A"));
    }

    #[test]
    fn babe_author_is_the_claimed_authority() {
        let raw = pre_runtime(BABE_ENGINE_ID, babe_primary(2, 100));
        assert_eq!(extract_author(&raw, &VALIDATORS), Some("C"));

        let secondary = (2u8, 1u32, 101u64).encode();
        let raw = pre_runtime(BABE_ENGINE_ID, secondary);
        assert_eq!(extract_author(&raw, &VALIDATORS), Some("B"));

        let vrf = (3u8, 0u32, 102u64, [0u8; 32], [0u8; 64]).encode();
        let raw = pre_runtime(BABE_ENGINE_ID, vrf);
        assert_eq!(extract_author(&raw, &VALIDATORS), Some("A"));
    }

    #[test]
    fn babe_index_out_of_range() {
        let raw = pre_runtime(BABE_ENGINE_ID, babe_primary(3, 100));
        assert_eq!(extract_author(&raw, &VALIDATORS), None);
    }

    #[test]
    fn babe_phantom_claim_names_nobody() {
        let raw = pre_runtime(BABE_ENGINE_ID, vec![0]);
        assert_eq!(extract_author(&raw, &VALIDATORS), None);
    }

    /// Always yields a claim with several variants populated.
    struct AmbiguousClaims;

    impl ScaleDecoder for AmbiguousClaims {
        fn decode_with_spec(
            &self,
            _: &[u8],
            _: &str,
            _: Option<&RuntimeMetadata>,
            _: Option<u32>,
        ) -> Result<Value, DecodeError> {
            Ok(json!({
                "VRF": { "authority_index": 1, "slot_number": 5 },
                "Secondary": { "authority_index": 2, "slot_number": 5 },
                "Primary": { "authority_index": 0, "slot_number": 5 }
            }))
        }
    }

    #[test]
    fn primary_claims_take_precedence() {
        let raw = pre_runtime(BABE_ENGINE_ID, vec![]);
        assert_eq!(extract_author_with(&AmbiguousClaims, &raw, &VALIDATORS), Some("A"));
    }

    #[test]
    fn unknown_engines_and_other_items() {
        let raw = pre_runtime(*b"pow_", 7u64.encode());
        assert_eq!(extract_author(&raw, &VALIDATORS), None);

        let seal = DigestItem::Seal(AURA_ENGINE_ID, vec![1, 2, 3]).encode();
        assert_eq!(extract_author(&seal, &VALIDATORS), None);
    }

    #[test]
    fn malformed_digests() {
        assert_eq!(extract_author(&[], &VALIDATORS), None);
        assert_eq!(extract_author(&[6, b'a', b'u'], &VALIDATORS), None);
        // aura payload too short for a slot number
        let raw = pre_runtime(AURA_ENGINE_ID, vec![1, 2]);
        assert_eq!(extract_author(&raw, &VALIDATORS), None);
    }

    #[quickcheck]
    fn no_validators_no_author(raw: Vec<u8>) -> bool {
        extract_author::<String>(&raw, &[]).is_none()
            && extract_author_from_json::<String>(&raw, &[]).is_none()
    }

    #[quickcheck]
    fn aura_authors_come_from_the_set(slot: u64) -> bool {
        let raw = pre_runtime(AURA_ENGINE_ID, slot.encode());
        extract_author(&raw, &VALIDATORS) == Some(VALIDATORS[(slot % 3) as usize])
    }

    #[test]
    fn json_form() {
        let engine = u32::from_le_bytes(AURA_ENGINE_ID);
        let json = json!({ "engine": engine, "data": format!("0x{}", hex::encode(7u64.encode())) });
        let bytes = serde_json::to_vec(&json).unwrap();
        assert_eq!(extract_author_from_json(&bytes, &VALIDATORS), Some("B"));

        let digest = PreRuntimeDigest::from_json_value(&json).unwrap();
        assert!(digest.is_aura());
        assert!(!digest.is_babe());
        assert_eq!(digest.data, 7u64.encode());

        assert_eq!(extract_author_from_json(b"not json", &VALIDATORS), None);
        assert_eq!(
            extract_author_from_json(br#"{"engine": 1, "data": "zz"}"#, &VALIDATORS),
            None
        );
    }

    #[test]
    fn scale_and_json_forms_agree() {
        let raw = pre_runtime(BABE_ENGINE_ID, babe_primary(1, 3));
        let digest = PreRuntimeDigest::from_scale(&raw).unwrap();
        assert!(digest.is_babe());
        let json = json!({
            "engine": u32::from_le_bytes(digest.engine),
            "data": hex::encode(&digest.data),
        });
        assert_eq!(PreRuntimeDigest::from_json_value(&json), Some(digest));
    }
}
