//! Decoding of block header digest logs.

use crate::{
    codec::{decode_hex, DecodeError, ScaleDecoder, TypeRegistry},
    digest::PreRuntimeDigest,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One decoded digest log: the variant tag, its name and its payload.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LogDigestEntry {
    pub index: u8,
    #[serde(rename = "type")]
    pub log_type: String,
    pub value: Value,
}

impl LogDigestEntry {
    /// Project a value of the form `{"index": .., "type": .., "value": ..}`.
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    pub fn as_pre_runtime(&self) -> Option<PreRuntimeDigest> {
        if self.log_type != "PreRuntime" {
            return None;
        }
        PreRuntimeDigest::from_json_value(&self.value)
    }
}

/// Decode raw digest log items. A single malformed item fails the batch.
pub fn decode_log_digests<R: AsRef<[u8]>>(raw_logs: &[R]) -> Result<Vec<LogDigestEntry>, DecodeError> {
    decode_log_digests_with(TypeRegistry::builtin(), raw_logs)
}

pub fn decode_log_digests_with<D, R>(
    decoder: &D,
    raw_logs: &[R],
) -> Result<Vec<LogDigestEntry>, DecodeError>
where
    D: ScaleDecoder + ?Sized,
    R: AsRef<[u8]>,
{
    raw_logs
        .iter()
        .map(|raw| decode_entry(decoder, raw.as_ref()))
        .collect()
}

/// Decode digest logs as delivered in a header's `digest.logs`, i.e. as hex.
pub fn decode_log_digests_hex(hex_logs: &[&str]) -> Result<Vec<LogDigestEntry>, DecodeError> {
    let raw_logs = hex_logs
        .iter()
        .map(|log| decode_hex(log))
        .collect::<Result<Vec<_>, _>>()?;
    decode_log_digests(&raw_logs)
}

fn decode_entry<D: ScaleDecoder + ?Sized>(decoder: &D, raw: &[u8]) -> Result<LogDigestEntry, DecodeError> {
    let decoded = decoder.decode(raw, "LogDigest", None)?;
    let (log_type, value) = match decoded {
        Value::Object(map) => map.into_iter().next().unwrap_or_default(),
        Value::String(unit) => (unit, Value::Null),
        other => (String::new(), other),
    };
    let entry = json!({
        "index": raw.first().copied().unwrap_or_default(),
        "type": log_type,
        "value": value,
    });
    Ok(LogDigestEntry::from_value(&entry).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{extract_author_from_json, AURA_ENGINE_ID, BABE_ENGINE_ID};
    use parity_scale_codec::Encode;
    use pretty_assertions::assert_eq;
    use sp_runtime::generic::DigestItem;

    fn seal() -> Vec<u8> {
        DigestItem::Seal(BABE_ENGINE_ID, vec![7; 64]).encode()
    }

    fn aura_pre_runtime(slot: u64) -> Vec<u8> {
        DigestItem::PreRuntime(AURA_ENGINE_ID, slot.encode()).encode()
    }

    #[test]
    fn entries_carry_index_name_and_payload() {
        let logs = decode_log_digests(&[aura_pre_runtime(4), seal()]).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].index, 6);
        assert_eq!(logs[0].log_type, "PreRuntime");
        assert_eq!(
            logs[0].value,
            json!({
                "engine": u32::from_le_bytes(AURA_ENGINE_ID),
                "data": format!("0x{}", hex::encode(4u64.encode())),
            })
        );
        assert_eq!(logs[1].index, 5);
        assert_eq!(logs[1].log_type, "Seal");

        let other = decode_log_digests(&[DigestItem::Other(vec![1, 2]).encode()]).unwrap();
        assert_eq!(other[0].index, 0);
        assert_eq!(other[0].value, json!("0x0102"));

        let updated = decode_log_digests(&[[8u8]]).unwrap();
        assert_eq!(updated[0].log_type, "RuntimeEnvironmentUpdated");
        assert_eq!(updated[0].value, Value::Null);
    }

    #[test]
    fn one_bad_entry_fails_the_batch() {
        let logs = vec![aura_pre_runtime(1), seal(), vec![6, 1], seal()];
        assert!(decode_log_digests(&logs).is_err());
        assert!(decode_log_digests(&[vec![42u8]]).is_err());
    }

    #[test]
    fn empty_batch() {
        assert_eq!(decode_log_digests::<Vec<u8>>(&[]), Ok(vec![]));
    }

    #[test]
    fn hex_input() {
        let pre = format!("0x{}", hex::encode(aura_pre_runtime(2)));
        let seal = hex::encode(seal());
        let logs = decode_log_digests_hex(&[&pre, &seal]).unwrap();
        assert_eq!(logs[0].log_type, "PreRuntime");
        assert_eq!(logs[1].log_type, "Seal");
        assert!(matches!(
            decode_log_digests_hex(&[&pre, "0xzz"]),
            Err(DecodeError::Hex(_))
        ));
    }

    #[test]
    fn pre_runtime_entries_feed_author_resolution() {
        let logs = decode_log_digests(&[seal(), aura_pre_runtime(7)]).unwrap();
        let entry = logs.iter().find(|l| l.log_type == "PreRuntime").unwrap();
        let digest = entry.as_pre_runtime().unwrap();
        assert!(digest.is_aura());
        assert_eq!(logs[0].as_pre_runtime(), None);

        let json = serde_json::to_vec(&entry.value).unwrap();
        assert_eq!(extract_author_from_json(&json, &["A", "B", "C"]), Some("B"));
    }
}
