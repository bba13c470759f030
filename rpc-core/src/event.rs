//! Decoding of the `System::Events` storage value.
//!
//! The value is a list of event records. Each record names its module and
//! event by index, and the argument types come from runtime metadata, so
//! events cannot be decoded without it.

use crate::{
    codec::{hex_string, Decoder, DecodeError, TypeRegistry},
    metadata::RuntimeMetadata,
};
use serde_json::{json, Value};

/// Decode raw event records with the builtin registry.
pub fn decode_event(
    raw: &[u8],
    metadata: &RuntimeMetadata,
    spec_version: u32,
) -> Result<Value, DecodeError> {
    TypeRegistry::builtin().decode_event(raw, metadata, spec_version)
}

impl TypeRegistry {
    /// Decode raw event records under the type layout of `spec_version`.
    pub fn decode_event(
        &self,
        raw: &[u8],
        metadata: &RuntimeMetadata,
        spec_version: u32,
    ) -> Result<Value, DecodeError> {
        let mut decoder = Decoder::new(self, raw, Some(metadata), Some(spec_version));
        let count = decoder.read_len()?;
        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            records.push(decode_record(&mut decoder, metadata)?);
        }
        Ok(Value::Array(records))
    }
}

fn decode_record(
    decoder: &mut Decoder<'_>,
    metadata: &RuntimeMetadata,
) -> Result<Value, DecodeError> {
    let (phase, extrinsic_idx) = match decoder.read_u8()? {
        0 => (0, Some(decoder.read_fixed::<u32>()?)),
        phase @ (1 | 2) => (phase, None),
        index => {
            return Err(DecodeError::UnknownVariant {
                ty: "Phase".to_string(),
                index,
            })
        }
    };

    let module_index = decoder.read_u8()?;
    let event_index = decoder.read_u8()?;
    let (module, event) =
        metadata
            .event(module_index, event_index)
            .ok_or(DecodeError::UnknownEvent {
                module: module_index,
                event: event_index,
            })?;

    let mut params = Vec::with_capacity(event.args.len());
    for ty in &event.args {
        let value = decoder.decode_type(ty)?;
        params.push(json!({ "type": ty, "value": value }));
    }
    let topics = decoder.decode_type("EventTopics")?;

    Ok(json!({
        "phase": phase,
        "extrinsic_idx": extrinsic_idx,
        "type": hex::encode([module_index, event_index]),
        "module_id": module.name,
        "event_id": event.name,
        "params": params,
        "topics": topics,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec::TypeDef, metadata::tests::test_metadata, storage::StorageValue};
    use parity_scale_codec::{Compact, Encode};
    use pretty_assertions::assert_eq;

    fn transfer_record(phase: u8) -> Vec<u8> {
        let mut raw = vec![phase];
        if phase == 0 {
            raw.extend(2u32.encode());
        }
        raw.extend([1u8, 0u8]);
        raw.extend([1u8; 32]);
        raw.extend([2u8; 32]);
        raw.extend(500u128.encode());
        raw.extend(Vec::<[u8; 32]>::new().encode());
        raw
    }

    #[test]
    fn records_are_resolved_against_metadata() {
        let metadata = test_metadata();
        let mut raw = Compact(2u32).encode();
        raw.extend(transfer_record(0));
        raw.extend(transfer_record(1));

        let events = decode_event(&raw, &metadata, 1055).unwrap();
        assert_eq!(
            events[0],
            json!({
                "phase": 0,
                "extrinsic_idx": 2,
                "type": "0100",
                "module_id": "Balances",
                "event_id": "Transfer",
                "params": [
                    { "type": "AccountId", "value": hex_string(&[1u8; 32]) },
                    { "type": "AccountId", "value": hex_string(&[2u8; 32]) },
                    { "type": "Balance", "value": 500 }
                ],
                "topics": []
            })
        );
        assert_eq!(events[1]["phase"], json!(1));
        assert_eq!(events[1]["extrinsic_idx"], json!(null));

        let records = StorageValue::from(events).to_event_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_id, "Transfer");
        assert_eq!(records[0].params[2].value, json!(500));
    }

    #[test]
    fn unknown_events_are_errors() {
        let metadata = test_metadata();
        let raw = (Compact(1u32), 1u8, 7u8, 0u8).encode();
        assert_eq!(
            decode_event(&raw, &metadata, 1055),
            Err(DecodeError::UnknownEvent { module: 7, event: 0 })
        );
    }

    #[test]
    fn truncated_records_are_errors() {
        let metadata = test_metadata();
        let mut raw = Compact(1u32).encode();
        raw.extend(&transfer_record(1)[..20]);
        assert!(decode_event(&raw, &metadata, 1055).is_err());
    }

    #[test]
    fn topics_follow_the_runtime_version() {
        let metadata = test_metadata();
        let mut registry = TypeRegistry::with_defaults().unwrap();
        registry.register_for_range(0, Some(1000), "EventTopics", TypeDef::Alias("Null".into()));

        let mut raw = Compact(1u32).encode();
        let record = transfer_record(1);
        // Drop the trailing empty topics list: older runtimes did not have it.
        raw.extend(&record[..record.len() - 1]);

        let events = registry.decode_event(&raw, &metadata, 900).unwrap();
        assert_eq!(events[0]["topics"], json!(null));
        assert!(registry.decode_event(&raw, &metadata, 1055).is_err());
    }
}
