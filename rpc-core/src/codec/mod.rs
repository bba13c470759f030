//! Generic SCALE decoding by type name.
//!
//! Raw bytes are decoded into a [`serde_json::Value`] tree guided by a
//! [`TypeRegistry`] of named definitions. The decoder never panics on
//! malformed input: truncated data, unknown tags and bogus length prefixes are
//! all reported as a [`DecodeError`].

mod decoder;
mod registry;
mod type_name;

pub(crate) use decoder::Decoder;
pub use registry::{RegistryError, TypeDef, TypeRegistry, DEFAULT_TYPES_JSON};

use crate::{metadata::RuntimeMetadata, LOG_TARGET};
use serde_json::Value;

/// Everything that can go wrong while decoding SCALE bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("input ended early: {needed} bytes needed, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },
    #[error("length prefix {len} exceeds the {remaining} bytes left")]
    LengthOverflow { len: u128, remaining: usize },
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("malformed type name `{0}`")]
    MalformedType(String),
    #[error("`{ty}` has no variant with index {index}")]
    UnknownVariant { ty: String, index: u8 },
    #[error("invalid bool byte {0:#04x}")]
    InvalidBool(u8),
    #[error("invalid option tag {0:#04x}")]
    InvalidOptionTag(u8),
    #[error("text is not valid utf-8")]
    InvalidUtf8,
    #[error("type nesting deeper than {0} levels")]
    RecursionLimit(usize),
    #[error("compact integer: {0}")]
    Compact(String),
    #[error("scale codec: {0}")]
    Codec(String),
    #[error("invalid hex: {0}")]
    Hex(String),
    #[error("metadata is required to decode `{0}`")]
    MissingMetadata(String),
    #[error("metadata has no event {event} in module {module}")]
    UnknownEvent { module: u8, event: u8 },
    #[error("metadata has no call {call} in module {module}")]
    UnknownCall { module: u8, call: u8 },
}

/// Decodes raw SCALE bytes into a value tree, given the name of their type.
pub trait ScaleDecoder {
    /// Decode `raw` as `type_name` under the type layout in force at
    /// `spec_version`. The same bytes can have a different shape under a
    /// different runtime version, so the version must match the bytes'
    /// provenance.
    fn decode_with_spec(
        &self,
        raw: &[u8],
        type_name: &str,
        metadata: Option<&RuntimeMetadata>,
        spec_version: Option<u32>,
    ) -> Result<Value, DecodeError>;

    /// Decode `raw` as `type_name`, taking the runtime version from `metadata`
    /// when given.
    fn decode(
        &self,
        raw: &[u8],
        type_name: &str,
        metadata: Option<&RuntimeMetadata>,
    ) -> Result<Value, DecodeError> {
        self.decode_with_spec(raw, type_name, metadata, metadata.and_then(|m| m.spec_version))
    }
}

impl ScaleDecoder for TypeRegistry {
    fn decode_with_spec(
        &self,
        raw: &[u8],
        type_name: &str,
        metadata: Option<&RuntimeMetadata>,
        spec_version: Option<u32>,
    ) -> Result<Value, DecodeError> {
        let mut decoder = Decoder::new(self, raw, metadata, spec_version);
        let value = decoder.decode_type(type_name)?;
        if !decoder.remaining().is_empty() {
            log::debug!(
                target: LOG_TARGET,
                "{} trailing bytes left after decoding `{}`",
                decoder.remaining().len(),
                type_name,
            );
        }
        Ok(value)
    }
}

/// Parse hex as delivered by RPC, with or without the `0x` prefix.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, DecodeError> {
    let digits = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    hex::decode(digits).map_err(|e| DecodeError::Hex(e.to_string()))
}

/// Render bytes the way the value tree carries them.
pub(crate) fn hex_string(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_prefix_is_optional() {
        assert_eq!(decode_hex("0x0102").unwrap(), vec![1, 2]);
        assert_eq!(decode_hex("0102").unwrap(), vec![1, 2]);
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
        assert!(matches!(decode_hex("0x012"), Err(DecodeError::Hex(_))));
    }
}
