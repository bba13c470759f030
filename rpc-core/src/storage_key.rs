//! Derivation of raw storage keys from (module, item, arguments).
//!
//! A key is the concatenation of the twox128 hash of the module's storage
//! prefix, the twox128 hash of the item name, and the hashed map arguments.

use crate::{
    codec::hex_string,
    hasher::{hash_by_name, StorageHasher},
    metadata::{MetadataProvider, StorageType},
    LOG_TARGET,
};

/// Hasher applied to arguments of plain items.
const PLAIN_HASHER: &str = "Twox64Concat";

/// A derived storage key, together with the type name of the value stored
/// under it. The empty key is returned when no key can be derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageKey {
    encoded_key: Vec<u8>,
    value_type: String,
}

impl StorageKey {
    pub fn encoded_key(&self) -> &[u8] {
        &self.encoded_key
    }

    pub fn value_type(&self) -> &str {
        &self.value_type
    }

    pub fn is_empty(&self) -> bool {
        self.encoded_key.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex_string(&self.encoded_key)
    }
}

/// Chooses the value type stored at the head key of a linked map.
pub trait LinkedHeadPolicy {
    /// Return the head value type for a map declaring `declared` values, or
    /// `None` to keep the `(value, Linkage)` tuple.
    fn head_value_type(&self, declared: &str) -> Option<String>;
}

/// The head of the linked `Validators` map holds the first waiting validator's
/// account id rather than its preferences.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitingValidatorsPolicy;

impl LinkedHeadPolicy for WaitingValidatorsPolicy {
    fn head_value_type(&self, declared: &str) -> Option<String> {
        (declared == "ValidatorPrefs").then(|| "AccountId".to_string())
    }
}

/// Key layout of one storage item.
struct KeyLayout {
    value_type: String,
    hasher: String,
    hasher2: String,
    is_linked: bool,
}

pub struct StorageKeyEncoder<'a, M: MetadataProvider + ?Sized> {
    metadata: &'a M,
    policy: &'a dyn LinkedHeadPolicy,
}

impl<'a, M: MetadataProvider + ?Sized> StorageKeyEncoder<'a, M> {
    pub fn new(metadata: &'a M) -> Self {
        Self::with_policy(metadata, &WaitingValidatorsPolicy)
    }

    pub fn with_policy(metadata: &'a M, policy: &'a dyn LinkedHeadPolicy) -> Self {
        Self { metadata, policy }
    }

    /// Derive the key of `section.method` for up to two map arguments, given
    /// as raw bytes. Returns the empty key when the runtime has no such item
    /// or the key cannot be derived.
    pub fn encode_storage_key(&self, section: &str, method: &str, args: &[&[u8]]) -> StorageKey {
        if args.len() > 2 {
            log::warn!(
                target: LOG_TARGET,
                "{section}.{method}: storage keys take at most two arguments, got {}",
                args.len()
            );
            return StorageKey::default();
        }

        let method = upper_camel(method);
        let Some((prefix, storage_type)) = self.metadata.storage_type(section, &method) else {
            log::debug!(target: LOG_TARGET, "no storage item {section}.{method}");
            return StorageKey::default();
        };
        let Some(layout) = self.layout(&storage_type, args.len()) else {
            log::warn!(
                target: LOG_TARGET,
                "{section}.{method}: unsupported storage layout {storage_type:?}"
            );
            return StorageKey::default();
        };

        let item = if layout.is_linked && args.is_empty() {
            format!("HeadOf{method}")
        } else {
            method
        };

        let mut key = StorageHasher::Twox128.hash(upper_camel(&prefix).as_bytes());
        key.extend(StorageHasher::Twox128.hash(item.as_bytes()));
        for (arg, hasher) in args.iter().zip([&layout.hasher, &layout.hasher2]) {
            match hash_by_name(arg, hasher) {
                Ok(hashed) => key.extend(hashed),
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "{section}.{item}: {e}");
                    return StorageKey::default();
                }
            }
        }

        log::debug!(
            target: LOG_TARGET,
            "{section}.{item} -> {} ({})",
            hex_string(&key),
            layout.value_type
        );
        StorageKey {
            encoded_key: key,
            value_type: layout.value_type,
        }
    }

    fn layout(&self, storage_type: &StorageType, arg_count: usize) -> Option<KeyLayout> {
        let layout = match storage_type {
            StorageType::Plain { value } => KeyLayout {
                value_type: value.clone(),
                hasher: PLAIN_HASHER.to_string(),
                hasher2: String::new(),
                is_linked: false,
            },
            StorageType::Map {
                hasher,
                value,
                is_linked,
                ..
            } => {
                let value_type = match (is_linked, arg_count) {
                    (false, _) => value.clone(),
                    (true, 0) => self
                        .policy
                        .head_value_type(value)
                        .unwrap_or_else(|| linked_value(value)),
                    (true, _) => linked_value(value),
                };
                KeyLayout {
                    value_type,
                    hasher: hasher.clone(),
                    hasher2: String::new(),
                    is_linked: *is_linked,
                }
            }
            StorageType::DoubleMap {
                hasher,
                value,
                key2_hasher,
                ..
            } => KeyLayout {
                value_type: value.clone(),
                hasher: hasher.clone(),
                hasher2: key2_hasher.clone(),
                is_linked: false,
            },
            // Deliberate: an unknown origin carries no declared value type to
            // fall back to, so no key is derived.
            StorageType::Unsupported => return None,
        };
        Some(layout)
    }
}

/// Derive a storage key with the default linked-map policy.
pub fn encode_storage_key<M: MetadataProvider + ?Sized>(
    metadata: &M,
    section: &str,
    method: &str,
    args: &[&[u8]],
) -> StorageKey {
    StorageKeyEncoder::new(metadata).encode_storage_key(section, method, args)
}

fn linked_value(value: &str) -> String {
    format!("({value}, Linkage<AccountId>)")
}

/// Uppercase the first character, leaving the rest untouched.
fn upper_camel(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
