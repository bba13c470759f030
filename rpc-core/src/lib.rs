//! This crate contains the building blocks an RPC client needs to talk to a
//! Substrate-family chain: storage key derivation, SCALE decoding by type name,
//! block author resolution from pre-runtime digests, and log digest decoding.
//!
//! Nothing in here performs I/O. Metadata and raw bytes come from the caller,
//! and hashing is delegated to `sp-core`.

pub mod codec;
pub mod digest;
pub mod event;
pub mod hasher;
pub mod log_digest;
pub mod metadata;
pub mod storage;
pub mod storage_key;
pub mod types;

pub use codec::{decode_hex, DecodeError, ScaleDecoder, TypeRegistry};
pub use digest::{extract_author, extract_author_from_json, PreRuntimeDigest};
pub use event::decode_event;
pub use log_digest::{decode_log_digests, LogDigestEntry};
pub use metadata::{MetadataProvider, RuntimeMetadata, StorageType};
pub use storage::StorageValue;
pub use storage_key::{encode_storage_key, StorageKey, StorageKeyEncoder};

/// A target for diagnostic log messages emitted by this crate.
const LOG_TARGET: &str = "rpc-core";
