//! Runtime metadata, as far as this crate needs it.
//!
//! The client obtains metadata from the node and converts it into a
//! [`RuntimeMetadata`] snapshot (usually from JSON). Storage key derivation only
//! needs the [`MetadataProvider`] trait, so callers with their own metadata
//! representation can implement it directly.

use serde::{Deserialize, Serialize};

/// Resolves a storage item to its prefix and type descriptor.
pub trait MetadataProvider {
    /// Look up `method` inside the module called `section`. Returns the module's
    /// storage prefix together with the item's descriptor, or `None` when the
    /// runtime has no such item.
    fn storage_type(&self, section: &str, method: &str) -> Option<(String, StorageType)>;
}

/// How a storage item is laid out, as declared in metadata.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "origin")]
pub enum StorageType {
    #[serde(rename = "PlainType", alias = "Plain")]
    Plain { value: String },

    #[serde(rename = "MapType", alias = "Map")]
    Map {
        hasher: String,
        key: String,
        value: String,
        /// Deprecated linked maps chain their entries and keep the list head
        /// under a separate key.
        #[serde(default)]
        is_linked: bool,
    },

    #[serde(rename = "DoubleMapType", alias = "DoubleMap")]
    DoubleMap {
        hasher: String,
        key1: String,
        key2: String,
        value: String,
        key2_hasher: String,
    },

    /// Any layout this crate cannot derive keys for.
    #[serde(other)]
    Unsupported,
}

/// The malformed metadata document error.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("malformed metadata document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A snapshot of the metadata of one runtime version.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeMetadata {
    /// The runtime `spec_version` this metadata was taken from.
    #[serde(default)]
    pub spec_version: Option<u32>,
    pub modules: Vec<ModuleMetadata>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleMetadata {
    pub name: String,
    /// Storage prefix. Falls back to `name` when empty.
    #[serde(default)]
    pub prefix: String,
    /// Explicit pallet index. Older metadata leaves this out, and indices are
    /// then implied by the position among modules with calls or events.
    #[serde(default)]
    pub index: Option<u8>,
    #[serde(default)]
    pub storage: Vec<StorageEntry>,
    #[serde(default)]
    pub calls: Vec<CallMetadata>,
    #[serde(default)]
    pub events: Vec<EventMetadata>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: StorageType,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMetadata {
    pub name: String,
    #[serde(default)]
    pub args: Vec<CallArgument>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CallArgument {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMetadata {
    pub name: String,
    /// Type names of the event arguments, in order.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub docs: Vec<String>,
}

impl ModuleMetadata {
    pub fn storage_prefix(&self) -> &str {
        if self.prefix.is_empty() {
            &self.name
        } else {
            &self.prefix
        }
    }
}

impl RuntimeMetadata {
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Find a module by name. Module names are matched case-insensitively.
    pub fn module(&self, name: &str) -> Option<&ModuleMetadata> {
        self.modules
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Resolve the pair of indices at the start of an encoded event.
    pub fn event(&self, module_index: u8, event_index: u8) -> Option<(&ModuleMetadata, &EventMetadata)> {
        let module = self.module_at(module_index, |m| !m.events.is_empty())?;
        Some((module, module.events.get(usize::from(event_index))?))
    }

    /// Resolve the pair of indices at the start of an encoded call.
    pub fn call(&self, module_index: u8, call_index: u8) -> Option<(&ModuleMetadata, &CallMetadata)> {
        let module = self.module_at(module_index, |m| !m.calls.is_empty())?;
        Some((module, module.calls.get(usize::from(call_index))?))
    }

    fn module_at(
        &self,
        index: u8,
        counted: impl Fn(&ModuleMetadata) -> bool,
    ) -> Option<&ModuleMetadata> {
        if self.modules.iter().any(|m| m.index.is_some()) {
            self.modules.iter().find(|m| m.index == Some(index))
        } else {
            self.modules
                .iter()
                .filter(|m| counted(m))
                .nth(usize::from(index))
        }
    }
}

impl MetadataProvider for RuntimeMetadata {
    fn storage_type(&self, section: &str, method: &str) -> Option<(String, StorageType)> {
        let module = self.module(section)?;
        let entry = module.storage.iter().find(|s| s.name == method)?;
        Some((module.storage_prefix().to_string(), entry.ty.clone()))
    }
}
