//! Named type definitions the decoder resolves type names against.
//!
//! Definitions are written as JSON. Each entry is either an alias
//! (`"Balance": "u128"`), a struct, or an enum:
//!
//! ```json
//! {
//!   "types": {
//!     "ActiveEraInfo": {
//!       "type": "struct",
//!       "type_mapping": [["index", "EraIndex"], ["start", "Option<Moment>"]]
//!     },
//!     "Reasons": { "type": "enum", "value_list": ["Fee", "Misc", "All"] }
//!   },
//!   "versioning": [
//!     { "runtime_range": [0, 1019], "types": { "RefCount": "u8" } }
//!   ]
//! }
//! ```
//!
//! Entries under `versioning` only apply to runtimes whose `spec_version` lies
//! in the (inclusive) range; an open upper bound is written as `null`.

use super::type_name::normalize;
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashMap},
    sync::OnceLock,
};

/// The type definitions every registry starts from.
pub const DEFAULT_TYPES_JSON: &str = include_str!("default_types.json");

/// How a named type is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    /// Another name for the given type.
    Alias(String),
    /// Named fields, decoded in order.
    Struct(Vec<(String, String)>),
    /// One-byte tag selecting a variant, followed by that variant's payload.
    Enum(Vec<(String, String)>),
    /// One-byte tag selecting a variant without payload.
    SimpleEnum(Vec<String>),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("malformed type registry document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("enum `{0}` declares no variants")]
    EmptyEnum(String),
    #[error("enum `{0}` declares more variants than a one-byte tag can select")]
    TooManyVariants(String),
}

#[derive(Deserialize)]
struct TypesDocument {
    #[serde(default)]
    types: BTreeMap<String, TypeDefDocument>,
    #[serde(default)]
    versioning: Vec<VersionedDocument>,
}

#[derive(Deserialize)]
struct VersionedDocument {
    runtime_range: (u32, Option<u32>),
    types: BTreeMap<String, TypeDefDocument>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeDefDocument {
    Alias(String),
    Composite(CompositeDocument),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CompositeDocument {
    Struct {
        type_mapping: Vec<(String, String)>,
    },
    Enum {
        #[serde(default)]
        type_mapping: Vec<(String, String)>,
        #[serde(default)]
        value_list: Vec<String>,
    },
}

#[derive(Debug, Clone)]
struct VersionedTypes {
    from: u32,
    to: Option<u32>,
    types: HashMap<String, TypeDef>,
}

impl VersionedTypes {
    fn covers(&self, spec_version: u32) -> bool {
        spec_version >= self.from && self.to.map_or(true, |to| spec_version <= to)
    }
}

/// A set of named type definitions, optionally overridden per runtime version.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDef>,
    versioned: Vec<VersionedTypes>,
}

impl TypeRegistry {
    /// The shared registry built from [`DEFAULT_TYPES_JSON`].
    pub fn builtin() -> &'static TypeRegistry {
        static BUILTIN: OnceLock<TypeRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| match Self::with_defaults() {
            Ok(registry) => registry,
            Err(e) => panic!("Error: {e}\nJSON data: {DEFAULT_TYPES_JSON}"),
        })
    }

    /// A fresh registry holding the default definitions, ready to be extended.
    pub fn with_defaults() -> Result<Self, RegistryError> {
        Self::from_json(DEFAULT_TYPES_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        registry.extend_from_json(json)?;
        Ok(registry)
    }

    /// Add the definitions of a JSON document. Later definitions replace
    /// earlier ones with the same name.
    pub fn extend_from_json(&mut self, json: &str) -> Result<(), RegistryError> {
        let document: TypesDocument = serde_json::from_str(json)?;
        for (name, doc) in document.types {
            let def = Self::convert(&name, doc)?;
            self.register(&name, def);
        }
        for versioned in document.versioning {
            let (from, to) = versioned.runtime_range;
            for (name, doc) in versioned.types {
                let def = Self::convert(&name, doc)?;
                self.register_for_range(from, to, &name, def);
            }
        }
        Ok(())
    }

    pub fn register(&mut self, name: &str, def: TypeDef) {
        self.types.insert(normalize(name), def);
    }

    /// Register a definition that only applies to runtimes with
    /// `from <= spec_version <= to`.
    pub fn register_for_range(&mut self, from: u32, to: Option<u32>, name: &str, def: TypeDef) {
        let name = normalize(name);
        match self
            .versioned
            .iter_mut()
            .find(|v| v.from == from && v.to == to)
        {
            Some(versioned) => {
                versioned.types.insert(name, def);
            }
            None => self.versioned.push(VersionedTypes {
                from,
                to,
                types: HashMap::from([(name, def)]),
            }),
        }
    }

    /// Look a normalised name up, preferring the most recently registered
    /// override covering `spec_version`.
    pub fn get(&self, name: &str, spec_version: Option<u32>) -> Option<&TypeDef> {
        spec_version
            .and_then(|spec| {
                self.versioned
                    .iter()
                    .rev()
                    .filter(|v| v.covers(spec))
                    .find_map(|v| v.types.get(name))
            })
            .or_else(|| self.types.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(&normalize(name))
    }

    fn convert(name: &str, doc: TypeDefDocument) -> Result<TypeDef, RegistryError> {
        let def = match doc {
            TypeDefDocument::Alias(target) => TypeDef::Alias(target),
            TypeDefDocument::Composite(CompositeDocument::Struct { type_mapping }) => {
                TypeDef::Struct(type_mapping)
            }
            TypeDefDocument::Composite(CompositeDocument::Enum {
                type_mapping,
                value_list,
            }) => {
                let count = type_mapping.len().max(value_list.len());
                if count == 0 {
                    return Err(RegistryError::EmptyEnum(name.to_string()));
                }
                if count > 256 {
                    return Err(RegistryError::TooManyVariants(name.to_string()));
                }
                if type_mapping.is_empty() {
                    TypeDef::SimpleEnum(value_list)
                } else {
                    TypeDef::Enum(type_mapping)
                }
            }
        };
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_load() {
        let registry = TypeRegistry::builtin();
        assert!(registry.contains("AccountInfo"));
        assert!(registry.contains("LogDigest"));
        assert!(registry.contains("RawBabePreDigest"));
        assert!(registry.contains("BalanceOf<T>"));
    }

    #[test]
    fn documents_extend_and_replace() {
        let mut registry = TypeRegistry::with_defaults().unwrap();
        registry
            .extend_from_json(r#"{ "types": { "Balance": "u64", "Nominations": {
                "type": "struct",
                "type_mapping": [["targets", "Vec<AccountId>"], ["submitted_in", "EraIndex"]]
            } } }"#)
            .unwrap();
        assert_eq!(registry.get("Balance", None), Some(&TypeDef::Alias("u64".to_string())));
        assert!(matches!(registry.get("Nominations", None), Some(TypeDef::Struct(f)) if f.len() == 2));
    }

    #[test]
    fn overrides_apply_inside_their_range_only() {
        let registry = TypeRegistry::from_json(
            r#"{
                "types": { "RefCount": "u32" },
                "versioning": [
                    { "runtime_range": [0, 1019], "types": { "RefCount": "u8" } },
                    { "runtime_range": [2000, null], "types": { "RefCount": "u64" } }
                ]
            }"#,
        )
        .unwrap();
        let alias = |name: &str| Some(TypeDef::Alias(name.to_string()));
        assert_eq!(registry.get("RefCount", Some(1000)).cloned(), alias("u8"));
        assert_eq!(registry.get("RefCount", Some(1500)).cloned(), alias("u32"));
        assert_eq!(registry.get("RefCount", Some(9000)).cloned(), alias("u64"));
        assert_eq!(registry.get("RefCount", None).cloned(), alias("u32"));
    }

    #[test]
    fn value_lists_become_simple_enums() {
        let registry = TypeRegistry::builtin();
        assert_eq!(
            registry.get("Reasons", None),
            Some(&TypeDef::SimpleEnum(vec!["Fee".into(), "Misc".into(), "All".into()]))
        );
    }

    #[test]
    fn empty_enums_are_rejected() {
        let err = TypeRegistry::from_json(r#"{ "types": { "Nothing": { "type": "enum" } } }"#)
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyEnum(name) if name == "Nothing"));
    }
}
