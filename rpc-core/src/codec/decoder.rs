//! The SCALE decoder proper.

use super::{
    hex_string,
    registry::{TypeDef, TypeRegistry},
    type_name::{normalize, split_generic, split_top_level},
    DecodeError,
};
use crate::metadata::RuntimeMetadata;
use parity_scale_codec::{Compact, Decode};
use serde_json::{json, Map, Value};

/// How deep type definitions may nest before decoding gives up. Guards
/// against self-referential definitions.
const MAX_DEPTH: usize = 64;

/// A cursor over the input, resolving type names against a registry.
pub(crate) struct Decoder<'a> {
    registry: &'a TypeRegistry,
    metadata: Option<&'a RuntimeMetadata>,
    spec_version: Option<u32>,
    input: &'a [u8],
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(
        registry: &'a TypeRegistry,
        input: &'a [u8],
        metadata: Option<&'a RuntimeMetadata>,
        spec_version: Option<u32>,
    ) -> Self {
        Self {
            registry,
            metadata,
            spec_version,
            input,
            depth: 0,
        }
    }

    pub(crate) fn remaining(&self) -> &'a [u8] {
        self.input
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.input.len() < len {
            return Err(DecodeError::UnexpectedEof {
                needed: len,
                remaining: self.input.len(),
            });
        }
        let (head, tail) = self.input.split_at(len);
        self.input = tail;
        Ok(head)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// A fixed-width value, decoded by `parity-scale-codec`.
    pub(crate) fn read_fixed<T: Decode>(&mut self) -> Result<T, DecodeError> {
        let needed = core::mem::size_of::<T>();
        if self.input.len() < needed {
            return Err(DecodeError::UnexpectedEof {
                needed,
                remaining: self.input.len(),
            });
        }
        T::decode(&mut self.input).map_err(|e| DecodeError::Codec(e.to_string()))
    }

    pub(crate) fn read_compact(&mut self) -> Result<u128, DecodeError> {
        Compact::<u128>::decode(&mut self.input)
            .map(|c| c.0)
            .map_err(|e| DecodeError::Compact(e.to_string()))
    }

    /// A compact length prefix, refused when it claims more items than there
    /// are bytes left.
    pub(crate) fn read_len(&mut self) -> Result<usize, DecodeError> {
        let len = self.read_compact()?;
        match usize::try_from(len) {
            Ok(n) if n <= self.input.len() => Ok(n),
            _ => Err(DecodeError::LengthOverflow {
                len,
                remaining: self.input.len(),
            }),
        }
    }

    pub(crate) fn decode_type(&mut self, type_name: &str) -> Result<Value, DecodeError> {
        if self.depth >= MAX_DEPTH {
            return Err(DecodeError::RecursionLimit(MAX_DEPTH));
        }
        self.depth += 1;
        let result = self.decode_normalized(&normalize(type_name));
        self.depth -= 1;
        result
    }

    fn decode_normalized(&mut self, name: &str) -> Result<Value, DecodeError> {
        let registry = self.registry;
        if let Some(def) = registry.get(name, self.spec_version) {
            return self.decode_definition(name, def);
        }
        match name {
            "Null" | "()" => Ok(Value::Null),
            "bool" => match self.read_u8()? {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                b => Err(DecodeError::InvalidBool(b)),
            },
            "u8" => Ok(self.read_u8()?.into()),
            "u16" => Ok(self.read_fixed::<u16>()?.into()),
            "u32" => Ok(self.read_fixed::<u32>()?.into()),
            "u64" => Ok(self.read_fixed::<u64>()?.into()),
            "u128" => Ok(u128_value(self.read_fixed()?)),
            "i8" => Ok(self.read_fixed::<i8>()?.into()),
            "i16" => Ok(self.read_fixed::<i16>()?.into()),
            "i32" => Ok(self.read_fixed::<i32>()?.into()),
            "i64" => Ok(self.read_fixed::<i64>()?.into()),
            "i128" => Ok(i128_value(self.read_fixed()?)),
            "Bytes" | "Vec<u8>" => {
                let len = self.read_len()?;
                Ok(Value::String(hex_string(self.read_bytes(len)?)))
            }
            "Text" | "String" | "Str" => {
                let len = self.read_len()?;
                let bytes = self.read_bytes(len)?;
                core::str::from_utf8(bytes)
                    .map(|s| Value::String(s.to_string()))
                    .map_err(|_| DecodeError::InvalidUtf8)
            }
            "Data" => self.decode_identity_data(),
            "Call" | "GenericCall" => self.decode_call(),
            _ => self.decode_composite(name),
        }
    }

    fn decode_definition(&mut self, name: &str, def: &'a TypeDef) -> Result<Value, DecodeError> {
        match def {
            TypeDef::Alias(target) => self.decode_type(target),
            TypeDef::Struct(fields) => {
                let mut map = Map::new();
                for (field, ty) in fields {
                    let value = self.decode_type(ty)?;
                    map.insert(field.clone(), value);
                }
                Ok(Value::Object(map))
            }
            TypeDef::Enum(variants) => {
                let index = self.read_u8()?;
                let (variant, ty) = variants.get(usize::from(index)).ok_or_else(|| {
                    DecodeError::UnknownVariant {
                        ty: name.to_string(),
                        index,
                    }
                })?;
                let mut map = Map::new();
                map.insert(variant.clone(), self.decode_type(ty)?);
                Ok(Value::Object(map))
            }
            TypeDef::SimpleEnum(variants) => {
                let index = self.read_u8()?;
                variants
                    .get(usize::from(index))
                    .map(|v| Value::String(v.clone()))
                    .ok_or_else(|| DecodeError::UnknownVariant {
                        ty: name.to_string(),
                        index,
                    })
            }
        }
    }

    fn decode_composite(&mut self, name: &str) -> Result<Value, DecodeError> {
        if let Some(inner) = name.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            let members = split_top_level(inner, ',');
            return match members.as_slice() {
                [] => Ok(Value::Null),
                [single] => self.decode_type(single),
                _ => members
                    .iter()
                    .map(|m| self.decode_type(m))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
            };
        }

        if let Some(inner) = name.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let (elem, len) = inner
                .rsplit_once(';')
                .ok_or_else(|| DecodeError::MalformedType(name.to_string()))?;
            let len: usize = len
                .parse()
                .map_err(|_| DecodeError::MalformedType(name.to_string()))?;
            if elem == "u8" {
                return Ok(Value::String(hex_string(self.read_bytes(len)?)));
            }
            return self.decode_fixed_array(name, elem, len);
        }

        let (head, params) =
            split_generic(name).ok_or_else(|| DecodeError::UnknownType(name.to_string()))?;
        match (head, params.as_slice()) {
            ("Vec" | "BoundedVec" | "WeakBoundedVec" | "BTreeSet", [elem, ..]) => {
                self.decode_vec(elem)
            }
            ("Option", [inner]) => self.decode_option(inner),
            ("Compact", [_]) => Ok(u128_value(self.read_compact()?)),
            ("Box" | "Rc", [inner]) => self.decode_type(inner),
            ("BTreeMap" | "BoundedBTreeMap", [key, value, ..]) => self.decode_map(key, value),
            _ => {
                let registry = self.registry;
                match registry.get(head, self.spec_version) {
                    Some(def) => self.decode_definition(head, def),
                    None => Err(DecodeError::UnknownType(name.to_string())),
                }
            }
        }
    }

    /// Every element must occupy at least one byte, so `len` can never exceed
    /// the input left.
    fn decode_fixed_array(&mut self, name: &str, elem: &str, len: usize) -> Result<Value, DecodeError> {
        if len > self.input.len() {
            return Err(DecodeError::LengthOverflow {
                len: len as u128,
                remaining: self.input.len(),
            });
        }
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            let before = self.input.len();
            items.push(self.decode_type(elem)?);
            if self.input.len() == before {
                return Err(DecodeError::MalformedType(name.to_string()));
            }
        }
        Ok(Value::Array(items))
    }

    fn decode_vec(&mut self, elem: &str) -> Result<Value, DecodeError> {
        if elem == "u8" {
            return self.decode_normalized("Bytes");
        }
        let len = self.read_len()?;
        (0..len)
            .map(|_| self.decode_type(elem))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn decode_option(&mut self, inner: &str) -> Result<Value, DecodeError> {
        // `Option<bool>` is packed into the tag byte.
        match (self.read_u8()?, inner) {
            (0, _) => Ok(Value::Null),
            (1, "bool") => Ok(Value::Bool(true)),
            (2, "bool") => Ok(Value::Bool(false)),
            (1, _) => self.decode_type(inner),
            (tag, _) => Err(DecodeError::InvalidOptionTag(tag)),
        }
    }

    /// Maps with scalar keys render as objects, anything else as `[key, value]`
    /// pairs.
    fn decode_map(&mut self, key: &str, value: &str) -> Result<Value, DecodeError> {
        let len = self.read_len()?;
        let mut entries = Vec::with_capacity(len);
        for _ in 0..len {
            let k = self.decode_type(key)?;
            let v = self.decode_type(value)?;
            entries.push((k, v));
        }
        if entries.iter().all(|(k, _)| k.is_string() || k.is_number()) {
            Ok(Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| match k {
                        Value::String(s) => (s, v),
                        other => (other.to_string(), v),
                    })
                    .collect(),
            ))
        } else {
            Ok(Value::Array(
                entries.into_iter().map(|(k, v)| json!([k, v])).collect(),
            ))
        }
    }

    /// Identity `Data` packs the length of raw payloads into the tag.
    fn decode_identity_data(&mut self) -> Result<Value, DecodeError> {
        let tag = self.read_u8()?;
        let (variant, value) = match tag {
            0 => ("None", Value::Null),
            1..=33 => {
                let raw = self.read_bytes(usize::from(tag - 1))?;
                let text = match core::str::from_utf8(raw) {
                    Ok(text) => text.to_string(),
                    Err(_) => hex_string(raw),
                };
                ("Raw", Value::String(text))
            }
            34 => ("BlakeTwo256", Value::String(hex_string(self.read_bytes(32)?))),
            35 => ("Sha256", Value::String(hex_string(self.read_bytes(32)?))),
            36 => ("Keccak256", Value::String(hex_string(self.read_bytes(32)?))),
            37 => ("ShaThree256", Value::String(hex_string(self.read_bytes(32)?))),
            index => {
                return Err(DecodeError::UnknownVariant {
                    ty: "Data".to_string(),
                    index,
                })
            }
        };
        let mut map = Map::new();
        map.insert(variant.to_string(), value);
        Ok(Value::Object(map))
    }

    /// Calls are laid out by metadata: module index, call index, then the
    /// declared arguments.
    fn decode_call(&mut self) -> Result<Value, DecodeError> {
        let metadata = self
            .metadata
            .ok_or_else(|| DecodeError::MissingMetadata("Call".to_string()))?;
        let module_index = self.read_u8()?;
        let call_index = self.read_u8()?;
        let (module, call) =
            metadata
                .call(module_index, call_index)
                .ok_or(DecodeError::UnknownCall {
                    module: module_index,
                    call: call_index,
                })?;
        let mut params = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let value = self.decode_type(&arg.ty)?;
            params.push(json!({ "name": arg.name, "type": arg.ty, "value": value }));
        }
        Ok(json!({
            "call_index": hex::encode([module_index, call_index]),
            "call_module": module.name,
            "call_name": call.name,
            "params": params,
        }))
    }
}

/// Integers that do not fit a JSON-safe `u64` are carried as decimal text.
pub(crate) fn u128_value(n: u128) -> Value {
    u64::try_from(n)
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(n.to_string()))
}

fn i128_value(n: i128) -> Value {
    i64::try_from(n)
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(n.to_string()))
}
