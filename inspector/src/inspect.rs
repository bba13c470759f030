//! The inspector's commands. Each one renders its result as text.

use std::{fs, path::Path};

use anyhow::{anyhow, Context as _};
use substrate_rpc_core::{
    digest::{extract_author_with, PreRuntimeDigest},
    log_digest::decode_log_digests_with,
    RuntimeMetadata, ScaleDecoder, StorageKeyEncoder, TypeRegistry,
};

use crate::cli::{Command, HexBytes};

/// Printed by `author` when no validator can be named.
pub const UNRESOLVED: &str = "unresolved";

/// Everything the commands decode against.
pub struct Inspector {
    registry: TypeRegistry,
    metadata: Option<RuntimeMetadata>,
    spec_version: Option<u32>,
}

impl Inspector {
    pub fn new(
        registry: TypeRegistry,
        metadata: Option<RuntimeMetadata>,
        spec_version: Option<u32>,
    ) -> Self {
        let spec_version = spec_version.or_else(|| metadata.as_ref()?.spec_version);
        Self {
            registry,
            metadata,
            spec_version,
        }
    }

    /// Load the metadata snapshot and extra type definitions named on the
    /// command line.
    pub fn load(
        metadata: Option<&Path>,
        types: Option<&Path>,
        spec_version: Option<u32>,
    ) -> anyhow::Result<Self> {
        let mut registry = TypeRegistry::with_defaults()?;
        if let Some(path) = types {
            let json = read(path)?;
            registry
                .extend_from_json(&json)
                .with_context(|| format!("loading types from {}", path.display()))?;
            log::info!("Loaded type definitions from {}", path.display());
        }
        let metadata = match metadata {
            Some(path) => {
                let json = read(path)?;
                let metadata = RuntimeMetadata::from_json(&json)
                    .with_context(|| format!("loading metadata from {}", path.display()))?;
                log::info!(
                    "Loaded metadata of {} modules from {}",
                    metadata.modules.len(),
                    path.display()
                );
                Some(metadata)
            }
            None => None,
        };
        Ok(Self::new(registry, metadata, spec_version))
    }

    pub fn run(&self, command: Command) -> anyhow::Result<String> {
        log::debug!("Running {:?}", command);
        match command {
            Command::StorageKey {
                section,
                method,
                args,
            } => self.storage_key(&section, &method, &args),
            Command::Decode { type_name, raw } => {
                let value = self.registry.decode_with_spec(
                    &raw.0,
                    &type_name,
                    self.metadata.as_ref(),
                    self.spec_version,
                )?;
                Ok(serde_json::to_string_pretty(&value)?)
            }
            Command::Events { raw } => {
                let spec_version = self.spec_version.ok_or_else(|| {
                    anyhow!("Events need a spec version: pass --spec-version or metadata naming one")
                })?;
                let events = self
                    .registry
                    .decode_event(&raw.0, self.metadata()?, spec_version)?;
                Ok(serde_json::to_string_pretty(&events)?)
            }
            Command::Logs { logs } => {
                let raw: Vec<&[u8]> = logs.iter().map(|log| log.0.as_slice()).collect();
                let entries = decode_log_digests_with(&self.registry, raw.as_slice())?;
                Ok(serde_json::to_string_pretty(&entries)?)
            }
            Command::Author { digest, validators } => Ok(self
                .author(&digest, &validators)?
                .unwrap_or_else(|| UNRESOLVED.to_string())),
        }
    }

    fn metadata(&self) -> anyhow::Result<&RuntimeMetadata> {
        self.metadata
            .as_ref()
            .ok_or_else(|| anyhow!("This command needs runtime metadata: pass --metadata"))
    }

    fn storage_key(&self, section: &str, method: &str, args: &[HexBytes]) -> anyhow::Result<String> {
        let args: Vec<&[u8]> = args.iter().map(|arg| arg.0.as_slice()).collect();
        let key = StorageKeyEncoder::new(self.metadata()?).encode_storage_key(section, method, &args);
        if key.is_empty() {
            return Err(anyhow!("No storage key can be derived for {section}.{method}"));
        }
        Ok(format!("{}\n{}", key.to_hex(), key.value_type()))
    }

    fn author(&self, digest: &str, validators: &[String]) -> anyhow::Result<Option<String>> {
        let digest = digest.trim();
        if digest.starts_with('{') {
            let digest = PreRuntimeDigest::from_json(digest.as_bytes())
                .ok_or_else(|| anyhow!("Not a pre-runtime digest: {digest}"))?;
            return Ok(digest.author(&self.registry, validators));
        }
        let raw = crate::cli::hex_bytes_from_string(digest)?;
        Ok(extract_author_with(&self.registry, &raw.0, validators))
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
