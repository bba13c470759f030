//! Inspector's Command Line Interface.

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use substrate_rpc_core::decode_hex;

/// Raw bytes given on the command line as hex, with or without `0x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

pub fn hex_bytes_from_string(s: &str) -> anyhow::Result<HexBytes> {
    decode_hex(s.trim())
        .map(HexBytes)
        .map_err(|e| anyhow!("{s:?} is not hex: {e}"))
}

/// The inspector's main CLI struct
#[derive(Debug, Parser)]
#[command(about, version)]
pub struct Cli {
    #[arg(long, short)]
    /// JSON metadata snapshot of the runtime the input was taken from.
    pub metadata: Option<PathBuf>,

    #[arg(long, short, verbatim_doc_comment)]
    /// JSON document with type definitions to add to the builtin ones.
    /// Definitions with the same name replace the builtin ones.
    pub types: Option<PathBuf>,

    #[arg(long, short)]
    /// Runtime spec version of the input. Defaults to the one named by the metadata.
    pub spec_version: Option<u32>,

    #[arg(long, short, action = ArgAction::Count)]
    /// Log more. May be repeated.
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// The tasks supported by the inspector
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Derive the storage key of an item, for up to two map arguments.
    /// Prints the key and the type of the value stored under it.
    #[command(verbatim_doc_comment)]
    StorageKey {
        /// Module name, e.g. `System`.
        section: String,
        /// Storage item name, e.g. `Account`.
        method: String,
        /// Hex-encoded map arguments.
        #[arg(value_parser = hex_bytes_from_string)]
        args: Vec<HexBytes>,
    },

    /// Decode a SCALE value by type name and print it as JSON.
    Decode {
        /// Type name, e.g. `AccountInfo` or `Vec<(u32, Balance)>`.
        type_name: String,
        #[arg(value_parser = hex_bytes_from_string)]
        raw: HexBytes,
    },

    /// Decode the value of `System::Events`. Requires metadata.
    Events {
        #[arg(value_parser = hex_bytes_from_string)]
        raw: HexBytes,
    },

    /// Decode header digest logs.
    Logs {
        #[arg(value_parser = hex_bytes_from_string, required = true)]
        logs: Vec<HexBytes>,
    },

    /// Resolve the author of a block from its pre-runtime digest.
    /// The digest is either a hex-encoded digest item or its JSON form
    /// `{"engine": <u32>, "data": "0x.."}`.
    #[command(verbatim_doc_comment)]
    Author {
        digest: String,
        /// The session validators, in order.
        #[arg(required = true)]
        validators: Vec<String>,
    },
}
