//! An offline inspector for Substrate storage keys, SCALE values, events and
//! header digests. Nothing is fetched from a node: raw bytes are given on the
//! command line and metadata is read from a JSON snapshot.

use clap::Parser;

mod cli;
mod inspect;

use cli::Cli;
use inspect::Inspector;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let inspector = Inspector::load(
        cli.metadata.as_deref(),
        cli.types.as_deref(),
        cli.spec_version,
    )?;
    println!("{}", inspector.run(cli.command)?);

    Ok(())
}
