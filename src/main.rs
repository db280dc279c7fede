//! Lootforge - Entry Point
//!
//! Loads the run configuration and corpus archive, drives the two family
//! pipelines, and writes the resulting delta artifact.

use clap::Parser;
use lootforge::core::config::Config;
use lootforge::core::error::Result;
use lootforge::pipeline;
use lootforge::records::loader;
use lootforge::records::store::RecordStore;
use std::path::PathBuf;

/// Distribute tiered enchanted variants through a record archive's
/// selection lists.
#[derive(Parser, Debug)]
#[command(name = "lootforge")]
#[command(about = "Generate rarity-tier loot variants and splice them into selection lists")]
struct Args {
    /// Path to the TOML run configuration
    #[arg(long, default_value = "lootforge.toml")]
    config: PathBuf,

    /// Path to the corpus archive (JSON record array)
    #[arg(long)]
    corpus: PathBuf,

    /// Where to write the delta artifact
    #[arg(long, default_value = "lootforge-delta.json")]
    out: PathBuf,

    /// Override the configured random seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("lootforge=info")
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    tracing::info!(seed = config.seed, "lootforge starting");

    let corpus = loader::load_corpus(&args.corpus)?;
    let store = RecordStore::new(corpus);

    let report = pipeline::run(&store, &config)?;

    let delta = store.into_delta();
    loader::write_delta(&args.out, &delta)?;

    tracing::info!(
        weapon_variants = report.weapons.variants,
        armor_variants = report.armor.variants,
        created = delta.created.len(),
        overridden = delta.overrides.len(),
        "run complete"
    );
    Ok(())
}
