// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   - harmonize, encode, compare RF vs RF+PCA
//   2. `inspect` - harmonize only and report missingness
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, SourceArgs, TrainArgs};

use crate::application::train_use_case::TrainConfig;
use crate::infra::config_store::ConfigStore;

/// The main CLI struct. clap reads the fields and generates
/// argument parsing code via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "cardio-harmonize",
    version = "0.1.0",
    about = "Harmonize three heart-disease datasets and compare a random forest with and without PCA."
)]
pub struct Cli {
    /// The subcommand to run (train or inspect)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// The CLI layer only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => Self::run_train(args),
            Commands::Inspect(args) => Self::run_inspect(args),
        }
    }

    /// Handles the `train` subcommand.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        let config = match args.sources.config.clone() {
            Some(path) => ConfigStore::new(path).load()?,
            None       => TrainConfig::from(args),
        };
        tracing::info!(
            "Training on {}, {} and {}",
            config.personal_indicators_path,
            config.clinical_records_path,
            config.heart_failure_path,
        );

        let report = TrainUseCase::new(config).execute()?;
        println!("{report}");
        Ok(())
    }

    /// Handles the `inspect` subcommand.
    fn run_inspect(args: InspectArgs) -> Result<()> {
        use crate::application::inspect_use_case::InspectUseCase;

        let config = resolve_sources(args.sources)?;
        let summary = InspectUseCase::new(config).execute()?;
        println!("{summary}");
        Ok(())
    }
}

/// A config file, when given, wins over the path flags.
fn resolve_sources(sources: SourceArgs) -> Result<TrainConfig> {
    match &sources.config {
        Some(path) => ConfigStore::new(path).load(),
        None       => Ok(TrainConfig::from(sources)),
    }
}
