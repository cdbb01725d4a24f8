// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `inspect`, and all
// their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for bad values
//   - type conversion (string → usize, f64, etc.)
//
// The three source paths are shared by both commands through a
// flattened SourceArgs group.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Harmonize the three datasets and compare a random forest
    /// on full features against one on PCA features
    Train(TrainArgs),

    /// Harmonize the three datasets and report row counts and
    /// per-column missingness
    Inspect(InspectArgs),
}

/// Locations of the three source tables
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Personal key indicators table (HeartDisease, AgeCategory, ...)
    #[arg(long, default_value = "./Data/heart_2020_cleaned.csv")]
    pub personal_indicators: String,

    /// Clinical records table (DEATH_EVENT, ejection_fraction, ...)
    #[arg(long, default_value = "./Data/heart_failure_clinical_records_dataset.csv")]
    pub clinical_records: String,

    /// Heart failure prediction table (ChestPainType, ST_Slope, ...)
    #[arg(long, default_value = "./Data/heart.csv")]
    pub heart_failure: String,

    /// Keep "Yes"/"No" labels as text instead of mapping them to 1/0.
    /// With this set every personal-indicators row is dropped by the
    /// target filter.
    #[arg(long)]
    pub no_yes_no_targets: bool,

    /// JSON config file; when given it replaces every other flag
    #[arg(long)]
    pub config: Option<String>,
}

/// All arguments for the `train` command
#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for the row split and the forest
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of trees in each forest
    #[arg(long, default_value_t = 100)]
    pub n_trees: usize,

    /// Number of principal components kept for the second run
    #[arg(long, default_value_t = 6)]
    pub components: usize,
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            test_fraction: a.test_fraction,
            seed:          a.seed,
            n_trees:       a.n_trees,
            n_components:  a.components,
            ..TrainConfig::from(a.sources)
        }
    }
}

impl From<SourceArgs> for TrainConfig {
    fn from(s: SourceArgs) -> Self {
        TrainConfig {
            personal_indicators_path: s.personal_indicators,
            clinical_records_path:    s.clinical_records,
            heart_failure_path:       s.heart_failure,
            yes_no_targets:           !s.no_yes_no_targets,
            ..TrainConfig::default()
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cardio-harmonize").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let Commands::Train(args) = parse(&["train"]).command else {
            panic!("expected train");
        };
        assert_eq!(TrainConfig::from(args), TrainConfig::default());
    }

    #[test]
    fn test_train_flags_reach_config() {
        let Commands::Train(args) = parse(&[
            "train",
            "--heart-failure", "hf.csv",
            "--seed", "7",
            "--components", "3",
            "--no-yes-no-targets",
        ])
        .command
        else {
            panic!("expected train");
        };
        let cfg = TrainConfig::from(args);
        assert_eq!(cfg.heart_failure_path, "hf.csv");
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.n_components, 3);
        assert!(!cfg.yes_no_targets);
    }

    #[test]
    fn test_inspect_accepts_source_flags() {
        let Commands::Inspect(args) = parse(&["inspect", "--clinical-records", "c.csv"]).command
        else {
            panic!("expected inspect");
        };
        assert_eq!(TrainConfig::from(args.sources).clinical_records_path, "c.csv");
    }
}
