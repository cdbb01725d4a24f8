// ============================================================
// Layer 6 - Config Store
// ============================================================
// Loads a TrainConfig from a JSON file.
//
// Every field is optional in the file (#[serde(default)] on the
// struct), so a config can override just the source paths:
//
//   {
//     "personal_indicators_path": "/data/heart_2020_cleaned.csv",
//     "seed": 7
//   }
//
// The pipeline writes no files, so there is no save side.
//
// Reference: serde_json crate documentation
//            Rust Book §9 (Error Handling with anyhow)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<TrainConfig> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read config from '{}'", self.path.display()))?;

        let cfg: TrainConfig = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config JSON in '{}'", self.path.display()))?;

        tracing::debug!("Loaded config from '{}'", self.path.display());
        Ok(cfg)
    }
}
