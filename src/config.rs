use crate::model::{Category, WorkerId};
use crate::scheduler::{EngineOptions, SchedError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration d'un bloc de planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockConfig {
    pub block_start: NaiveDate,
    pub block_end: NaiveDate,
    /// Liste annuelle complète ; seuls les fériés du bloc comptent.
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    #[serde(default)]
    pub excluded: Vec<WorkerId>,
    /// Service → catégorie.
    #[serde(default)]
    pub services: BTreeMap<String, Category>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub rules: Option<Rules>,
}

fn default_seed() -> u64 {
    1
}

impl BlockConfig {
    pub fn new(block_start: NaiveDate, block_end: NaiveDate) -> Self {
        Self {
            block_start,
            block_end,
            holidays: Vec::new(),
            excluded: Vec::new(),
            services: BTreeMap::new(),
            seed: default_seed(),
            rules: None,
        }
    }

    pub fn with_service<S: Into<String>>(mut self, service: S, category: Category) -> Self {
        self.services.insert(service.into(), category);
        self
    }

    pub fn validate(&self) -> Result<(), SchedError> {
        if self.block_end < self.block_start {
            return Err(SchedError::InvalidConfig(
                "block_end must not be before block_start".to_string(),
            ));
        }
        if self.services.is_empty() {
            return Err(SchedError::MissingField("services"));
        }
        if self.services.keys().any(|s| s.trim().is_empty()) {
            return Err(SchedError::InvalidConfig(
                "service names cannot be empty".to_string(),
            ));
        }
        if let Some(rules) = &self.rules {
            rules.validate()?;
        }
        Ok(())
    }

    pub fn options(&self) -> EngineOptions {
        self.rules
            .as_ref()
            .map(Rules::options)
            .unwrap_or_default()
    }
}

/// Surcharges optionnelles des règles du moteur.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    #[serde(default)]
    pub min_weekends_for_matching: Option<u32>,
    #[serde(default)]
    pub max_weekend_duties: Option<u32>,
    #[serde(default)]
    pub double_attempts: Option<u32>,
    #[serde(default)]
    pub min_gap_days: Option<i64>,
    #[serde(default)]
    pub preferred_gap_days: Option<i64>,
    #[serde(default)]
    pub rebalance_rounds: Option<u32>,
}

impl Rules {
    fn validate(&self) -> Result<(), SchedError> {
        let opts = self.options();
        if opts.max_weekend_duties == 0 {
            return Err(SchedError::InvalidConfig(
                "max_weekend_duties must be > 0".to_string(),
            ));
        }
        if opts.double_attempts == 0 {
            return Err(SchedError::InvalidConfig(
                "double_attempts must be > 0".to_string(),
            ));
        }
        if opts.min_gap_days < 1 || opts.preferred_gap_days < opts.min_gap_days {
            return Err(SchedError::InvalidConfig(
                "gap days must satisfy 1 <= min_gap_days <= preferred_gap_days".to_string(),
            ));
        }
        Ok(())
    }

    pub fn options(&self) -> EngineOptions {
        let base = EngineOptions::default();
        EngineOptions {
            min_weekends_for_matching: self
                .min_weekends_for_matching
                .unwrap_or(base.min_weekends_for_matching),
            max_weekend_duties: self.max_weekend_duties.unwrap_or(base.max_weekend_duties),
            double_attempts: self.double_attempts.unwrap_or(base.double_attempts),
            min_gap_days: self.min_gap_days.unwrap_or(base.min_gap_days),
            preferred_gap_days: self.preferred_gap_days.unwrap_or(base.preferred_gap_days),
            rebalance_rounds: self.rebalance_rounds.unwrap_or(base.rebalance_rounds),
        }
    }
}

#[cfg(feature = "io")]
pub use self::files::{export_config_json, load_config_from_file};

#[cfg(feature = "io")]
mod files {
    use super::BlockConfig;
    use anyhow::{Context, Result};
    use std::fs;
    use std::path::Path;

    pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<BlockConfig> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: BlockConfig = serde_json::from_slice(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn export_config_json<P: AsRef<Path>>(path: P, config: &BlockConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        fs::write(path, json)?;
        Ok(())
    }
}
