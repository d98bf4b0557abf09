//! Serializable run configuration.
//!
//! A run is a backtest request plus an optional Monte Carlo stage. Configs
//! load from TOML; dates are quoted `YYYY-MM-DD` strings.
//!
//! ```toml
//! [backtest]
//! after = "2022-01-01"
//! entry_delay_days = 1
//! threads = 4
//!
//! [backtest.entry]
//! type = "PREDEFINED"
//! name = "trend_following"
//!
//! [backtest.exit]
//! type = "CUSTOM"
//! operator = "OR"
//! conditions = [
//!     { type = "stop_loss", params = { atr_multiplier = 2.0 } },
//!     { type = "bars_held", params = { bars = 10 } },
//! ]
//!
//! [monte_carlo]
//! technique = "BOOTSTRAP_RESAMPLING"
//! iterations = 5000
//! seed = 42
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use edgelab_core::backtest::{BacktestOptions, BacktestWindow};
use edgelab_core::factory::{build_entry_strategy, build_exit_strategy, FactoryError, StrategySpec};
use edgelab_core::strategy::{EntryStrategy, ExitStrategy};

use crate::montecarlo::{MonteCarloConfig, SimulationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid strategy: {0}")]
    Strategy(#[from] FactoryError),
    #[error("invalid monte carlo settings: {0}")]
    MonteCarlo(#[from] SimulationError),
    #[error("window starts {after} after it ends {before}")]
    InvertedWindow { after: NaiveDate, before: NaiveDate },
}

/// What to backtest: strategies, entry window, entry delay, parallelism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub entry: StrategySpec,
    pub exit: StrategySpec,
    /// First entry date (inclusive).
    #[serde(default)]
    pub after: Option<NaiveDate>,
    /// Last entry date (inclusive).
    #[serde(default)]
    pub before: Option<NaiveDate>,
    /// Bars between an entry signal and its fill.
    #[serde(default)]
    pub entry_delay_days: usize,
    /// 0 = rayon default pool, 1 = sequential.
    #[serde(default)]
    pub threads: usize,
}

impl BacktestRequest {
    pub fn new(entry: StrategySpec, exit: StrategySpec) -> Self {
        Self {
            entry,
            exit,
            after: None,
            before: None,
            entry_delay_days: 0,
            threads: 0,
        }
    }

    pub fn window(&self) -> BacktestWindow {
        BacktestWindow::new(self.after, self.before)
    }

    pub fn options(&self) -> BacktestOptions {
        BacktestOptions::new(self.window(), self.entry_delay_days)
    }

    /// Check the window and build both strategies.
    pub fn build_strategies(&self) -> Result<(EntryStrategy, ExitStrategy), ConfigError> {
        if let (Some(after), Some(before)) = (self.after, self.before) {
            if after > before {
                return Err(ConfigError::InvertedWindow { after, before });
            }
        }
        Ok((build_entry_strategy(&self.entry)?, build_exit_strategy(&self.exit)?))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_strategies().map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub backtest: BacktestRequest,
    #[serde(default)]
    pub monte_carlo: Option<MonteCarloConfig>,
}

impl RunConfig {
    /// Parse and validate a TOML config.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backtest.validate()?;
        if let Some(mc) = &self.monte_carlo {
            mc.validate()?;
        }
        Ok(())
    }
}
