//! Factory: turns declarative condition configs into condition trees and strategies.
//!
//! Type names are matched case-insensitively with `_` ignored, so
//! `priceAboveEma`, `price_above_ema` and `PRICEABOVEEMA` all resolve to the
//! same variant. Missing parameters fall back to documented defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::condition::{Composite, Condition, ConditionError, LogicalOperator};
use crate::domain::EmaSet;
use crate::registry::StrategyRegistry;
use crate::strategy::{EntryStrategy, ExitStrategy};

// ─── Config types ────────────────────────────────────────────────────

/// One node of a condition tree as it appears in configuration.
///
/// Composite nodes use type `and`, `or` or `not` and carry `children`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionConfig {
    #[serde(rename = "type")]
    pub condition_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ConditionConfig>,
}

impl ConditionConfig {
    pub fn new(condition_type: impl Into<String>) -> Self {
        Self {
            condition_type: condition_type.into(),
            params: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn with_children(mut self, children: Vec<ConditionConfig>) -> Self {
        self.children = children;
        self
    }
}

/// How a strategy is specified: by registry name or as a custom condition list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategySpec {
    Predefined {
        name: String,
    },
    Custom {
        /// `AND`, `OR` or `NOT`; empty picks the side's default.
        #[serde(default)]
        operator: String,
        conditions: Vec<ConditionConfig>,
        #[serde(default)]
        description: Option<String>,
    },
}

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FactoryError {
    #[error("Unknown condition type: {0}")]
    UnknownCondition(String),
    #[error("Unknown predefined strategy: {0}")]
    UnknownStrategy(String),
    #[error("Invalid parameter `{name}` for {condition}: {reason}")]
    InvalidParam {
        condition: String,
        name: String,
        reason: String,
    },
    #[error(transparent)]
    Malformed(#[from] ConditionError),
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn invalid(config: &ConditionConfig, name: &str, reason: impl Into<String>) -> FactoryError {
    FactoryError::InvalidParam {
        condition: config.condition_type.clone(),
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Named f64 parameter, falling back to `default`. Rejects non-finite values.
fn param(config: &ConditionConfig, name: &str, default: f64) -> Result<f64, FactoryError> {
    match config.params.get(name).copied() {
        None => Ok(default),
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(invalid(config, name, format!("{v} is not finite"))),
    }
}

/// Named non-negative whole-number parameter.
fn param_usize(config: &ConditionConfig, name: &str, default: usize) -> Result<usize, FactoryError> {
    match config.params.get(name).copied() {
        None => Ok(default),
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v.is_finite() => Ok(v as usize),
        Some(v) => Err(invalid(config, name, format!("{v} is not a non-negative integer"))),
    }
}

fn ema_period(config: &ConditionConfig, name: &str, default: usize) -> Result<usize, FactoryError> {
    let period = param_usize(config, name, default)?;
    if EmaSet::is_supported(period) {
        Ok(period)
    } else {
        Err(invalid(
            config,
            name,
            format!("EMA{period} is not one of {:?}", EmaSet::PERIODS),
        ))
    }
}

fn non_negative(config: &ConditionConfig, name: &str, default: f64) -> Result<f64, FactoryError> {
    let v = param(config, name, default)?;
    if v < 0.0 {
        return Err(invalid(config, name, "must be >= 0"));
    }
    Ok(v)
}

// ─── Condition factory ───────────────────────────────────────────────

/// Build a condition (or condition tree) from its config.
pub fn create_condition(config: &ConditionConfig) -> Result<Condition, FactoryError> {
    let c = config;
    let condition = match normalize(&c.condition_type).as_str() {
        "and" | "or" | "not" => {
            let operator = LogicalOperator::parse(&c.condition_type, LogicalOperator::And)?;
            let children = c
                .children
                .iter()
                .map(create_condition)
                .collect::<Result<Vec<_>, _>>()?;
            Condition::Composite(Composite::new(operator, children)?)
        }
        "always" => Condition::Always,
        "never" => Condition::Never,
        "uptrend" => Condition::Uptrend,
        "priceaboveema" => Condition::PriceAboveEma {
            period: ema_period(c, "period", 10)?,
        },
        "emaalignment" => Condition::EmaAlignment {
            fast: ema_period(c, "fast", 10)?,
            slow: ema_period(c, "slow", 20)?,
        },
        "emabullishcross" => Condition::EmaBullishCross {
            fast: ema_period(c, "fast", 10)?,
            slow: ema_period(c, "slow", 20)?,
        },
        "adxrange" => {
            let min = param(c, "min", 20.0)?;
            let max = param(c, "max", 50.0)?;
            if min > max {
                return Err(invalid(c, "min", format!("{min} exceeds max {max}")));
            }
            Condition::AdxRange { min, max }
        }
        "minimumprice" => Condition::MinimumPrice {
            price: non_negative(c, "price", 10.0)?,
        },
        "volumeaboveaverage" => Condition::VolumeAboveAverage {
            multiplier: non_negative(c, "multiplier", 1.3)?,
            lookback_days: param_usize(c, "lookback_days", 20)?.max(1),
        },
        "priceneardonchianhigh" => Condition::PriceNearDonchianHigh {
            max_distance_pct: non_negative(c, "max_distance_pct", 1.5)?,
        },
        "marketuptrend" => Condition::MarketUptrend,
        "sectoruptrend" => Condition::SectorUptrend,
        "spyuptrend" | "spypriceuptrend" => Condition::SpyUptrend,
        "marketbreadthabove" => Condition::MarketBreadthAbove {
            threshold: param(c, "threshold", 50.0)?,
        },
        "sectorbreadthabove" => Condition::SectorBreadthAbove {
            threshold: param(c, "threshold", 50.0)?,
        },
        "marketandsectordowntrend" => Condition::MarketAndSectorDowntrend,
        "noearningswithindays" => Condition::NoEarningsWithinDays {
            days: param_usize(c, "days", 7)? as i64,
        },
        "beforeearnings" => Condition::BeforeEarnings {
            days: param_usize(c, "days", 1)? as i64,
        },
        "beloworderblock" => Condition::BelowOrderBlock {
            percent_below: non_negative(c, "percent_below", 2.0)?,
            age_days: param_usize(c, "age_days", 30)?,
        },
        "notinorderblock" => Condition::NotInOrderBlock {
            age_days: param_usize(c, "age_days", 120)?,
        },
        "bearishorderblock" => Condition::BearishOrderBlock {
            age_days: param_usize(c, "age_days", 120)?,
        },
        "stoploss" => Condition::StopLoss {
            atr_multiplier: non_negative(c, "atr_multiplier", 2.0)?,
        },
        "profittarget" => Condition::ProfitTarget {
            atr_multiplier: non_negative(c, "atr_multiplier", 3.0)?,
            ema_period: ema_period(c, "ema_period", 20)?,
        },
        "atrtrailingstop" | "trailingstoploss" => Condition::AtrTrailingStop {
            atr_multiplier: non_negative(c, "atr_multiplier", 2.7)?,
        },
        "pricebelowema" => Condition::PriceBelowEma {
            period: ema_period(c, "period", 10)?,
        },
        "emacross" => Condition::EmaCross {
            fast: ema_period(c, "fast", 10)?,
            slow: ema_period(c, "slow", 20)?,
        },
        "barsheld" => Condition::BarsHeld {
            bars: param_usize(c, "bars", 1)?,
        },
        _ => return Err(FactoryError::UnknownCondition(c.condition_type.clone())),
    };
    Ok(condition)
}

fn create_all(configs: &[ConditionConfig]) -> Result<Vec<Condition>, FactoryError> {
    configs.iter().map(create_condition).collect()
}

// ─── Strategy builders ───────────────────────────────────────────────

/// Build an entry strategy. A custom spec with no operator combines with AND.
pub fn build_entry_strategy(spec: &StrategySpec) -> Result<EntryStrategy, FactoryError> {
    match spec {
        StrategySpec::Predefined { name } => StrategyRegistry::entry(name),
        StrategySpec::Custom {
            operator,
            conditions,
            description,
        } => {
            let operator = LogicalOperator::parse(operator, LogicalOperator::And)?;
            Ok(EntryStrategy::new(
                "custom",
                operator,
                create_all(conditions)?,
                description.clone(),
            )?)
        }
    }
}

/// Build an exit strategy. A custom spec with no operator combines with OR.
pub fn build_exit_strategy(spec: &StrategySpec) -> Result<ExitStrategy, FactoryError> {
    match spec {
        StrategySpec::Predefined { name } => StrategyRegistry::exit(name),
        StrategySpec::Custom {
            operator,
            conditions,
            description,
        } => {
            let operator = LogicalOperator::parse(operator, LogicalOperator::Or)?;
            if operator == LogicalOperator::And && conditions.len() > 1 {
                warn!(
                    conditions = conditions.len(),
                    "exit strategy uses AND: every condition must hold on the same bar"
                );
            }
            Ok(ExitStrategy::new(
                "custom",
                operator,
                create_all(conditions)?,
                description.clone(),
            )?)
        }
    }
}
