//! Predefined entry and exit strategies.
//!
//! Presets are expressed as ordinary [`StrategySpec::Custom`] trees so they go
//! through the same factory path as user-supplied configs.

use std::collections::BTreeMap;

use crate::factory::{build_entry_strategy, build_exit_strategy, ConditionConfig, FactoryError, StrategySpec};
use crate::strategy::{EntryStrategy, ExitStrategy};

/// Helper: build a `BTreeMap<String, f64>` from `&[(&str, f64)]` pairs.
fn btree(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn cond(condition_type: &str, params: &[(&str, f64)]) -> ConditionConfig {
    ConditionConfig {
        condition_type: condition_type.into(),
        params: btree(params),
        children: Vec::new(),
    }
}

fn custom(operator: &str, conditions: Vec<ConditionConfig>, description: &str) -> StrategySpec {
    StrategySpec::Custom {
        operator: operator.into(),
        conditions,
        description: Some(description.into()),
    }
}

// ─── Entry presets ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPreset {
    TrendFollowing,
    BreadthMomentum,
    Always,
}

impl EntryPreset {
    pub fn all() -> &'static [EntryPreset] {
        &[Self::TrendFollowing, Self::BreadthMomentum, Self::Always]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TrendFollowing => "trend_following",
            Self::BreadthMomentum => "breadth_momentum",
            Self::Always => "always",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.name() == name)
    }

    pub fn to_spec(self) -> StrategySpec {
        match self {
            Self::TrendFollowing => custom(
                "AND",
                vec![
                    cond("uptrend", &[]),
                    cond("adx_range", &[("min", 20.0), ("max", 50.0)]),
                    cond("minimum_price", &[("price", 10.0)]),
                    cond(
                        "volume_above_average",
                        &[("multiplier", 1.3), ("lookback_days", 20.0)],
                    ),
                ],
                "Trending stock with strong ADX and rising volume",
            ),
            Self::BreadthMomentum => custom(
                "AND",
                vec![
                    cond("market_uptrend", &[]),
                    cond("sector_uptrend", &[]),
                    cond("spy_uptrend", &[]),
                    cond("uptrend", &[]),
                    cond("price_above_ema", &[("period", 20.0)]),
                    cond("no_earnings_within_days", &[("days", 7.0)]),
                ],
                "Stock, sector and market all trending up, no earnings nearby",
            ),
            Self::Always => custom("AND", vec![cond("always", &[])], "Enter on every bar"),
        }
    }
}

// ─── Exit presets ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPreset {
    TrendExit,
    AtrProtect,
    TwoBarHold,
}

impl ExitPreset {
    pub fn all() -> &'static [ExitPreset] {
        &[Self::TrendExit, Self::AtrProtect, Self::TwoBarHold]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TrendExit => "trend_exit",
            Self::AtrProtect => "atr_protect",
            Self::TwoBarHold => "two_bar_hold",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.name() == name)
    }

    pub fn to_spec(self) -> StrategySpec {
        match self {
            Self::TrendExit => custom(
                "OR",
                vec![
                    cond("price_below_ema", &[("period", 10.0)]),
                    cond("ema_cross", &[("fast", 10.0), ("slow", 20.0)]),
                    cond("stop_loss", &[("atr_multiplier", 2.0)]),
                ],
                "Exit when the short-term trend breaks",
            ),
            Self::AtrProtect => custom(
                "OR",
                vec![
                    cond("stop_loss", &[("atr_multiplier", 2.0)]),
                    cond("atr_trailing_stop", &[("atr_multiplier", 2.7)]),
                    cond("profit_target", &[("atr_multiplier", 3.0), ("ema_period", 20.0)]),
                    cond("before_earnings", &[("days", 1.0)]),
                ],
                "ATR stop, trailing stop and profit target",
            ),
            Self::TwoBarHold => custom(
                "OR",
                vec![cond("bars_held", &[("bars", 1.0)])],
                "Exit on the second bar after entry",
            ),
        }
    }
}

// ─── Registry ───────────────────────────────────────────────────────

/// Name lookup over the predefined strategies.
pub struct StrategyRegistry;

impl StrategyRegistry {
    pub fn entry_names() -> Vec<&'static str> {
        EntryPreset::all().iter().map(|p| p.name()).collect()
    }

    pub fn exit_names() -> Vec<&'static str> {
        ExitPreset::all().iter().map(|p| p.name()).collect()
    }

    pub fn entry(name: &str) -> Result<EntryStrategy, FactoryError> {
        let preset =
            EntryPreset::from_name(name).ok_or_else(|| FactoryError::UnknownStrategy(name.into()))?;
        build_entry_strategy(&preset.to_spec()).map(|s| s.renamed(preset.name()))
    }

    pub fn exit(name: &str) -> Result<ExitStrategy, FactoryError> {
        let preset =
            ExitPreset::from_name(name).ok_or_else(|| FactoryError::UnknownStrategy(name.into()))?;
        build_exit_strategy(&preset.to_spec()).map(|s| s.renamed(preset.name()))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, LogicalOperator};

    #[test]
    fn every_preset_builds() {
        for name in StrategyRegistry::entry_names() {
            let s = StrategyRegistry::entry(name).unwrap();
            assert_eq!(s.name(), name);
            assert_eq!(s.operator(), LogicalOperator::And);
            assert!(!s.conditions().is_empty());
        }
        for name in StrategyRegistry::exit_names() {
            let s = StrategyRegistry::exit(name).unwrap();
            assert_eq!(s.name(), name);
            assert_eq!(s.operator(), LogicalOperator::Or);
        }
    }

    #[test]
    fn names_round_trip() {
        for p in EntryPreset::all() {
            assert_eq!(EntryPreset::from_name(p.name()), Some(*p));
        }
        for p in ExitPreset::all() {
            assert_eq!(ExitPreset::from_name(p.name()), Some(*p));
        }
    }

    #[test]
    fn two_bar_hold_is_a_single_time_exit() {
        let s = StrategyRegistry::exit("two_bar_hold").unwrap();
        // signal after one bar held, filled on the next bar
        assert_eq!(s.conditions(), &[Condition::BarsHeld { bars: 1 }]);
        assert_eq!(s.description(), "Exit on the second bar after entry");
    }

    #[test]
    fn unknown_names_are_errors() {
        assert_eq!(
            StrategyRegistry::entry("nope").unwrap_err(),
            FactoryError::UnknownStrategy("nope".into())
        );
        assert!(StrategyRegistry::exit("trend_following").is_err());
    }
}
