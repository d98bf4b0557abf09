//! EdgeLab Core: time-series model, condition tree, strategies and the backtest loop.
//!
//! This crate contains the pure computation at the heart of strategy evaluation:
//! - Domain types (raw and enriched quotes, stocks, order blocks, earnings, trades)
//! - One-shot indicator enrichment (`RawQuote -> Quote`)
//! - Condition tree with AND / OR / NOT composition and detailed diagnostics
//! - Condition factory and predefined strategy registry
//! - Single-stock backtest loop and the aggregate backtest report
//! - Deterministic RNG hierarchy shared by the simulators
//!
//! Nothing here performs I/O; callers hand in already-materialized, date-sorted data.

pub mod backtest;
pub mod condition;
pub mod domain;
pub mod enrich;
pub mod factory;
pub mod indicators;
pub mod registry;
pub mod report;
pub mod rng;
pub mod strategy;
