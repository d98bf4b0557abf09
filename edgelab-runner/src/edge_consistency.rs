//! Edge consistency score: how steady a strategy's edge is from year to year.
//!
//! Combines three 0–100 components:
//! - profitable periods: share of years with a non-negative edge
//! - stability: inverse coefficient of variation of the yearly edges
//! - downside: how bad the worst year was, floored at an edge of -10
//!
//! `score = 0.4 × profitable + 0.4 × stability + 0.2 × downside`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use edgelab_core::report::{BacktestReport, PeriodStats, SectorStats};

const NEAR_ZERO: f64 = 0.001;
const PROFITABLE_WEIGHT: f64 = 0.4;
const STABILITY_WEIGHT: f64 = 0.4;
const DOWNSIDE_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpretation {
    Excellent,
    Good,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl Interpretation {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => Self::Excellent,
            s if s >= 60.0 => Self::Good,
            s if s >= 40.0 => Self::Moderate,
            s if s >= 20.0 => Self::Poor,
            _ => Self::VeryPoor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeConsistencyScore {
    pub score: f64,
    pub interpretation: Interpretation,
    pub years_analyzed: usize,
    pub yearly_edges: BTreeMap<i32, f64>,
    pub profitable_periods_score: f64,
    pub stability_score: f64,
    pub downside_score: f64,
}

fn stability(edges: &[f64]) -> f64 {
    let n = edges.len() as f64;
    let mean = edges.iter().sum::<f64>() / n;
    let std_dev = (edges.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n).sqrt();
    if mean.abs() < NEAR_ZERO {
        // flat at zero is neutral; flipping around zero is unstable
        return if std_dev < NEAR_ZERO { 50.0 } else { 0.0 };
    }
    (100.0 * (1.0 - std_dev / mean.abs())).max(0.0)
}

fn downside(worst_edge: f64) -> f64 {
    (100.0 * (1.0 + worst_edge / 10.0)).clamp(0.0, 100.0)
}

impl EdgeConsistencyScore {
    /// Score a year → stats map. Years without trades are ignored; fewer than
    /// two remaining years gives `None`.
    pub fn calculate(yearly: &BTreeMap<i32, PeriodStats>) -> Option<Self> {
        let yearly_edges: BTreeMap<i32, f64> = yearly
            .iter()
            .filter(|(_, s)| s.trades > 0)
            .map(|(y, s)| (*y, s.edge))
            .collect();
        if yearly_edges.len() < 2 {
            return None;
        }

        let edges: Vec<f64> = yearly_edges.values().copied().collect();
        let profitable = edges.iter().filter(|e| **e >= 0.0).count();
        let profitable_periods_score = 100.0 * profitable as f64 / edges.len() as f64;
        let stability_score = stability(&edges);
        let worst = edges.iter().copied().fold(f64::INFINITY, f64::min);
        let downside_score = downside(worst);

        let score = PROFITABLE_WEIGHT * profitable_periods_score
            + STABILITY_WEIGHT * stability_score
            + DOWNSIDE_WEIGHT * downside_score;

        Some(Self {
            score,
            interpretation: Interpretation::from_score(score),
            years_analyzed: edges.len(),
            yearly_edges,
            profitable_periods_score,
            stability_score,
            downside_score,
        })
    }

    pub fn from_report(report: &BacktestReport) -> Option<Self> {
        Self::calculate(&report.yearly_stats())
    }

    /// Sector breakdown of `report`, each scored on its own yearly edges.
    pub fn by_sector(report: &BacktestReport) -> Vec<SectorConsistency> {
        report
            .sector_stats()
            .into_iter()
            .map(|stats| SectorConsistency {
                edge_consistency: Self::calculate(&stats.yearly),
                stats,
            })
            .collect()
    }
}

/// A sector's aggregates plus its edge consistency, when it spans two or
/// more years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorConsistency {
    pub stats: SectorStats,
    pub edge_consistency: Option<EdgeConsistencyScore>,
}
