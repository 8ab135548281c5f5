//! Cross-ticker return correlation
//!
//! Correlation is taken over daily returns, never raw prices: two trending
//! price series correlate strongly whether or not they move together.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{AnalysisError, Result};
use crate::model::PriceSeries;

/// Strength bucket of a correlation coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationCategory {
    High,
    Moderate,
    Low,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl CorrelationCategory {
    pub fn from_coefficient(coefficient: Option<f64>) -> Self {
        match coefficient.map(f64::abs) {
            Some(r) if r >= 0.7 => Self::High,
            Some(r) if r >= 0.4 => Self::Moderate,
            Some(_) => Self::Low,
            None => Self::NotAvailable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
            Self::NotAvailable => "N/A",
        }
    }
}

/// Outcome of correlating two series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Pearson coefficient in `[-1, 1]`, absent when indeterminate
    pub coefficient: Option<f64>,
    pub category: CorrelationCategory,
    /// Number of shared return observations
    pub observations: usize,
}

impl CorrelationResult {
    pub fn not_available(observations: usize) -> Self {
        Self {
            coefficient: None,
            category: CorrelationCategory::NotAvailable,
            observations,
        }
    }

    fn from_coefficient(coefficient: f64, observations: usize) -> Self {
        let coefficient = coefficient.clamp(-1.0, 1.0);
        Self {
            coefficient: Some(coefficient),
            category: CorrelationCategory::from_coefficient(Some(coefficient)),
            observations,
        }
    }

    /// Category with the signed percentage, e.g. `High (75.00%)`
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CorrelationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.coefficient {
            Some(r) => write!(f, "{} ({:.2}%)", self.category.as_str(), r * 100.0),
            None => f.write_str(self.category.as_str()),
        }
    }
}

/// Correlate the daily returns of two series on their shared dates.
pub fn correlate(a: &PriceSeries, b: &PriceSeries) -> CorrelationResult {
    let returns_b: HashMap<NaiveDate, f64> = daily_returns(b).into_iter().collect();
    let (xs, ys): (Vec<f64>, Vec<f64>) = daily_returns(a)
        .into_iter()
        .filter_map(|(date, ra)| returns_b.get(&date).map(|&rb| (ra, rb)))
        .unzip();

    match pearson(&xs, &ys) {
        Ok(r) => CorrelationResult::from_coefficient(r, xs.len()),
        Err(e) => {
            tracing::debug!(
                a = a.ticker(),
                b = b.ticker(),
                "Correlation unavailable: {e}"
            );
            CorrelationResult::not_available(xs.len())
        },
    }
}

/// Dated daily returns, without the leading undefined one
fn daily_returns(series: &PriceSeries) -> Vec<(NaiveDate, f64)> {
    series
        .bars()
        .windows(2)
        .filter(|w| w[0].close != 0.0)
        .map(|w| (w[1].date, w[1].close / w[0].close - 1.0))
        .collect()
}

/// Pearson correlation coefficient
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return Err(AnalysisError::ComputationIndeterminate(format!(
            "need at least 2 aligned points, got {}",
            xs.len().min(ys.len())
        )));
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if r.is_nan() || r.is_infinite() {
        return Err(AnalysisError::ComputationIndeterminate(
            "zero variance in return series".to_string(),
        ));
    }
    Ok(r)
}
