//! Descriptive statistics and correlation analysis over school record sets.
//!
//! [`describe()`] summarizes one variable; [`analyze_correlations()`] runs
//! Pearson correlation with a two-tailed significance test over a fixed list
//! of variable pairs; [`correlation_matrix()`] gives the pairwise coefficients
//! for every numeric variable. All functions read the records and never
//! modify them.

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::metrics::School;

/// Numeric variables of a [`School`] that analyses can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    AcPercentage,
    TotalRooms,
    AcRooms,
    RoomsWithoutAc,
    EarlyScore,
    FinalScore,
}

impl Variable {
    pub fn value(&self, school: &School) -> Option<f64> {
        match self {
            Variable::AcPercentage => Some(school.ac_percentage),
            Variable::TotalRooms => Some(f64::from(school.total_rooms)),
            Variable::AcRooms => Some(f64::from(school.ac_rooms)),
            Variable::RoomsWithoutAc => Some(f64::from(school.rooms_without_ac)),
            Variable::EarlyScore => school.early_score,
            Variable::FinalScore => school.final_score,
        }
        .filter(|value| !value.is_nan())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Variable::AcPercentage => "AC percentage",
            Variable::TotalRooms => "total rooms",
            Variable::AcRooms => "AC rooms",
            Variable::RoomsWithoutAc => "rooms without AC",
            Variable::EarlyScore => "early score",
            Variable::FinalScore => "final score",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample (n-1) standard deviation; NaN for a single value.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
}

impl Summary {
    pub fn entries(&self) -> [(&'static str, f64); 7] {
        [
            ("mean", self.mean),
            ("median", self.median),
            ("std_dev", self.std_dev),
            ("min", self.min),
            ("max", self.max),
            ("q1", self.q1),
            ("q3", self.q3),
        ]
    }
}

/// Summarizes the present, non-NaN values. `None` when there are none.
pub fn describe<I>(values: I) -> Option<Summary>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sorted = values
        .into_iter()
        .flatten()
        .filter(|value| !value.is_nan())
        .collect::<Vec<_>>();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(Summary {
        count: sorted.len(),
        mean: mean(&sorted),
        median: quantile(&sorted, 0.5),
        std_dev: sample_variance(&sorted).sqrt(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        q1: quantile(&sorted, 0.25),
        q3: quantile(&sorted, 0.75),
    })
}

pub fn describe_variable(records: &[School], variable: Variable) -> Option<Summary> {
    describe(records.iter().map(|school| variable.value(school)))
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// NaN when fewer than two values.
pub(crate) fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean(values);
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

// Linear interpolation between closest ranks over sorted input.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    HighlySignificant,
    VerySignificant,
    Significant,
    MarginallySignificant,
    NotSignificant,
}

impl Significance {
    pub fn from_p_value(p_value: f64) -> Self {
        if p_value < 0.001 {
            Significance::HighlySignificant
        } else if p_value < 0.01 {
            Significance::VerySignificant
        } else if p_value < 0.05 {
            Significance::Significant
        } else if p_value < 0.1 {
            Significance::MarginallySignificant
        } else {
            Significance::NotSignificant
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Significance::HighlySignificant => "highly significant",
            Significance::VerySignificant => "very significant",
            Significance::Significant => "significant",
            Significance::MarginallySignificant => "marginally significant",
            Significance::NotSignificant => "not significant",
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pairs analyzed by [`analyze_correlations()`], in reporting order.
pub const CORRELATION_PAIRS: [(Variable, Variable); 5] = [
    (Variable::AcPercentage, Variable::EarlyScore),
    (Variable::AcPercentage, Variable::FinalScore),
    (Variable::EarlyScore, Variable::FinalScore),
    (Variable::TotalRooms, Variable::EarlyScore),
    (Variable::TotalRooms, Variable::FinalScore),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub variable_pair: String,
    pub x: Variable,
    pub y: Variable,
    pub coefficient: f64,
    pub p_value: f64,
    pub significance: Significance,
    pub sample_size: usize,
}

/// Pearson correlation for each of [`CORRELATION_PAIRS`] over its
/// complete-case subset. Pairs with two or fewer complete cases, or with a
/// constant variable, are left out rather than reported as zero.
pub fn analyze_correlations(records: &[School]) -> Vec<CorrelationResult> {
    CORRELATION_PAIRS
        .iter()
        .filter_map(|&(x, y)| correlate(records, x, y))
        .collect()
}

pub fn correlate(records: &[School], x: Variable, y: Variable) -> Option<CorrelationResult> {
    let (xs, ys) = complete_cases(records, x, y);
    let (coefficient, p_value) = pearson(&xs, &ys)?;
    Some(CorrelationResult {
        variable_pair: format!("{x} vs {y}"),
        x,
        y,
        coefficient,
        p_value,
        significance: Significance::from_p_value(p_value),
        sample_size: xs.len(),
    })
}

/// The result with the largest absolute coefficient.
pub fn strongest(results: &[CorrelationResult]) -> Option<&CorrelationResult> {
    results
        .iter()
        .max_by(|a, b| a.coefficient.abs().total_cmp(&b.coefficient.abs()))
}

fn complete_cases(records: &[School], x: Variable, y: Variable) -> (Vec<f64>, Vec<f64>) {
    records
        .iter()
        .filter_map(|school| Some((x.value(school)?, y.value(school)?)))
        .unzip()
}

/// Coefficient and two-tailed p-value; `None` below three points or when
/// either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    if xs.len() != ys.len() || xs.len() <= 2 {
        return None;
    }
    let r = pearson_coefficient(xs, ys)?;
    let df = (xs.len() - 2) as f64;
    let p_value = if r.abs() >= 1.0 {
        0.0
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        two_tailed_p(t, df)?
    };
    Some((r, p_value))
}

fn pearson_coefficient(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mean_x = mean(xs);
    let mean_y = mean(ys);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Two-tailed p-value of a Student's t statistic.
pub(crate) fn two_tailed_p(t: f64, df: f64) -> Option<f64> {
    if !t.is_finite() || df <= 0.0 {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub variables: Vec<Variable>,
    /// Row-major coefficients; `None` where a pair has too little data.
    pub coefficients: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, x: Variable, y: Variable) -> Option<f64> {
        let row = self.variables.iter().position(|v| *v == x)?;
        let col = self.variables.iter().position(|v| *v == y)?;
        self.coefficients[row][col]
    }
}

const MATRIX_VARIABLES: [Variable; 5] = [
    Variable::TotalRooms,
    Variable::AcRooms,
    Variable::AcPercentage,
    Variable::EarlyScore,
    Variable::FinalScore,
];

/// Pairwise-complete Pearson coefficients between the numeric variables that
/// have any data. `None` when fewer than two such variables exist.
pub fn correlation_matrix(records: &[School]) -> Option<CorrelationMatrix> {
    let variables = MATRIX_VARIABLES
        .into_iter()
        .filter(|variable| records.iter().any(|school| variable.value(school).is_some()))
        .collect::<Vec<_>>();
    if variables.len() < 2 {
        return None;
    }
    let coefficients = variables
        .iter()
        .map(|&x| {
            variables
                .iter()
                .map(|&y| {
                    let (xs, ys) = complete_cases(records, x, y);
                    pearson_coefficient(&xs, &ys)
                })
                .collect()
        })
        .collect();
    Some(CorrelationMatrix {
        variables,
        coefficients,
    })
}
