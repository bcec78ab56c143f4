use std::{fmt, str::FromStr};

use anyhow::{Result, anyhow, ensure};
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::metrics::School;

/// Neighborhood values that mean "every neighborhood".
pub const ALL_NEIGHBORHOODS: &[&str] = &["Todos", "All"];

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        ensure!(
            min.is_finite() && max.is_finite(),
            "Range bounds must be finite numbers"
        );
        ensure!(min <= max, "Range minimum {min} exceeds maximum {max}");
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl FromStr for Range {
    type Err = anyhow::Error;

    /// Accepts `min:max` or `min..max`.
    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let (left, right) = trimmed
            .split_once("..")
            .or_else(|| trimmed.split_once(':'))
            .ok_or_else(|| anyhow!("Range '{trimmed}' must look like 'min:max'"))?;
        let parse = |bound: &str| {
            bound
                .trim()
                .parse::<f64>()
                .map_err(|_| anyhow!("Range bound '{}' is not a number", bound.trim()))
        };
        Range::new(parse(left)?, parse(right)?)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.min, self.max)
    }
}

/// Optional predicates combined with AND. A `None` imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub neighborhood: Option<String>,
    pub ac_percentage: Option<Range>,
    pub total_rooms: Option<Range>,
    pub early_score: Option<Range>,
    pub final_score: Option<Range>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.neighborhood_constraint().is_none()
            && self.ac_percentage.is_none()
            && self.total_rooms.is_none()
            && self.early_score.is_none()
            && self.final_score.is_none()
    }

    fn neighborhood_constraint(&self) -> Option<&str> {
        self.neighborhood
            .as_deref()
            .filter(|value| !ALL_NEIGHBORHOODS.contains(value))
    }

    pub fn matches(&self, school: &School) -> bool {
        if let Some(wanted) = self.neighborhood_constraint()
            && school.neighborhood.as_deref() != Some(wanted)
        {
            return false;
        }
        if let Some(range) = &self.ac_percentage
            && !range.contains(school.ac_percentage)
        {
            return false;
        }
        if let Some(range) = &self.total_rooms
            && !range.contains(f64::from(school.total_rooms))
        {
            return false;
        }
        score_matches(self.early_score.as_ref(), school.early_score)
            && score_matches(self.final_score.as_ref(), school.final_score)
    }
}

// A school without a score has no data for the range to judge; it stays.
fn score_matches(range: Option<&Range>, score: Option<f64>) -> bool {
    match (range, score) {
        (Some(range), Some(score)) => range.contains(score),
        _ => true,
    }
}

/// Returns the schools matching every predicate in `spec`, in input order.
/// An empty result is a valid answer.
pub fn apply(records: &[School], spec: &FilterSpec) -> Vec<School> {
    if spec.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|school| spec.matches(school))
        .cloned()
        .collect()
}

/// Value domains of a record set, used to offer filter defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterBounds {
    pub neighborhoods: Vec<String>,
    pub ac_percentage: Option<Range>,
    pub total_rooms: Option<Range>,
    pub early_score: Option<Range>,
    pub final_score: Option<Range>,
}

impl FilterBounds {
    pub fn from_records(records: &[School]) -> Self {
        let neighborhoods = records
            .iter()
            .filter_map(|school| school.neighborhood.clone())
            .sorted()
            .dedup()
            .collect();
        Self {
            neighborhoods,
            ac_percentage: span(records.iter().map(|s| s.ac_percentage)),
            total_rooms: span(records.iter().map(|s| f64::from(s.total_rooms))),
            early_score: span(records.iter().filter_map(|s| s.early_score)),
            final_score: span(records.iter().filter_map(|s| s.final_score)),
        }
    }

    /// A spec whose every range covers this record set completely.
    pub fn to_full_spec(&self) -> FilterSpec {
        FilterSpec {
            neighborhood: None,
            ac_percentage: self.ac_percentage,
            total_rooms: self.total_rooms,
            early_score: self.early_score,
            final_score: self.final_score,
        }
    }
}

fn span(values: impl Iterator<Item = f64>) -> Option<Range> {
    match values.minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(value) => Some(Range {
            min: value,
            max: value,
        }),
        MinMaxResult::MinMax(min, max) => Some(Range { min, max }),
    }
}
