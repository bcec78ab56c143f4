//! Group comparisons by air-conditioning coverage.
//!
//! Two views: schools bucketed into fixed AC-coverage bands with per-band
//! averages, and a high/low split at the median AC percentage tested with
//! Student's two-sample t-test for each score.

use std::fmt;

use serde::Serialize;

use crate::{
    metrics::School,
    stats::{self, Significance, Variable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcBand {
    Low,
    MediumLow,
    MediumHigh,
    High,
}

impl AcBand {
    pub const ALL: [AcBand; 4] = [AcBand::Low, AcBand::MediumLow, AcBand::MediumHigh, AcBand::High];

    /// Bands are right-closed, with 0% included in the lowest one.
    pub fn for_percentage(percentage: f64) -> Option<Self> {
        match percentage {
            p if (0.0..=25.0).contains(&p) => Some(AcBand::Low),
            p if p > 25.0 && p <= 50.0 => Some(AcBand::MediumLow),
            p if p > 50.0 && p <= 75.0 => Some(AcBand::MediumHigh),
            p if p > 75.0 && p <= 100.0 => Some(AcBand::High),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AcBand::Low => "low (0-25%)",
            AcBand::MediumLow => "medium-low (25-50%)",
            AcBand::MediumHigh => "medium-high (50-75%)",
            AcBand::High => "high (75-100%)",
        }
    }
}

impl fmt::Display for AcBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub band: AcBand,
    pub count: usize,
    pub mean_early_score: Option<f64>,
    pub mean_final_score: Option<f64>,
    pub mean_total_rooms: f64,
    pub mean_ac_percentage: f64,
}

/// Per-band averages, in band order. Bands without schools are omitted.
pub fn group_by_ac_band(records: &[School]) -> Vec<GroupStats> {
    AcBand::ALL
        .into_iter()
        .filter_map(|band| {
            let members = records
                .iter()
                .filter(|school| AcBand::for_percentage(school.ac_percentage) == Some(band))
                .collect::<Vec<_>>();
            if members.is_empty() {
                return None;
            }
            Some(GroupStats {
                band,
                count: members.len(),
                mean_early_score: mean_of(&members, Variable::EarlyScore),
                mean_final_score: mean_of(&members, Variable::FinalScore),
                mean_total_rooms: mean_of(&members, Variable::TotalRooms).unwrap_or(0.0),
                mean_ac_percentage: mean_of(&members, Variable::AcPercentage).unwrap_or(0.0),
            })
        })
        .collect()
}

fn mean_of(members: &[&School], variable: Variable) -> Option<f64> {
    let values = members
        .iter()
        .filter_map(|school| variable.value(school))
        .collect::<Vec<_>>();
    (!values.is_empty()).then(|| stats::mean(&values))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupComparison {
    pub score: Variable,
    pub median_ac_percentage: f64,
    pub high_ac_count: usize,
    pub low_ac_count: usize,
    pub high_ac_mean: f64,
    pub low_ac_mean: f64,
    pub t_statistic: f64,
    pub p_value: f64,
    pub significance: Significance,
}

/// Splits schools at the median AC percentage (at or above the median is
/// "high") and compares each score between the halves. A score is skipped
/// unless both halves have at least two values and some variance.
pub fn compare_high_low_ac(records: &[School]) -> Vec<GroupComparison> {
    let Some(summary) = stats::describe_variable(records, Variable::AcPercentage) else {
        return Vec::new();
    };
    let median = summary.median;
    [Variable::EarlyScore, Variable::FinalScore]
        .into_iter()
        .filter_map(|score| {
            let (high, low): (Vec<&School>, Vec<&School>) = records
                .iter()
                .partition(|school| school.ac_percentage >= median);
            let high_scores = high.iter().filter_map(|s| score.value(s)).collect::<Vec<_>>();
            let low_scores = low.iter().filter_map(|s| score.value(s)).collect::<Vec<_>>();
            let (t_statistic, p_value) = students_t_test(&high_scores, &low_scores)?;
            Some(GroupComparison {
                score,
                median_ac_percentage: median,
                high_ac_count: high_scores.len(),
                low_ac_count: low_scores.len(),
                high_ac_mean: stats::mean(&high_scores),
                low_ac_mean: stats::mean(&low_scores),
                t_statistic,
                p_value,
                significance: Significance::from_p_value(p_value),
            })
        })
        .collect()
}

/// Two-sample t-test with pooled variance. Returns `(t, p)`.
pub fn students_t_test(a: &[f64], b: &[f64]) -> Option<(f64, f64)> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let df = n1 + n2 - 2.0;
    let pooled = ((n1 - 1.0) * stats::sample_variance(a) + (n2 - 1.0) * stats::sample_variance(b)) / df;
    let standard_error = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    if standard_error == 0.0 || !standard_error.is_finite() {
        return None;
    }
    let t = (stats::mean(a) - stats::mean(b)) / standard_error;
    let p = stats::two_tailed_p(t, df)?;
    Some((t, p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges_are_right_closed() {
        assert_eq!(AcBand::for_percentage(0.0), Some(AcBand::Low));
        assert_eq!(AcBand::for_percentage(25.0), Some(AcBand::Low));
        assert_eq!(AcBand::for_percentage(25.1), Some(AcBand::MediumLow));
        assert_eq!(AcBand::for_percentage(75.0), Some(AcBand::MediumHigh));
        assert_eq!(AcBand::for_percentage(100.0), Some(AcBand::High));
        assert_eq!(AcBand::for_percentage(100.5), None);
    }

    #[test]
    fn t_test_matches_reference_values() {
        // ttest_ind([1, 2, 3, 4], [2, 4, 6, 8]): t = -sqrt(3), p = 0.13397
        let (t, p) = students_t_test(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((t + 3f64.sqrt()).abs() < 1e-9);
        assert!((p - 0.133_97).abs() < 1e-4);
    }

    #[test]
    fn t_test_needs_two_values_per_side() {
        assert!(students_t_test(&[1.0], &[2.0, 3.0]).is_none());
        assert!(students_t_test(&[1.0, 1.0], &[1.0, 1.0]).is_none());
    }
}
