//! Text-table and JSON rendering of analysis results.
//!
//! Every builder returns the complete output as a `String`; the caller decides
//! where it goes. Table output uses the elastic layout of [`table::render_table`],
//! JSON output is pretty-printed `serde_json`.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    cli::OutputFormat,
    filter::{FilterBounds, Range},
    groups::{GroupComparison, GroupStats},
    metrics::School,
    normalize::NormalizationReport,
    session::ExecutiveSummary,
    stats::{self, CorrelationMatrix, CorrelationResult, Summary, Variable},
    table,
};

pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.4}")
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_float).unwrap_or_default()
}

fn format_range(range: Option<Range>) -> String {
    range
        .map(|r| format!("{} - {}", format_float(r.min), format_float(r.max)))
        .unwrap_or_else(|| "(no data)".to_string())
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).context("Serializing report to JSON")?;
    text.push('\n');
    Ok(text)
}

#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub summary: ExecutiveSummary,
    pub filter_active: bool,
    pub sources: &'a [NormalizationReport],
    pub bounds: FilterBounds,
}

impl SummaryReport<'_> {
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => to_json(self),
            OutputFormat::Table => Ok(self.render_table()),
        }
    }

    fn render_table(&self) -> String {
        let s = &self.summary;
        let mut output = String::new();
        let _ = writeln!(
            output,
            "Executive summary{}",
            if self.filter_active { " (filtered)" } else { "" }
        );
        let rows = vec![
            vec!["schools".to_string(), s.schools.to_string()],
            vec!["share of total (%)".to_string(), format_float(s.share_of_total)],
            vec!["total rooms".to_string(), s.total_rooms.to_string()],
            vec!["AC rooms".to_string(), s.ac_rooms.to_string()],
            vec!["AC room share (%)".to_string(), format_float(s.ac_room_share)],
            vec!["mean early score".to_string(), format_optional(s.mean_early)],
            vec!["mean final score".to_string(), format_optional(s.mean_final)],
        ];
        output.push_str(&table::render_table(&headers(&["metric", "value"]), &rows));

        let _ = writeln!(output, "\nSources");
        let rows = self
            .sources
            .iter()
            .map(|report| {
                vec![
                    report.source_name.clone(),
                    report.rows_read.to_string(),
                    report.kept.to_string(),
                    report.excluded().to_string(),
                    report.unparsable_rates.to_string(),
                ]
            })
            .collect::<Vec<_>>();
        output.push_str(&table::render_table(
            &headers(&["source", "rows", "kept", "excluded", "unparsable_rates"]),
            &rows,
        ));

        let b = &self.bounds;
        let _ = writeln!(output, "\nFilter bounds");
        let neighborhoods = if b.neighborhoods.is_empty() {
            "(none recorded)".to_string()
        } else {
            b.neighborhoods.join(", ")
        };
        let rows = vec![
            vec!["neighborhoods".to_string(), neighborhoods],
            vec!["AC percentage".to_string(), format_range(b.ac_percentage)],
            vec!["total rooms".to_string(), format_range(b.total_rooms)],
            vec!["early score".to_string(), format_range(b.early_score)],
            vec!["final score".to_string(), format_range(b.final_score)],
        ];
        output.push_str(&table::render_table(&headers(&["field", "range"]), &rows));
        output
    }
}

#[derive(Debug, Serialize)]
pub struct FieldSummary {
    pub field: Variable,
    /// `None` when the field has no values in the record set.
    pub summary: Option<Summary>,
}

pub fn describe_fields(records: &[School], fields: &[Variable]) -> Vec<FieldSummary> {
    fields
        .iter()
        .map(|&field| FieldSummary {
            field,
            summary: stats::describe_variable(records, field),
        })
        .collect()
}

pub fn render_stats(summaries: &[FieldSummary], format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(&summaries);
    }
    let names = [
        "field", "count", "mean", "median", "std_dev", "min", "max", "q1", "q3",
    ];
    let rows = summaries
        .iter()
        .map(|entry| {
            let mut row = vec![entry.field.label().to_string()];
            match &entry.summary {
                Some(summary) => {
                    row.push(summary.count.to_string());
                    row.extend(summary.entries().iter().map(|(_, v)| format_float(*v)));
                }
                None => {
                    row.push("0".to_string());
                    row.extend(std::iter::repeat_n(String::new(), 7));
                }
            }
            row
        })
        .collect::<Vec<_>>();
    Ok(table::render_table(&headers(&names), &rows))
}

#[derive(Debug, Serialize)]
pub struct CorrelationReport<'a> {
    pub correlations: &'a [CorrelationResult],
    pub strongest: Option<&'a CorrelationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<&'a CorrelationMatrix>,
}

impl CorrelationReport<'_> {
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => to_json(self),
            OutputFormat::Table => Ok(self.render_table()),
        }
    }

    fn render_table(&self) -> String {
        let mut output = String::new();
        if self.correlations.is_empty() {
            output.push_str("No variable pair has enough data for correlation.\n");
        } else {
            let rows = self
                .correlations
                .iter()
                .map(|result| {
                    vec![
                        result.variable_pair.clone(),
                        format_float(result.coefficient),
                        format_float(result.p_value),
                        result.significance.to_string(),
                        result.sample_size.to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            output.push_str(&table::render_table(
                &headers(&["pair", "r", "p_value", "significance", "n"]),
                &rows,
            ));
        }
        if let Some(best) = self.strongest {
            let _ = writeln!(
                output,
                "\nStrongest: {} (r = {}, {})",
                best.variable_pair,
                format_float(best.coefficient),
                best.significance
            );
        }
        if let Some(matrix) = self.matrix {
            let _ = writeln!(output, "\nCorrelation matrix");
            let mut names = vec![String::new()];
            names.extend(matrix.variables.iter().map(|v| v.label().to_string()));
            let rows = matrix
                .variables
                .iter()
                .zip(&matrix.coefficients)
                .map(|(variable, coefficients)| {
                    let mut row = vec![variable.label().to_string()];
                    row.extend(coefficients.iter().map(|c| format_optional(*c)));
                    row
                })
                .collect::<Vec<_>>();
            output.push_str(&table::render_table(&names, &rows));
        }
        output
    }
}

#[derive(Debug, Serialize)]
pub struct GroupReport {
    pub bands: Vec<GroupStats>,
    pub comparisons: Vec<GroupComparison>,
}

impl GroupReport {
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => to_json(self),
            OutputFormat::Table => Ok(self.render_table()),
        }
    }

    fn render_table(&self) -> String {
        let mut output = String::from("AC coverage bands\n");
        let rows = self
            .bands
            .iter()
            .map(|group| {
                vec![
                    group.band.label().to_string(),
                    group.count.to_string(),
                    format_optional(group.mean_early_score),
                    format_optional(group.mean_final_score),
                    format_float(group.mean_total_rooms),
                    format_float(group.mean_ac_percentage),
                ]
            })
            .collect::<Vec<_>>();
        output.push_str(&table::render_table(
            &headers(&["band", "schools", "mean_early", "mean_final", "mean_rooms", "mean_ac_pct"]),
            &rows,
        ));

        output.push_str("\nHigh vs low AC (split at median)\n");
        if self.comparisons.is_empty() {
            output.push_str("Not enough scores on both sides for a t-test.\n");
            return output;
        }
        let rows = self
            .comparisons
            .iter()
            .map(|cmp| {
                vec![
                    cmp.score.label().to_string(),
                    format_float(cmp.median_ac_percentage),
                    format!("{} / {}", cmp.high_ac_count, cmp.low_ac_count),
                    format_float(cmp.high_ac_mean),
                    format_float(cmp.low_ac_mean),
                    format_float(cmp.t_statistic),
                    format_float(cmp.p_value),
                    cmp.significance.to_string(),
                ]
            })
            .collect::<Vec<_>>();
        output.push_str(&table::render_table(
            &headers(&[
                "score",
                "median_ac_pct",
                "n_high / n_low",
                "mean_high",
                "mean_low",
                "t",
                "p_value",
                "significance",
            ]),
            &rows,
        ));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Significance;

    fn correlation(pair: &str, r: f64) -> CorrelationResult {
        CorrelationResult {
            variable_pair: pair.to_string(),
            x: Variable::AcPercentage,
            y: Variable::EarlyScore,
            coefficient: r,
            p_value: 0.03,
            significance: Significance::from_p_value(0.03),
            sample_size: 12,
        }
    }

    #[test]
    fn correlation_table_names_strongest_pair() {
        let results = vec![correlation("a vs b", 0.2), correlation("c vs d", -0.7)];
        let report = CorrelationReport {
            correlations: &results,
            strongest: stats::strongest(&results),
            matrix: None,
        };
        let text = report.render(OutputFormat::Table).unwrap();
        assert!(text.contains("p_value"));
        assert!(text.contains("Strongest: c vs d (r = -0.7000, significant)"));
    }

    #[test]
    fn json_omits_missing_matrix() {
        let results = vec![correlation("a vs b", 0.2)];
        let report = CorrelationReport {
            correlations: &results,
            strongest: None,
            matrix: None,
        };
        let json: serde_json::Value =
            serde_json::from_str(&report.render(OutputFormat::Json).unwrap()).unwrap();
        assert!(json.get("matrix").is_none());
        assert_eq!(json["correlations"][0]["significance"], "significant");
        assert_eq!(json["correlations"][0]["sample_size"], 12);
    }

    #[test]
    fn fields_without_data_render_blank() {
        let text = render_stats(
            &[FieldSummary {
                field: Variable::FinalScore,
                summary: None,
            }],
            OutputFormat::Table,
        )
        .unwrap();
        let row = text.lines().nth(2).unwrap();
        assert_eq!(row.split_whitespace().collect::<Vec<_>>(), ["final", "score", "0"]);
    }
}
