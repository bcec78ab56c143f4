use anyhow::Result;
use log::info;
use serde::Serialize;

use crate::{
    config::AliasConfig,
    filter::{self, FilterBounds, FilterSpec},
    io_utils::ReadOptions,
    metrics::School,
    normalize::NormalizationReport,
    pipeline::{self, PipelineOutput, SourcePaths},
    stats::{self, Variable},
};

/// One loaded, validated record set and the reports produced while building
/// it. Each load builds a new session; a failed load produces none.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    schools: Vec<School>,
    reports: Vec<NormalizationReport>,
}

impl AnalysisSession {
    pub fn new(output: PipelineOutput) -> Self {
        Self {
            schools: output.schools,
            reports: output.reports,
        }
    }

    pub fn load(paths: &SourcePaths, options: &ReadOptions, config: &AliasConfig) -> Result<Self> {
        let session = Self::new(pipeline::process_files(paths, options, config)?);
        info!("Session ready with {} school(s)", session.schools.len());
        Ok(session)
    }

    pub fn records(&self) -> &[School] {
        &self.schools
    }

    pub fn reports(&self) -> &[NormalizationReport] {
        &self.reports
    }

    pub fn filter(&self, spec: &FilterSpec) -> Vec<School> {
        let view = filter::apply(&self.schools, spec);
        if !spec.is_empty() {
            info!(
                "Filter kept {} of {} school(s)",
                view.len(),
                self.schools.len()
            );
        }
        view
    }

    pub fn bounds(&self) -> FilterBounds {
        FilterBounds::from_records(&self.schools)
    }

    /// Headline figures for `view`, relative to the whole session.
    pub fn summary(&self, view: &[School]) -> ExecutiveSummary {
        ExecutiveSummary::compute(view, self.schools.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub schools: usize,
    /// Percentage of the session's schools present in the view.
    pub share_of_total: f64,
    pub total_rooms: u64,
    pub ac_rooms: u64,
    /// AC rooms as a percentage of all rooms in the view.
    pub ac_room_share: f64,
    pub mean_early: Option<f64>,
    pub mean_final: Option<f64>,
}

impl ExecutiveSummary {
    pub fn compute(view: &[School], session_size: usize) -> Self {
        let total_rooms = view.iter().map(|s| u64::from(s.total_rooms)).sum::<u64>();
        let ac_rooms = view.iter().map(|s| u64::from(s.ac_rooms)).sum::<u64>();
        Self {
            schools: view.len(),
            share_of_total: percentage(view.len() as f64, session_size as f64),
            total_rooms,
            ac_rooms,
            ac_room_share: percentage(ac_rooms as f64, total_rooms as f64),
            mean_early: stats::describe_variable(view, Variable::EarlyScore).map(|s| s.mean),
            mean_final: stats::describe_variable(view, Variable::FinalScore).map(|s| s.mean),
        }
    }
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { 100.0 * part / whole }
}
