use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    config::AliasConfig,
    error::PipelineError,
    io_utils::{self, ReadOptions},
    metrics::{self, School},
    normalize::{self, Level, NormalizationReport},
    reconcile,
    schema::{self, AliasTable},
    table::RawTable,
};

pub const SCHOOL_SOURCE: &str = "school table";
pub const EARLY_SOURCE: &str = "early-grade performance table";
pub const FINAL_SOURCE: &str = "final-grade performance table";

/// The three source exports of one analysis run.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub schools: PathBuf,
    pub early: PathBuf,
    pub final_: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub schools: Vec<School>,
    /// School, early and final reports, in that order.
    pub reports: Vec<NormalizationReport>,
}

/// Resolves, normalizes, joins, and enriches three raw tables. Any fatal error
/// aborts the whole run; no partial record set is returned.
pub fn process_tables(
    schools: &RawTable,
    early: &RawTable,
    final_: &RawTable,
    config: &AliasConfig,
) -> Result<PipelineOutput, PipelineError> {
    let school_schema = schema::resolve_table(schools, &AliasTable::school(config))?;
    debug!(
        "{}: resolved header {:?}",
        schools.name(),
        school_schema.renamed_headers()
    );
    let (school_records, school_report) =
        normalize::normalize_schools(schools, &school_schema, config.public_dependency_code)?;

    let (early_records, early_report) = normalize_level(early, Level::Early, config)?;
    let (final_records, final_report) = normalize_level(final_, Level::Final, config)?;

    let reports = vec![school_report, early_report, final_report];
    for report in &reports {
        info!("{report}");
    }

    let reconciled = reconcile::reconcile(&school_records, &early_records, &final_records)?;
    Ok(PipelineOutput {
        schools: metrics::derive_metrics(reconciled),
        reports,
    })
}

fn normalize_level(
    table: &RawTable,
    level: Level,
    config: &AliasConfig,
) -> Result<(Vec<normalize::PerformanceRecord>, NormalizationReport), PipelineError> {
    let aliases = AliasTable::performance(config, table.name());
    let resolved = schema::resolve_table(table, &aliases)?;
    debug!(
        "{}: resolved header {:?}",
        table.name(),
        resolved.renamed_headers()
    );
    normalize::normalize_performance(table, &resolved, level)
}

pub fn process_files(
    paths: &SourcePaths,
    options: &ReadOptions,
    config: &AliasConfig,
) -> Result<PipelineOutput> {
    let schools = io_utils::read_table(&paths.schools, SCHOOL_SOURCE, options)?;
    let early = io_utils::read_table(&paths.early, EARLY_SOURCE, options)?;
    let final_ = io_utils::read_table(&paths.final_, FINAL_SOURCE, options)?;
    process_tables(&schools, &early, &final_, config).context("Processing school data")
}
