use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::{
    error::PipelineError,
    normalize::{PerformanceRecord, SchoolInfrastructureRecord},
};

/// One infrastructure record with its scores attached, before derived metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledSchool {
    pub school_id: String,
    pub school_name: String,
    pub neighborhood: Option<String>,
    pub total_rooms: u32,
    pub ac_rooms: u32,
    pub early_score: Option<f64>,
    pub final_score: Option<f64>,
}

/// Left outer join of the infrastructure records with both performance
/// sources on `school_id`.
///
/// Every infrastructure record survives whether or not it has scores. When a
/// performance source lists the same school more than once the first row wins.
/// The joined set is deduplicated by `school_id`, first occurrence kept, and
/// keeps the order of the infrastructure input.
pub fn reconcile(
    schools: &[SchoolInfrastructureRecord],
    early: &[PerformanceRecord],
    final_: &[PerformanceRecord],
) -> Result<Vec<ReconciledSchool>, PipelineError> {
    let early_lookup = build_score_lookup(early, "early");
    let final_lookup = build_score_lookup(final_, "final");

    let mut seen: HashSet<&str> = HashSet::with_capacity(schools.len());
    let mut reconciled = Vec::with_capacity(schools.len());
    let mut duplicate_schools = 0usize;
    for school in schools {
        if !seen.insert(school.school_id.as_str()) {
            debug!("Duplicate school '{}' ignored", school.school_id);
            duplicate_schools += 1;
            continue;
        }
        reconciled.push(ReconciledSchool {
            school_id: school.school_id.clone(),
            school_name: school.school_name.clone(),
            neighborhood: school.neighborhood.clone(),
            total_rooms: school.total_rooms,
            ac_rooms: school.ac_rooms,
            early_score: score_for(&early_lookup, &school.school_id),
            final_score: score_for(&final_lookup, &school.school_id),
        });
    }

    if reconciled.is_empty() {
        return Err(PipelineError::EmptyResult);
    }
    let matched_early = reconciled.iter().filter(|s| s.early_score.is_some()).count();
    let matched_final = reconciled.iter().filter(|s| s.final_score.is_some()).count();
    info!(
        "Reconciled {} school(s): {} with early scores, {} with final scores, {} duplicate(s) dropped",
        reconciled.len(),
        matched_early,
        matched_final,
        duplicate_schools
    );
    Ok(reconciled)
}

fn build_score_lookup<'a>(records: &'a [PerformanceRecord], label: &str) -> HashMap<&'a str, f64> {
    let mut lookup: HashMap<&str, f64> = HashMap::with_capacity(records.len());
    let mut duplicates = 0usize;
    for record in records {
        if lookup.contains_key(record.school_id.as_str()) {
            debug!(
                "{label}: duplicate performance row for '{}' ignored",
                record.school_id
            );
            duplicates += 1;
            continue;
        }
        lookup.insert(record.school_id.as_str(), record.approval_rate);
    }
    if duplicates > 0 {
        info!("{label}: {duplicates} duplicate performance row(s) ignored, first occurrence kept");
    }
    lookup
}

// NaN rates mean "reported without a usable value"; downstream that is the
// same absence as no row at all.
fn score_for(lookup: &HashMap<&str, f64>, school_id: &str) -> Option<f64> {
    lookup
        .get(school_id)
        .copied()
        .filter(|score| !score.is_nan())
}
