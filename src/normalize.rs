//! Typed canonical records from resolved source tables.
//!
//! Normalization is where data-quality exclusions happen: private schools,
//! blank identifiers, impossible room counts. None of these are errors. Each
//! excluded row is logged at debug level and counted in the
//! [`NormalizationReport`] returned alongside the records.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::{
    data::{normalize_identifier, normalize_neighborhood, parse_number},
    error::PipelineError,
    schema::{CanonicalField, ResolvedSchema},
    table::RawTable,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolInfrastructureRecord {
    pub school_id: String,
    pub school_name: String,
    pub neighborhood: Option<String>,
    pub total_rooms: u32,
    pub ac_rooms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Early,
    Final,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Early => "early",
            Level::Final => "final",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord {
    pub school_id: String,
    /// NaN when the source cell could not be read as a number.
    pub approval_rate: f64,
    pub level: Level,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub source_name: String,
    pub rows_read: usize,
    pub kept: usize,
    pub not_public: usize,
    pub missing_identifier: usize,
    pub missing_name: usize,
    pub missing_total_rooms: usize,
    pub invalid_room_counts: usize,
    pub missing_state_code: usize,
    pub unparsable_rates: usize,
}

impl NormalizationReport {
    fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            ..Self::default()
        }
    }

    pub fn excluded(&self) -> usize {
        self.rows_read - self.kept
    }
}

impl fmt::Display for NormalizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: kept {} of {} row(s)",
            self.source_name, self.kept, self.rows_read
        )?;
        let reasons = [
            ("not public", self.not_public),
            ("missing identifier", self.missing_identifier),
            ("missing name", self.missing_name),
            ("missing total rooms", self.missing_total_rooms),
            ("invalid room counts", self.invalid_room_counts),
            ("missing state code", self.missing_state_code),
        ];
        for (label, count) in reasons.iter().filter(|(_, count)| *count > 0) {
            write!(f, ", {count} {label}")?;
        }
        if self.unparsable_rates > 0 {
            write!(f, " ({} unparsable rate(s) kept as NaN)", self.unparsable_rates)?;
        }
        Ok(())
    }
}

pub fn normalize_schools(
    table: &RawTable,
    schema: &ResolvedSchema,
    public_dependency_code: i64,
) -> Result<(Vec<SchoolInfrastructureRecord>, NormalizationReport), PipelineError> {
    let id_col = schema.require(CanonicalField::SchoolId)?;
    let name_col = schema.require(CanonicalField::SchoolName)?;
    let dependency_col = schema.require(CanonicalField::DependencyType)?;
    let total_col = schema.require(CanonicalField::TotalRooms)?;
    let ac_col = schema.require(CanonicalField::AcRooms)?;
    let neighborhood_col = schema.column(CanonicalField::Neighborhood);

    let mut report = NormalizationReport::new(table.name());
    let mut records = Vec::new();
    for (offset, row) in table.rows().iter().skip(schema.data_start()).enumerate() {
        report.rows_read += 1;
        let line = schema.data_start() + offset + 2;

        let dependency = parse_number(RawTable::cell(row, dependency_col));
        if dependency != Some(public_dependency_code as f64) {
            report.not_public += 1;
            continue;
        }
        let Some(school_id) = normalize_identifier(RawTable::cell(row, id_col)) else {
            debug!("{}: row {line} dropped, blank identifier", table.name());
            report.missing_identifier += 1;
            continue;
        };
        let school_name = RawTable::cell(row, name_col).trim().to_string();
        if school_name.is_empty() {
            debug!("{}: row {line} ({school_id}) dropped, blank name", table.name());
            report.missing_name += 1;
            continue;
        }
        let (total_rooms, ac_rooms) = match read_rooms(
            RawTable::cell(row, total_col),
            RawTable::cell(row, ac_col),
        ) {
            Ok(rooms) => rooms,
            Err(RoomsRejection::MissingTotal) => {
                debug!("{}: row {line} ({school_id}) dropped, no room count", table.name());
                report.missing_total_rooms += 1;
                continue;
            }
            Err(RoomsRejection::Invalid) => {
                debug!(
                    "{}: row {line} ({school_id}) dropped, invalid room counts '{}' / '{}'",
                    table.name(),
                    RawTable::cell(row, total_col),
                    RawTable::cell(row, ac_col)
                );
                report.invalid_room_counts += 1;
                continue;
            }
        };
        let neighborhood =
            neighborhood_col.map(|col| normalize_neighborhood(RawTable::cell(row, col)));

        records.push(SchoolInfrastructureRecord {
            school_id,
            school_name,
            neighborhood,
            total_rooms,
            ac_rooms,
        });
        report.kept += 1;
    }
    Ok((records, report))
}

enum RoomsRejection {
    MissingTotal,
    Invalid,
}

// A missing AC count means no air-conditioned rooms; a missing total makes the
// school unusable.
fn read_rooms(total_raw: &str, ac_raw: &str) -> Result<(u32, u32), RoomsRejection> {
    let total = parse_number(total_raw).ok_or(RoomsRejection::MissingTotal)?;
    let ac = parse_number(ac_raw).unwrap_or(0.0);
    if total.fract() != 0.0 || ac.fract() != 0.0 {
        return Err(RoomsRejection::Invalid);
    }
    if total <= 0.0 || ac < 0.0 || ac > total || total > u32::MAX as f64 {
        return Err(RoomsRejection::Invalid);
    }
    Ok((total as u32, ac as u32))
}

pub fn normalize_performance(
    table: &RawTable,
    schema: &ResolvedSchema,
    level: Level,
) -> Result<(Vec<PerformanceRecord>, NormalizationReport), PipelineError> {
    let id_col = schema.require(CanonicalField::SchoolId)?;
    let rate_col = schema.require(CanonicalField::ApprovalRate)?;
    let state_col = schema.column(CanonicalField::StateCode);

    let mut report = NormalizationReport::new(table.name());
    let mut records = Vec::new();
    for (offset, row) in table.rows().iter().skip(schema.data_start()).enumerate() {
        report.rows_read += 1;
        let line = schema.data_start() + offset + 2;

        if let Some(col) = state_col
            && RawTable::cell(row, col).trim().is_empty()
        {
            report.missing_state_code += 1;
            continue;
        }
        let Some(school_id) = normalize_identifier(RawTable::cell(row, id_col)) else {
            debug!("{}: row {line} dropped, blank identifier", table.name());
            report.missing_identifier += 1;
            continue;
        };
        let raw_rate = RawTable::cell(row, rate_col);
        let approval_rate = parse_number(raw_rate).unwrap_or_else(|| {
            if !raw_rate.trim().is_empty() {
                debug!(
                    "{}: row {line} ({school_id}) rate '{}' is not numeric",
                    table.name(),
                    raw_rate.trim()
                );
            }
            report.unparsable_rates += 1;
            f64::NAN
        });

        records.push(PerformanceRecord {
            school_id,
            approval_rate,
            level,
        });
        report.kept += 1;
    }
    Ok((records, report))
}
