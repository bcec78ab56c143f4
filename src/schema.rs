//! Canonical-field resolution for drifting spreadsheet schemas.
//!
//! Each source table is matched against an [`AliasTable`]: an ordered list of
//! canonical fields, each with the source names accepted for it. Resolution is
//! a pure lookup producing a [`ResolvedSchema`] (canonical field → column
//! index); the source table is never renamed or copied.
//!
//! ## Responsibilities
//!
//! - Header cleanup (wrapped and padded names) before any comparison
//! - Ordered alias search, canonical name first
//! - Substring fallback for the approval-rate column
//! - Header-row detection for exports that carry title rows above the header
//! - Diagnostics naming missing fields and every column actually present

use std::fmt;

use log::{Level, debug, log};
use serde::Serialize;

use crate::{
    config::AliasConfig,
    data::clean_header,
    error::PipelineError,
    table::RawTable,
};

/// How many leading rows are searched for the real header when the first row
/// does not resolve.
pub const HEADER_SCAN_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    SchoolId,
    SchoolName,
    DependencyType,
    TotalRooms,
    AcRooms,
    Neighborhood,
    ApprovalRate,
    StateCode,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::SchoolId => "school_id",
            CanonicalField::SchoolName => "school_name",
            CanonicalField::DependencyType => "dependency_type",
            CanonicalField::TotalRooms => "total_rooms",
            CanonicalField::AcRooms => "ac_rooms",
            CanonicalField::Neighborhood => "neighborhood",
            CanonicalField::ApprovalRate => "approval_rate",
            CanonicalField::StateCode => "state_code",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAlias {
    pub field: CanonicalField,
    pub names: Vec<String>,
    pub required: bool,
    pub fallback_substrings: Vec<String>,
}

impl FieldAlias {
    pub fn required(field: CanonicalField, names: &[String]) -> Self {
        Self {
            field,
            names: names.to_vec(),
            required: true,
            fallback_substrings: Vec::new(),
        }
    }

    pub fn optional(field: CanonicalField, names: &[String]) -> Self {
        Self {
            required: false,
            ..Self::required(field, names)
        }
    }

    pub fn with_fallbacks(mut self, substrings: &[String]) -> Self {
        self.fallback_substrings = substrings.to_vec();
        self
    }

    /// Exact match on the canonical name, then each alias in order, then the
    /// first column containing a fallback substring.
    fn find(&self, cleaned: &[String]) -> Option<usize> {
        std::iter::once(self.field.as_str())
            .chain(self.names.iter().map(|n| n.as_str()))
            .map(clean_header)
            .filter(|candidate| !candidate.is_empty())
            .find_map(|candidate| cleaned.iter().position(|h| *h == candidate))
            .or_else(|| {
                cleaned.iter().position(|header| {
                    self.fallback_substrings
                        .iter()
                        .filter(|needle| !needle.is_empty())
                        .any(|needle| header.contains(needle.as_str()))
                })
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    source_name: String,
    fields: Vec<FieldAlias>,
}

impl AliasTable {
    pub fn new(source_name: impl Into<String>, fields: Vec<FieldAlias>) -> Self {
        Self {
            source_name: source_name.into(),
            fields,
        }
    }

    pub fn school(config: &AliasConfig) -> Self {
        let aliases = &config.school;
        Self::new(
            "school table",
            vec![
                FieldAlias::required(CanonicalField::SchoolName, &aliases.school_name),
                FieldAlias::required(CanonicalField::SchoolId, &aliases.school_id),
                FieldAlias::required(CanonicalField::DependencyType, &aliases.dependency_type),
                FieldAlias::required(CanonicalField::TotalRooms, &aliases.total_rooms),
                FieldAlias::required(CanonicalField::AcRooms, &aliases.ac_rooms),
                FieldAlias::optional(CanonicalField::Neighborhood, &aliases.neighborhood),
            ],
        )
    }

    pub fn performance(config: &AliasConfig, source_name: impl Into<String>) -> Self {
        let aliases = &config.performance;
        Self::new(
            source_name,
            vec![
                FieldAlias::required(CanonicalField::SchoolId, &aliases.school_id),
                FieldAlias::required(CanonicalField::ApprovalRate, &aliases.approval_rate)
                    .with_fallbacks(&aliases.approval_rate_fallbacks),
                FieldAlias::optional(CanonicalField::StateCode, &aliases.state_code),
            ],
        )
    }
}

/// Outcome of resolving one source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    source_name: String,
    columns: Vec<(CanonicalField, usize)>,
    available: Vec<String>,
    /// Index into [`RawTable::rows`] of the first data row. Non-zero when the
    /// header was found below title rows.
    data_start: usize,
}

impl ResolvedSchema {
    pub fn column(&self, field: CanonicalField) -> Option<usize> {
        self.columns
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, idx)| *idx)
    }

    pub fn require(&self, field: CanonicalField) -> Result<usize, PipelineError> {
        self.column(field).ok_or_else(|| {
            PipelineError::schema_validation(
                self.source_name.clone(),
                vec![field.as_str().to_string()],
                &self.available,
            )
        })
    }

    pub fn data_start(&self) -> usize {
        self.data_start
    }

    /// Cleaned header names with every resolved column replaced by its
    /// canonical name.
    pub fn renamed_headers(&self) -> Vec<String> {
        let mut headers = self.available.clone();
        for (field, idx) in &self.columns {
            if let Some(slot) = headers.get_mut(*idx) {
                *slot = field.as_str().to_string();
            }
        }
        headers
    }
}

// Without a neighborhood column every school loses its neighborhood, which
// must be visible at the default log level.
fn missing_optional_level(field: CanonicalField) -> Level {
    match field {
        CanonicalField::Neighborhood => Level::Info,
        _ => Level::Debug,
    }
}

pub fn resolve_columns(
    headers: &[String],
    aliases: &AliasTable,
) -> Result<ResolvedSchema, PipelineError> {
    let cleaned = headers.iter().map(|h| clean_header(h)).collect::<Vec<_>>();
    let mut columns = Vec::with_capacity(aliases.fields.len());
    let mut missing = Vec::new();
    for alias in &aliases.fields {
        match alias.find(&cleaned) {
            Some(idx) => columns.push((alias.field, idx)),
            None if alias.required => missing.push(alias.field.as_str().to_string()),
            None => log!(
                missing_optional_level(alias.field),
                "{}: optional field '{}' not present",
                aliases.source_name,
                alias.field
            ),
        }
    }
    if !missing.is_empty() {
        return Err(PipelineError::schema_validation(
            aliases.source_name.clone(),
            missing,
            &cleaned,
        ));
    }
    Ok(ResolvedSchema {
        source_name: aliases.source_name.clone(),
        columns,
        available: cleaned,
        data_start: 0,
    })
}

/// Resolves `table` against `aliases`, looking below the first row for the
/// real header when needed. Errors report the table's original header.
pub fn resolve_table(
    table: &RawTable,
    aliases: &AliasTable,
) -> Result<ResolvedSchema, PipelineError> {
    let first_error = match resolve_columns(table.headers(), aliases) {
        Ok(resolved) => return Ok(resolved),
        Err(err) => err,
    };
    for (row_idx, row) in table.rows().iter().take(HEADER_SCAN_ROWS).enumerate() {
        if let Ok(mut resolved) = resolve_columns(row, aliases) {
            debug!(
                "{}: header found on data row {}",
                aliases.source_name,
                row_idx + 1
            );
            resolved.data_start = row_idx + 1;
            return Ok(resolved);
        }
    }
    Err(first_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn resolves_aliases_in_priority_order() {
        let config = AliasConfig::default();
        let aliases = AliasTable::school(&config);
        let resolved = resolve_columns(
            &headers(&[
                "Bairro",
                "NO_ENTIDADE",
                "CO_ENTIDADE",
                "TP_DEPENDENCIA",
                "QT_SALAS_UTILIZADAS",
                "QT_SALAS_UTILIZA_CLIMATIZADAS",
                "NO_BAIRRO",
            ]),
            &aliases,
        )
        .unwrap();
        assert_eq!(resolved.column(CanonicalField::Neighborhood), Some(6));
        assert_eq!(resolved.column(CanonicalField::SchoolId), Some(2));
    }

    #[test]
    fn canonical_name_is_accepted_directly() {
        let config = AliasConfig::default();
        let aliases = AliasTable::performance(&config, "early");
        let resolved =
            resolve_columns(&headers(&["school_id", "approval_rate"]), &aliases).unwrap();
        assert_eq!(resolved.column(CanonicalField::SchoolId), Some(0));
        assert_eq!(resolved.column(CanonicalField::ApprovalRate), Some(1));
        assert_eq!(resolved.column(CanonicalField::StateCode), None);
    }

    #[test]
    fn approval_rate_falls_back_to_first_substring_match() {
        let config = AliasConfig::default();
        let aliases = AliasTable::performance(&config, "early");
        let resolved = resolve_columns(
            &headers(&[
                "Código da\nEscola",
                "Nota SAEB",
                "Taxa de Aprovação - 2021",
                "Taxa de Aprovação - 2019",
            ]),
            &aliases,
        )
        .unwrap();
        assert_eq!(resolved.column(CanonicalField::SchoolId), Some(0));
        assert_eq!(resolved.column(CanonicalField::ApprovalRate), Some(2));
    }

    #[test]
    fn fallback_is_case_sensitive() {
        let config = AliasConfig::default();
        let aliases = AliasTable::performance(&config, "final");
        let err = resolve_columns(&headers(&["CO_ENTIDADE", "taxa media"]), &aliases)
            .unwrap_err();
        match err {
            PipelineError::SchemaValidation {
                missing, available, ..
            } => {
                assert_eq!(missing, vec!["approval_rate".to_string()]);
                assert_eq!(available, headers(&["CO_ENTIDADE", "taxa media"]));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_neighborhood_is_not_an_error() {
        let config = AliasConfig::default();
        let aliases = AliasTable::school(&config);
        let resolved = resolve_columns(
            &headers(&[
                "NO_ENTIDADE",
                "CO_ENTIDADE",
                "TP_DEPENDENCIA",
                "QT_SALAS_UTILIZADAS",
                "QT_SALAS_UTILIZA_CLIMATIZADAS",
            ]),
            &aliases,
        )
        .unwrap();
        assert_eq!(resolved.column(CanonicalField::Neighborhood), None);
    }

    #[test]
    fn header_row_is_detected_below_title_rows() {
        let config = AliasConfig::default();
        let aliases = AliasTable::performance(&config, "early");
        let table = RawTable::from_rows(
            "early",
            vec![
                headers(&["IDEB 2023 - Anos Iniciais", "", ""]),
                headers(&["", "", ""]),
                headers(&["Sigla da UF", "Código da Escola", "Taxa de Aprovação - 2023"]),
                headers(&["RJ", "1", "95.0"]),
            ],
        );
        let resolved = resolve_table(&table, &aliases).unwrap();
        assert_eq!(resolved.data_start(), 2);
        assert_eq!(resolved.column(CanonicalField::StateCode), Some(0));
        assert_eq!(
            resolved.renamed_headers(),
            headers(&["state_code", "school_id", "approval_rate"])
        );
    }

    #[test]
    fn missing_neighborhood_is_logged_at_info() {
        assert_eq!(
            missing_optional_level(CanonicalField::Neighborhood),
            Level::Info
        );
        assert_eq!(
            missing_optional_level(CanonicalField::StateCode),
            Level::Debug
        );
    }
}
