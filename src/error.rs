//! Fatal pipeline errors.
//!
//! Only two conditions abort a run: a source whose required columns cannot be
//! resolved, and a reconciliation that leaves no school behind. Everything
//! else (bad room counts, unparsable rates, duplicate rows) is a data-quality
//! exclusion that is counted and logged by the stage that meets it.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(
        "Required column(s) not found in {source_name}: {missing_list}. Available columns: {available_list}",
        missing_list = .missing.join(", "),
        available_list = format_available(.available)
    )]
    SchemaValidation {
        source_name: String,
        missing: Vec<String>,
        available: Vec<String>,
    },
    #[error("no valid school records after reconciliation")]
    EmptyResult,
}

impl PipelineError {
    pub fn schema_validation(
        source_name: impl Into<String>,
        missing: Vec<String>,
        available: &[String],
    ) -> Self {
        PipelineError::SchemaValidation {
            source_name: source_name.into(),
            missing,
            available: available.to_vec(),
        }
    }
}

fn format_available(columns: &[String]) -> String {
    if columns.is_empty() {
        return "(none)".to_string();
    }
    columns
        .iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_validation_message_lists_missing_and_available_columns() {
        let err = PipelineError::schema_validation(
            "school table",
            vec!["school_id".into(), "total_rooms".into()],
            &["NO_ENTIDADE".to_string(), "Bairro".to_string()],
        );
        let message = err.to_string();
        assert!(message.contains("school table"));
        assert!(message.contains("school_id, total_rooms"));
        assert!(message.contains("'NO_ENTIDADE', 'Bairro'"));
    }

    #[test]
    fn empty_result_message_is_stable() {
        assert_eq!(
            PipelineError::EmptyResult.to_string(),
            "no valid school records after reconciliation"
        );
    }
}
