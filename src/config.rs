//! Alias configuration persisted as YAML.
//!
//! Source spreadsheets drift between data releases: columns get renamed,
//! headers wrap, the approval-rate year changes. The alias table captures the
//! accepted names for every canonical field so a new release can be handled
//! by editing a YAML file instead of the code. Keys missing from a file fall
//! back to the built-in defaults.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// Dependency-type code identifying the public schools under analysis.
pub const PUBLIC_DEPENDENCY_CODE: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    pub public_dependency_code: i64,
    pub school: SchoolAliases,
    pub performance: PerformanceAliases,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolAliases {
    pub school_name: Vec<String>,
    pub school_id: Vec<String>,
    pub dependency_type: Vec<String>,
    pub total_rooms: Vec<String>,
    pub ac_rooms: Vec<String>,
    pub neighborhood: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceAliases {
    pub school_id: Vec<String>,
    pub approval_rate: Vec<String>,
    /// Last-resort substrings: the first column containing any of them is
    /// taken as the approval rate. Matching is case-sensitive.
    pub approval_rate_fallbacks: Vec<String>,
    /// Rows blank in this column (first present alias) are footnotes and are
    /// dropped before normalization.
    pub state_code: Vec<String>,
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            public_dependency_code: PUBLIC_DEPENDENCY_CODE,
            school: SchoolAliases::default(),
            performance: PerformanceAliases::default(),
        }
    }
}

impl Default for SchoolAliases {
    fn default() -> Self {
        Self {
            school_name: names(&["NO_ENTIDADE"]),
            school_id: names(&["CO_ENTIDADE"]),
            dependency_type: names(&["TP_DEPENDENCIA"]),
            total_rooms: names(&["QT_SALAS_UTILIZADAS"]),
            ac_rooms: names(&["QT_SALAS_UTILIZA_CLIMATIZADAS"]),
            neighborhood: names(&["NO_BAIRRO", "BAIRRO", "Bairro"]),
        }
    }
}

impl Default for PerformanceAliases {
    fn default() -> Self {
        Self {
            school_id: names(&["Código da Escola", "CO_ENTIDADE"]),
            approval_rate: names(&["Taxa de Aprovação - 2023"]),
            approval_rate_fallbacks: names(&["Taxa", "Aprovação", "Rate", "Approval"]),
            state_code: names(&["Sigla da UF", "SG_UF"]),
        }
    }
}

impl AliasConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening alias file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: AliasConfig =
            serde_yaml::from_reader(reader).context("Parsing alias YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating alias file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing alias YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing aliases to YAML string")
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("school.school_name", &self.school.school_name),
            ("school.school_id", &self.school.school_id),
            ("school.dependency_type", &self.school.dependency_type),
            ("school.total_rooms", &self.school.total_rooms),
            ("school.ac_rooms", &self.school.ac_rooms),
            ("performance.school_id", &self.performance.school_id),
            ("performance.approval_rate", &self.performance.approval_rate),
        ];
        for (key, aliases) in required {
            ensure!(
                aliases.iter().any(|alias| !alias.trim().is_empty()),
                "Alias list '{key}' must name at least one column"
            );
        }
        Ok(())
    }
}
