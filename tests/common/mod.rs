#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use school_climate::metrics::School;
use tempfile::{TempDir, tempdir};

pub const SCHOOL_HEADER: &str = "CO_ENTIDADE,NO_ENTIDADE,TP_DEPENDENCIA,QT_SALAS_UTILIZADAS,QT_SALAS_UTILIZA_CLIMATIZADAS,NO_BAIRRO";
pub const PERFORMANCE_HEADER: &str = "Sigla da UF,Código da Escola,Taxa de Aprovação - 2023";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the three-school scenario and returns (schools, early, final).
    pub fn write_scenario(&self) -> (PathBuf, PathBuf, PathBuf) {
        (
            self.write("escolas.csv", &scenario_schools()),
            self.write("iniciais.csv", &scenario_early()),
            self.write("finais.csv", &scenario_final()),
        )
    }
}

/// Ids 1 and 2 are public (code 3), id 3 is private (code 4).
pub fn scenario_schools() -> String {
    [
        SCHOOL_HEADER,
        "1,Escola A,3,10,5,Centro",
        "2,Escola B,3,8,8,Centro",
        "3,Escola C,4,12,0,Boa Vista",
    ]
    .join("\n")
}

pub fn scenario_early() -> String {
    [
        "Resultados IDEB 2023,,",
        PERFORMANCE_HEADER,
        "RJ,1,6.5",
        "RJ,2,7.0",
        ",Fonte: INEP,",
    ]
    .join("\n")
}

pub fn scenario_final() -> String {
    [PERFORMANCE_HEADER, "RJ,2,5.5", "RJ,3,4.0"].join("\n")
}

/// Builds `count` public schools with AC coverage rising with the index and
/// scores that track it, for statistics-heavy tests.
pub fn synthetic_inputs(count: usize) -> (String, String, String) {
    let mut schools = vec![SCHOOL_HEADER.to_string()];
    let mut early = vec![PERFORMANCE_HEADER.to_string()];
    let mut final_ = vec![PERFORMANCE_HEADER.to_string()];
    for idx in 0..count {
        let total = 10 + (idx % 7) as u32;
        let ac = (idx as u32 * 3) % (total + 1);
        let neighborhood = ["Centro", "Tijuca", "Bangu"][idx % 3];
        schools.push(format!(
            "{},Escola {idx},3,{total},{ac},{neighborhood}",
            33_000_000 + idx
        ));
        let share = f64::from(ac) / f64::from(total);
        early.push(format!("RJ,{},{:.2}", 33_000_000 + idx, 5.0 + 4.0 * share));
        if idx % 4 != 0 {
            final_.push(format!(
                "RJ,{},{:.2}",
                33_000_000 + idx,
                4.0 + 2.0 * share + (idx % 5) as f64 * 0.1
            ));
        }
    }
    (schools.join("\n"), early.join("\n"), final_.join("\n"))
}

pub fn school(id: &str, neighborhood: Option<&str>, total: u32, ac: u32) -> School {
    School {
        school_id: id.to_string(),
        school_name: format!("Escola {id}"),
        neighborhood: neighborhood.map(|n| n.to_string()),
        total_rooms: total,
        ac_rooms: ac,
        rooms_without_ac: total - ac,
        ac_percentage: school_climate::metrics::ac_percentage(ac, total),
        early_score: None,
        final_score: None,
    }
}

pub fn with_scores(mut school: School, early: Option<f64>, final_score: Option<f64>) -> School {
    school.early_score = early;
    school.final_score = final_score;
    school
}
