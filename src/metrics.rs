use serde::Serialize;

use crate::reconcile::ReconciledSchool;

/// The merged per-school record every analysis works on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct School {
    pub school_id: String,
    pub school_name: String,
    pub neighborhood: Option<String>,
    pub total_rooms: u32,
    pub ac_rooms: u32,
    pub rooms_without_ac: u32,
    pub ac_percentage: f64,
    pub early_score: Option<f64>,
    pub final_score: Option<f64>,
}

pub fn ac_percentage(ac_rooms: u32, total_rooms: u32) -> f64 {
    if total_rooms == 0 {
        0.0
    } else {
        100.0 * f64::from(ac_rooms) / f64::from(total_rooms)
    }
}

/// Adds `ac_percentage` and `rooms_without_ac` to every record, preserving
/// order and count.
pub fn derive_metrics(records: Vec<ReconciledSchool>) -> Vec<School> {
    records
        .into_iter()
        .map(|record| School {
            rooms_without_ac: record.total_rooms.saturating_sub(record.ac_rooms),
            ac_percentage: ac_percentage(record.ac_rooms, record.total_rooms),
            school_id: record.school_id,
            school_name: record.school_name,
            neighborhood: record.neighborhood,
            total_rooms: record.total_rooms,
            ac_rooms: record.ac_rooms,
            early_score: record.early_score,
            final_score: record.final_score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconciled(id: &str, total: u32, ac: u32) -> ReconciledSchool {
        ReconciledSchool {
            school_id: id.to_string(),
            school_name: format!("Escola {id}"),
            neighborhood: None,
            total_rooms: total,
            ac_rooms: ac,
            early_score: None,
            final_score: Some(4.2),
        }
    }

    #[test]
    fn derives_percentage_and_rooms_without_ac() {
        let schools = derive_metrics(vec![reconciled("1", 10, 5), reconciled("2", 3, 1)]);
        assert_eq!(schools.len(), 2);
        assert_eq!(schools[0].ac_percentage, 50.0);
        assert_eq!(schools[0].rooms_without_ac, 5);
        assert!((schools[1].ac_percentage - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(schools[1].final_score, Some(4.2));
    }

    #[test]
    fn zero_total_rooms_does_not_divide() {
        let schools = derive_metrics(vec![reconciled("1", 0, 0)]);
        assert_eq!(schools[0].ac_percentage, 0.0);
        assert_eq!(schools[0].rooms_without_ac, 0);
    }
}
