//! Absence query results, flat and grouped by supervisor.
//!
//! All of these are transient, computed per dispatch cycle and never
//! persisted.

use serde::{Deserialize, Serialize};

use crate::api::UserId;

/// One absent intern as returned by the repository, denormalized with
/// supervisor and unit names. Repositories order rows by supervisor id,
/// then intern id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsentInternRow {
    pub intern_id: UserId,
    pub intern_name: String,
    pub supervisor_id: UserId,
    pub supervisor_name: String,
    pub unit_name: Option<String>,
}

/// An absent intern inside a supervisor group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsentIntern {
    pub intern_id: UserId,
    pub intern_name: String,
    pub unit_name: Option<String>,
}

/// A supervisor's absent interns. Supervisors with no absentees never
/// appear as a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceGroup {
    pub supervisor_id: UserId,
    pub supervisor_name: String,
    pub absent_interns: Vec<AbsentIntern>,
}

impl AbsenceGroup {
    /// Group flat rows by supervisor.
    ///
    /// Groups come out ordered by supervisor id and interns by intern id,
    /// so one invocation's output is deterministic regardless of the
    /// backend's row order.
    pub fn from_rows(mut rows: Vec<AbsentInternRow>) -> Vec<AbsenceGroup> {
        rows.sort_by_key(|row| (row.supervisor_id.value(), row.intern_id.value()));

        let mut groups: Vec<AbsenceGroup> = Vec::new();
        for row in rows {
            let intern = AbsentIntern {
                intern_id: row.intern_id,
                intern_name: row.intern_name,
                unit_name: row.unit_name,
            };
            match groups.last_mut() {
                Some(group) if group.supervisor_id == row.supervisor_id => {
                    group.absent_interns.push(intern);
                }
                _ => groups.push(AbsenceGroup {
                    supervisor_id: row.supervisor_id,
                    supervisor_name: row.supervisor_name,
                    absent_interns: vec![intern],
                }),
            }
        }
        groups
    }

    /// Total interns across all groups.
    pub fn total_interns(groups: &[AbsenceGroup]) -> usize {
        groups.iter().map(|g| g.absent_interns.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(intern_id: i64, supervisor_id: i64, unit: Option<&str>) -> AbsentInternRow {
        AbsentInternRow {
            intern_id: UserId::new(intern_id),
            intern_name: format!("Intern {}", intern_id),
            supervisor_id: UserId::new(supervisor_id),
            supervisor_name: format!("Supervisor {}", supervisor_id),
            unit_name: unit.map(String::from),
        }
    }

    #[test]
    fn test_groups_by_supervisor_in_id_order() {
        let rows = vec![
            row(30, 2, Some("Finance")),
            row(10, 1, Some("Engineering")),
            row(20, 1, None),
        ];
        let groups = AbsenceGroup::from_rows(rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].supervisor_id, UserId::new(1));
        assert_eq!(groups[0].absent_interns.len(), 2);
        assert_eq!(groups[0].absent_interns[0].intern_id, UserId::new(10));
        assert_eq!(groups[0].absent_interns[1].intern_id, UserId::new(20));
        assert_eq!(groups[1].supervisor_id, UserId::new(2));
        assert_eq!(groups[1].absent_interns[0].unit_name.as_deref(), Some("Finance"));
    }

    #[test]
    fn test_no_rows_means_no_groups() {
        assert!(AbsenceGroup::from_rows(Vec::new()).is_empty());
    }

    #[test]
    fn test_total_interns() {
        let groups = AbsenceGroup::from_rows(vec![row(1, 1, None), row(2, 1, None), row(3, 2, None)]);
        assert_eq!(AbsenceGroup::total_interns(&groups), 3);
    }
}
