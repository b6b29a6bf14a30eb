use std::collections::HashMap;

use serde::Serialize;
use tracing::instrument;

use crate::db::Store;
use crate::error::AppError;
use crate::models::{Discipline, Group, Marks, RecordId, Student, StudentDisciplineData};
use crate::stats::{
    grade_class, rounded_percent, score_to_grade, select_best_worst, truncated_percent,
};

const UNKNOWN_DISCIPLINE: &str = "—";

#[derive(Debug, Serialize)]
pub struct DisciplineRow {
    pub discipline_id: RecordId,
    pub name: String,
    pub score: i64,
    pub total_classes: i64,
    pub attended_classes: i64,
    pub percent: i64,
    pub grade: u8,
    pub grade_class: String,
}

#[derive(Debug, Serialize)]
pub struct StatEntry {
    pub discipline_name: String,
    pub score: i64,
    pub percent: i64,
}

#[derive(Debug, Serialize)]
pub struct StudentStatistics {
    pub best_score: StatEntry,
    pub worst_score: StatEntry,
    pub best_attendance: StatEntry,
    pub worst_attendance: StatEntry,
}

/// Everything the student page shows, fully resolved.
#[derive(Debug, Serialize)]
pub struct StudentView {
    pub student: Student,
    pub group_name: String,
    pub rows: Vec<DisciplineRow>,
    pub statistics: Option<StudentStatistics>,
}

impl StudentView {
    /// Rows follow the group's discipline order; a discipline without a data
    /// row shows zeros. Statistics run over `data` in fetch order.
    pub fn build(
        student: Student,
        group: &Group,
        disciplines: &[Discipline],
        data: &[StudentDisciplineData],
    ) -> Self {
        let by_discipline: HashMap<RecordId, Marks> =
            data.iter().map(|d| (d.discipline_id, d.marks())).collect();

        let rows = disciplines
            .iter()
            .map(|discipline| {
                let marks = by_discipline
                    .get(&discipline.id)
                    .copied()
                    .unwrap_or(Marks::ZERO);
                DisciplineRow {
                    discipline_id: discipline.id,
                    name: discipline.name.clone(),
                    score: marks.score,
                    total_classes: marks.total_classes,
                    attended_classes: marks.attended_classes,
                    percent: rounded_percent(marks.attended_classes, marks.total_classes),
                    grade: score_to_grade(marks.score),
                    grade_class: grade_class(marks.score),
                }
            })
            .collect();

        let name_of = |id: RecordId| {
            disciplines
                .iter()
                .find(|d| d.id == id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| UNKNOWN_DISCIPLINE.to_string())
        };
        let entry = |row: &StudentDisciplineData| StatEntry {
            discipline_name: name_of(row.discipline_id),
            score: row.score,
            percent: truncated_percent(row.attended_classes, row.total_classes),
        };

        let statistics = select_best_worst(data).map(|selection| StudentStatistics {
            best_score: entry(selection.best_score),
            worst_score: entry(selection.worst_score),
            best_attendance: entry(selection.best_attendance),
            worst_attendance: entry(selection.worst_attendance),
        });

        Self {
            student,
            group_name: group.name.clone(),
            rows,
            statistics,
        }
    }
}

#[instrument(skip(store))]
pub async fn load_student_view(store: &Store, id: RecordId) -> Result<StudentView, AppError> {
    let student = store.student_by_id(id).await?;
    let group = store.group_by_id(student.group_id).await?;
    let disciplines = store.disciplines_by_group(group.id).await?;
    let data = store.discipline_data_for_student(student.id).await?;

    Ok(StudentView::build(student, &group, &disciplines, &data))
}
