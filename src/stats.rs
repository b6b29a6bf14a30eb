//! Grading and attendance statistics over already fetched rows.

use crate::models::StudentDisciplineData;

/// `attended / total * 100`, or 0 when no classes were held.
pub fn attendance_percent(attended: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    attended as f64 / total as f64 * 100.0
}

/// Whole percent, rounded half away from zero (12.5 gives 13, not the
/// half-to-even 12 of `%.0f` formatting). Used in the discipline table,
/// matching the `Math.round` recomputation done by the page script.
pub fn rounded_percent(attended: i64, total: i64) -> i64 {
    attendance_percent(attended, total).round() as i64
}

/// Whole percent with the fraction dropped. Used in the statistics block.
pub fn truncated_percent(attended: i64, total: i64) -> i64 {
    attendance_percent(attended, total).trunc() as i64
}

/// Maps a 0-100 score to a 1-5 grade. Each band includes its lower bound.
pub fn score_to_grade(score: i64) -> u8 {
    match score {
        s if s >= 80 => 5,
        s if s >= 60 => 4,
        s if s >= 40 => 3,
        s if s >= 20 => 2,
        _ => 1,
    }
}

pub fn grade_class(score: i64) -> String {
    format!("grade-{}", score_to_grade(score))
}

/// Rows holding the extreme score and attendance values of one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestWorst<'a> {
    pub best_score: &'a StudentDisciplineData,
    pub worst_score: &'a StudentDisciplineData,
    pub best_attendance: &'a StudentDisciplineData,
    pub worst_attendance: &'a StudentDisciplineData,
}

/// Selects the best and worst rows by score and by attendance percentage.
///
/// Comparisons are strict, so on ties the earliest row in `rows` wins for
/// both the maximum and the minimum. Returns `None` for an empty slice.
pub fn select_best_worst(rows: &[StudentDisciplineData]) -> Option<BestWorst<'_>> {
    let first = rows.first()?;
    let mut selection = BestWorst {
        best_score: first,
        worst_score: first,
        best_attendance: first,
        worst_attendance: first,
    };

    for row in &rows[1..] {
        if row.score > selection.best_score.score {
            selection.best_score = row;
        }
        if row.score < selection.worst_score.score {
            selection.worst_score = row;
        }

        let attendance = attendance_of(row);
        if attendance > attendance_of(selection.best_attendance) {
            selection.best_attendance = row;
        }
        if attendance < attendance_of(selection.worst_attendance) {
            selection.worst_attendance = row;
        }
    }

    Some(selection)
}

fn attendance_of(row: &StudentDisciplineData) -> f64 {
    attendance_percent(row.attended_classes, row.total_classes)
}
