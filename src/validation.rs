use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::Marks;

/// One submitted discipline line of the student edit form.
#[derive(Debug, Clone, Copy, Validate)]
#[validate(schema(function = "validate_attendance"))]
pub struct ScoreEntry {
    #[validate(range(min = 0, max = 100, message = "Score must be between 0 and 100"))]
    pub score: i64,
    #[validate(range(min = 0, message = "Total classes cannot be negative"))]
    pub total_classes: i64,
    #[validate(range(min = 0, message = "Attended classes cannot be negative"))]
    pub attended_classes: i64,
}

fn validate_attendance(entry: &ScoreEntry) -> Result<(), ValidationError> {
    if entry.attended_classes > entry.total_classes {
        let mut error = ValidationError::new("attendance_exceeds_total");
        error.message = Some("Attended classes cannot exceed total classes".into());
        return Err(error);
    }
    Ok(())
}

impl ScoreEntry {
    pub fn into_marks(self) -> Result<Marks, ValidationErrors> {
        self.validate()?;
        Ok(Marks {
            score: self.score,
            total_classes: self.total_classes,
            attended_classes: self.attended_classes,
        })
    }
}
