use std::fmt;
use std::str::FromStr;

use rocket::request::FromParam;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Opaque record identifier assigned when a record is created.
///
/// Stored as a UUID blob and rendered as the hyphenated string form in URLs
/// and form field names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RecordId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| AppError::Validation(format!("Malformed identifier '{}'", s)))
    }
}

impl<'a> FromParam<'a> for RecordId {
    type Error = AppError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: RecordId,
    pub name: String,
    pub group_id: RecordId,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Discipline {
    pub id: RecordId,
    pub name: String,
    pub group_id: RecordId,
}

/// Score and attendance for one (student, discipline) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentDisciplineData {
    pub id: RecordId,
    pub student_id: RecordId,
    pub discipline_id: RecordId,
    pub score: i64,
    pub total_classes: i64,
    pub attended_classes: i64,
}

impl StudentDisciplineData {
    pub fn marks(&self) -> Marks {
        Marks {
            score: self.score,
            total_classes: self.total_classes,
            attended_classes: self.attended_classes,
        }
    }
}

/// The three mutable numeric fields of a [`StudentDisciplineData`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Marks {
    pub score: i64,
    pub total_classes: i64,
    pub attended_classes: i64,
}

impl Marks {
    pub const ZERO: Marks = Marks {
        score: 0,
        total_classes: 0,
        attended_classes: 0,
    };
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub group_id: RecordId,
}

#[derive(Debug, Clone)]
pub struct NewDiscipline {
    pub name: String,
    pub group_id: RecordId,
}

#[derive(Debug, Clone)]
pub struct NewDisciplineData {
    pub student_id: RecordId,
    pub discipline_id: RecordId,
    pub marks: Marks,
}
