use std::collections::HashMap;
use std::convert::Infallible;

use either::Either;
use rocket::FromForm;
use rocket::form::Form;
use rocket::request::{FromRequest, Outcome};
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::{Request, State};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::db::Store;
use crate::error::AppError;
use crate::models::RecordId;
use crate::seed::reset_dynamic;
use crate::validation::ScoreEntry;
use crate::view::{StudentView, load_student_view};

#[derive(Serialize, Deserialize, Debug)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Raw discipline inputs. Missing values and values that do not parse as
/// integers read as 0.
#[derive(FromForm, Debug, Default)]
pub struct MarksForm {
    score: Option<String>,
    total: Option<String>,
    attended: Option<String>,
}

fn int_or_zero(value: Option<&str>) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

impl From<&MarksForm> for ScoreEntry {
    fn from(form: &MarksForm) -> Self {
        Self {
            score: int_or_zero(form.score.as_deref()),
            total_classes: int_or_zero(form.total.as_deref()),
            attended_classes: int_or_zero(form.attended.as_deref()),
        }
    }
}

/// Fields are `comments` and `disciplines[<discipline id>].score|total|attended`.
#[derive(FromForm, Debug)]
pub struct StudentEditForm {
    comments: Option<String>,
    disciplines: HashMap<String, MarksForm>,
}

/// Counts of discipline entries written and skipped by one edit.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EditReport {
    pub applied: usize,
    pub failed: usize,
}

/// Upserts each entry independently. A bad entry is logged and skipped; it
/// never aborts the others and nothing already written is rolled back.
pub async fn apply_discipline_entries(
    store: &Store,
    student_id: RecordId,
    entries: &HashMap<String, MarksForm>,
) -> EditReport {
    let mut report = EditReport::default();

    for (key, form) in entries {
        let discipline_id = match key.parse::<RecordId>() {
            Ok(id) => id,
            Err(e) => {
                warn!(discipline = %key, error = %e, "Skipping entry with malformed discipline id");
                report.failed += 1;
                continue;
            }
        };

        let marks = match ScoreEntry::from(form).into_marks() {
            Ok(marks) => marks,
            Err(e) => {
                warn!(%discipline_id, error = %e, "Skipping entry outside numeric bounds");
                report.failed += 1;
                continue;
            }
        };

        match store
            .upsert_discipline_score(student_id, discipline_id, marks)
            .await
        {
            Ok(_) => report.applied += 1,
            Err(e) => {
                error!(%student_id, %discipline_id, error = %e, "Failed to save discipline entry");
                report.failed += 1;
            }
        }
    }

    report
}

#[post("/student/<id>", data = "<form>")]
pub async fn api_update_student(
    id: Result<RecordId, AppError>,
    form: Form<StudentEditForm>,
    store: &State<Store>,
) -> Result<Redirect, AppError> {
    let student = store.student_by_id(id?).await?;

    store
        .set_student_comments(student.id, form.comments.as_deref().unwrap_or_default())
        .await?;

    let report = apply_discipline_entries(store, student.id, &form.disciplines).await;
    info!(
        applied = report.applied,
        failed = report.failed,
        "Student edit processed"
    );

    Ok(Redirect::to(format!("/student/{}", student.id)))
}

#[get("/student/<id>")]
pub async fn api_get_student(
    id: Result<RecordId, AppError>,
    store: &State<Store>,
) -> Result<Json<StudentView>, AppError> {
    let view = load_student_view(store, id?).await?;
    Ok(Json(view))
}

/// Whether the client's preferred response type is JSON.
pub struct PrefersJson(pub bool);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for PrefersJson {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let prefers_json = request
            .accept()
            .is_some_and(|accept| accept.preferred().media_type().is_json());
        Outcome::Success(PrefersJson(prefers_json))
    }
}

#[post("/reset-dynamic")]
pub async fn api_reset_dynamic(
    prefers_json: PrefersJson,
    store: &State<Store>,
) -> Result<Either<Json<StatusResponse>, Redirect>, AppError> {
    reset_dynamic(store).await?;

    if prefers_json.0 {
        Ok(Either::Left(Json(StatusResponse::ok())))
    } else {
        Ok(Either::Right(Redirect::to("/")))
    }
}

#[get("/health")]
pub fn health() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}
