use rocket::{Request, State};
use rocket_dyn_templates::{Template, context};

use crate::db::Store;
use crate::error::AppError;
use crate::models::RecordId;
use crate::view::load_student_view;

const TITLE: &str = "Электронный дневник";

#[get("/")]
pub async fn index(store: &State<Store>) -> Result<Template, AppError> {
    let groups = store.all_groups().await?;

    Ok(Template::render(
        "index",
        context! {
            title: TITLE,
            groups: groups,
        },
    ))
}

#[get("/group/<name>")]
pub async fn group_page(name: &str, store: &State<Store>) -> Result<Template, AppError> {
    let group_id = store.group_id_by_name(name).await?;
    let students = store.students_by_group(group_id).await?;

    Ok(Template::render(
        "group",
        context! {
            title: format!("Группа {}", name),
            group_name: name,
            students: students,
        },
    ))
}

#[get("/student/<id>")]
pub async fn student_page(
    id: Result<RecordId, AppError>,
    store: &State<Store>,
) -> Result<Template, AppError> {
    let view = load_student_view(store, id?).await?;

    Ok(Template::render(
        "student",
        context! {
            title: view.student.name.clone(),
            view: view,
        },
    ))
}

#[catch(404)]
pub fn not_found(req: &Request<'_>) -> Template {
    Template::render(
        "error",
        context! {
            title: TITLE,
            code: 404,
            message: format!("Страница {} не найдена", req.uri().path()),
        },
    )
}

#[catch(500)]
pub fn internal_error() -> Template {
    Template::render(
        "error",
        context! {
            title: TITLE,
            code: 500,
            message: "Ошибка базы данных",
        },
    )
}
