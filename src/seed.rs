use tracing::{info, instrument};

use crate::db::Store;
use crate::error::AppError;
use crate::models::{Marks, NewDiscipline, NewDisciplineData, NewStudent};

/// Reference data written into an empty store.
#[derive(Debug, Clone, Default)]
pub struct SeedRoster {
    pub groups: Vec<SeedGroup>,
}

#[derive(Debug, Clone)]
pub struct SeedGroup {
    pub name: String,
    pub students: Vec<String>,
    pub disciplines: Vec<String>,
}

impl SeedRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, name: &str, students: &[&str], disciplines: &[&str]) -> Self {
        self.groups.push(SeedGroup {
            name: name.to_string(),
            students: students.iter().map(|s| s.to_string()).collect(),
            disciplines: disciplines.iter().map(|d| d.to_string()).collect(),
        });
        self
    }

    /// The Backend and Frontend cohorts this deployment ships with.
    pub fn standard() -> Self {
        Self::new()
            .group(
                "Backend",
                &["Магомед Магомедов", "Хамхоев Иса", "Мархиев Ислам"],
                &[
                    "GO",
                    "Node.js",
                    "Основы Linux",
                    "Алгоритмы и структуры данных",
                    "Английский язык",
                ],
            )
            .group(
                "Frontend",
                &[
                    "Костоева Залина",
                    "Цечоев Абдула",
                    "Татиев Илез",
                    "Татиев Хамзат",
                    "Чиниев Ильяс",
                    "Точиев Рамзан",
                ],
                &[
                    "Английский язык",
                    "JavaScript Framework",
                    "HTML5",
                    "CSS",
                    "Web-компоненты",
                ],
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Skipped,
    Seeded {
        groups: usize,
        students: usize,
        disciplines: usize,
        data_rows: usize,
    },
}

/// Populates the store unless a group already exists.
///
/// Data rows are created only for students and disciplines of the same group.
/// The check and every insert share one transaction, so a failed seed leaves
/// the store empty and the next call starts over.
#[instrument(skip_all)]
pub async fn seed_if_empty(store: &Store, roster: &SeedRoster) -> Result<SeedOutcome, AppError> {
    let mut tx = store.begin().await?;

    if tx.count_groups().await? > 0 {
        info!("Data already present, skipping seed");
        return Ok(SeedOutcome::Skipped);
    }

    info!("Seeding initial data");

    let mut new_students = Vec::new();
    let mut new_disciplines = Vec::new();

    for group in &roster.groups {
        let group_id = tx.insert_group(&group.name).await?;

        new_students.extend(group.students.iter().map(|name| NewStudent {
            name: name.clone(),
            group_id,
        }));
        new_disciplines.extend(group.disciplines.iter().map(|name| NewDiscipline {
            name: name.clone(),
            group_id,
        }));
    }

    let student_ids = tx.insert_students(&new_students).await?;
    let discipline_ids = tx.insert_disciplines(&new_disciplines).await?;

    let data_rows: Vec<NewDisciplineData> = new_students
        .iter()
        .zip(&student_ids)
        .flat_map(|(student, &student_id)| {
            new_disciplines
                .iter()
                .zip(&discipline_ids)
                .filter(move |(discipline, _)| discipline.group_id == student.group_id)
                .map(move |(_, &discipline_id)| NewDisciplineData {
                    student_id,
                    discipline_id,
                    marks: Marks::ZERO,
                })
        })
        .collect();

    tx.insert_discipline_data(&data_rows).await?;
    tx.commit().await?;

    let outcome = SeedOutcome::Seeded {
        groups: roster.groups.len(),
        students: student_ids.len(),
        disciplines: discipline_ids.len(),
        data_rows: data_rows.len(),
    };
    info!(?outcome, "Initial data created");

    Ok(outcome)
}

/// Removes every record; pair with [`seed_if_empty`] for a full reseed.
#[instrument(skip_all)]
pub async fn drop_all(store: &Store) -> Result<(), AppError> {
    store.drop_all().await?;
    info!("All data deleted");
    Ok(())
}

/// Zeroes comments and marks everywhere while keeping every record and id.
/// Both updates commit together or not at all.
#[instrument(skip_all)]
pub async fn reset_dynamic(store: &Store) -> Result<(), AppError> {
    let mut tx = store.begin().await?;
    let students = tx.reset_all_comments().await?;
    let rows = tx.reset_all_marks().await?;
    tx.commit().await?;
    info!(students, rows, "Dynamic data reset");
    Ok(())
}
