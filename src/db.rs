use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{
    Discipline, Group, Marks, NewDiscipline, NewDisciplineData, NewStudent, RecordId, Student,
    StudentDisciplineData,
};

/// Handle to the diary database. Created once at startup and shared through
/// Rocket managed state; cloning only clones the pool handle.
///
/// Every "by filter" lookup returns rows in insertion order.
#[derive(Debug, Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        info!(database_url = %config.database_url, "Connecting to database");
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Opens a transaction. Dropping the returned handle without
    /// [`StoreTx::commit`] rolls back everything written through it.
    pub async fn begin(&self) -> Result<StoreTx, AppError> {
        Ok(StoreTx {
            tx: self.pool.begin().await?,
        })
    }

    #[cfg(test)]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn all_groups(&self) -> Result<Vec<Group>, AppError> {
        let rows = sqlx::query_as::<_, Group>("SELECT id, name FROM study_groups ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn group_by_id(&self, id: RecordId) -> Result<Group, AppError> {
        let row = sqlx::query_as::<_, Group>("SELECT id, name FROM study_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(group) => Ok(group),
            _ => Err(AppError::NotFound(format!(
                "Group with id {} not found in database",
                id
            ))),
        }
    }

    /// Looks up the first group with the given name.
    #[instrument(skip(self))]
    pub async fn group_by_name(&self, name: &str) -> Result<Group, AppError> {
        info!("Fetching group by name");
        let row = sqlx::query_as::<_, Group>(
            "SELECT id, name FROM study_groups WHERE name = ? ORDER BY rowid LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(group) => Ok(group),
            _ => Err(AppError::NotFound(format!(
                "Group named {} not found in database",
                name
            ))),
        }
    }

    pub async fn group_id_by_name(&self, name: &str) -> Result<RecordId, AppError> {
        Ok(self.group_by_name(name).await?.id)
    }

    #[instrument(skip(self))]
    pub async fn students_by_group(&self, group_id: RecordId) -> Result<Vec<Student>, AppError> {
        info!("Getting students for group");
        let rows = sqlx::query_as::<_, Student>(
            "SELECT id, name, group_id, comments FROM students
             WHERE group_id = ?
             ORDER BY rowid",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn student_by_id(&self, id: RecordId) -> Result<Student, AppError> {
        info!("Fetching student by ID");
        let row = sqlx::query_as::<_, Student>(
            "SELECT id, name, group_id, comments FROM students WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(student) => Ok(student),
            _ => Err(AppError::NotFound(format!(
                "Student with id {} not found in database",
                id
            ))),
        }
    }

    #[instrument(skip(self))]
    pub async fn disciplines_by_group(
        &self,
        group_id: RecordId,
    ) -> Result<Vec<Discipline>, AppError> {
        info!("Getting disciplines for group");
        let rows = sqlx::query_as::<_, Discipline>(
            "SELECT id, name, group_id FROM disciplines
             WHERE group_id = ?
             ORDER BY rowid",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn discipline_data_for_student(
        &self,
        student_id: RecordId,
    ) -> Result<Vec<StudentDisciplineData>, AppError> {
        info!("Getting discipline data for student");
        let rows = sqlx::query_as::<_, StudentDisciplineData>(
            "SELECT id, student_id, discipline_id, score, total_classes, attended_classes
             FROM student_discipline_data
             WHERE student_id = ?
             ORDER BY rowid",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn discipline_data_row(
        &self,
        student_id: RecordId,
        discipline_id: RecordId,
    ) -> Result<Option<StudentDisciplineData>, AppError> {
        let row = sqlx::query_as::<_, StudentDisciplineData>(
            "SELECT id, student_id, discipline_id, score, total_classes, attended_classes
             FROM student_discipline_data
             WHERE student_id = ? AND discipline_id = ?",
        )
        .bind(student_id)
        .bind(discipline_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Overwrites the student's comments. Content is stored as given.
    #[instrument(skip(self, comments))]
    pub async fn set_student_comments(
        &self,
        student_id: RecordId,
        comments: &str,
    ) -> Result<(), AppError> {
        info!("Updating student comments");
        let result = sqlx::query("UPDATE students SET comments = ? WHERE id = ?")
            .bind(comments)
            .bind(student_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Student with id {} not found in database",
                student_id
            )));
        }

        Ok(())
    }

    /// Writes the marks for a (student, discipline) pair, creating the row if
    /// it does not exist yet. The unique pair index makes this a single atomic
    /// statement, so concurrent edits of one pair cannot produce duplicates and
    /// the last write wins.
    #[instrument(skip(self))]
    pub async fn upsert_discipline_score(
        &self,
        student_id: RecordId,
        discipline_id: RecordId,
        marks: Marks,
    ) -> Result<RecordId, AppError> {
        info!("Upserting discipline score");
        let id = sqlx::query_scalar::<_, RecordId>(
            "INSERT INTO student_discipline_data
             (id, student_id, discipline_id, score, total_classes, attended_classes)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (student_id, discipline_id) DO UPDATE SET
                 score = excluded.score,
                 total_classes = excluded.total_classes,
                 attended_classes = excluded.attended_classes
             RETURNING id",
        )
        .bind(RecordId::new())
        .bind(student_id)
        .bind(discipline_id)
        .bind(marks.score)
        .bind(marks.total_classes)
        .bind(marks.attended_classes)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Deletes every record of every type. Child tables go first so foreign
    /// keys hold throughout.
    #[instrument(skip(self))]
    pub async fn drop_all(&self) -> Result<(), AppError> {
        info!("Deleting all records");
        let mut tx = self.pool.begin().await?;

        for table in [
            "student_discipline_data",
            "students",
            "disciplines",
            "study_groups",
        ] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Writes that must land together: seeding and the bulk resets.
pub struct StoreTx {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTx {
    pub async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn count_groups(&mut self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM study_groups")
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn insert_group(&mut self, name: &str) -> Result<RecordId, AppError> {
        info!("Creating group");
        let id = RecordId::new();
        sqlx::query("INSERT INTO study_groups (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&mut *self.tx)
            .await?;
        Ok(id)
    }

    /// Returns the new ids in the order of `students`.
    #[instrument(skip_all, fields(count = students.len()))]
    pub async fn insert_students(
        &mut self,
        students: &[NewStudent],
    ) -> Result<Vec<RecordId>, AppError> {
        info!("Creating students");
        let mut ids = Vec::with_capacity(students.len());

        for student in students {
            let id = RecordId::new();
            sqlx::query("INSERT INTO students (id, name, group_id, comments) VALUES (?, ?, ?, '')")
                .bind(id)
                .bind(&student.name)
                .bind(student.group_id)
                .execute(&mut *self.tx)
                .await?;
            ids.push(id);
        }

        Ok(ids)
    }

    /// Returns the new ids in the order of `disciplines`.
    #[instrument(skip_all, fields(count = disciplines.len()))]
    pub async fn insert_disciplines(
        &mut self,
        disciplines: &[NewDiscipline],
    ) -> Result<Vec<RecordId>, AppError> {
        info!("Creating disciplines");
        let mut ids = Vec::with_capacity(disciplines.len());

        for discipline in disciplines {
            let id = RecordId::new();
            sqlx::query("INSERT INTO disciplines (id, name, group_id) VALUES (?, ?, ?)")
                .bind(id)
                .bind(&discipline.name)
                .bind(discipline.group_id)
                .execute(&mut *self.tx)
                .await?;
            ids.push(id);
        }

        Ok(ids)
    }

    #[instrument(skip_all, fields(count = rows.len()))]
    pub async fn insert_discipline_data(
        &mut self,
        rows: &[NewDisciplineData],
    ) -> Result<Vec<RecordId>, AppError> {
        info!("Creating student discipline data");
        let mut ids = Vec::with_capacity(rows.len());

        for row in rows {
            let id = RecordId::new();
            sqlx::query(
                "INSERT INTO student_discipline_data
                 (id, student_id, discipline_id, score, total_classes, attended_classes)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(row.student_id)
            .bind(row.discipline_id)
            .bind(row.marks.score)
            .bind(row.marks.total_classes)
            .bind(row.marks.attended_classes)
            .execute(&mut *self.tx)
            .await?;
            ids.push(id);
        }

        Ok(ids)
    }

    #[instrument(skip(self))]
    pub async fn reset_all_comments(&mut self) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE students SET comments = ''")
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    pub async fn reset_all_marks(&mut self) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE student_discipline_data
             SET score = 0, total_classes = 0, attended_classes = 0",
        )
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }
}
