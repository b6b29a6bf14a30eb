#[cfg(test)]
pub mod test_db {
    use std::str::FromStr;
    use std::sync::Once;

    use rocket::local::asynchronous::Client;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    use crate::db::Store;
    use crate::error::AppError;
    use crate::init_rocket;
    use crate::models::{Discipline, Group, RecordId, Student};
    use crate::seed::{SeedRoster, seed_if_empty};

    static INIT: Once = Once::new();

    fn init_logging() {
        INIT.call_once(|| {
            let _ = env_logger::builder()
                .parse_filters("debug")
                .is_test(true)
                .try_init();
        });
    }

    /// A migrated, empty in-memory store. The pool is pinned to a single
    /// connection that never expires, since every `:memory:` connection is a
    /// separate database.
    pub async fn empty_store() -> Result<Store, AppError> {
        init_logging();

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Store::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        roster: SeedRoster,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn standard() -> Self {
            Self {
                roster: SeedRoster::standard(),
            }
        }

        pub fn group(mut self, name: &str, students: &[&str], disciplines: &[&str]) -> Self {
            self.roster = self.roster.group(name, students, disciplines);
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            let store = empty_store().await?;
            seed_if_empty(&store, &self.roster).await?;
            Ok(TestDb { store })
        }
    }

    pub struct TestDb {
        pub store: Store,
    }

    impl TestDb {
        pub async fn group_id(&self, name: &str) -> RecordId {
            self.store
                .group_id_by_name(name)
                .await
                .expect("Group not found")
        }

        pub async fn student(&self, name: &str) -> Student {
            all_students(&self.store)
                .await
                .into_iter()
                .find(|s| s.name == name)
                .expect("Student not found")
        }

        pub async fn discipline(&self, group: &str, name: &str) -> Discipline {
            let group_id = self.group_id(group).await;
            self.store
                .disciplines_by_group(group_id)
                .await
                .expect("Failed to list disciplines")
                .into_iter()
                .find(|d| d.name == name)
                .expect("Discipline not found")
        }
    }

    async fn groups(store: &Store) -> Vec<Group> {
        store.all_groups().await.expect("Failed to list groups")
    }

    pub async fn count_groups(store: &Store) -> usize {
        groups(store).await.len()
    }

    /// Every student, group by group in insertion order.
    pub async fn all_students(store: &Store) -> Vec<Student> {
        let mut students = Vec::new();
        for group in groups(store).await {
            students.extend(
                store
                    .students_by_group(group.id)
                    .await
                    .expect("Failed to list students"),
            );
        }
        students
    }

    /// Every discipline, group by group in insertion order.
    pub async fn all_disciplines(store: &Store) -> Vec<Discipline> {
        let mut disciplines = Vec::new();
        for group in groups(store).await {
            disciplines.extend(
                store
                    .disciplines_by_group(group.id)
                    .await
                    .expect("Failed to list disciplines"),
            );
        }
        disciplines
    }

    pub async fn count_discipline_data(store: &Store) -> usize {
        let mut count = 0;
        for student in all_students(store).await {
            count += store
                .discipline_data_for_student(student.id)
                .await
                .expect("Failed to list discipline data")
                .len();
        }
        count
    }

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::standard()
            .build()
            .await
            .expect("Failed to build standard test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let client = Client::tracked(init_rocket(test_db.store.clone()))
            .await
            .expect("Failed to build rocket client");
        (client, test_db)
    }
}
