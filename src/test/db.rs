#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::models::{Marks, NewDiscipline, NewStudent, RecordId};
    use crate::test::test_utils::{
        TestDbBuilder, all_disciplines, all_students, count_discipline_data, count_groups,
        create_standard_test_db, empty_store,
    };

    #[rocket::async_test]
    async fn test_group_lookup_by_name() {
        let test_db = create_standard_test_db().await;

        let group = test_db
            .store
            .group_by_name("Frontend")
            .await
            .expect("Failed to get group");
        assert_eq!(group.name, "Frontend");
        assert_eq!(
            test_db.store.group_id_by_name("Frontend").await.unwrap(),
            group.id
        );

        let missing = test_db.store.group_id_by_name("Design").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn test_students_and_disciplines_by_group_keep_insertion_order() {
        let test_db = create_standard_test_db().await;
        let backend = test_db.group_id("Backend").await;

        let students = test_db
            .store
            .students_by_group(backend)
            .await
            .expect("Failed to get students");
        let names: Vec<&str> = students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Магомед Магомедов", "Хамхоев Иса", "Мархиев Ислам"]
        );
        assert!(students.iter().all(|s| s.group_id == backend));
        assert!(students.iter().all(|s| s.comments.is_empty()));

        let disciplines = test_db
            .store
            .disciplines_by_group(backend)
            .await
            .expect("Failed to get disciplines");
        assert_eq!(disciplines.len(), 5);
        assert_eq!(disciplines[0].name, "GO");
        assert_eq!(disciplines[4].name, "Английский язык");
    }

    #[rocket::async_test]
    async fn test_student_by_id_distinguishes_missing_records() {
        let test_db = create_standard_test_db().await;
        let student = test_db.student("Татиев Илез").await;

        let found = test_db
            .store
            .student_by_id(student.id)
            .await
            .expect("Failed to get student");
        assert_eq!(found, student);

        let missing = test_db.store.student_by_id(RecordId::new()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn test_set_student_comments() {
        let test_db = create_standard_test_db().await;
        let student = test_db.student("Хамхоев Иса").await;

        test_db
            .store
            .set_student_comments(student.id, "<b>Хорошо</b> работает")
            .await
            .expect("Failed to update comments");

        let updated = test_db.store.student_by_id(student.id).await.unwrap();
        assert_eq!(updated.comments, "<b>Хорошо</b> работает");

        let missing = test_db
            .store
            .set_student_comments(RecordId::new(), "nobody")
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn test_upsert_creates_then_updates_in_place() {
        let store = empty_store().await.expect("Failed to create store");
        let mut tx = store.begin().await.unwrap();
        let group_id = tx.insert_group("Backend").await.unwrap();
        let student_id = tx
            .insert_students(&[NewStudent {
                name: "Мархиев Ислам".to_string(),
                group_id,
            }])
            .await
            .unwrap()[0];
        let discipline_id = tx
            .insert_disciplines(&[NewDiscipline {
                name: "GO".to_string(),
                group_id,
            }])
            .await
            .unwrap()[0];
        tx.commit().await.unwrap();

        assert!(
            store
                .discipline_data_row(student_id, discipline_id)
                .await
                .unwrap()
                .is_none()
        );

        let first = Marks {
            score: 55,
            total_classes: 10,
            attended_classes: 8,
        };
        let created_id = store
            .upsert_discipline_score(student_id, discipline_id, first)
            .await
            .expect("Failed to insert discipline score");
        assert_eq!(count_discipline_data(&store).await, 1);

        let second = Marks {
            score: 81,
            total_classes: 12,
            attended_classes: 12,
        };
        let updated_id = store
            .upsert_discipline_score(student_id, discipline_id, second)
            .await
            .expect("Failed to update discipline score");

        assert_eq!(updated_id, created_id);
        assert_eq!(count_discipline_data(&store).await, 1);

        let row = store
            .discipline_data_row(student_id, discipline_id)
            .await
            .unwrap()
            .expect("Row should exist");
        assert_eq!(row.id, created_id);
        assert_eq!(row.marks(), second);
    }

    #[rocket::async_test]
    async fn test_upsert_for_unknown_discipline_fails() {
        let test_db = create_standard_test_db().await;
        let student = test_db.student("Цечоев Абдула").await;

        let result = test_db
            .store
            .upsert_discipline_score(student.id, RecordId::new(), Marks::ZERO)
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[rocket::async_test]
    async fn test_drop_all_removes_everything() {
        let test_db = TestDbBuilder::new()
            .group("Backend", &["Один"], &["GO"])
            .build()
            .await
            .expect("Failed to build test database");

        test_db.store.drop_all().await.expect("Failed to drop data");

        assert_eq!(count_groups(&test_db.store).await, 0);
        assert!(all_students(&test_db.store).await.is_empty());
        assert!(all_disciplines(&test_db.store).await.is_empty());
        assert_eq!(count_discipline_data(&test_db.store).await, 0);
    }
}
