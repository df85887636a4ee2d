use std::future::Future;
use std::time::Duration;

use sqlx::{FromRow, SqlitePool};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::Course;

/// Runs a statement under a deadline. An expired deadline drops the future,
/// which returns the connection to the pool.
pub async fn with_timeout<T, F>(limit: Duration, query: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, query).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::Timeout(limit)),
    }
}

/// `courseid` is declared `INT`, not `INTEGER`, so SQLite keeps a separate
/// rowid for each row.
pub async fn ensure_schema(db: &SqlitePool) -> Result<(), AppError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS golfcourse (
            courseid INT PRIMARY KEY,
            golfcoursename TEXT,
            price REAL,
            totalhole TEXT
        )
        "#,
    )
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_course_by_id(
    db: &SqlitePool,
    limit: Duration,
    id: i64,
) -> Result<Option<Course>, AppError> {
    with_timeout(
        limit,
        sqlx::query_as::<_, Course>(
            "SELECT courseid, golfcoursename, price, totalhole FROM golfcourse WHERE courseid = ?",
        )
        .bind(id)
        .fetch_optional(db),
    )
    .await
}

/// Rows that fail to decode are logged and left out of the result.
pub async fn fetch_courses(db: &SqlitePool, limit: Duration) -> Result<Vec<Course>, AppError> {
    let rows = with_timeout(
        limit,
        sqlx::query(
            "SELECT courseid, golfcoursename, price, totalhole FROM golfcourse ORDER BY courseid",
        )
        .fetch_all(db),
    )
    .await?;

    let mut courses = Vec::with_capacity(rows.len());
    for row in &rows {
        match Course::from_row(row) {
            Ok(course) => courses.push(course),
            Err(e) => warn!("skipping golfcourse row: {}", e),
        }
    }
    if courses.len() < rows.len() {
        warn!("returned {} of {} golfcourse rows", courses.len(), rows.len());
    }
    Ok(courses)
}

/// Inserts the course with its client-chosen id and returns the rowid SQLite
/// assigned, which is not the course id.
pub async fn insert_course(
    db: &SqlitePool,
    limit: Duration,
    course: &Course,
) -> Result<i64, AppError> {
    let result = with_timeout(
        limit,
        sqlx::query(
            r#"
            INSERT INTO golfcourse (courseid, golfcoursename, price, totalhole)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(course.id)
        .bind(&course.name)
        .bind(course.price)
        .bind(&course.total_hole)
        .execute(db),
    )
    .await?;

    Ok(result.last_insert_rowid())
}

/// Replaces name, price and hole count. The submitted course is returned as
/// is, whether or not a row matched `id`.
pub async fn update_course(
    db: &SqlitePool,
    limit: Duration,
    id: i64,
    course: Course,
) -> Result<Course, AppError> {
    let affected = with_timeout(
        limit,
        sqlx::query(
            r#"
            UPDATE golfcourse
            SET golfcoursename = ?1,
                price = ?2,
                totalhole = ?3
            WHERE courseid = ?4
            "#,
        )
        .bind(&course.name)
        .bind(course.price)
        .bind(&course.total_hole)
        .bind(id)
        .execute(db),
    )
    .await?
    .rows_affected();

    if affected == 0 {
        debug!("update matched no golfcourse row for id {}", id);
    }
    Ok(course)
}

pub async fn delete_course(db: &SqlitePool, limit: Duration, id: i64) -> Result<(), AppError> {
    let affected = with_timeout(
        limit,
        sqlx::query("DELETE FROM golfcourse WHERE courseid = ?")
            .bind(id)
            .execute(db),
    )
    .await?
    .rows_affected();

    if affected == 0 {
        debug!("delete matched no golfcourse row for id {}", id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    const LIMIT: Duration = Duration::from_secs(3);

    async fn setup_test_db() -> SqlitePool {
        // One connection, otherwise each pooled connection gets its own
        // in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        ensure_schema(&pool)
            .await
            .expect("Failed to create schema");

        pool
    }

    fn pebble() -> Course {
        Course {
            id: 5,
            name: "Pebble".to_string(),
            price: 199.99,
            total_hole: "18".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_course() {
        let pool = setup_test_db().await;

        let rowid = insert_course(&pool, LIMIT, &pebble())
            .await
            .expect("Failed to insert course");
        // First row in the table, regardless of the client id.
        assert_eq!(rowid, 1);

        let found = find_course_by_id(&pool, LIMIT, 5)
            .await
            .expect("Failed to fetch course")
            .expect("Course not found");
        assert_eq!(found, pebble());
    }

    #[tokio::test]
    async fn test_insert_returns_rowid_not_course_id() {
        let pool = setup_test_db().await;

        let mut course = pebble();
        course.id = 42;
        insert_course(&pool, LIMIT, &course).await.unwrap();
        course.id = 7;
        let rowid = insert_course(&pool, LIMIT, &course).await.unwrap();

        assert_eq!(rowid, 2);
        assert_ne!(rowid, course.id);
    }

    #[tokio::test]
    async fn test_insert_duplicate_id_fails() {
        let pool = setup_test_db().await;

        insert_course(&pool, LIMIT, &pebble()).await.unwrap();
        let err = insert_course(&pool, LIMIT, &pebble()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_find_missing_course_is_none() {
        let pool = setup_test_db().await;

        let found = find_course_by_id(&pool, LIMIT, 99).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_fetch_courses_ordered_by_id() {
        let pool = setup_test_db().await;

        for id in [3, 1, 2] {
            let mut course = pebble();
            course.id = id;
            course.name = format!("Course {}", id);
            insert_course(&pool, LIMIT, &course).await.unwrap();
        }

        let courses = fetch_courses(&pool, LIMIT).await.unwrap();
        let ids: Vec<i64> = courses.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(courses[0].name, "Course 1");
    }

    #[tokio::test]
    async fn test_fetch_courses_skips_undecodable_rows() {
        let pool = setup_test_db().await;

        insert_course(&pool, LIMIT, &pebble()).await.unwrap();
        // 'n/a' is not numeric, so the REAL column keeps it as TEXT.
        sqlx::query(
            "INSERT INTO golfcourse (courseid, golfcoursename, price, totalhole) VALUES (6, 'Broken', 'n/a', '9')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let courses = fetch_courses(&pool, LIMIT).await.unwrap();
        assert_eq!(courses, vec![pebble()]);
    }

    #[tokio::test]
    async fn test_update_course() {
        let pool = setup_test_db().await;
        insert_course(&pool, LIMIT, &pebble()).await.unwrap();

        let replacement = Course {
            id: 5,
            name: "Pebble Beach".to_string(),
            price: 250.0,
            total_hole: "27".to_string(),
        };
        let updated = update_course(&pool, LIMIT, 5, replacement.clone())
            .await
            .expect("Failed to update course");
        assert_eq!(updated, replacement);

        let found = find_course_by_id(&pool, LIMIT, 5).await.unwrap().unwrap();
        assert_eq!(found, replacement);
    }

    #[tokio::test]
    async fn test_update_missing_course_echoes_input() {
        let pool = setup_test_db().await;

        let updated = update_course(&pool, LIMIT, 77, pebble()).await.unwrap();
        assert_eq!(updated, pebble());
        assert!(find_course_by_id(&pool, LIMIT, 77).await.unwrap().is_none());
        assert!(fetch_courses(&pool, LIMIT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_uses_path_id() {
        let pool = setup_test_db().await;
        insert_course(&pool, LIMIT, &pebble()).await.unwrap();

        // The body id is ignored by the statement; only the path id is used.
        let mut body = pebble();
        body.id = 900;
        body.name = "Renamed".to_string();
        update_course(&pool, LIMIT, 5, body).await.unwrap();

        let found = find_course_by_id(&pool, LIMIT, 5).await.unwrap().unwrap();
        assert_eq!(found.name, "Renamed");
        assert!(find_course_by_id(&pool, LIMIT, 900).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_course() {
        let pool = setup_test_db().await;
        insert_course(&pool, LIMIT, &pebble()).await.unwrap();

        delete_course(&pool, LIMIT, 5).await.expect("Failed to delete course");
        assert!(find_course_by_id(&pool, LIMIT, 5).await.unwrap().is_none());

        // Deleting again is not an error.
        delete_course(&pool, LIMIT, 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            std::future::pending::<Result<(), sqlx::Error>>(),
        )
        .await;
        assert!(matches!(result, Err(AppError::Timeout(d)) if d == Duration::from_millis(10)));
    }
}
