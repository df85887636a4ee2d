pub mod repository;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::models::Course;

/// Data access for golf courses, one call per HTTP operation.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// `Ok(None)` when no row has this id.
    async fn get(&self, id: i64) -> Result<Option<Course>, AppError>;
    async fn list(&self) -> Result<Vec<Course>, AppError>;
    /// Returns the database-assigned row id.
    async fn insert(&self, course: &Course) -> Result<i64, AppError>;
    async fn update(&self, id: i64, course: Course) -> Result<Course, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

pub struct SqliteCourseStore {
    db: SqlitePool,
    query_timeout: Duration,
}

impl SqliteCourseStore {
    pub fn new(db: SqlitePool, query_timeout: Duration) -> Self {
        Self { db, query_timeout }
    }
}

#[async_trait]
impl CourseStore for SqliteCourseStore {
    async fn get(&self, id: i64) -> Result<Option<Course>, AppError> {
        repository::find_course_by_id(&self.db, self.query_timeout, id).await
    }

    async fn list(&self) -> Result<Vec<Course>, AppError> {
        repository::fetch_courses(&self.db, self.query_timeout).await
    }

    async fn insert(&self, course: &Course) -> Result<i64, AppError> {
        repository::insert_course(&self.db, self.query_timeout, course).await
    }

    async fn update(&self, id: i64, course: Course) -> Result<Course, AppError> {
        repository::update_course(&self.db, self.query_timeout, id, course).await
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        repository::delete_course(&self.db, self.query_timeout, id).await
    }
}

/// Opens the pool with the configured bounds and makes sure the table exists.
pub async fn connect(config: &Config) -> Result<SqlitePool, AppError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .max_lifetime(config.max_lifetime)
        .acquire_timeout(config.query_timeout)
        .connect(&config.database_url)
        .await?;

    repository::ensure_schema(&pool).await?;
    info!(
        "connected to {} (max_connections={}, max_lifetime={:?})",
        config.database_url, config.max_connections, config.max_lifetime
    );

    Ok(pool)
}
