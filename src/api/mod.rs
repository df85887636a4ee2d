pub mod cors;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::Uri;
use axum::routing::get;
use axum::{Json, Router, http::StatusCode, middleware};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{Course, CreatedCourse};
use crate::state::AppState;

pub const BASE_PATH: &str = "/api";
pub const COURSE_PATH: &str = "golfcourses";

pub fn router(state: AppState) -> Router {
    let collection = format!("{}/{}", BASE_PATH, COURSE_PATH);
    let item_root = format!("{}/", collection);
    let item_rest = format!("{}/{{*rest}}", collection);

    // Everything under the collection path is an item request; the id is
    // whatever follows the prefix, so `/5/x` and an empty id reach the parser.
    let item = get(get_course)
        .put(update_course)
        .delete(delete_course)
        .options(preflight);

    Router::new()
        .route(
            &collection,
            get(list_courses).post(create_course).options(preflight),
        )
        .route(&item_root, item.clone())
        .route(&item_rest, item)
        .layer(middleware::from_fn(cors::cors_headers))
        .with_state(state)
}

/// Parses the id from an item path by stripping the collection prefix.
fn course_id_from_path(path: &str) -> Result<i64, AppError> {
    let prefix = format!("{}/{}/", BASE_PATH, COURSE_PATH);
    let raw = path
        .strip_prefix(&prefix)
        .ok_or_else(|| AppError::BadRequest(format!("not a course path: {}", path)))?;
    parse_course_id(raw)
}

fn parse_course_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|e| AppError::BadRequest(format!("invalid course id {:?}: {}", raw, e)))
}

/// Decodes a JSON body regardless of its content type.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("invalid request body: {}", e)))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.courses.list().await?;
    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedCourse>), AppError> {
    let course: Course = decode_body(&body)?;
    // A failed insert is reported as the client's fault, e.g. a duplicate id.
    let courseid = state
        .courses
        .insert(&course)
        .await
        .map_err(|e| AppError::BadRequest(format!("insert failed: {}", e)))?;

    info!("created golf course {} (rowid {})", course.id, courseid);
    Ok((StatusCode::CREATED, Json(CreatedCourse { courseid })))
}

async fn get_course(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<Course>, AppError> {
    let id = course_id_from_path(uri.path())?;
    let course = state.courses.get(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

async fn update_course(
    State(state): State<AppState>,
    uri: Uri,
    body: Bytes,
) -> Result<Json<Course>, AppError> {
    let id = course_id_from_path(uri.path())?;
    let course: Course = decode_body(&body)?;
    let updated = state.courses.update(id, course).await?;
    debug!("updated golf course {}", id);
    Ok(Json(updated))
}

async fn delete_course(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<StatusCode, AppError> {
    let id = course_id_from_path(uri.path())?;
    state.courses.delete(id).await?;
    debug!("deleted golf course {}", id);
    Ok(StatusCode::NO_CONTENT)
}
