use std::sync::Arc;

use crate::db::CourseStore;

#[derive(Clone)]
pub struct AppState {
    pub courses: Arc<dyn CourseStore>,
}

impl AppState {
    pub fn new(courses: Arc<dyn CourseStore>) -> Self {
        Self { courses }
    }
}
