use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// A golf course row.
///
/// The JSON keys and the `golfcourse` column names differ, so both sides are
/// renamed explicitly. Absent or `null` fields decode to their zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Course {
    #[serde(deserialize_with = "null_as_default")]
    #[sqlx(rename = "courseid")]
    pub id: i64,
    #[serde(rename = "coursename", deserialize_with = "null_as_default")]
    #[sqlx(rename = "golfcoursename")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub price: f64,
    // Stored as text, e.g. "18" or "9+9".
    #[serde(rename = "totalhole", deserialize_with = "null_as_default")]
    #[sqlx(rename = "totalhole")]
    pub total_hole: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of a successful `POST /api/golfcourses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedCourse {
    pub courseid: i64,
}
