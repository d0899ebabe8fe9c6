use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub name: String,
    pub color_bg: String,
    pub color_text: String,
    pub default_duration_min: i32,
    pub default_instructor_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Program {
    pub fn new(name: String, color_bg: String, color_text: String, default_duration_min: i32, default_instructor_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            color_bg,
            color_text,
            default_duration_min,
            default_instructor_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    pub id: String,
    pub name: String,
    pub specialties: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl Instructor {
    pub fn new(name: String, specialties: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            specialties: Json(specialties),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Studio {
    pub id: String,
    pub name: String,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

impl Studio {
    pub fn new(name: String, capacity: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            capacity,
            created_at: Utc::now(),
        }
    }
}
