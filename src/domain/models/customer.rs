use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    /// Messaging identifier (e.g. the LINE user id); unique.
    pub external_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub last_booking_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct CustomerUpsert {
    pub external_id: String,
    pub name: String,
    pub phone: Option<String>,
}

impl Customer {
    pub fn from_upsert(params: &CustomerUpsert) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            external_id: params.external_id.clone(),
            name: params.name.clone(),
            phone: params.phone.clone(),
            email: None,
            last_booking_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }
}
