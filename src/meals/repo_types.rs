use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Catalog meal. `category` is matched against plan slots by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub calories: i32,
    pub prep_time: i32, // minutes
    pub category: String,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMeal {
    pub name: String,
    pub image: Option<String>,
    pub calories: i32,
    pub prep_time: i32,
    pub category: String,
    pub tags: Vec<String>,
}
