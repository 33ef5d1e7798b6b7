use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub gender: String,
    pub birthdate: String,
    pub health_goals: Vec<String>,
    pub medical_conditions: Vec<String>,
    pub nutrition_preference: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

#[derive(Debug, Clone)]
pub struct Onboarding {
    pub gender: String,
    pub birthdate: String,
    pub health_goals: Vec<String>,
    pub medical_conditions: Vec<String>,
    pub nutrition_preference: String,
}
