use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, Onboarding, User};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, is_active, \
    gender, birthdate, health_goals, medical_conditions, nutrition_preference, created_at, updated_at";

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    /// Create a new, not yet verified user.
    pub async fn create<'e, E>(db: E, new: NewUser<'_>) -> anyhow::Result<User>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.first_name)
        .bind(new.last_name)
        .fetch_one(db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    /// Returns false when the user does not exist.
    pub async fn complete_onboarding(
        db: &PgPool,
        id: Uuid,
        onboarding: &Onboarding,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET gender = $2, birthdate = $3, health_goals = $4, medical_conditions = $5,
                   nutrition_preference = $6, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&onboarding.gender)
        .bind(&onboarding.birthdate)
        .bind(&onboarding.health_goals)
        .bind(&onboarding.medical_conditions)
        .bind(&onboarding.nutrition_preference)
        .execute(db)
        .await
        .context("update onboarding")?;
        Ok(result.rows_affected() == 1)
    }
}

// ---- Email verification ----

pub async fn insert_verification_token<'e, E>(
    db: E,
    user_id: Uuid,
    token: &str,
    expires_at: OffsetDateTime,
) -> anyhow::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("INSERT INTO email_verifications (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(db)
        .await
        .context("insert verification token")?;
    Ok(())
}

/// Activates the owner of an unexpired token and consumes the token.
/// Returns the activated user id, or `None` for unknown or expired tokens.
pub async fn consume_verification_token(db: &PgPool, token: &str) -> anyhow::Result<Option<Uuid>> {
    let mut tx = db.begin().await.context("begin tx")?;

    let user_id: Option<(Uuid,)> = sqlx::query_as(
        "DELETE FROM email_verifications WHERE token = $1 AND expires_at > now() RETURNING user_id",
    )
    .bind(token)
    .fetch_optional(&mut *tx)
    .await
    .context("consume verification token")?;

    let Some((user_id,)) = user_id else {
        return Ok(None);
    };

    sqlx::query("UPDATE users SET is_active = TRUE, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .context("activate user")?;

    tx.commit().await.context("commit tx")?;
    Ok(Some(user_id))
}

/// Per-user lookups needed outside the auth handlers.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// The preference the meal planner filters on. `None` when the user does
    /// not exist; an empty string means onboarding is not complete.
    async fn nutrition_preference(&self, user_id: Uuid) -> anyhow::Result<Option<String>>;

    /// `None` when the user does not exist.
    async fn role(&self, user_id: Uuid) -> anyhow::Result<Option<String>>;
}

#[derive(Clone)]
pub struct PgUserDirectory {
    db: PgPool,
}

impl PgUserDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn nutrition_preference(&self, user_id: Uuid) -> anyhow::Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT nutrition_preference FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await
                .context("load nutrition preference")?;
        Ok(row.map(|(p,)| p))
    }

    async fn role(&self, user_id: Uuid) -> anyhow::Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .context("load user role")?;
        Ok(row.map(|(r,)| r))
    }
}
