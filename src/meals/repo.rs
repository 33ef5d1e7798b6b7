use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::meals::repo_types::{Meal, NewMeal};

/// Read access to the meal catalog, plus the admin insert path.
#[async_trait]
pub trait MealCatalog: Send + Sync {
    /// Meals whose tag set contains `tag`. No match is an empty vec, not an error.
    async fn fetch_eligible_meals(&self, tag: &str) -> anyhow::Result<Vec<Meal>>;

    async fn list_meals(
        &self,
        tag: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Meal>>;

    async fn insert_meal(&self, meal: NewMeal) -> anyhow::Result<Meal>;
}

#[derive(Clone)]
pub struct PgMealCatalog {
    db: PgPool,
}

impl PgMealCatalog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealCatalog for PgMealCatalog {
    async fn fetch_eligible_meals(&self, tag: &str) -> anyhow::Result<Vec<Meal>> {
        let rows = sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, name, image, calories, prep_time, category, tags, created_at, updated_at
              FROM meals
             WHERE $1 = ANY(tags)
             ORDER BY created_at ASC
            "#,
        )
        .bind(tag)
        .fetch_all(&self.db)
        .await
        .context("fetch eligible meals")?;
        Ok(rows)
    }

    async fn list_meals(
        &self,
        tag: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Meal>> {
        let rows = sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, name, image, calories, prep_time, category, tags, created_at, updated_at
              FROM meals
             WHERE $1::text IS NULL OR $1 = ANY(tags)
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tag)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list meals")?;
        Ok(rows)
    }

    async fn insert_meal(&self, meal: NewMeal) -> anyhow::Result<Meal> {
        let row = sqlx::query_as::<_, Meal>(
            r#"
            INSERT INTO meals (name, image, calories, prep_time, category, tags)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, image, calories, prep_time, category, tags, created_at, updated_at
            "#,
        )
        .bind(&meal.name)
        .bind(&meal.image)
        .bind(meal.calories)
        .bind(meal.prep_time)
        .bind(&meal.category)
        .bind(&meal.tags)
        .fetch_one(&self.db)
        .await
        .context("insert meal")?;
        Ok(row)
    }
}
