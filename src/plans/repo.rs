use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::plans::repo_types::{DailyMeals, DayMap, MealPlanRow, MonthlyMealPlan, PlanPeriod};

/// Storage for the one-plan-per-user-per-month document.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Drops any plan for `(user_id, period)` and stores `days` as the new one.
    async fn replace_plan(
        &self,
        user_id: Uuid,
        period: PlanPeriod,
        days: DayMap,
    ) -> anyhow::Result<MonthlyMealPlan>;

    /// Overwrites only the given days and bumps `updated_at`.
    /// `None` when the plan no longer exists.
    async fn merge_days(
        &self,
        plan_id: Uuid,
        days: &DayMap,
    ) -> anyhow::Result<Option<MonthlyMealPlan>>;

    async fn find_plan(
        &self,
        user_id: Uuid,
        period: PlanPeriod,
    ) -> anyhow::Result<Option<MonthlyMealPlan>>;

    /// `None` both when there is no plan and when the plan lacks `day`.
    async fn find_day(
        &self,
        user_id: Uuid,
        period: PlanPeriod,
        day: u8,
    ) -> anyhow::Result<Option<DailyMeals>> {
        let plan = self.find_plan(user_id, period).await?;
        Ok(plan.and_then(|mut p| p.days.remove(&day)))
    }
}

#[derive(Clone)]
pub struct PgPlanStore {
    db: PgPool,
}

impl PgPlanStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn replace_plan(
        &self,
        user_id: Uuid,
        period: PlanPeriod,
        days: DayMap,
    ) -> anyhow::Result<MonthlyMealPlan> {
        let month = period.month_number();
        let mut tx = self.db.begin().await.context("begin tx")?;

        // Serializes concurrent regenerations of the same period until commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("meal_plan:{}:{}:{}", user_id, period.year, month))
            .execute(&mut *tx)
            .await
            .context("lock plan period")?;

        sqlx::query("DELETE FROM meal_plans WHERE user_id = $1 AND month = $2 AND year = $3")
            .bind(user_id)
            .bind(month)
            .bind(period.year)
            .execute(&mut *tx)
            .await
            .context("clear existing meal plan")?;

        let row = sqlx::query_as::<_, MealPlanRow>(
            r#"
            INSERT INTO meal_plans (user_id, month, year, days)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, month, year, days, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(month)
        .bind(period.year)
        .bind(Json(&days))
        .fetch_one(&mut *tx)
        .await
        .context("insert meal plan")?;

        tx.commit().await.context("commit tx")?;
        Ok(row.into())
    }

    async fn merge_days(
        &self,
        plan_id: Uuid,
        days: &DayMap,
    ) -> anyhow::Result<Option<MonthlyMealPlan>> {
        // jsonb `||` replaces matching top-level keys and keeps the rest.
        let row = sqlx::query_as::<_, MealPlanRow>(
            r#"
            UPDATE meal_plans
               SET days = days || $2,
                   updated_at = GREATEST(now(), updated_at + interval '1 microsecond')
             WHERE id = $1
            RETURNING id, user_id, month, year, days, created_at, updated_at
            "#,
        )
        .bind(plan_id)
        .bind(Json(days))
        .fetch_optional(&self.db)
        .await
        .context("merge meal plan days")?;
        Ok(row.map(Into::into))
    }

    async fn find_plan(
        &self,
        user_id: Uuid,
        period: PlanPeriod,
    ) -> anyhow::Result<Option<MonthlyMealPlan>> {
        let row = sqlx::query_as::<_, MealPlanRow>(
            r#"
            SELECT id, user_id, month, year, days, created_at, updated_at
              FROM meal_plans
             WHERE user_id = $1 AND month = $2 AND year = $3
             ORDER BY updated_at DESC
             LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(period.month_number())
        .bind(period.year)
        .fetch_optional(&self.db)
        .await
        .context("find meal plan")?;
        Ok(row.map(Into::into))
    }

    async fn find_day(
        &self,
        user_id: Uuid,
        period: PlanPeriod,
        day: u8,
    ) -> anyhow::Result<Option<DailyMeals>> {
        let row: Option<(Option<Json<DailyMeals>>,)> = sqlx::query_as(
            r#"
            SELECT days -> $4
              FROM meal_plans
             WHERE user_id = $1 AND month = $2 AND year = $3
             ORDER BY updated_at DESC
             LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(period.month_number())
        .bind(period.year)
        .bind(day.to_string())
        .fetch_optional(&self.db)
        .await
        .context("find meal plan day")?;
        Ok(row.and_then(|(meals,)| meals).map(|Json(m)| m))
    }
}
