use std::collections::BTreeSet;
use std::sync::Arc;

use rand::Rng;
use time::{Date, OffsetDateTime};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::auth::repo::UserDirectory;
use crate::error::AppError;
use crate::meals::repo::MealCatalog;
use crate::plans::generator::{generate_plan, random_plan, Strategy};
use crate::plans::provider::PlanProvider;
use crate::plans::repo::PlanStore;
use crate::plans::repo_types::{DailyMeals, MonthlyMealPlan, PlanPeriod};

/// Today's date on the service's local clock, falling back to UTC when the
/// local offset cannot be determined.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Days touched by a recalibration.
///
/// An explicit, non-empty list keeps only days in 1..=31 (others are skipped
/// without error). Otherwise every day from `today` to the end of its month.
pub fn recalibration_days(requested: Option<&[i64]>, today: Date) -> BTreeSet<u8> {
    match requested {
        Some(days) if !days.is_empty() => days
            .iter()
            .filter(|d| (1..=31).contains(*d))
            .map(|&d| d as u8)
            .collect(),
        _ => {
            let last = PlanPeriod::containing(today).days_in_month();
            (today.day()..=last).collect()
        }
    }
}

/// Generation, lookup and recalibration of monthly plans.
#[derive(Clone)]
pub struct PlanService {
    catalog: Arc<dyn MealCatalog>,
    plans: Arc<dyn PlanStore>,
    users: Arc<dyn UserDirectory>,
    provider: Option<Arc<dyn PlanProvider>>,
}

impl PlanService {
    pub fn new(
        catalog: Arc<dyn MealCatalog>,
        plans: Arc<dyn PlanStore>,
        users: Arc<dyn UserDirectory>,
        provider: Option<Arc<dyn PlanProvider>>,
    ) -> Self {
        Self {
            catalog,
            plans,
            users,
            provider,
        }
    }

    pub fn catalog(&self) -> &dyn MealCatalog {
        self.catalog.as_ref()
    }

    async fn preference(&self, user_id: Uuid) -> Result<String, AppError> {
        self.users
            .nutrition_preference(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    /// Builds a plan for every day of `today`'s month and replaces whatever
    /// plan the user had for that month.
    #[instrument(skip(self, rng))]
    pub async fn generate_monthly_plan<R>(
        &self,
        user_id: Uuid,
        today: Date,
        rng: &mut R,
    ) -> Result<MonthlyMealPlan, AppError>
    where
        R: Rng + Send + ?Sized,
    {
        let preference = self.preference(user_id).await?;
        let meals = self.catalog.fetch_eligible_meals(&preference).await?;

        let period = PlanPeriod::containing(today);
        let day_count = period.days_in_month();
        let strategy = match &self.provider {
            Some(p) => Strategy::Delegated(p.as_ref()),
            None => Strategy::Random,
        };

        let days = generate_plan(strategy, &preference, &meals, day_count, rng).await?;
        let plan = self.plans.replace_plan(user_id, period, days).await?;

        info!(
            %user_id,
            plan_id = %plan.id,
            month = plan.month,
            year = plan.year,
            days = plan.days.len(),
            eligible_meals = meals.len(),
            "meal plan generated"
        );
        Ok(plan)
    }

    /// Rewrites selected days of the current plan with random picks from the
    /// user's current preference. Other days are left as they are.
    #[instrument(skip(self, rng))]
    pub async fn recalibrate<R>(
        &self,
        user_id: Uuid,
        today: Date,
        requested_days: Option<Vec<i64>>,
        rng: &mut R,
    ) -> Result<MonthlyMealPlan, AppError>
    where
        R: Rng + Send + ?Sized,
    {
        let period = PlanPeriod::containing(today);
        let plan = self
            .plans
            .find_plan(user_id, period)
            .await?
            .ok_or_else(|| AppError::not_found("meal plan not found"))?;

        let preference = self.preference(user_id).await?;
        let meals = self.catalog.fetch_eligible_meals(&preference).await?;

        let targets = recalibration_days(requested_days.as_deref(), today);
        debug!(plan_id = %plan.id, days = ?targets, "recalibrating");
        let updated_days = random_plan(&meals, targets, rng);

        let updated = self
            .plans
            .merge_days(plan.id, &updated_days)
            .await?
            .ok_or_else(|| AppError::not_found("meal plan not found"))?;

        info!(
            %user_id,
            plan_id = %updated.id,
            rewritten = updated_days.len(),
            "meal plan recalibrated"
        );
        Ok(updated)
    }

    pub async fn current_plan(
        &self,
        user_id: Uuid,
        today: Date,
    ) -> Result<MonthlyMealPlan, AppError> {
        self.plans
            .find_plan(user_id, PlanPeriod::containing(today))
            .await?
            .ok_or_else(|| AppError::not_found("meal plan not found"))
    }

    /// Meals for one day of the current month. A missing plan and a missing
    /// day both come back as the same not-found error.
    pub async fn daily_meals(
        &self,
        user_id: Uuid,
        today: Date,
        day: i64,
    ) -> Result<DailyMeals, AppError> {
        if !(1..=31).contains(&day) {
            return Err(AppError::validation("day must be between 1 and 31"));
        }
        self.plans
            .find_day(user_id, PlanPeriod::containing(today), day as u8)
            .await?
            .ok_or_else(|| AppError::not_found("no meal plan for this day"))
    }
}
