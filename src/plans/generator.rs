use std::collections::{HashMap, HashSet};

use rand::{seq::SliceRandom, Rng};
use tracing::{debug, warn};

use crate::meals::repo_types::Meal;
use crate::plans::provider::{PlanProvider, PlanRequest, ProviderError};
use crate::plans::repo_types::{DailyMeals, DayMap, MealSlot};

/// Slot value used when a category has no eligible meal.
pub const NO_MEAL_AVAILABLE: &str = "No meal available";

/// Eligible meals grouped by category.
pub struct MealBuckets<'a> {
    by_category: HashMap<&'a str, Vec<&'a Meal>>,
}

impl<'a> MealBuckets<'a> {
    pub fn from_meals(meals: &'a [Meal]) -> Self {
        let mut by_category: HashMap<&'a str, Vec<&'a Meal>> = HashMap::new();
        for meal in meals {
            by_category.entry(meal.category.as_str()).or_default().push(meal);
        }
        Self { by_category }
    }

    /// Uniform draw from the slot's bucket, or the sentinel when it is empty.
    pub fn pick<R: Rng + ?Sized>(&self, slot: MealSlot, rng: &mut R) -> String {
        self.by_category
            .get(slot.category())
            .and_then(|bucket| bucket.choose(rng))
            .map(|meal| meal.name.clone())
            .unwrap_or_else(|| NO_MEAL_AVAILABLE.to_string())
    }

    pub fn daily_meals<R: Rng + ?Sized>(&self, rng: &mut R) -> DailyMeals {
        DailyMeals {
            breakfast: self.pick(MealSlot::Breakfast, rng),
            lunch: self.pick(MealSlot::Lunch, rng),
            dinner: self.pick(MealSlot::Dinner, rng),
            dessert: self.pick(MealSlot::Dessert, rng),
        }
    }
}

/// Random plan for the given days. Repeats across days are allowed.
pub fn random_plan<R, I>(meals: &[Meal], days: I, rng: &mut R) -> DayMap
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = u8>,
{
    let buckets = MealBuckets::from_meals(meals);
    days.into_iter()
        .map(|day| (day, buckets.daily_meals(rng)))
        .collect()
}

/// How full-month plans are produced.
pub enum Strategy<'a> {
    Random,
    Delegated(&'a dyn PlanProvider),
}

/// Plan for days `1..=day_count` using the chosen strategy.
///
/// Delegated output is taken as returned by the provider. Meal names that are
/// not in `meals` are logged but kept.
pub async fn generate_plan<R>(
    strategy: Strategy<'_>,
    preference: &str,
    meals: &[Meal],
    day_count: u8,
    rng: &mut R,
) -> Result<DayMap, ProviderError>
where
    R: Rng + Send + ?Sized,
{
    match strategy {
        Strategy::Random => {
            debug!(preference, meals = meals.len(), day_count, "random plan");
            Ok(random_plan(meals, 1..=day_count, rng))
        }
        Strategy::Delegated(provider) => {
            let days = provider
                .request_plan(PlanRequest {
                    preference,
                    meals,
                    day_count,
                })
                .await?;
            let unknown = unknown_meal_names(&days, meals);
            if !unknown.is_empty() {
                warn!(
                    count = unknown.len(),
                    names = ?unknown,
                    "provider plan references meals outside the eligible set"
                );
            }
            Ok(days)
        }
    }
}

/// Names in `days` that are neither an eligible meal nor the sentinel.
pub fn unknown_meal_names(days: &DayMap, meals: &[Meal]) -> Vec<String> {
    let known: HashSet<&str> = meals.iter().map(|m| m.name.as_str()).collect();
    let mut unknown: Vec<String> = days
        .values()
        .flat_map(|d| d.slots())
        .map(|(_, name)| name)
        .filter(|name| *name != NO_MEAL_AVAILABLE && !known.contains(name))
        .map(str::to_string)
        .collect();
    unknown.sort();
    unknown.dedup();
    unknown
}
