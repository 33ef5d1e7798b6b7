use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::{Date, Month, OffsetDateTime};
use uuid::Uuid;

/// Day of month (1-31) to the meals planned for that day.
pub type DayMap = BTreeMap<u8, DailyMeals>;

/// Meal names for one day. Names are copied from the catalog so a plan stays
/// readable after the source meal changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMeals {
    pub breakfast: String,
    pub lunch: String,
    pub dinner: String,
    pub dessert: String,
}

impl DailyMeals {
    pub fn slots(&self) -> [(MealSlot, &str); 4] {
        [
            (MealSlot::Breakfast, self.breakfast.as_str()),
            (MealSlot::Lunch, self.lunch.as_str()),
            (MealSlot::Dinner, self.dinner.as_str()),
            (MealSlot::Dessert, self.dessert.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Dessert,
}

impl MealSlot {
    /// Catalog category that feeds this slot.
    pub fn category(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
            MealSlot::Dessert => "dessert",
        }
    }
}

/// (month, year) half of the plan key; the user id completes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanPeriod {
    pub month: Month,
    pub year: i32,
}

impl PlanPeriod {
    pub fn containing(date: Date) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    pub fn month_number(&self) -> i32 {
        u8::from(self.month) as i32
    }

    pub fn days_in_month(&self) -> u8 {
        let (next_year, next_month) = match self.month {
            Month::December => (self.year + 1, Month::January),
            m => (self.year, m.next()),
        };
        Date::from_calendar_date(next_year, next_month, 1)
            .ok()
            .and_then(|d| d.previous_day())
            .map(|d| d.day())
            .unwrap_or(31)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub month: i32,
    pub year: i32,
    pub days: DayMap,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct MealPlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub month: i32,
    pub year: i32,
    pub days: Json<DayMap>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<MealPlanRow> for MonthlyMealPlan {
    fn from(r: MealPlanRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            month: r.month,
            year: r.year,
            days: r.days.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
