use serde::Deserialize;

use crate::meals::repo_types::NewMeal;

#[derive(Debug, Deserialize)]
pub struct AddMealRequest {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub calories: i32,
    #[serde(default)]
    pub prep_time: i32,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AddMealRequest {
    /// Trims and normalizes the request into an insertable meal.
    pub fn validate(self) -> Result<NewMeal, &'static str> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("name is required");
        }
        let category = self.category.trim().to_lowercase();
        if category.is_empty() {
            return Err("category is required");
        }
        if self.calories < 0 || self.prep_time < 0 {
            return Err("calories and prep_time must not be negative");
        }
        let tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(NewMeal {
            name,
            image: self.image.filter(|i| !i.trim().is_empty()),
            calories: self.calories,
            prep_time: self.prep_time,
            category,
            tags,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ListMealsQuery {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}
