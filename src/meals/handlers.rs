use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{AppJson, AppQuery},
    meals::{
        dto::{AddMealRequest, ListMealsQuery},
        repo_types::Meal,
    },
    state::AppState,
};

const MAX_PAGE: i64 = 100;

pub fn catalog_routes() -> Router<AppState> {
    Router::new().route("/meals", post(add_meal).get(list_meals))
}

#[instrument(skip(state, payload))]
pub async fn add_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<AddMealRequest>,
) -> Result<(StatusCode, Json<Meal>), AppError> {
    let new_meal = payload.validate().map_err(|e| {
        warn!(%user_id, error = e, "meal rejected");
        AppError::validation(e)
    })?;

    let meal = state.plans.catalog().insert_meal(new_meal).await?;
    info!(%user_id, meal_id = %meal.id, category = %meal.category, "meal added");
    Ok((StatusCode::CREATED, Json(meal)))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    AppQuery(q): AppQuery<ListMealsQuery>,
) -> Result<Json<Vec<Meal>>, AppError> {
    let limit = q.limit.clamp(1, MAX_PAGE);
    let offset = q.offset.max(0);
    let tag = q.tag.as_deref().filter(|t| !t.is_empty());

    let meals = state.plans.catalog().list_meals(tag, limit, offset).await?;
    Ok(Json(meals))
}
