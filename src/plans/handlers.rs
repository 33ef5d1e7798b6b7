use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    plans::{
        dto::RecalibrateRequest,
        repo_types::{DailyMeals, MonthlyMealPlan},
        services::today,
    },
    state::AppState,
};

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/generate-plan", post(generate_plan))
        .route("/meals/plan", get(current_plan))
        .route("/meals/plan/:day", get(daily_meals))
        .route("/meals/recalibrate", post(recalibrate))
}

#[instrument(skip(state))]
pub async fn generate_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(StatusCode, Json<MonthlyMealPlan>), AppError> {
    let mut rng = StdRng::from_entropy();
    let plan = state
        .plans
        .generate_monthly_plan(user_id, today(), &mut rng)
        .await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[instrument(skip(state))]
pub async fn current_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MonthlyMealPlan>, AppError> {
    Ok(Json(state.plans.current_plan(user_id, today()).await?))
}

#[instrument(skip(state))]
pub async fn daily_meals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(day): Path<String>,
) -> Result<Json<DailyMeals>, AppError> {
    let day: i64 = day
        .parse()
        .map_err(|_| AppError::validation("day must be a number between 1 and 31"))?;
    Ok(Json(state.plans.daily_meals(user_id, today(), day).await?))
}

/// Body is optional; anything that does not parse counts as no days given.
#[instrument(skip(state, payload))]
pub async fn recalibrate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Option<Json<RecalibrateRequest>>,
) -> Result<Json<MonthlyMealPlan>, AppError> {
    let req = payload.map(|Json(r)| r).unwrap_or_default();
    debug!(%user_id, days = ?req.days, "recalibrate requested");

    let mut rng = StdRng::from_entropy();
    let plan = state
        .plans
        .recalibrate(user_id, today(), req.days, &mut rng)
        .await?;
    Ok(Json(plan))
}
