use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rand::Rng;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{AppJson, AppQuery},
    quotes::{
        dto::{CreateQuoteRequest, PageQuery, Pagination, QuotePage},
        repo_types::Quote,
    },
    state::AppState,
};

pub fn quote_routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", get(list_quotes).post(create_quote))
        .route("/quotes/random", get(random_quote))
        .route("/quotes/:id", get(get_quote))
}

#[instrument(skip(state, payload))]
pub async fn create_quote(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateQuoteRequest>,
) -> Result<(StatusCode, Json<Quote>), AppError> {
    let role = state
        .users
        .role(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    if role != "admin" {
        warn!(%user_id, %role, "non-admin tried to create a quote");
        return Err(AppError::Forbidden("Only admins can create quotes".into()));
    }

    let content = payload.content.trim();
    if content.is_empty() {
        return Err(AppError::validation("content is required"));
    }

    let quote = state.quotes.insert_quote(content).await?;
    info!(%user_id, quote_id = %quote.id, "quote created");
    Ok((StatusCode::CREATED, Json(quote)))
}

#[instrument(skip(state))]
pub async fn get_quote(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Quote>, AppError> {
    let id = Uuid::parse_str(&id).map_err(|_| AppError::validation("Invalid quote ID"))?;
    let quote = state
        .quotes
        .find_quote(id)
        .await?
        .ok_or_else(|| AppError::not_found("Quote not found"))?;
    Ok(Json(quote))
}

#[instrument(skip(state))]
pub async fn list_quotes(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    AppQuery(q): AppQuery<PageQuery>,
) -> Result<Json<QuotePage>, AppError> {
    let (page, limit) = q.resolve();
    let total = state.quotes.count_quotes().await?;
    let pagination = Pagination::new(page, limit, total);
    let quotes = state.quotes.list_quotes(limit, pagination.offset()).await?;
    Ok(Json(QuotePage { quotes, pagination }))
}

#[instrument(skip(state))]
pub async fn random_quote(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<Quote>, AppError> {
    let total = state.quotes.count_quotes().await?;
    if total == 0 {
        return Err(AppError::not_found("No quotes available"));
    }
    let offset = rand::thread_rng().gen_range(0..total);
    let quote = state
        .quotes
        .quote_at(offset)
        .await?
        .ok_or_else(|| AppError::not_found("No quotes available"))?;
    Ok(Json(quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bearer, json_body, Fixture};
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn get_req(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("Authorization", token)
            .body(Body::empty())
            .unwrap()
    }

    fn create_req(token: &str, content: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/quotes")
            .header("Authorization", token)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "content": content }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn only_admins_create_quotes() {
        let fx = Fixture::new(Vec::new());
        let user = fx.add_user("vegan");
        let admin = fx.add_admin();
        let state = fx.app_state();
        let user_token = bearer(&state, user);
        let admin_token = bearer(&state, admin);
        let app = quote_routes().with_state(state);

        let res = app
            .clone()
            .oneshot(create_req(&user_token, "Eat well"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = app.clone().oneshot(create_req(&admin_token, "  ")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .clone()
            .oneshot(create_req(&admin_token, "Eat well"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let created = json_body(res).await;

        let uri = format!("/quotes/{}", created["id"].as_str().unwrap());
        let res = app.oneshot(get_req(&uri, &user_token)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["content"], "Eat well");
    }

    #[tokio::test]
    async fn get_by_id_validates_and_reports_missing() {
        let fx = Fixture::new(Vec::new());
        let user = fx.add_user("vegan");
        let state = fx.app_state();
        let token = bearer(&state, user);
        let app = quote_routes().with_state(state);

        let res = app.clone().oneshot(get_req("/quotes/nope", &token)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let uri = format!("/quotes/{}", Uuid::new_v4());
        let res = app.oneshot(get_req(&uri, &token)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_pages_through_quotes() {
        let fx = Fixture::new(Vec::new());
        for i in 0..12 {
            fx.add_quote(&format!("quote {i}"));
        }
        let user = fx.add_user("vegan");
        let state = fx.app_state();
        let token = bearer(&state, user);
        let app = quote_routes().with_state(state);

        let res = app
            .clone()
            .oneshot(get_req("/quotes?page=2&limit=5", &token))
            .await
            .unwrap();
        let body = json_body(res).await;
        let quotes = body["quotes"].as_array().unwrap();
        assert_eq!(quotes.len(), 5);
        assert_eq!(quotes[0]["content"], "quote 5");
        assert_eq!(body["pagination"]["total"], 12);
        assert_eq!(body["pagination"]["total_pages"], 3);

        let res = app
            .oneshot(get_req("/quotes?page=0&limit=abc", &token))
            .await
            .unwrap();
        let body = json_body(res).await;
        assert_eq!(body["pagination"]["current_page"], 1);
        assert_eq!(body["pagination"]["limit"], 10);
        assert_eq!(body["quotes"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn oversized_paging_values_are_capped() {
        let fx = Fixture::new(Vec::new());
        fx.add_quote("only one");
        let user = fx.add_user("vegan");
        let state = fx.app_state();
        let token = bearer(&state, user);
        let app = quote_routes().with_state(state);

        let res = app
            .oneshot(get_req(
                "/quotes?page=9223372036854775807&limit=9223372036854775807",
                &token,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["pagination"]["limit"], 100);
        assert_eq!(body["pagination"]["total_pages"], 1);
        assert!(body["quotes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn random_quote_needs_at_least_one() {
        let fx = Fixture::new(Vec::new());
        let user = fx.add_user("vegan");
        let state = fx.app_state();
        let token = bearer(&state, user);
        let app = quote_routes().with_state(state);

        let res = app.clone().oneshot(get_req("/quotes/random", &token)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        fx.add_quote("only one");
        let res = app.oneshot(get_req("/quotes/random", &token)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["content"], "only one");
    }
}
