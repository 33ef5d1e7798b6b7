use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;

/// `Json` whose rejections use the API error body.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(status = %rejection.status(), error = %rejection.body_text(), "json body rejected");
                Err(AppError::validation(rejection.body_text()))
            }
        }
    }
}

/// `Query` whose rejections use the API error body.
pub struct AppQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "query string rejected");
                Err(AppError::validation(rejection.body_text()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::json_body;
    use axum::{body::Body, http::StatusCode, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Named {
        name: String,
    }

    #[derive(Deserialize)]
    struct Paging {
        #[allow(dead_code)]
        limit: i64,
    }

    fn app() -> Router {
        Router::new().route(
            "/echo",
            post(|AppQuery(_p): AppQuery<Paging>, AppJson(b): AppJson<Named>| async move { b.name }),
        )
    }

    #[tokio::test]
    async fn malformed_json_gets_the_error_envelope() {
        let res = app()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/echo?limit=5")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"name\":"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = json_body(res).await;
        assert_eq!(json["error"]["kind"], "validation_failure");
        assert!(!json["error"]["detail"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_content_type_gets_the_error_envelope() {
        let res = app()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/echo?limit=5")
                    .body(Body::from("{\"name\":\"x\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"]["kind"], "validation_failure");
    }

    #[tokio::test]
    async fn bad_query_gets_the_error_envelope() {
        let res = app()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/echo?limit=lots")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"name\":\"x\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"]["kind"], "validation_failure");
    }

    #[tokio::test]
    async fn valid_input_passes_through() {
        let res = app()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/echo?limit=5")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"name\":\"x\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
