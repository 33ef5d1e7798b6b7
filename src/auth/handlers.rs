use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use anyhow::Context;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, MessageResponse, OnboardingRequest, Profile, PublicUser,
            RefreshRequest, SignInRequest, SignUpRequest, VerifyEmailQuery,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, validate_password, verify_password},
        repo::{consume_verification_token, insert_verification_token},
        repo_types::{NewUser, User},
        services::{generate_verification_token, is_valid_email, validate_onboarding},
    },
    error::AppError,
    extract::{AppJson, AppQuery},
    mail::verification_email,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/refresh", post(refresh))
        .route("/auth/verify-email", get(verify_email))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/onboarding", post(complete_onboarding))
}

fn auth_response(state: &AppState, user: &User) -> Result<AuthResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    let pair = keys.sign_pair(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::internal(e)
    })?;
    Ok(AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        user: PublicUser {
            id: user.id,
            email: user.email.clone(),
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<SignUpRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(AppError::validation("first_name and last_name are required"));
    }
    if let Err(rule) = validate_password(&payload.password, &payload.email) {
        warn!(rule, "password rejected");
        return Err(AppError::validation(rule));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let hash = hash_password(&payload.password).map_err(AppError::internal)?;
    let token = generate_verification_token();
    let expires_at = OffsetDateTime::now_utc() + Duration::hours(24);

    // Nothing is committed unless the verification email goes out.
    let mut tx = state.db.begin().await.context("begin signup tx")?;
    let user = User::create(
        &mut *tx,
        NewUser {
            email: &payload.email,
            password_hash: &hash,
            first_name: payload.first_name.trim(),
            last_name: payload.last_name.trim(),
        },
    )
    .await?;
    insert_verification_token(&mut *tx, user.id, &token, expires_at).await?;

    let email = verification_email(&state.config.frontend_url, &user.email, &token);
    if let Err(e) = state.mailer.send(email).await {
        error!(error = %e, email = %user.email, "verification email failed; signup rolled back");
        return Err(e.into());
    }
    tx.commit().await.context("commit signup tx")?;

    let response = auth_response(&state, &user)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<SignInRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        AppError::internal(e)
    })?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let response = auth_response(&state, &user)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(format!("Invalid refresh token: {e}")))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(auth_response(&state, &user)?))
}

#[instrument(skip(state, query))]
pub async fn verify_email(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<VerifyEmailQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    if query.token.is_empty() {
        return Err(AppError::validation("Invalid or expired token"));
    }
    match consume_verification_token(&state.db, &query.token).await? {
        Some(user_id) => {
            info!(%user_id, "email verified");
            Ok(Json(MessageResponse {
                message: "Email verified successfully. You can now log in.".into(),
            }))
        }
        None => Err(AppError::validation("Invalid or expired token")),
    }
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Profile>, AppError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(Profile {
        id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        nutrition_preference: user.nutrition_preference,
        is_active: user.is_active,
        created_at: user.created_at,
    }))
}

#[instrument(skip(state, payload))]
pub async fn complete_onboarding(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<OnboardingRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let onboarding = validate_onboarding(payload).map_err(AppError::Validation)?;

    if !User::complete_onboarding(&state.db, user_id, &onboarding).await? {
        return Err(AppError::not_found("User not found"));
    }

    info!(%user_id, preference = %onboarding.nutrition_preference, "onboarding completed");
    Ok(Json(MessageResponse {
        message: "Onboarding completed successfully".into(),
    }))
}
