//! Sign-up and login.

use actix_web::{HttpResponse, web};

use blogicum_core::domain::User;
use blogicum_core::forms::RegistrationForm;
use blogicum_shared::dto::{AuthResponse, LoginRequest};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /auth/register/
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegistrationForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner().clean()?;

    if state.users.find_by_username(&form.username).await?.is_some() {
        return Err(AppError::Conflict(
            "A user with that username already exists.".to_string(),
        ));
    }

    let password_hash = state
        .passwords
        .hash(&form.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = state
        .users
        .save(User::new(form.username, form.email, password_hash))
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let token = state
        .tokens
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Created().json(AuthResponse::bearer(
        token,
        state.tokens.expiration_seconds(),
        &user,
    )))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = state
        .passwords
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        tracing::debug!(username = %user.username, "Rejected login");
        return Err(AppError::Unauthorized);
    }

    let token = state
        .tokens
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(AuthResponse::bearer(
        token,
        state.tokens.expiration_seconds(),
        &user,
    )))
}
