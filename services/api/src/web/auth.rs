//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::header,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use meridian_core::ports::RealtimeEvent;
use meridian_core::routing::{self, Page};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::middleware::session_id_from_headers;
use crate::web::pages::RouteDecision;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// The page the client is currently on, as a path segment. Used to run
    /// the status check immediately after a successful login.
    pub page: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    /// Where the status router sends the user next.
    pub route: RouteDecision,
}

//=========================================================================================
// Handlers
//=========================================================================================

fn session_cookie(auth_session_id: &str, max_age_secs: i64) -> String {
    format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id, max_age_secs
    )
}

/// POST /auth/signup - Create a new user account
///
/// Also seeds the profile (status `new`) and a zero-balance account, so every
/// authenticated user has both from the start.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })?
        .to_string();

    // 2. Create user, profile, and account. Duplicate emails surface as a
    //    409 with the conflict message in the body.
    let user = state
        .db
        .create_user_with_email(&req.email, &password_hash, &req.full_name)
        .await?;
    info!("Created user {} ({})", user.user_id, req.email);

    // 3. Open an auth session and hand back the cookie.
    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(state.config.session_days);
    state
        .db
        .create_auth_session(&auth_session_id, user.user_id, expires_at)
        .await?;

    let cookie = session_cookie(
        &auth_session_id,
        Duration::days(state.config.session_days).num_seconds(),
    );

    // New signups always start onboarding.
    let response = AuthResponse {
        user_id: user.user_id,
        email: user.email.unwrap_or_default(),
        route: RouteDecision::redirect(Page::Onboarding),
    };

    Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // 1. Fetch credentials; an unknown email reads the same as a bad password.
    let user_creds = state.db.get_user_by_email(&req.email).await.map_err(|e| {
        error!("Failed to get user: {:?}", e);
        ApiError::Unauthorized("Invalid email or password".to_string())
    })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    // 3. Open an auth session.
    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(state.config.session_days);
    state
        .db
        .create_auth_session(&auth_session_id, user_creds.user_id, expires_at)
        .await?;

    let cookie = session_cookie(
        &auth_session_id,
        Duration::days(state.config.session_days).num_seconds(),
    );

    // 4. Run the status check right away so the client knows where to go.
    let profile = state.db.get_profile(user_creds.user_id).await?;
    let page = req
        .page
        .as_deref()
        .and_then(Page::from_segment)
        .unwrap_or(Page::Login);
    let route = RouteDecision::from(routing::resolve(Some(profile.status), page));

    let response = AuthResponse {
        user_id: user_creds.user_id,
        email: user_creds.email,
        route,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and invalidate session
///
/// Also publishes a session-revoked event so any live support-chat
/// connection for this user releases its subscription.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let auth_session_id = session_id_from_headers(&headers)
        .ok_or_else(|| ApiError::Unauthorized("No session found".to_string()))?
        .to_owned();

    let user_id = state.db.delete_auth_session(&auth_session_id).await.map_err(|e| {
        error!("Failed to delete auth session: {:?}", e);
        ApiError::Unauthorized("No session found".to_string())
    })?;

    state.realtime.publish(RealtimeEvent::SessionRevoked { user_id });
    info!("User {} signed out", user_id);

    // Clear the cookie.
    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}
