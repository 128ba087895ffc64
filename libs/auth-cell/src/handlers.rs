use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::{debug, info};

use shared_models::auth::{LoginData, LoginRequest, PublicUser, RegisterRequest, TokenClaims};
use shared_models::error::AppError;
use shared_models::response::ApiResponse;
use shared_utils::token::token_preview;

use crate::router::AuthApiState;
use crate::service::require_credentials;

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct UsersData {
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Serialize)]
pub struct ClaimsData {
    pub user: TokenClaims,
}

pub async fn login(
    State(state): State<AuthApiState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginData>>, AppError> {
    let (email, password) =
        require_credentials(request.email.as_deref(), request.password.as_deref())?;
    debug!("Login attempt for {}", email);

    let record = state
        .credentials
        .find_by_credentials(email, password)
        .await
        .ok_or_else(|| {
            debug!("Login failed: invalid credentials for {}", email);
            AppError::Auth("Invalid email or password".to_string())
        })?;

    let user = record.to_public();
    let token = state
        .codec
        .encode(&user)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!("Login successful for {}", user.email);
    debug!("Issued token {}", token_preview(&token));

    Ok(Json(
        ApiResponse::ok(LoginData { token, user }).with_message("Login successful"),
    ))
}

pub async fn register(
    State(state): State<AuthApiState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserData>>), AppError> {
    let (email, password) =
        require_credentials(request.email.as_deref(), request.password.as_deref())?;

    let record = state
        .credentials
        .add(email, password, request.name.as_deref())
        .await?;

    info!("User registered successfully: {}", record.email);

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::ok(UserData {
                user: record.to_public(),
            })
            .with_message("Registration successful"),
        ),
    ))
}

pub async fn verify(Extension(claims): Extension<TokenClaims>) -> Json<ApiResponse<ClaimsData>> {
    debug!("Token verified for user {}", claims.id);
    Json(ApiResponse::ok(ClaimsData { user: claims }).with_message("Token is valid"))
}

pub async fn list_users(State(state): State<AuthApiState>) -> Json<ApiResponse<UsersData>> {
    let users = state.credentials.all().await;
    Json(ApiResponse::ok(UsersData { users }))
}

// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<ApiResponse<()>> {
    info!("Logout request received");
    Json(ApiResponse::message_only("Logged out successfully"))
}
