//! User account handlers
//!
//! Signup, login, profile edits, deletion and lookup. Edits and deletes
//! must present an auth key issued to the same user by `/login`. Signup,
//! login and edit accept their fields as JSON, as a form body, or in the
//! query string.

use crate::error::AppError;
use crate::extract::Params;
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use jingle_core::{StoreError, User, UserId, UserPublic};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Signup request
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response carrying the new auth key
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: UserId,
    pub auth_key: String,
}

/// Edit request; only the fields present are changed
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub userid: UserId,
    pub authkey: String,
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Credentials for deleting an account
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub userid: UserId,
    pub authkey: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: UserId,
    pub success: bool,
}

/// User selector; `userid` wins when both are given
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub userid: Option<UserId>,
    pub username: Option<String>,
}

/// Register a new user account
///
/// # Responses
///
/// * `201 Created` - User saved, password hash omitted
/// * `400 Bad Request` - Blank username or email, or password too short
/// * `409 Conflict` - Username or email address already taken
/// * `503 Service Unavailable` - Hashing pool is full
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Params(request): Params<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {

    // Reject blank fields before spending a derivation on the password.
    let mut user = User::new(
        request.username,
        request.firstname,
        request.lastname,
        request.email,
        Vec::new(),
    )?;
    user.password_hash = state.auth.hash(&request.password).await?;

    let saved = state.users.save(user).await?;
    tracing::info!(user_id = ?saved.id, username = %saved.username(), "User signed up");

    Ok((StatusCode::CREATED, Json(UserPublic::from(&saved))))
}

/// Log in and receive an auth key
///
/// # Responses
///
/// * `200 OK` - `{id, authKey}`
/// * `401 Unauthorized` - Unknown user, wrong password or a password too short to be valid
pub async fn login(
    State(state): State<Arc<AppState>>,
    Params(request): Params<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {

    let outcome = state
        .auth
        .login(&request.username, &request.password, state.users.as_ref())
        .await?;

    Ok(Json(LoginResponse {
        id: outcome.user_id,
        auth_key: outcome.token.as_str().to_string(),
    }))
}

/// Update an existing user
///
/// # Responses
///
/// * `200 OK` - Updated user
/// * `400 Bad Request` - Unknown user id, blank field or short password
/// * `401 Unauthorized` - Auth key invalid, expired or issued to another user
/// * `409 Conflict` - New username or email address already taken
pub async fn edit_user(
    State(state): State<Arc<AppState>>,
    Params(request): Params<EditRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut user = find_by_id(&state, request.userid).await?;

    state.auth.authorize(&request.authkey, &user)?;

    if let Some(username) = request.username {
        user.set_username(username)?;
    }
    if let Some(first_name) = request.firstname {
        user.first_name = Some(first_name);
    }
    if let Some(last_name) = request.lastname {
        user.last_name = Some(last_name);
    }
    if let Some(email) = request.email {
        user.set_email_address(email)?;
    }
    if let Some(password) = request.password {
        user.password_hash = state.auth.hash(&password).await?;
    }

    let saved = state.users.save(user).await?;
    tracing::info!(user_id = %request.userid, "User updated");

    Ok(Json(UserPublic::from(&saved)))
}

/// Delete a user and revoke their auth keys
///
/// # Responses
///
/// * `200 OK` - `{id, success: true}`
/// * `400 Bad Request` - Unknown user id
/// * `401 Unauthorized` - Auth key invalid, expired or issued to another user
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    let user = find_by_id(&state, params.userid).await?;

    state.auth.authorize(&params.authkey, &user)?;
    state.users.delete(params.userid).await?;
    let revoked = state.auth.revoke_user(params.userid);

    tracing::info!(user_id = %params.userid, revoked_keys = revoked, "User deleted");

    Ok(Json(DeleteResponse {
        id: params.userid,
        success: true,
    }))
}

/// Look up a user by id or username
///
/// # Responses
///
/// * `200 OK` - The user
/// * `400 Bad Request` - No selector given, or no such user
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    params: Result<Query<UserQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;

    let user = match (params.userid, params.username) {
        (Some(id), _) => find_by_id(&state, id).await?,
        (None, Some(username)) => state
            .users
            .by_username(&username)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("User with username ({username}) doesn't exist"))
            })?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either a userid or username must be provided".to_string(),
            ))
        }
    };

    Ok(Json(UserPublic::from(&user)))
}

async fn find_by_id(state: &AppState, id: UserId) -> Result<User, AppError> {
    state
        .users
        .by_id(id)
        .await?
        .ok_or(AppError::Store(StoreError::NotFound(id)))
}
