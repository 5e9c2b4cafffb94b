use crate::{
    auth::AuthUser,
    db::{StoreError, UserFilter},
    models::{LoginRequest, LoginResponse, MeResponse, NewUser, SignupRequest, User},
    state::AppState,
    utils::{ApiError, ApiResult, ErrorCode, JsonBody},
};
use axum::{extract::State, Extension, Json};
use validator::Validate;

fn user_already_exists() -> ApiError {
    ApiError::bad_request("User already exists", ErrorCode::UserAlreadyExists)
}

/// Register a new user and return the stored record
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> ApiResult<Json<User>> {
    request.validate().map_err(ApiError::from)?;

    if state
        .store
        .find_first(UserFilter::Email(&request.email))
        .await?
        .is_some()
    {
        return Err(user_already_exists().into());
    }

    let password = state.auth_service.hash_password(&request.password).await?;

    let user = match state
        .store
        .create(NewUser {
            name: request.name,
            email: request.email,
            password,
        })
        .await
    {
        Ok(user) => user,
        // Lost a race with a concurrent signup for the same email
        Err(StoreError::Duplicate) => return Err(user_already_exists().into()),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = user.id, "user signed up");
    Ok(Json(user))
}

/// Handle user login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .store
        .find_first(UserFilter::Email(&request.email))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found", ErrorCode::UserNotFound))?;

    let matches = state
        .auth_service
        .verify_password(&request.password, &user.password)
        .await?;
    if !matches {
        return Err(ApiError::bad_request("Invalid password", ErrorCode::IncorrectPassword).into());
    }

    let token = state.auth_service.sign_token(user.id)?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse { user, token }))
}

/// Get current user
pub async fn me(Extension(AuthUser { user }): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse { user })
}
