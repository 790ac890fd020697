use crate::model::{
    auth::LoginRequest,
    user::{CreateUserRequest, UserResponse},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use garde::Validate;
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

// ユーザー登録。利用者は自分では登録せず、管理側が一括で作る運用
pub async fn register(
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate(&())?;

    let user = registry.user_repository().create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

// email（nombre.apellido）とパスワード（DNI）でログインする
pub async fn login(
    State(registry): State<AppRegistry>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<UserResponse>> {
    req.validate(&())?;

    let hash = registry
        .user_repository()
        .find_password_hash_by_email(&req.email)
        .await?
        .ok_or(AppError::UnauthenticatedError)?;

    if !bcrypt::verify(&req.password, &hash)? {
        return Err(AppError::UnauthenticatedError);
    }

    registry
        .user_repository()
        .find_by_email(&req.email)
        .await?
        .map(UserResponse::from)
        .map(Json)
        .ok_or(AppError::UnauthenticatedError)
}
