use crate::model::user::{
    UpdateUserRequest, UpdateUserRequestWithUserId, UserResponse, UsersResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::id::UserId;
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn show_user_list(
    State(registry): State<AppRegistry>,
) -> AppResult<Json<UsersResponse>> {
    registry
        .user_repository()
        .find_all()
        .await
        .map(UsersResponse::from)
        .map(Json)
}

pub async fn show_user(
    Path(user_id): Path<UserId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<UserResponse>> {
    registry
        .user_repository()
        .find_by_id(user_id)
        .await
        .and_then(|user| match user {
            Some(user) => Ok(Json(user.into())),
            None => Err(AppError::EntityNotFound(
                "指定されたユーザーが見つかりませんでした。".into(),
            )),
        })
}

pub async fn update_user(
    Path(user_id): Path<UserId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;

    let update = UpdateUserRequestWithUserId::new(user_id, req);
    registry
        .user_repository()
        .update(update.into())
        .await
        .map(|_| StatusCode::OK)
}

pub async fn delete_user(
    Path(user_id): Path<UserId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    registry
        .user_repository()
        .delete(user_id)
        .await
        .map(|_| StatusCode::OK)
}
