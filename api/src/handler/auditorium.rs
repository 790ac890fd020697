use crate::model::auditorium::{
    AuditoriumResponse, AuditoriumsResponse, CreateAuditoriumRequest, UpdateAuditoriumRequest,
    UpdateAuditoriumRequestWithId,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::id::AuditoriumId;
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn register_auditorium(
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateAuditoriumRequest>,
) -> Result<StatusCode, AppError> {
    req.validate(&())?;

    registry
        .auditorium_repository()
        .create(req.into())
        .await
        .map(|_| StatusCode::CREATED)
}

pub async fn show_auditorium_list(
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AuditoriumsResponse>> {
    registry
        .auditorium_repository()
        .find_all()
        .await
        .map(AuditoriumsResponse::from)
        .map(Json)
}

// 利用者向けには有効な講堂だけを見せる
pub async fn show_active_auditorium_list(
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AuditoriumsResponse>> {
    registry
        .auditorium_repository()
        .find_active()
        .await
        .map(AuditoriumsResponse::from)
        .map(Json)
}

pub async fn show_auditorium(
    Path(auditorium_id): Path<AuditoriumId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AuditoriumResponse>> {
    registry
        .auditorium_repository()
        .find_by_id(auditorium_id)
        .await
        .and_then(|auditorium| match auditorium {
            Some(auditorium) => Ok(Json(auditorium.into())),
            None => Err(AppError::EntityNotFound(
                "指定された講堂が見つかりませんでした。".into(),
            )),
        })
}

pub async fn update_auditorium(
    Path(auditorium_id): Path<AuditoriumId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateAuditoriumRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;

    let update = UpdateAuditoriumRequestWithId::new(auditorium_id, req);
    registry
        .auditorium_repository()
        .update(update.into())
        .await
        .map(|_| StatusCode::OK)
}

pub async fn delete_auditorium(
    Path(auditorium_id): Path<AuditoriumId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    registry
        .auditorium_repository()
        .delete(auditorium_id)
        .await
        .map(|_| StatusCode::OK)
}
