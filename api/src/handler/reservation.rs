use crate::model::{
    reservation::{
        CreateReservationRequest, ReservationResponse, ReservationStateQuery,
        ReservationsResponse, UpdateReservationRequest, UpdateReservationRequestWithId,
        UpdateReservationStateQuery,
    },
    user::RoleQuery,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use garde::Validate;
use kernel::model::id::{AuditoriumId, ReservationId, UserId};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

// 予約 ID から現在の姿を読み戻す。更新系のレスポンスで使う
async fn fetch_reservation(
    registry: &AppRegistry,
    reservation_id: ReservationId,
) -> AppResult<ReservationResponse> {
    registry
        .reservation_repository()
        .find_by_id(reservation_id)
        .await?
        .map(ReservationResponse::from)
        .ok_or_else(|| AppError::EntityNotFound("指定された予約が見つかりませんでした。".into()))
}

pub async fn register_reservation(
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate(&())?;

    let reservation_id = registry
        .reservation_repository()
        .create(req.into())
        .await?;

    let created = fetch_reservation(&registry, reservation_id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn show_reservation_list(
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationsResponse>> {
    registry
        .reservation_repository()
        .find_all()
        .await
        .map(ReservationsResponse::from)
        .map(Json)
}

pub async fn show_reservation(
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationResponse>> {
    fetch_reservation(&registry, reservation_id).await.map(Json)
}

pub async fn show_reservation_list_by_state(
    Query(query): Query<ReservationStateQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationsResponse>> {
    registry
        .reservation_repository()
        .find_by_state(query.value.into())
        .await
        .map(ReservationsResponse::from)
        .map(Json)
}

pub async fn show_reservation_list_by_role(
    Query(query): Query<RoleQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationsResponse>> {
    registry
        .reservation_repository()
        .find_by_role(query.value.into())
        .await
        .map(ReservationsResponse::from)
        .map(Json)
}

pub async fn show_reservation_list_by_auditorium(
    Path(auditorium_id): Path<AuditoriumId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationsResponse>> {
    registry
        .reservation_repository()
        .find_by_auditorium_id(auditorium_id)
        .await
        .map(ReservationsResponse::from)
        .map(Json)
}

// カレンダー表示用
pub async fn show_reservation_list_by_auditorium_and_date(
    Path((auditorium_id, date)): Path<(AuditoriumId, NaiveDate)>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationsResponse>> {
    registry
        .reservation_repository()
        .find_by_auditorium_id_and_date(auditorium_id, date)
        .await
        .map(ReservationsResponse::from)
        .map(Json)
}

pub async fn show_reservation_list_by_user(
    Path(user_id): Path<UserId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationsResponse>> {
    registry
        .reservation_repository()
        .find_by_user_id(user_id)
        .await
        .map(ReservationsResponse::from)
        .map(Json)
}

pub async fn update_reservation(
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateReservationRequest>,
) -> AppResult<Json<ReservationResponse>> {
    req.validate(&())?;

    let update = UpdateReservationRequestWithId::new(reservation_id, req);
    registry
        .reservation_repository()
        .update(update.into())
        .await?;

    fetch_reservation(&registry, reservation_id).await.map(Json)
}

// 管理側の状態変更。遷移の向きは制限しない
pub async fn update_reservation_state(
    Path(reservation_id): Path<ReservationId>,
    Query(query): Query<UpdateReservationStateQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationResponse>> {
    registry
        .reservation_repository()
        .update_state(reservation_id, query.value.into())
        .await?;

    // 却下理由などの備考が添えられていれば合わせて書き込む
    if let Some(observations) = query.observations {
        registry
            .reservation_repository()
            .update_observations(reservation_id, observations)
            .await?;
    }

    fetch_reservation(&registry, reservation_id).await.map(Json)
}

// 削除はレコードを消さず CANCELADA に遷移させる
pub async fn delete_reservation(
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    registry
        .reservation_repository()
        .cancel(reservation_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
}
