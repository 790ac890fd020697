use crate::model::{
    id::{AuditoriumId, ReservationId, UserId},
    reservation::{
        event::{CreateReservation, UpdateReservation},
        Reservation, ReservationState,
    },
    role::Role,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::error::AppResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    // 予約を作成する。重複チェックと登録はひとかたまりで行う
    async fn create(&self, event: CreateReservation) -> AppResult<ReservationId>;
    // 日時・理由・備考（・状態）をまとめて更新する
    async fn update(&self, event: UpdateReservation) -> AppResult<()>;
    // 状態のみを書き換える。遷移の制限は設けない
    async fn update_state(
        &self,
        reservation_id: ReservationId,
        state: ReservationState,
    ) -> AppResult<()>;
    // 却下時の備考を書き込む
    async fn update_observations(
        &self,
        reservation_id: ReservationId,
        observations: String,
    ) -> AppResult<()>;
    // キャンセルは物理削除ではなく CANCELADA への遷移
    async fn cancel(&self, reservation_id: ReservationId) -> AppResult<()> {
        self.update_state(reservation_id, ReservationState::Cancelada)
            .await
    }
    async fn find_all(&self) -> AppResult<Vec<Reservation>>;
    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Option<Reservation>>;
    async fn find_by_state(&self, state: ReservationState) -> AppResult<Vec<Reservation>>;
    // 予約者のロールで絞り込む
    async fn find_by_role(&self, role: Role) -> AppResult<Vec<Reservation>>;
    async fn find_by_auditorium_id(
        &self,
        auditorium_id: AuditoriumId,
    ) -> AppResult<Vec<Reservation>>;
    // 参照先が解決できない予約は除外して返す
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Reservation>>;
    // カレンダー表示と重複チェックに使う
    async fn find_by_auditorium_id_and_date(
        &self,
        auditorium_id: AuditoriumId,
        date: NaiveDate,
    ) -> AppResult<Vec<Reservation>>;
}
