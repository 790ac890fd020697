use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use derive_new::new;
use kernel::model::id::{AuditoriumId, ReservationId, UserId};
use kernel::model::reservation::{
    event::{CreateReservation, UpdateReservation},
    Reservation, ReservationState,
};
use kernel::model::role::Role;
use kernel::repository::reservation::ReservationRepository;
use shared::error::{AppError, AppResult};

use crate::database::{model::reservation::ReservationRow, ConnectionPool};

#[derive(new)]
pub struct ReservationRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ReservationRepository for ReservationRepositoryImpl {
    // 予約操作を行う
    async fn create(&self, event: CreateReservation) -> AppResult<ReservationId> {
        let mut tx = self.db.begin().await?;

        // トランザクション分離レベルを SERIALIZABLE に設定する。
        // 重複チェックと INSERT をひとかたまりにしないと、同時刻の
        // 同時リクエストが両方ともチェックを通過してしまう
        self.set_transaction_serializable(&mut tx).await?;

        // 事前のチェックとして、以下を順に調べる。
        // どれかに引っかかった時点で書き込まずに返す
        {
            //
            // ① 講堂の存在確認
            //
            let auditorium_row =
                sqlx::query("SELECT auditorium_id FROM auditoriums WHERE auditorium_id = $1")
                    .bind(event.auditorium_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(AppError::SpecificOperationError)?;

            if auditorium_row.is_none() {
                return Err(AppError::EntityNotFound(format!(
                    "講堂（{}）が見つかりませんでした。",
                    event.auditorium_id
                )));
            }

            //
            // ② ユーザーの存在確認
            //
            let user_row = sqlx::query("SELECT user_id FROM users WHERE user_id = $1")
                .bind(event.user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::SpecificOperationError)?;

            if user_row.is_none() {
                return Err(AppError::EntityNotFound(format!(
                    "ユーザー（{}）が見つかりませんでした。",
                    event.user_id
                )));
            }

            //
            // ③ 希望時間帯が同じ日の既存予約と重なっていないか確認。
            //    RECHAZADA / CANCELADA の予約は対象外。
            //    重複条件：
            //        existing.start < new.end AND new.start < existing.end
            //
            let overlap = sqlx::query(
                r#"
                SELECT reservation_id
                FROM reservations
                WHERE auditorium_id = $1
                  AND reservation_date = $2
                  AND state IN ('SOLICITADA', 'PENDIENTE', 'APROBADA')
                  AND start_time < $4
                  AND $3 < end_time
                LIMIT 1
                "#,
            )
            .bind(event.auditorium_id)
            .bind(event.reservation_date)
            .bind(event.start_time)
            .bind(event.end_time)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

            if overlap.is_some() {
                return Err(AppError::SlotConflict(format!(
                    "講堂（{}）は指定時間帯にすでに予約が存在します。",
                    event.auditorium_id
                )));
            }

            //
            // ④ 終了時刻 > 開始時刻
            //
            if !event.has_valid_time_range() {
                return Err(AppError::InvalidTimeRange(
                    "終了時刻は開始時刻より後でなければなりません。".into(),
                ));
            }

            //
            // ⑤ 過去日付でないこと
            //
            if event.is_before(Local::now().date_naive()) {
                return Err(AppError::PastDate(
                    "過去の日付には予約できません。".into(),
                ));
            }
        }

        // チェックを通過したので reservations テーブルにレコードを追加する。
        // 状態の指定がなければ SOLICITADA で登録する
        let reservation_id = ReservationId::new();
        let state = event.state.unwrap_or_default();
        let res = sqlx::query(
            r#"
                INSERT INTO reservations
                (reservation_id, auditorium_id, user_id, reservation_date,
                start_time, end_time, reason, state)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reservation_id)
        .bind(event.auditorium_id)
        .bind(event.user_id)
        .bind(event.reservation_date)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(&event.reason)
        .bind(state.as_ref())
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No reservation record has been created".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(reservation_id)
    }

    // 日時・理由・備考（・状態）の全項目更新
    async fn update(&self, event: UpdateReservation) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                UPDATE reservations
                SET
                    reservation_date = $2,
                    start_time = $3,
                    end_time = $4,
                    reason = $5,
                    observations = $6,
                    state = COALESCE($7, state)
                WHERE reservation_id = $1
            "#,
        )
        .bind(event.reservation_id)
        .bind(event.reservation_date)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(&event.reason)
        .bind(&event.observations)
        .bind(event.state.map(|s| s.as_ref().to_string()))
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "指定された予約が見つかりませんでした。".into(),
            ));
        }

        Ok(())
    }

    // 状態遷移。遷移表による制限は設けず、そのまま上書きする
    async fn update_state(
        &self,
        reservation_id: ReservationId,
        state: ReservationState,
    ) -> AppResult<()> {
        let res = sqlx::query("UPDATE reservations SET state = $1 WHERE reservation_id = $2")
            .bind(state.as_ref())
            .bind(reservation_id)
            .execute(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "指定された予約が見つかりませんでした。".into(),
            ));
        }

        Ok(())
    }

    async fn update_observations(
        &self,
        reservation_id: ReservationId,
        observations: String,
    ) -> AppResult<()> {
        let res =
            sqlx::query("UPDATE reservations SET observations = $1 WHERE reservation_id = $2")
                .bind(&observations)
                .bind(reservation_id)
                .execute(self.db.inner_ref())
                .await
                .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "指定された予約が見つかりませんでした。".into(),
            ));
        }

        Ok(())
    }

    // すべての予約を取得する
    async fn find_all(&self) -> AppResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            r#"
                SELECT
                r.reservation_id,
                r.reservation_date,
                r.start_time,
                r.end_time,
                r.reason,
                r.state,
                r.observations,
                a.auditorium_id,
                a.name AS auditorium_name,
                a.capacity AS auditorium_capacity,
                a.location AS auditorium_location,
                u.user_id,
                u.email AS user_email,
                u.first_name AS user_first_name,
                u.last_name AS user_last_name,
                u.role AS user_role
                FROM reservations AS r
                LEFT JOIN auditoriums AS a ON r.auditorium_id = a.auditorium_id
                LEFT JOIN users AS u ON r.user_id = u.user_id
                ORDER BY r.created_at ASC
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(
            r#"
                SELECT
                r.reservation_id,
                r.reservation_date,
                r.start_time,
                r.end_time,
                r.reason,
                r.state,
                r.observations,
                a.auditorium_id,
                a.name AS auditorium_name,
                a.capacity AS auditorium_capacity,
                a.location AS auditorium_location,
                u.user_id,
                u.email AS user_email,
                u.first_name AS user_first_name,
                u.last_name AS user_last_name,
                u.role AS user_role
                FROM reservations AS r
                LEFT JOIN auditoriums AS a ON r.auditorium_id = a.auditorium_id
                LEFT JOIN users AS u ON r.user_id = u.user_id
                WHERE r.reservation_id = $1
            "#,
        )
        .bind(reservation_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(Reservation::try_from).transpose()
    }

    async fn find_by_state(&self, state: ReservationState) -> AppResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            r#"
                SELECT
                r.reservation_id,
                r.reservation_date,
                r.start_time,
                r.end_time,
                r.reason,
                r.state,
                r.observations,
                a.auditorium_id,
                a.name AS auditorium_name,
                a.capacity AS auditorium_capacity,
                a.location AS auditorium_location,
                u.user_id,
                u.email AS user_email,
                u.first_name AS user_first_name,
                u.last_name AS user_last_name,
                u.role AS user_role
                FROM reservations AS r
                LEFT JOIN auditoriums AS a ON r.auditorium_id = a.auditorium_id
                LEFT JOIN users AS u ON r.user_id = u.user_id
                WHERE r.state = $1
                ORDER BY r.created_at ASC
            "#,
        )
        .bind(state.as_ref())
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    // 予約者のロールで絞り込む。ユーザーが解決できない予約は含まれない
    async fn find_by_role(&self, role: Role) -> AppResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            r#"
                SELECT
                r.reservation_id,
                r.reservation_date,
                r.start_time,
                r.end_time,
                r.reason,
                r.state,
                r.observations,
                a.auditorium_id,
                a.name AS auditorium_name,
                a.capacity AS auditorium_capacity,
                a.location AS auditorium_location,
                u.user_id,
                u.email AS user_email,
                u.first_name AS user_first_name,
                u.last_name AS user_last_name,
                u.role AS user_role
                FROM reservations AS r
                LEFT JOIN auditoriums AS a ON r.auditorium_id = a.auditorium_id
                INNER JOIN users AS u ON r.user_id = u.user_id
                WHERE u.role = $1
                ORDER BY r.created_at ASC
            "#,
        )
        .bind(role.as_ref())
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    async fn find_by_auditorium_id(
        &self,
        auditorium_id: AuditoriumId,
    ) -> AppResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            r#"
                SELECT
                r.reservation_id,
                r.reservation_date,
                r.start_time,
                r.end_time,
                r.reason,
                r.state,
                r.observations,
                a.auditorium_id,
                a.name AS auditorium_name,
                a.capacity AS auditorium_capacity,
                a.location AS auditorium_location,
                u.user_id,
                u.email AS user_email,
                u.first_name AS user_first_name,
                u.last_name AS user_last_name,
                u.role AS user_role
                FROM reservations AS r
                LEFT JOIN auditoriums AS a ON r.auditorium_id = a.auditorium_id
                LEFT JOIN users AS u ON r.user_id = u.user_id
                WHERE r.auditorium_id = $1
                ORDER BY r.created_at ASC
            "#,
        )
        .bind(auditorium_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    // ユーザー ID に紐づく予約を取得する。
    // ユーザー自体が存在しない場合は空リストを返す
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Reservation>> {
        let user_row = sqlx::query("SELECT user_id FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;
        if user_row.is_none() {
            return Ok(Vec::new());
        }

        let rows: Vec<ReservationRow> = sqlx::query_as(
            r#"
                SELECT
                r.reservation_id,
                r.reservation_date,
                r.start_time,
                r.end_time,
                r.reason,
                r.state,
                r.observations,
                a.auditorium_id,
                a.name AS auditorium_name,
                a.capacity AS auditorium_capacity,
                a.location AS auditorium_location,
                u.user_id,
                u.email AS user_email,
                u.first_name AS user_first_name,
                u.last_name AS user_last_name,
                u.role AS user_role
                FROM reservations AS r
                LEFT JOIN auditoriums AS a ON r.auditorium_id = a.auditorium_id
                LEFT JOIN users AS u ON r.user_id = u.user_id
                WHERE r.user_id = $1
                ORDER BY r.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let reservations = rows
            .into_iter()
            .map(Reservation::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        // 参照先が解決できない予約は落とす（エラーにはしない）
        Ok(reservations
            .into_iter()
            .filter(|r| {
                let resolved = r.auditorium.is_some() && r.user.is_some();
                if !resolved {
                    tracing::warn!(
                        reservation_id = %r.reservation_id,
                        "参照先が解決できない予約を一覧から除外しました"
                    );
                }
                resolved
            })
            .collect())
    }

    // 講堂と日付で絞り込む。カレンダー表示用
    async fn find_by_auditorium_id_and_date(
        &self,
        auditorium_id: AuditoriumId,
        date: NaiveDate,
    ) -> AppResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            r#"
                SELECT
                r.reservation_id,
                r.reservation_date,
                r.start_time,
                r.end_time,
                r.reason,
                r.state,
                r.observations,
                a.auditorium_id,
                a.name AS auditorium_name,
                a.capacity AS auditorium_capacity,
                a.location AS auditorium_location,
                u.user_id,
                u.email AS user_email,
                u.first_name AS user_first_name,
                u.last_name AS user_last_name,
                u.role AS user_role
                FROM reservations AS r
                LEFT JOIN auditoriums AS a ON r.auditorium_id = a.auditorium_id
                LEFT JOIN users AS u ON r.user_id = u.user_id
                WHERE r.auditorium_id = $1 AND r.reservation_date = $2
                ORDER BY r.start_time ASC
            "#,
        )
        .bind(auditorium_id)
        .bind(date)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }
}

impl ReservationRepositoryImpl {
    // create でのトランザクションを利用するにあたり
    // トランザクション分離レベルを SERIALIZABLE にするために
    // 内部的に使うメソッド
    async fn set_transaction_serializable(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> AppResult<()> {
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut **tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }
}
