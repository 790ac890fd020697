use async_trait::async_trait;
use derive_new::new;
use kernel::model::auditorium::{
    event::{CreateAuditorium, UpdateAuditorium},
    Auditorium,
};
use kernel::model::id::AuditoriumId;
use kernel::repository::auditorium::AuditoriumRepository;
use shared::error::{AppError, AppResult};

use crate::database::{model::auditorium::AuditoriumRow, ConnectionPool};

#[derive(new)]
pub struct AuditoriumRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl AuditoriumRepository for AuditoriumRepositoryImpl {
    async fn create(&self, event: CreateAuditorium) -> AppResult<AuditoriumId> {
        if event.capacity <= 0 {
            return Err(AppError::UnprocessableEntity(
                "定員は 1 以上でなければなりません。".into(),
            ));
        }

        // 講堂名は一意
        let existing = sqlx::query("SELECT auditorium_id FROM auditoriums WHERE name = $1")
            .bind(&event.name)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;
        if existing.is_some() {
            return Err(AppError::UnprocessableEntity(format!(
                "同名の講堂がすでに存在します: {}",
                event.name
            )));
        }

        let auditorium_id = AuditoriumId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO auditoriums
                (auditorium_id, name, capacity, description, location, is_active)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(auditorium_id)
        .bind(&event.name)
        .bind(event.capacity)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.is_active)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No auditorium record has been created".into(),
            ));
        }

        Ok(auditorium_id)
    }

    async fn find_all(&self) -> AppResult<Vec<Auditorium>> {
        let rows: Vec<AuditoriumRow> = sqlx::query_as(
            r#"
                SELECT
                    auditorium_id,
                    name,
                    capacity,
                    description,
                    location,
                    is_active,
                    image_key,
                    video_key
                FROM auditoriums
                ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(Auditorium::from).collect())
    }

    async fn find_active(&self) -> AppResult<Vec<Auditorium>> {
        let rows: Vec<AuditoriumRow> = sqlx::query_as(
            r#"
                SELECT
                    auditorium_id,
                    name,
                    capacity,
                    description,
                    location,
                    is_active,
                    image_key,
                    video_key
                FROM auditoriums
                WHERE is_active = TRUE
                ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(Auditorium::from).collect())
    }

    async fn find_by_id(&self, auditorium_id: AuditoriumId) -> AppResult<Option<Auditorium>> {
        let row: Option<AuditoriumRow> = sqlx::query_as(
            r#"
                SELECT
                    auditorium_id,
                    name,
                    capacity,
                    description,
                    location,
                    is_active,
                    image_key,
                    video_key
                FROM auditoriums
                WHERE auditorium_id = $1
            "#,
        )
        .bind(auditorium_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row.map(Auditorium::from))
    }

    async fn update(&self, event: UpdateAuditorium) -> AppResult<()> {
        if event.capacity <= 0 {
            return Err(AppError::UnprocessableEntity(
                "定員は 1 以上でなければなりません。".into(),
            ));
        }

        let res = sqlx::query(
            r#"
                UPDATE auditoriums
                SET
                    name = $2,
                    capacity = $3,
                    description = $4,
                    location = $5,
                    is_active = $6
                WHERE auditorium_id = $1
            "#,
        )
        .bind(event.auditorium_id)
        .bind(&event.name)
        .bind(event.capacity)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.is_active)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "指定された講堂が見つかりませんでした。".into(),
            ));
        }

        Ok(())
    }

    async fn delete(&self, auditorium_id: AuditoriumId) -> AppResult<()> {
        // 予約から参照されている講堂は消さない
        let referenced =
            sqlx::query("SELECT reservation_id FROM reservations WHERE auditorium_id = $1 LIMIT 1")
                .bind(auditorium_id)
                .fetch_optional(self.db.inner_ref())
                .await
                .map_err(AppError::SpecificOperationError)?;
        if referenced.is_some() {
            return Err(AppError::UnprocessableEntity(format!(
                "講堂（{auditorium_id}）には予約が残っているため削除できません。"
            )));
        }

        let res = sqlx::query("DELETE FROM auditoriums WHERE auditorium_id = $1")
            .bind(auditorium_id)
            .execute(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "指定された講堂が見つかりませんでした。".into(),
            ));
        }

        Ok(())
    }
}
