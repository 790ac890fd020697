use crate::model::auditorium::{
    event::{CreateAuditorium, UpdateAuditorium},
    Auditorium,
};
use crate::model::id::AuditoriumId;
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait AuditoriumRepository: Send + Sync {
    async fn create(&self, event: CreateAuditorium) -> AppResult<AuditoriumId>;
    async fn find_all(&self) -> AppResult<Vec<Auditorium>>;
    async fn find_active(&self) -> AppResult<Vec<Auditorium>>;
    async fn find_by_id(&self, auditorium_id: AuditoriumId) -> AppResult<Option<Auditorium>>;
    async fn update(&self, event: UpdateAuditorium) -> AppResult<()>;
    // 予約から参照されている間は削除できない
    async fn delete(&self, auditorium_id: AuditoriumId) -> AppResult<()>;
}
