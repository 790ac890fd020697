use crate::model::{
    id::UserId,
    user::{
        event::{CreateUser, UpdateUser},
        User,
    },
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, event: CreateUser) -> AppResult<User>;
    async fn find_all(&self) -> AppResult<Vec<User>>;
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    // ログイン検証用。モデルにはハッシュを載せない
    async fn find_password_hash_by_email(&self, email: &str) -> AppResult<Option<String>>;
    async fn update(&self, event: UpdateUser) -> AppResult<()>;
    async fn delete(&self, user_id: UserId) -> AppResult<()>;
}
