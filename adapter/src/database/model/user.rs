use std::str::FromStr;

use kernel::model::{id::UserId, role::Role, user::User};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct UserRow {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub dni: String,
    pub university_code: String,
    pub role: String,
    pub cycle: Option<i32>,
    pub group_name: Option<String>,
    pub program: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(value: UserRow) -> Result<Self, Self::Error> {
        let UserRow {
            user_id,
            email,
            first_name,
            last_name,
            dni,
            university_code,
            role,
            cycle,
            group_name,
            program,
        } = value;
        // role カラムは TEXT で持っているため、ここで enum に戻す
        let role = Role::from_str(&role)
            .map_err(|e| AppError::ConversionEntityError(e.to_string()))?;
        Ok(User {
            user_id,
            email,
            first_name,
            last_name,
            dni,
            university_code,
            role,
            cycle,
            group: group_name,
            program,
        })
    }
}
