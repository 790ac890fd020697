use crate::model::{id::UserId, role::Role};
use derive_new::new;

#[derive(Debug, new)]
pub struct CreateUser {
    // 省略時は姓名から生成する
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub dni: String,
    pub university_code: String,
    pub role: Role,
    pub cycle: Option<i32>,
    pub group: Option<String>,
    pub program: Option<String>,
}

#[derive(Debug, new)]
pub struct UpdateUser {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub password: Option<String>,
    pub role: Option<Role>,
}
