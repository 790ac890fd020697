use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::UserId,
    role::Role,
    user::{
        event::{CreateUser, UpdateUser},
        User,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleName {
    Estudiante,
    Profesor,
    Administrador,
}

impl From<Role> for RoleName {
    fn from(value: Role) -> Self {
        match value {
            Role::Estudiante => Self::Estudiante,
            Role::Profesor => Self::Profesor,
            Role::Administrador => Self::Administrador,
        }
    }
}

impl From<RoleName> for Role {
    fn from(value: RoleName) -> Self {
        match value {
            RoleName::Estudiante => Self::Estudiante,
            RoleName::Profesor => Self::Profesor,
            RoleName::Administrador => Self::Administrador,
        }
    }
}

// 予約一覧のロール絞り込み用クエリ
#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub value: RoleName,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersResponse {
    pub items: Vec<UserResponse>,
}

impl From<Vec<User>> for UsersResponse {
    fn from(value: Vec<User>) -> Self {
        Self {
            items: value.into_iter().map(UserResponse::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub dni: String,
    pub university_code: String,
    pub role: RoleName,
    pub cycle: Option<i32>,
    pub group: Option<String>,
    pub program: Option<String>,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        let User {
            user_id,
            email,
            first_name,
            last_name,
            dni,
            university_code,
            role,
            cycle,
            group,
            program,
        } = value;
        Self {
            user_id,
            email,
            first_name,
            last_name,
            dni,
            university_code,
            role: RoleName::from(role),
            cycle,
            group,
            program,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    // 省略時は nombre.apellido を生成して使う
    #[garde(skip)]
    pub email: Option<String>,
    #[garde(length(min = 1))]
    pub first_name: String,
    #[garde(length(min = 1))]
    pub last_name: String,
    #[garde(length(min = 8, max = 8))]
    pub dni: String,
    #[garde(length(min = 9, max = 9))]
    pub university_code: String,
    #[garde(skip)]
    pub role: Option<RoleName>,
    #[garde(skip)]
    pub cycle: Option<i32>,
    #[garde(skip)]
    pub group: Option<String>,
    #[garde(skip)]
    pub program: Option<String>,
}

impl From<CreateUserRequest> for CreateUser {
    fn from(value: CreateUserRequest) -> Self {
        let CreateUserRequest {
            email,
            first_name,
            last_name,
            dni,
            university_code,
            role,
            cycle,
            group,
            program,
        } = value;
        CreateUser {
            email,
            first_name,
            last_name,
            dni,
            university_code,
            role: role.map(Role::from).unwrap_or_default(),
            cycle,
            group,
            program,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[garde(length(min = 1))]
    pub first_name: String,
    #[garde(length(min = 1))]
    pub last_name: String,
    #[garde(skip)]
    pub password: Option<String>,
    #[garde(skip)]
    pub role: Option<RoleName>,
}

#[derive(new)]
pub struct UpdateUserRequestWithUserId(UserId, UpdateUserRequest);

impl From<UpdateUserRequestWithUserId> for UpdateUser {
    fn from(value: UpdateUserRequestWithUserId) -> Self {
        let UpdateUserRequestWithUserId(
            user_id,
            UpdateUserRequest {
                first_name,
                last_name,
                password,
                role,
            },
        ) = value;
        UpdateUser {
            user_id,
            first_name,
            last_name,
            password,
            role: role.map(Role::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_uses_wire_role_names() {
        let user = User {
            user_id: UserId::new(),
            email: "ana.quispe".into(),
            first_name: "Ana".into(),
            last_name: "Quispe".into(),
            dni: "87654321".into(),
            university_code: "201810456".into(),
            role: Role::Profesor,
            cycle: None,
            group: None,
            program: None,
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["role"], "PROFESOR");
        assert_eq!(json["universityCode"], "201810456");
        assert!(!json.to_string().contains("password"));
    }

    #[test]
    fn create_request_defaults_role_to_student() {
        let payload = r#"{
            "firstName": "David",
            "lastName": "Romero",
            "dni": "12345678",
            "universityCode": "202210123"
        }"#;
        let req: CreateUserRequest = serde_json::from_str(payload).unwrap();
        let event = CreateUser::from(req);
        assert_eq!(event.role, Role::Estudiante);
        assert!(event.email.is_none());
    }
}
