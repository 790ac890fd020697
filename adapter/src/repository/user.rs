use async_trait::async_trait;
use derive_new::new;
use kernel::model::id::UserId;
use kernel::model::user::{
    derive_email,
    event::{CreateUser, UpdateUser},
    is_valid_dni, is_valid_university_code, User,
};
use kernel::repository::user::UserRepository;
use shared::error::{AppError, AppResult};

use crate::database::{model::user::UserRow, ConnectionPool};

#[derive(new)]
pub struct UserRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, event: CreateUser) -> AppResult<User> {
        if !is_valid_dni(&event.dni) {
            return Err(AppError::UnprocessableEntity(
                "DNI は 8 桁の数字でなければなりません。".into(),
            ));
        }
        if !is_valid_university_code(&event.university_code) {
            return Err(AppError::UnprocessableEntity(
                "大学コードは 9 桁の数字でなければなりません。".into(),
            ));
        }

        // DNI・大学コード・メールアドレスはそれぞれ一意
        let dni_exists = sqlx::query("SELECT user_id FROM users WHERE dni = $1")
            .bind(&event.dni)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;
        if dni_exists.is_some() {
            return Err(AppError::UnprocessableEntity(
                "この DNI はすでに登録されています。".into(),
            ));
        }

        let code_exists = sqlx::query("SELECT user_id FROM users WHERE university_code = $1")
            .bind(&event.university_code)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;
        if code_exists.is_some() {
            return Err(AppError::UnprocessableEntity(
                "この大学コードはすでに登録されています。".into(),
            ));
        }

        let email = match &event.email {
            Some(email) if !email.is_empty() => email.clone(),
            _ => derive_email(&event.first_name, &event.last_name),
        };

        let email_exists = sqlx::query("SELECT user_id FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;
        if email_exists.is_some() {
            return Err(AppError::UnprocessableEntity(
                "このメールアドレスはすでに登録されています。".into(),
            ));
        }

        // 初期パスワードは DNI のハッシュ
        let password_hash = bcrypt::hash(&event.dni, bcrypt::DEFAULT_COST)?;

        let user_id = UserId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO users
                (user_id, email, first_name, last_name, password_hash,
                dni, university_code, role, cycle, group_name, program)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user_id)
        .bind(&email)
        .bind(&event.first_name)
        .bind(&event.last_name)
        .bind(&password_hash)
        .bind(&event.dni)
        .bind(&event.university_code)
        .bind(event.role.as_ref())
        .bind(event.cycle)
        .bind(&event.group)
        .bind(&event.program)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No user record has been created".into(),
            ));
        }

        let CreateUser {
            first_name,
            last_name,
            dni,
            university_code,
            role,
            cycle,
            group,
            program,
            ..
        } = event;
        Ok(User {
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
        })
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
                SELECT
                    user_id,
                    email,
                    first_name,
                    last_name,
                    dni,
                    university_code,
                    role,
                    cycle,
                    group_name,
                    program
                FROM users
                ORDER BY created_at ASC
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
                SELECT
                    user_id,
                    email,
                    first_name,
                    last_name,
                    dni,
                    university_code,
                    role,
                    cycle,
                    group_name,
                    program
                FROM users
                WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
                SELECT
                    user_id,
                    email,
                    first_name,
                    last_name,
                    dni,
                    university_code,
                    role,
                    cycle,
                    group_name,
                    program
                FROM users
                WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(User::try_from).transpose()
    }

    async fn find_password_hash_by_email(&self, email: &str) -> AppResult<Option<String>> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(self.db.inner_ref())
                .await
                .map_err(AppError::SpecificOperationError)?;

        Ok(hash)
    }

    async fn update(&self, event: UpdateUser) -> AppResult<()> {
        let password_hash = match &event.password {
            Some(password) if !password.is_empty() => {
                Some(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
            }
            _ => None,
        };

        let res = sqlx::query(
            r#"
                UPDATE users
                SET
                    first_name = $2,
                    last_name = $3,
                    password_hash = COALESCE($4, password_hash),
                    role = COALESCE($5, role)
                WHERE user_id = $1
            "#,
        )
        .bind(event.user_id)
        .bind(&event.first_name)
        .bind(&event.last_name)
        .bind(password_hash)
        .bind(event.role.map(|r| r.as_ref().to_string()))
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "指定されたユーザーが見つかりませんでした。".into(),
            ));
        }

        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "指定されたユーザーが見つかりませんでした。".into(),
            ));
        }

        Ok(())
    }
}
