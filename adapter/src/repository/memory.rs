// リポジトリトレイトのインメモリ実装。
// データベースを用意できない環境（主にテスト）で Postgres 実装の
// 代わりに差し替えて使う。チェックの順序とエラーの種類は
// Postgres 実装と揃えてある
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveTime};
use derive_new::new;
use kernel::model::auditorium::{
    event::{CreateAuditorium, UpdateAuditorium},
    Auditorium,
};
use kernel::model::id::{AuditoriumId, ReservationId, UserId};
use kernel::model::reservation::{
    event::{CreateReservation, UpdateReservation},
    time_ranges_overlap, Reservation, ReservationAuditorium, ReservationState, ReservationUser,
};
use kernel::model::role::Role;
use kernel::model::user::{
    derive_email,
    event::{CreateUser, UpdateUser},
    is_valid_dni, is_valid_university_code, User,
};
use kernel::repository::auditorium::AuditoriumRepository;
use kernel::repository::reservation::ReservationRepository;
use kernel::repository::user::UserRepository;
use shared::error::{AppError, AppResult};

#[derive(Debug, Clone)]
struct AuditoriumRecord {
    auditorium_id: AuditoriumId,
    name: String,
    capacity: i32,
    description: Option<String>,
    location: Option<String>,
    is_active: bool,
    image_key: Option<String>,
    video_key: Option<String>,
}

#[derive(Debug, Clone)]
struct UserRecord {
    user_id: UserId,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    dni: String,
    university_code: String,
    role: Role,
    cycle: Option<i32>,
    group: Option<String>,
    program: Option<String>,
}

#[derive(Debug, Clone)]
struct ReservationRecord {
    reservation_id: ReservationId,
    auditorium_id: AuditoriumId,
    user_id: UserId,
    reservation_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    reason: Option<String>,
    state: ReservationState,
    observations: Option<String>,
}

#[derive(Default)]
struct Tables {
    auditoriums: Vec<AuditoriumRecord>,
    users: Vec<UserRecord>,
    reservations: Vec<ReservationRecord>,
}

impl Tables {
    // LEFT JOIN 相当。参照先が消えていれば None のまま返す
    fn project(&self, record: &ReservationRecord) -> Reservation {
        let auditorium = self
            .auditoriums
            .iter()
            .find(|a| a.auditorium_id == record.auditorium_id)
            .map(|a| ReservationAuditorium {
                auditorium_id: a.auditorium_id,
                name: a.name.clone(),
                capacity: a.capacity,
                location: a.location.clone(),
            });
        let user = self
            .users
            .iter()
            .find(|u| u.user_id == record.user_id)
            .map(|u| ReservationUser {
                user_id: u.user_id,
                email: u.email.clone(),
                first_name: u.first_name.clone(),
                last_name: u.last_name.clone(),
                role: u.role,
            });
        Reservation {
            reservation_id: record.reservation_id,
            reservation_date: record.reservation_date,
            start_time: record.start_time,
            end_time: record.end_time,
            reason: record.reason.clone(),
            state: record.state,
            observations: record.observations.clone(),
            auditorium,
            user,
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDb(Arc<Mutex<Tables>>);

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(new)]
pub struct InMemoryAuditoriumRepository {
    db: InMemoryDb,
}

#[async_trait]
impl AuditoriumRepository for InMemoryAuditoriumRepository {
    async fn create(&self, event: CreateAuditorium) -> AppResult<AuditoriumId> {
        if event.capacity <= 0 {
            return Err(AppError::UnprocessableEntity(
                "定員は 1 以上でなければなりません。".into(),
            ));
        }

        let mut tables = self.db.lock();
        if tables.auditoriums.iter().any(|a| a.name == event.name) {
            return Err(AppError::UnprocessableEntity(format!(
                "同名の講堂がすでに存在します: {}",
                event.name
            )));
        }

        let auditorium_id = AuditoriumId::new();
        tables.auditoriums.push(AuditoriumRecord {
            auditorium_id,
            name: event.name,
            capacity: event.capacity,
            description: event.description,
            location: event.location,
            is_active: event.is_active,
            image_key: None,
            video_key: None,
        });
        Ok(auditorium_id)
    }

    async fn find_all(&self) -> AppResult<Vec<Auditorium>> {
        let tables = self.db.lock();
        Ok(tables.auditoriums.iter().map(to_auditorium).collect())
    }

    async fn find_active(&self) -> AppResult<Vec<Auditorium>> {
        let tables = self.db.lock();
        Ok(tables
            .auditoriums
            .iter()
            .filter(|a| a.is_active)
            .map(to_auditorium)
            .collect())
    }

    async fn find_by_id(&self, auditorium_id: AuditoriumId) -> AppResult<Option<Auditorium>> {
        let tables = self.db.lock();
        Ok(tables
            .auditoriums
            .iter()
            .find(|a| a.auditorium_id == auditorium_id)
            .map(to_auditorium))
    }

    async fn update(&self, event: UpdateAuditorium) -> AppResult<()> {
        if event.capacity <= 0 {
            return Err(AppError::UnprocessableEntity(
                "定員は 1 以上でなければなりません。".into(),
            ));
        }

        let mut tables = self.db.lock();
        let record = tables
            .auditoriums
            .iter_mut()
            .find(|a| a.auditorium_id == event.auditorium_id)
            .ok_or_else(|| {
                AppError::EntityNotFound("指定された講堂が見つかりませんでした。".into())
            })?;
        record.name = event.name;
        record.capacity = event.capacity;
        record.description = event.description;
        record.location = event.location;
        record.is_active = event.is_active;
        Ok(())
    }

    async fn delete(&self, auditorium_id: AuditoriumId) -> AppResult<()> {
        let mut tables = self.db.lock();
        if tables
            .reservations
            .iter()
            .any(|r| r.auditorium_id == auditorium_id)
        {
            return Err(AppError::UnprocessableEntity(format!(
                "講堂（{auditorium_id}）には予約が残っているため削除できません。"
            )));
        }
        let before = tables.auditoriums.len();
        tables
            .auditoriums
            .retain(|a| a.auditorium_id != auditorium_id);
        if tables.auditoriums.len() == before {
            return Err(AppError::EntityNotFound(
                "指定された講堂が見つかりませんでした。".into(),
            ));
        }
        Ok(())
    }
}

fn to_auditorium(record: &AuditoriumRecord) -> Auditorium {
    Auditorium {
        auditorium_id: record.auditorium_id,
        name: record.name.clone(),
        capacity: record.capacity,
        description: record.description.clone(),
        location: record.location.clone(),
        is_active: record.is_active,
        image_key: record.image_key.clone(),
        video_key: record.video_key.clone(),
    }
}

#[derive(new)]
pub struct InMemoryUserRepository {
    db: InMemoryDb,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
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

        // ロック前にハッシュ化を済ませる
        let password_hash = bcrypt::hash(&event.dni, bcrypt::DEFAULT_COST)?;

        let mut tables = self.db.lock();
        if tables.users.iter().any(|u| u.dni == event.dni) {
            return Err(AppError::UnprocessableEntity(
                "この DNI はすでに登録されています。".into(),
            ));
        }
        if tables
            .users
            .iter()
            .any(|u| u.university_code == event.university_code)
        {
            return Err(AppError::UnprocessableEntity(
                "この大学コードはすでに登録されています。".into(),
            ));
        }

        let email = match &event.email {
            Some(email) if !email.is_empty() => email.clone(),
            _ => derive_email(&event.first_name, &event.last_name),
        };
        if tables.users.iter().any(|u| u.email == email) {
            return Err(AppError::UnprocessableEntity(
                "このメールアドレスはすでに登録されています。".into(),
            ));
        }

        let user_id = UserId::new();
        tables.users.push(UserRecord {
            user_id,
            email: email.clone(),
            first_name: event.first_name.clone(),
            last_name: event.last_name.clone(),
            password_hash,
            dni: event.dni.clone(),
            university_code: event.university_code.clone(),
            role: event.role,
            cycle: event.cycle,
            group: event.group.clone(),
            program: event.program.clone(),
        });

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
        let tables = self.db.lock();
        Ok(tables.users.iter().map(to_user).collect())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        let tables = self.db.lock();
        Ok(tables
            .users
            .iter()
            .find(|u| u.user_id == user_id)
            .map(to_user))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.db.lock();
        Ok(tables.users.iter().find(|u| u.email == email).map(to_user))
    }

    async fn find_password_hash_by_email(&self, email: &str) -> AppResult<Option<String>> {
        let tables = self.db.lock();
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.password_hash.clone()))
    }

    async fn update(&self, event: UpdateUser) -> AppResult<()> {
        let password_hash = match &event.password {
            Some(password) if !password.is_empty() => {
                Some(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
            }
            _ => None,
        };

        let mut tables = self.db.lock();
        let record = tables
            .users
            .iter_mut()
            .find(|u| u.user_id == event.user_id)
            .ok_or_else(|| {
                AppError::EntityNotFound("指定されたユーザーが見つかりませんでした。".into())
            })?;
        record.first_name = event.first_name;
        record.last_name = event.last_name;
        if let Some(hash) = password_hash {
            record.password_hash = hash;
        }
        if let Some(role) = event.role {
            record.role = role;
        }
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        let mut tables = self.db.lock();
        let before = tables.users.len();
        tables.users.retain(|u| u.user_id != user_id);
        if tables.users.len() == before {
            return Err(AppError::EntityNotFound(
                "指定されたユーザーが見つかりませんでした。".into(),
            ));
        }
        Ok(())
    }
}

fn to_user(record: &UserRecord) -> User {
    User {
        user_id: record.user_id,
        email: record.email.clone(),
        first_name: record.first_name.clone(),
        last_name: record.last_name.clone(),
        dni: record.dni.clone(),
        university_code: record.university_code.clone(),
        role: record.role,
        cycle: record.cycle,
        group: record.group.clone(),
        program: record.program.clone(),
    }
}

#[derive(new)]
pub struct InMemoryReservationRepository {
    db: InMemoryDb,
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn create(&self, event: CreateReservation) -> AppResult<ReservationId> {
        // Postgres 実装の SERIALIZABLE トランザクションに相当する区間。
        // チェックと追加が終わるまでロックを手放さない
        let mut tables = self.db.lock();

        // ① 講堂の存在確認
        if !tables
            .auditoriums
            .iter()
            .any(|a| a.auditorium_id == event.auditorium_id)
        {
            return Err(AppError::EntityNotFound(format!(
                "講堂（{}）が見つかりませんでした。",
                event.auditorium_id
            )));
        }

        // ② ユーザーの存在確認
        if !tables.users.iter().any(|u| u.user_id == event.user_id) {
            return Err(AppError::EntityNotFound(format!(
                "ユーザー（{}）が見つかりませんでした。",
                event.user_id
            )));
        }

        // ③ 同じ日・同じ講堂の生きている予約との重複確認
        let conflict = tables.reservations.iter().any(|r| {
            r.auditorium_id == event.auditorium_id
                && r.reservation_date == event.reservation_date
                && r.state.is_live()
                && time_ranges_overlap(r.start_time, r.end_time, event.start_time, event.end_time)
        });
        if conflict {
            return Err(AppError::SlotConflict(format!(
                "講堂（{}）は指定時間帯にすでに予約が存在します。",
                event.auditorium_id
            )));
        }

        // ④ 終了時刻 > 開始時刻
        if !event.has_valid_time_range() {
            return Err(AppError::InvalidTimeRange(
                "終了時刻は開始時刻より後でなければなりません。".into(),
            ));
        }

        // ⑤ 過去日付でないこと
        if event.is_before(Local::now().date_naive()) {
            return Err(AppError::PastDate("過去の日付には予約できません。".into()));
        }

        let reservation_id = ReservationId::new();
        tables.reservations.push(ReservationRecord {
            reservation_id,
            auditorium_id: event.auditorium_id,
            user_id: event.user_id,
            reservation_date: event.reservation_date,
            start_time: event.start_time,
            end_time: event.end_time,
            reason: event.reason,
            state: event.state.unwrap_or_default(),
            observations: None,
        });
        Ok(reservation_id)
    }

    async fn update(&self, event: UpdateReservation) -> AppResult<()> {
        let mut tables = self.db.lock();
        let record = tables
            .reservations
            .iter_mut()
            .find(|r| r.reservation_id == event.reservation_id)
            .ok_or_else(|| {
                AppError::EntityNotFound("指定された予約が見つかりませんでした。".into())
            })?;
        record.reservation_date = event.reservation_date;
        record.start_time = event.start_time;
        record.end_time = event.end_time;
        record.reason = event.reason;
        record.observations = event.observations;
        if let Some(state) = event.state {
            record.state = state;
        }
        Ok(())
    }

    async fn update_state(
        &self,
        reservation_id: ReservationId,
        state: ReservationState,
    ) -> AppResult<()> {
        let mut tables = self.db.lock();
        let record = tables
            .reservations
            .iter_mut()
            .find(|r| r.reservation_id == reservation_id)
            .ok_or_else(|| {
                AppError::EntityNotFound("指定された予約が見つかりませんでした。".into())
            })?;
        record.state = state;
        Ok(())
    }

    async fn update_observations(
        &self,
        reservation_id: ReservationId,
        observations: String,
    ) -> AppResult<()> {
        let mut tables = self.db.lock();
        let record = tables
            .reservations
            .iter_mut()
            .find(|r| r.reservation_id == reservation_id)
            .ok_or_else(|| {
                AppError::EntityNotFound("指定された予約が見つかりませんでした。".into())
            })?;
        record.observations = Some(observations);
        Ok(())
    }

    async fn find_all(&self) -> AppResult<Vec<Reservation>> {
        let tables = self.db.lock();
        Ok(tables
            .reservations
            .iter()
            .map(|r| tables.project(r))
            .collect())
    }

    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Option<Reservation>> {
        let tables = self.db.lock();
        Ok(tables
            .reservations
            .iter()
            .find(|r| r.reservation_id == reservation_id)
            .map(|r| tables.project(r)))
    }

    async fn find_by_state(&self, state: ReservationState) -> AppResult<Vec<Reservation>> {
        let tables = self.db.lock();
        Ok(tables
            .reservations
            .iter()
            .filter(|r| r.state == state)
            .map(|r| tables.project(r))
            .collect())
    }

    async fn find_by_role(&self, role: Role) -> AppResult<Vec<Reservation>> {
        let tables = self.db.lock();
        Ok(tables
            .reservations
            .iter()
            .map(|r| tables.project(r))
            .filter(|r| r.user.as_ref().map(|u| u.role) == Some(role))
            .collect())
    }

    async fn find_by_auditorium_id(
        &self,
        auditorium_id: AuditoriumId,
    ) -> AppResult<Vec<Reservation>> {
        let tables = self.db.lock();
        Ok(tables
            .reservations
            .iter()
            .filter(|r| r.auditorium_id == auditorium_id)
            .map(|r| tables.project(r))
            .collect())
    }

    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Reservation>> {
        let tables = self.db.lock();
        if !tables.users.iter().any(|u| u.user_id == user_id) {
            return Ok(Vec::new());
        }
        Ok(tables
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| tables.project(r))
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

    async fn find_by_auditorium_id_and_date(
        &self,
        auditorium_id: AuditoriumId,
        date: NaiveDate,
    ) -> AppResult<Vec<Reservation>> {
        let tables = self.db.lock();
        let mut reservations: Vec<Reservation> = tables
            .reservations
            .iter()
            .filter(|r| r.auditorium_id == auditorium_id && r.reservation_date == date)
            .map(|r| tables.project(r))
            .collect();
        reservations.sort_by_key(|r| r.start_time);
        Ok(reservations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // 今日を基準に未来の日付を返す
    fn future_date(days: u64) -> NaiveDate {
        Local::now()
            .date_naive()
            .checked_add_days(Days::new(days))
            .unwrap()
    }

    struct Fixture {
        db: InMemoryDb,
        auditoriums: InMemoryAuditoriumRepository,
        users: InMemoryUserRepository,
        reservations: InMemoryReservationRepository,
    }

    fn fixture() -> Fixture {
        let db = InMemoryDb::new();
        Fixture {
            auditoriums: InMemoryAuditoriumRepository::new(db.clone()),
            users: InMemoryUserRepository::new(db.clone()),
            reservations: InMemoryReservationRepository::new(db.clone()),
            db,
        }
    }

    async fn register_auditorium(f: &Fixture, name: &str) -> AuditoriumId {
        f.auditoriums
            .create(CreateAuditorium::new(
                name.into(),
                120,
                Some("テスト用".into()),
                Some("本館 1F".into()),
                true,
            ))
            .await
            .unwrap()
    }

    async fn register_user(f: &Fixture, first: &str, last: &str, dni: &str, code: &str) -> UserId {
        f.users
            .create(CreateUser::new(
                None,
                first.into(),
                last.into(),
                dni.into(),
                code.into(),
                Role::Estudiante,
                Some(3),
                Some("1".into()),
                Some("Ingeniería de Sistemas".into()),
            ))
            .await
            .unwrap()
            .user_id
    }

    fn proposal(
        auditorium_id: AuditoriumId,
        user_id: UserId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> CreateReservation {
        CreateReservation::new(
            auditorium_id,
            user_id,
            date,
            start,
            end,
            Some("clase de repaso".into()),
            None,
        )
    }

    #[tokio::test]
    async fn create_rejects_unknown_auditorium_before_other_checks() {
        let f = fixture();
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;

        // 時間帯も不正だが、講堂の存在チェックが先に効く
        let err = f
            .reservations
            .create(proposal(
                AuditoriumId::new(),
                user_id,
                future_date(1),
                t(11, 0),
                t(10, 0),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EntityNotFound(_)));
    }

    #[tokio::test]
    async fn create_rejects_unknown_user() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;

        let err = f
            .reservations
            .create(proposal(
                auditorium_id,
                UserId::new(),
                future_date(1),
                t(10, 0),
                t(11, 0),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EntityNotFound(_)));
    }

    #[tokio::test]
    async fn overlapping_live_reservation_is_rejected() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        let date = future_date(7);

        let first = f
            .reservations
            .create(proposal(auditorium_id, user_id, date, t(10, 30), t(11, 30)))
            .await
            .unwrap();

        // [10:00, 11:00) は [10:30, 11:30) と重なる
        let err = f
            .reservations
            .create(proposal(auditorium_id, user_id, date, t(10, 0), t(11, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SlotConflict(_)));

        // 既存予約を RECHAZADA にすれば同じ時間帯を取れる
        f.reservations
            .update_state(first, ReservationState::Rechazada)
            .await
            .unwrap();
        f.reservations
            .create(proposal(auditorium_id, user_id, date, t(10, 0), t(11, 0)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_reservation_does_not_block_the_slot() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        let date = future_date(7);

        let first = f
            .reservations
            .create(proposal(auditorium_id, user_id, date, t(10, 0), t(12, 0)))
            .await
            .unwrap();
        f.reservations.cancel(first).await.unwrap();

        f.reservations
            .create(proposal(auditorium_id, user_id, date, t(10, 0), t(12, 0)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn back_to_back_reservations_do_not_conflict() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        let date = future_date(7);

        f.reservations
            .create(proposal(auditorium_id, user_id, date, t(9, 0), t(10, 0)))
            .await
            .unwrap();
        f.reservations
            .create(proposal(auditorium_id, user_id, date, t(10, 0), t(11, 0)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn same_slot_on_another_auditorium_or_day_is_free() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let other_id = register_auditorium(&f, "Auditorio Norte").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        let date = future_date(7);

        f.reservations
            .create(proposal(auditorium_id, user_id, date, t(10, 0), t(11, 0)))
            .await
            .unwrap();
        f.reservations
            .create(proposal(other_id, user_id, date, t(10, 0), t(11, 0)))
            .await
            .unwrap();
        f.reservations
            .create(proposal(
                auditorium_id,
                user_id,
                future_date(8),
                t(10, 0),
                t(11, 0),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_or_reversed_time_range_is_rejected() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;

        let err = f
            .reservations
            .create(proposal(
                auditorium_id,
                user_id,
                future_date(1),
                t(10, 0),
                t(10, 0),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTimeRange(_)));

        let err = f
            .reservations
            .create(proposal(
                auditorium_id,
                user_id,
                future_date(1),
                t(11, 0),
                t(10, 0),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTimeRange(_)));
    }

    #[tokio::test]
    async fn past_date_is_rejected() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;

        let yesterday = Local::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap();
        let err = f
            .reservations
            .create(proposal(auditorium_id, user_id, yesterday, t(10, 0), t(11, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PastDate(_)));
    }

    #[tokio::test]
    async fn caller_supplied_initial_state_is_kept() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;

        let mut event = proposal(auditorium_id, user_id, future_date(1), t(10, 0), t(11, 0));
        event.state = Some(ReservationState::Aprobada);
        let id = f.reservations.create(event).await.unwrap();

        let found = f.reservations.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.state, ReservationState::Aprobada);
    }

    #[tokio::test]
    async fn transitions_are_not_restricted_to_forward_order() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        let id = f
            .reservations
            .create(proposal(
                auditorium_id,
                user_id,
                future_date(1),
                t(10, 0),
                t(11, 0),
            ))
            .await
            .unwrap();

        f.reservations
            .update_state(id, ReservationState::Aprobada)
            .await
            .unwrap();
        // 承認済みからの却下も許される
        f.reservations
            .update_state(id, ReservationState::Rechazada)
            .await
            .unwrap();
        f.reservations
            .update_observations(id, "horario no disponible".into())
            .await
            .unwrap();

        let found = f.reservations.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.state, ReservationState::Rechazada);
        assert_eq!(found.observations.as_deref(), Some("horario no disponible"));
    }

    #[tokio::test]
    async fn transition_on_unknown_reservation_fails() {
        let f = fixture();
        let err = f
            .reservations
            .update_state(ReservationId::new(), ReservationState::Aprobada)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EntityNotFound(_)));
    }

    #[tokio::test]
    async fn cancel_keeps_the_record() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        let id = f
            .reservations
            .create(proposal(
                auditorium_id,
                user_id,
                future_date(1),
                t(10, 0),
                t(11, 0),
            ))
            .await
            .unwrap();

        f.reservations.cancel(id).await.unwrap();

        let by_auditorium = f
            .reservations
            .find_by_auditorium_id(auditorium_id)
            .await
            .unwrap();
        assert_eq!(by_auditorium.len(), 1);
        assert_eq!(by_auditorium[0].state, ReservationState::Cancelada);
    }

    #[tokio::test]
    async fn full_update_replaces_fields() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        let id = f
            .reservations
            .create(proposal(
                auditorium_id,
                user_id,
                future_date(1),
                t(10, 0),
                t(11, 0),
            ))
            .await
            .unwrap();

        f.reservations
            .update(UpdateReservation::new(
                id,
                future_date(2),
                t(14, 0),
                t(16, 0),
                Some("ensayo general".into()),
                Some("confirmar equipo de sonido".into()),
                Some(ReservationState::Pendiente),
            ))
            .await
            .unwrap();

        let found = f.reservations.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.reservation_date, future_date(2));
        assert_eq!(found.start_time, t(14, 0));
        assert_eq!(found.end_time, t(16, 0));
        assert_eq!(found.reason.as_deref(), Some("ensayo general"));
        assert_eq!(found.state, ReservationState::Pendiente);
    }

    #[tokio::test]
    async fn live_reservations_for_a_day_never_overlap() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        let date = future_date(7);

        // 成否はどうあれ、生きている予約同士は重ならないこと
        let attempts = [
            (t(9, 0), t(10, 0)),
            (t(9, 30), t(10, 30)),
            (t(10, 0), t(11, 0)),
            (t(10, 30), t(12, 0)),
            (t(11, 0), t(12, 0)),
            (t(8, 0), t(12, 0)),
        ];
        for (start, end) in attempts {
            let _ = f
                .reservations
                .create(proposal(auditorium_id, user_id, date, start, end))
                .await;
        }

        let live: Vec<Reservation> = f
            .reservations
            .find_by_auditorium_id_and_date(auditorium_id, date)
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.state.is_live())
            .collect();
        assert!(!live.is_empty());
        for (i, a) in live.iter().enumerate() {
            for b in live.iter().skip(i + 1) {
                assert!(!time_ranges_overlap(
                    a.start_time,
                    a.end_time,
                    b.start_time,
                    b.end_time
                ));
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_creation_admits_exactly_one_winner() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        let date = future_date(7);

        let repo = Arc::new(InMemoryReservationRepository::new(f.db.clone()));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.create(proposal(auditorium_id, user_id, date, t(10, 0), t(11, 0)))
                    .await
            }));
        }

        let mut ok = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(AppError::SlotConflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn queries_filter_by_state_and_role() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let student = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        let professor = f
            .users
            .create(CreateUser::new(
                None,
                "Ana".into(),
                "Quispe".into(),
                "87654321".into(),
                "201810456".into(),
                Role::Profesor,
                None,
                None,
                None,
            ))
            .await
            .unwrap()
            .user_id;
        let date = future_date(7);

        let first = f
            .reservations
            .create(proposal(auditorium_id, student, date, t(9, 0), t(10, 0)))
            .await
            .unwrap();
        f.reservations
            .create(proposal(auditorium_id, professor, date, t(10, 0), t(11, 0)))
            .await
            .unwrap();
        f.reservations
            .update_state(first, ReservationState::Aprobada)
            .await
            .unwrap();

        let approved = f
            .reservations
            .find_by_state(ReservationState::Aprobada)
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].reservation_id, first);

        let by_professor = f.reservations.find_by_role(Role::Profesor).await.unwrap();
        assert_eq!(by_professor.len(), 1);
        assert_eq!(
            by_professor[0].user.as_ref().map(|u| u.user_id),
            Some(professor)
        );

        assert_eq!(f.reservations.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn find_by_user_excludes_unresolvable_references() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        f.reservations
            .create(proposal(
                auditorium_id,
                user_id,
                future_date(1),
                t(10, 0),
                t(11, 0),
            ))
            .await
            .unwrap();

        // 講堂レコードだけが失われた壊れた状態を作る
        f.db.lock().auditoriums.clear();

        let listed = f.reservations.find_by_user_id(user_id).await.unwrap();
        assert!(listed.is_empty());

        // 一覧側は落とさず、参照だけ欠けた形で返す
        let all = f.reservations.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].auditorium.is_none());
        assert!(all[0].user.is_some());
    }

    #[tokio::test]
    async fn find_by_unknown_user_returns_empty_list() {
        let f = fixture();
        let listed = f.reservations.find_by_user_id(UserId::new()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn auditorium_names_are_unique() {
        let f = fixture();
        register_auditorium(&f, "Auditorio Central").await;
        let err = f
            .auditoriums
            .create(CreateAuditorium::new(
                "Auditorio Central".into(),
                80,
                None,
                None,
                true,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }

    #[tokio::test]
    async fn auditorium_with_reservations_cannot_be_deleted() {
        let f = fixture();
        let auditorium_id = register_auditorium(&f, "Auditorio Central").await;
        let user_id = register_user(&f, "David", "Romero", "12345678", "202210123").await;
        f.reservations
            .create(proposal(
                auditorium_id,
                user_id,
                future_date(1),
                t(10, 0),
                t(11, 0),
            ))
            .await
            .unwrap();

        let err = f.auditoriums.delete(auditorium_id).await.unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }

    #[tokio::test]
    async fn user_registration_derives_email_and_checks_uniqueness() {
        let f = fixture();
        let user = f
            .users
            .create(CreateUser::new(
                None,
                "María".into(),
                "Ñáñez".into(),
                "11223344".into(),
                "202010111".into(),
                Role::Estudiante,
                Some(1),
                Some("Unico".into()),
                Some("Derecho".into()),
            ))
            .await
            .unwrap();
        assert_eq!(user.email, "maria.nanez");

        // DNI の重複は拒否される
        let err = f
            .users
            .create(CreateUser::new(
                None,
                "Mario".into(),
                "Nanez".into(),
                "11223344".into(),
                "202010112".into(),
                Role::Estudiante,
                None,
                None,
                None,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }

    #[tokio::test]
    async fn stored_password_hash_verifies_against_dni() {
        let f = fixture();
        register_user(&f, "David", "Romero", "12345678", "202210123").await;

        let hash = f
            .users
            .find_password_hash_by_email("david.romero")
            .await
            .unwrap()
            .unwrap();
        assert!(bcrypt::verify("12345678", &hash).unwrap());
        assert!(!bcrypt::verify("00000000", &hash).unwrap());
    }
}
