use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use kernel::model::{
    id::{AuditoriumId, ReservationId, UserId},
    reservation::{Reservation, ReservationAuditorium, ReservationState, ReservationUser},
    role::Role,
};
use shared::error::AppError;

// 講堂・ユーザーを LEFT JOIN した一覧取得用の型。
// 参照先が消えている場合は結合カラムがすべて NULL になる
#[derive(sqlx::FromRow)]
pub struct ReservationRow {
    pub reservation_id: ReservationId,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
    pub state: String,
    pub observations: Option<String>,
    pub auditorium_id: Option<AuditoriumId>,
    pub auditorium_name: Option<String>,
    pub auditorium_capacity: Option<i32>,
    pub auditorium_location: Option<String>,
    pub user_id: Option<UserId>,
    pub user_email: Option<String>,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
    pub user_role: Option<String>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = AppError;

    fn try_from(value: ReservationRow) -> Result<Self, Self::Error> {
        let ReservationRow {
            reservation_id,
            reservation_date,
            start_time,
            end_time,
            reason,
            state,
            observations,
            auditorium_id,
            auditorium_name,
            auditorium_capacity,
            auditorium_location,
            user_id,
            user_email,
            user_first_name,
            user_last_name,
            user_role,
        } = value;

        let state = ReservationState::from_str(&state)
            .map_err(|e| AppError::ConversionEntityError(e.to_string()))?;

        let auditorium = match (auditorium_id, auditorium_name, auditorium_capacity) {
            (Some(auditorium_id), Some(name), Some(capacity)) => Some(ReservationAuditorium {
                auditorium_id,
                name,
                capacity,
                location: auditorium_location,
            }),
            _ => None,
        };

        let user = match (user_id, user_email, user_first_name, user_last_name, user_role) {
            (Some(user_id), Some(email), Some(first_name), Some(last_name), Some(role)) => {
                let role = Role::from_str(&role)
                    .map_err(|e| AppError::ConversionEntityError(e.to_string()))?;
                Some(ReservationUser {
                    user_id,
                    email,
                    first_name,
                    last_name,
                    role,
                })
            }
            _ => None,
        };

        Ok(Reservation {
            reservation_id,
            reservation_date,
            start_time,
            end_time,
            reason,
            state,
            observations,
            auditorium,
            user,
        })
    }
}
