use crate::model::id::{AuditoriumId, ReservationId, UserId};
use crate::model::reservation::ReservationState;
use chrono::{NaiveDate, NaiveTime};
use derive_new::new;

#[derive(Debug, new)]
pub struct CreateReservation {
    pub auditorium_id: AuditoriumId,
    pub user_id: UserId,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
    // 省略時は SOLICITADA で登録する
    pub state: Option<ReservationState>,
}

impl CreateReservation {
    pub fn has_valid_time_range(&self) -> bool {
        self.end_time > self.start_time
    }

    pub fn is_before(&self, today: NaiveDate) -> bool {
        self.reservation_date < today
    }
}

#[derive(Debug, new)]
pub struct UpdateReservation {
    pub reservation_id: ReservationId,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
    pub observations: Option<String>,
    pub state: Option<ReservationState>,
}
