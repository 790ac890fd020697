use crate::model::id::{AuditoriumId, ReservationId, UserId};
use crate::model::role::Role;
use chrono::{NaiveDate, NaiveTime};
use strum::{AsRefStr, Display, EnumString};

pub mod event;

// 予約の状態。RECHAZADA / CANCELADA は他の予約の妨げにならない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationState {
    #[default]
    Solicitada,
    Pendiente,
    Aprobada,
    Rechazada,
    Cancelada,
}

impl ReservationState {
    // 重複チェックの対象になる状態かどうか
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            ReservationState::Solicitada
                | ReservationState::Pendiente
                | ReservationState::Aprobada
        )
    }
}

// [a_start, a_end) と [b_start, b_end) の重なり判定。
// 半開区間なので、端が接しているだけの予約は重ならない
pub fn time_ranges_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

#[derive(Debug)]
pub struct Reservation {
    pub reservation_id: ReservationId,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
    pub state: ReservationState,
    pub observations: Option<String>,
    // 参照先が失われている場合は None のまま返す
    pub auditorium: Option<ReservationAuditorium>,
    pub user: Option<ReservationUser>,
}

#[derive(Debug)]
pub struct ReservationAuditorium {
    pub auditorium_id: AuditoriumId,
    pub name: String,
    pub capacity: i32,
    pub location: Option<String>,
}

#[derive(Debug)]
pub struct ReservationUser {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn overlapping_ranges_are_detected() {
        // [10:00, 11:00) と [10:30, 11:30)
        assert!(time_ranges_overlap(t(10, 0), t(11, 0), t(10, 30), t(11, 30)));
        // 包含
        assert!(time_ranges_overlap(t(9, 0), t(12, 0), t(10, 0), t(11, 0)));
        // 同一区間
        assert!(time_ranges_overlap(t(10, 0), t(11, 0), t(10, 0), t(11, 0)));
    }

    #[test]
    fn back_to_back_ranges_do_not_overlap() {
        // [09:00, 10:00) と [10:00, 11:00) は連続するが重ならない
        assert!(!time_ranges_overlap(t(9, 0), t(10, 0), t(10, 0), t(11, 0)));
        assert!(!time_ranges_overlap(t(10, 0), t(11, 0), t(9, 0), t(10, 0)));
    }

    #[test]
    fn disjoint_ranges_do_not_overlap() {
        assert!(!time_ranges_overlap(t(8, 0), t(9, 0), t(13, 0), t(14, 0)));
    }

    #[test]
    fn live_states_participate_in_conflicts() {
        assert!(ReservationState::Solicitada.is_live());
        assert!(ReservationState::Pendiente.is_live());
        assert!(ReservationState::Aprobada.is_live());
        assert!(!ReservationState::Rechazada.is_live());
        assert!(!ReservationState::Cancelada.is_live());
    }

    #[test]
    fn states_round_trip_through_wire_names() {
        let s: ReservationState = "SOLICITADA".parse().unwrap();
        assert_eq!(s, ReservationState::Solicitada);
        assert_eq!(ReservationState::Cancelada.to_string(), "CANCELADA");
        assert!("INVALIDA".parse::<ReservationState>().is_err());
    }
}
