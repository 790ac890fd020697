use chrono::{NaiveDate, NaiveTime};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::{AuditoriumId, ReservationId, UserId},
    reservation::{
        event::{CreateReservation, UpdateReservation},
        Reservation, ReservationAuditorium, ReservationState, ReservationUser,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStateName {
    Solicitada,
    Pendiente,
    Aprobada,
    Rechazada,
    Cancelada,
}

impl From<ReservationState> for ReservationStateName {
    fn from(value: ReservationState) -> Self {
        match value {
            ReservationState::Solicitada => Self::Solicitada,
            ReservationState::Pendiente => Self::Pendiente,
            ReservationState::Aprobada => Self::Aprobada,
            ReservationState::Rechazada => Self::Rechazada,
            ReservationState::Cancelada => Self::Cancelada,
        }
    }
}

impl From<ReservationStateName> for ReservationState {
    fn from(value: ReservationStateName) -> Self {
        match value {
            ReservationStateName::Solicitada => Self::Solicitada,
            ReservationStateName::Pendiente => Self::Pendiente,
            ReservationStateName::Aprobada => Self::Aprobada,
            ReservationStateName::Rechazada => Self::Rechazada,
            ReservationStateName::Cancelada => Self::Cancelada,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[garde(skip)]
    pub auditorium_id: AuditoriumId,
    #[garde(skip)]
    pub user_id: UserId,
    #[garde(skip)]
    pub reservation_date: NaiveDate,
    #[garde(skip)]
    pub start_time: NaiveTime,
    #[garde(skip)]
    pub end_time: NaiveTime,
    #[garde(skip)]
    pub reason: Option<String>,
    // 指定がなければ SOLICITADA になる
    #[garde(skip)]
    pub state: Option<ReservationStateName>,
}

impl From<CreateReservationRequest> for CreateReservation {
    fn from(value: CreateReservationRequest) -> Self {
        let CreateReservationRequest {
            auditorium_id,
            user_id,
            reservation_date,
            start_time,
            end_time,
            reason,
            state,
        } = value;
        CreateReservation {
            auditorium_id,
            user_id,
            reservation_date,
            start_time,
            end_time,
            reason,
            state: state.map(ReservationState::from),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReservationRequest {
    #[garde(skip)]
    pub reservation_date: NaiveDate,
    #[garde(skip)]
    pub start_time: NaiveTime,
    #[garde(skip)]
    pub end_time: NaiveTime,
    #[garde(skip)]
    pub reason: Option<String>,
    #[garde(skip)]
    pub observations: Option<String>,
    #[garde(skip)]
    pub state: Option<ReservationStateName>,
}

#[derive(new)]
pub struct UpdateReservationRequestWithId(ReservationId, UpdateReservationRequest);

impl From<UpdateReservationRequestWithId> for UpdateReservation {
    fn from(value: UpdateReservationRequestWithId) -> Self {
        let UpdateReservationRequestWithId(
            reservation_id,
            UpdateReservationRequest {
                reservation_date,
                start_time,
                end_time,
                reason,
                observations,
                state,
            },
        ) = value;
        UpdateReservation {
            reservation_id,
            reservation_date,
            start_time,
            end_time,
            reason,
            observations,
            state: state.map(ReservationState::from),
        }
    }
}

// 状態絞り込みで使うクエリ
#[derive(Debug, Deserialize)]
pub struct ReservationStateQuery {
    pub value: ReservationStateName,
}

// 管理側の状態変更で使うクエリ。却下時は備考を添えられる
#[derive(Debug, Deserialize)]
pub struct UpdateReservationStateQuery {
    pub value: ReservationStateName,
    pub observations: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationsResponse {
    pub items: Vec<ReservationResponse>,
}

impl From<Vec<Reservation>> for ReservationsResponse {
    fn from(value: Vec<Reservation>) -> Self {
        Self {
            items: value.into_iter().map(ReservationResponse::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub reservation_id: ReservationId,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
    pub state: ReservationStateName,
    pub observations: Option<String>,
    pub auditorium: Option<ReservationAuditoriumResponse>,
    pub user: Option<ReservationUserResponse>,
}

impl From<Reservation> for ReservationResponse {
    fn from(value: Reservation) -> Self {
        let Reservation {
            reservation_id,
            reservation_date,
            start_time,
            end_time,
            reason,
            state,
            observations,
            auditorium,
            user,
        } = value;
        Self {
            reservation_id,
            reservation_date,
            start_time,
            end_time,
            reason,
            state: state.into(),
            observations,
            auditorium: auditorium.map(ReservationAuditoriumResponse::from),
            user: user.map(ReservationUserResponse::from),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationAuditoriumResponse {
    pub auditorium_id: AuditoriumId,
    pub name: String,
    pub capacity: i32,
    pub location: Option<String>,
}

impl From<ReservationAuditorium> for ReservationAuditoriumResponse {
    fn from(value: ReservationAuditorium) -> Self {
        let ReservationAuditorium {
            auditorium_id,
            name,
            capacity,
            location,
        } = value;
        Self {
            auditorium_id,
            name,
            capacity,
            location,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationUserResponse {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    // ロールは文字列で出す
    pub role: String,
}

impl From<ReservationUser> for ReservationUserResponse {
    fn from(value: ReservationUser) -> Self {
        let ReservationUser {
            user_id,
            email,
            first_name,
            last_name,
            role,
        } = value;
        Self {
            user_id,
            email,
            first_name,
            last_name,
            role: role.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::model::role::Role;

    fn sample_reservation() -> Reservation {
        Reservation {
            reservation_id: ReservationId::new(),
            reservation_date: NaiveDate::from_ymd_opt(2030, 4, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            reason: Some("clase magistral".into()),
            state: ReservationState::Solicitada,
            observations: None,
            auditorium: Some(ReservationAuditorium {
                auditorium_id: AuditoriumId::new(),
                name: "Auditorio Central".into(),
                capacity: 120,
                location: Some("Pabellón A".into()),
            }),
            user: Some(ReservationUser {
                user_id: UserId::new(),
                email: "david.romero".into(),
                first_name: "David".into(),
                last_name: "Romero".into(),
                role: Role::Estudiante,
            }),
        }
    }

    #[test]
    fn response_flattens_references_and_never_carries_credentials() {
        let response = ReservationResponse::from(sample_reservation());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["state"], "SOLICITADA");
        assert_eq!(json["auditorium"]["name"], "Auditorio Central");
        assert_eq!(json["auditorium"]["capacity"], 120);
        assert_eq!(json["user"]["email"], "david.romero");
        assert_eq!(json["user"]["role"], "ESTUDIANTE");

        // パスワード類はどの形でも出さない
        let raw = json.to_string();
        assert!(!raw.contains("password"));
        assert!(!raw.contains("passwordHash"));
    }

    #[test]
    fn missing_references_project_as_null() {
        let mut reservation = sample_reservation();
        reservation.auditorium = None;
        reservation.user = None;

        let json = serde_json::to_value(ReservationResponse::from(reservation)).unwrap();
        assert!(json["auditorium"].is_null());
        assert!(json["user"].is_null());
    }

    #[test]
    fn create_request_accepts_camel_case_payload() {
        let payload = format!(
            r#"{{
                "auditoriumId": "{}",
                "userId": "{}",
                "reservationDate": "2030-04-01",
                "startTime": "10:00:00",
                "endTime": "11:00:00",
                "reason": "ensayo",
                "state": "PENDIENTE"
            }}"#,
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4(),
        );
        let req: CreateReservationRequest = serde_json::from_str(&payload).unwrap();
        assert_eq!(req.state, Some(ReservationStateName::Pendiente));

        let event = CreateReservation::from(req);
        assert_eq!(event.state, Some(ReservationState::Pendiente));
        assert!(event.has_valid_time_range());
    }
}
