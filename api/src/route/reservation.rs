use axum::{
    routing::{delete, get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::reservation::{
    delete_reservation, register_reservation, show_reservation, show_reservation_list,
    show_reservation_list_by_auditorium, show_reservation_list_by_auditorium_and_date,
    show_reservation_list_by_role, show_reservation_list_by_state, show_reservation_list_by_user,
    update_reservation, update_reservation_state,
};

pub fn build_reservation_routers() -> Router<AppRegistry> {
    let reservations_routers = Router::new()
        .route("/", post(register_reservation))
        .route("/", get(show_reservation_list))
        .route("/by-state", get(show_reservation_list_by_state))
        .route("/by-role", get(show_reservation_list_by_role))
        .route("/by-room/:auditorium_id", get(show_reservation_list_by_auditorium))
        .route(
            "/by-room/:auditorium_id/date/:date",
            get(show_reservation_list_by_auditorium_and_date),
        )
        .route("/by-user/:user_id", get(show_reservation_list_by_user))
        .route("/:reservation_id", get(show_reservation))
        .route("/:reservation_id", put(update_reservation))
        .route("/:reservation_id", delete(delete_reservation))
        .route("/:reservation_id/state", put(update_reservation_state));

    Router::new().nest("/reservations", reservations_routers)
}
