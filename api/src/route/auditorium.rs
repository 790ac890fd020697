use axum::{
    routing::{delete, get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::auditorium::{
    delete_auditorium, register_auditorium, show_active_auditorium_list, show_auditorium,
    show_auditorium_list, update_auditorium,
};

pub fn build_auditorium_routers() -> Router<AppRegistry> {
    let auditoriums_routers = Router::new()
        .route("/", post(register_auditorium))
        .route("/", get(show_auditorium_list))
        .route("/active", get(show_active_auditorium_list))
        .route("/:auditorium_id", get(show_auditorium))
        .route("/:auditorium_id", put(update_auditorium))
        .route("/:auditorium_id", delete(delete_auditorium));

    Router::new().nest("/auditoriums", auditoriums_routers)
}
