use super::{
    auditorium::build_auditorium_routers, auth, reservation::build_reservation_routers,
    user::build_user_routers,
};
use axum::Router;
use registry::AppRegistry;

pub fn routes() -> Router<AppRegistry> {
    let router = Router::new()
        .merge(build_auditorium_routers())
        .merge(build_reservation_routers())
        .merge(build_user_routers())
        .merge(auth::routes());
    Router::new().nest("/api", router)
}
