pub mod auditorium;
pub mod auth;
pub mod reservation;
pub mod user;
