pub mod auditorium;
pub mod reservation;
pub mod user;
