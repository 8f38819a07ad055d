pub mod sqlite_analytics_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_calendar_connection_repo;
pub mod sqlite_class_repo;
pub mod sqlite_session_repo;

pub mod postgres_analytics_repo;
pub mod postgres_booking_repo;
pub mod postgres_calendar_connection_repo;
pub mod postgres_class_repo;
pub mod postgres_session_repo;
