pub mod analytics;
pub mod booking;
pub mod calendar;
pub mod calendar_sync;
pub mod capacity;
pub mod notification;
