pub mod analytics;
pub mod booking;
pub mod calendar;
pub mod class;
pub mod health;
pub mod session;
