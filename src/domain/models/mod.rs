pub mod analytics;
pub mod appointment;
pub mod booking;
pub mod calendar;
pub mod class_definition;
pub mod session;
