pub mod cache;
pub mod calendar;
pub mod email;
pub mod factory;
pub mod repositories;
