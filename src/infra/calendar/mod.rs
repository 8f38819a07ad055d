pub mod google_calendar_provider;
