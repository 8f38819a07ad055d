pub mod report_cache;
