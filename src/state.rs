use std::sync::Arc;
use std::time::Duration;
use chrono_tz::Tz;
use tera::Tera;

use crate::config::Config;
use crate::domain::ports::{
    AnalyticsRepository, BookingRepository, CalendarConnectionRepository, CalendarProvider,
    ClassRepository, EmailService, SessionRepository,
};
use crate::domain::services::{
    analytics::AnalyticsService,
    booking::BookingService,
    calendar_sync::CalendarSyncService,
    notification::{BookingNotifier, CUSTOMER_TEMPLATE, OPERATOR_TEMPLATE},
};
use crate::error::AppError;
use crate::infra::cache::report_cache::ReportCache;

/// Adapters the application is assembled from.
pub struct Ports {
    pub class_repo: Arc<dyn ClassRepository>,
    pub session_repo: Arc<dyn SessionRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub analytics_repo: Arc<dyn AnalyticsRepository>,
    pub connection_repo: Arc<dyn CalendarConnectionRepository>,
    pub email_service: Arc<dyn EmailService>,
    pub calendar_provider: Arc<dyn CalendarProvider>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub timezone: Tz,
    pub class_repo: Arc<dyn ClassRepository>,
    pub session_repo: Arc<dyn SessionRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub booking_service: Arc<BookingService>,
    pub calendar_sync: Arc<CalendarSyncService>,
    pub analytics: Arc<AnalyticsService>,
    pub report_cache: Arc<ReportCache>,
}

impl AppState {
    pub fn new(config: Config, ports: Ports) -> Result<Self, AppError> {
        let timezone: Tz = config.timezone.parse()
            .map_err(|_| AppError::InternalWithMsg(format!("Unknown timezone: {}", config.timezone)))?;

        let mut tera = Tera::default();
        tera.add_raw_template(CUSTOMER_TEMPLATE, include_str!("templates/confirmation.txt"))
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to load confirmation template: {}", e)))?;
        tera.add_raw_template(OPERATOR_TEMPLATE, include_str!("templates/operator_notification.txt"))
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to load operator template: {}", e)))?;

        let notifier = BookingNotifier::new(
            ports.email_service,
            Arc::new(tera),
            config.operator_email.clone(),
            timezone,
        );
        let booking_service = BookingService::new(
            ports.session_repo.clone(),
            ports.class_repo.clone(),
            ports.booking_repo.clone(),
            notifier,
        );
        let calendar_sync = CalendarSyncService::new(
            ports.class_repo.clone(),
            ports.session_repo.clone(),
            ports.connection_repo,
            ports.calendar_provider,
            config.match_policy,
        );
        let analytics = AnalyticsService::new(ports.analytics_repo, timezone);
        let report_cache = ReportCache::new(Duration::from_secs(config.analytics_cache_ttl_secs));

        Ok(Self {
            config,
            timezone,
            class_repo: ports.class_repo,
            session_repo: ports.session_repo,
            booking_repo: ports.booking_repo,
            booking_service: Arc::new(booking_service),
            calendar_sync: Arc::new(calendar_sync),
            analytics: Arc::new(analytics),
            report_cache: Arc::new(report_cache),
        })
    }
}
