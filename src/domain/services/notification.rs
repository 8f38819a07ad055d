use std::sync::Arc;
use chrono_tz::Tz;
use tera::{Context, Tera};
use tracing::{info, warn};

use crate::domain::ports::EmailService;
use crate::domain::services::booking::BookingConfirmation;
use crate::domain::services::calendar::generate_ics;
use crate::error::AppError;

pub const CUSTOMER_TEMPLATE: &str = "confirmation.txt";
pub const OPERATOR_TEMPLATE: &str = "operator_notification.txt";

/// Sends the customer confirmation and the operator notice for a booking.
pub struct BookingNotifier {
    email_service: Arc<dyn EmailService>,
    templates: Arc<Tera>,
    operator_email: String,
    tz: Tz,
}

impl BookingNotifier {
    pub fn new(email_service: Arc<dyn EmailService>, templates: Arc<Tera>, operator_email: String, tz: Tz) -> Self {
        Self { email_service, templates, operator_email, tz }
    }

    /// Attempts both emails; failures are logged and never propagated.
    pub async fn notify_booking(&self, confirmation: &BookingConfirmation) {
        let booking_id = &confirmation.booking.id;

        if let Err(e) = self.send_customer_confirmation(confirmation).await {
            warn!(booking_id = %booking_id, error = %e, "Customer confirmation email not delivered");
        }
        if let Err(e) = self.send_operator_notice(confirmation).await {
            warn!(booking_id = %booking_id, error = %e, "Operator notification email not delivered");
        }
    }

    async fn send_customer_confirmation(&self, confirmation: &BookingConfirmation) -> Result<(), AppError> {
        let ctx = self.build_context(confirmation);
        let body = self.templates.render(CUSTOMER_TEMPLATE, &ctx)
            .map_err(|e| AppError::InternalWithMsg(format!("Template render error: {}", e)))?;
        let subject = format!("Booking Confirmed: {}", confirmation.class.name);
        let ics = generate_ics(&confirmation.class, &confirmation.session, &confirmation.booking);

        self.email_service.send(
            &confirmation.booking.customer_email,
            &subject,
            &body,
            Some("booking.ics"),
            Some(ics.as_bytes()),
        ).await?;

        info!(booking_id = %confirmation.booking.id, "Confirmation email sent");
        Ok(())
    }

    async fn send_operator_notice(&self, confirmation: &BookingConfirmation) -> Result<(), AppError> {
        let ctx = self.build_context(confirmation);
        let body = self.templates.render(OPERATOR_TEMPLATE, &ctx)
            .map_err(|e| AppError::InternalWithMsg(format!("Template render error: {}", e)))?;
        let subject = format!("New Booking: {} - {}", confirmation.class.name, confirmation.booking.customer_name);

        self.email_service.send(&self.operator_email, &subject, &body, None, None).await
    }

    fn build_context(&self, confirmation: &BookingConfirmation) -> Context {
        let start = confirmation.session.start_time.with_timezone(&self.tz);
        let end = confirmation.session.end_time.with_timezone(&self.tz);

        let mut ctx = Context::new();
        ctx.insert("customer_name", &confirmation.booking.customer_name);
        ctx.insert("customer_email", &confirmation.booking.customer_email);
        ctx.insert("customer_phone", &confirmation.booking.customer_phone);
        ctx.insert("class_name", &confirmation.class.name);
        ctx.insert("date", &start.format("%A, %B %-d, %Y").to_string());
        ctx.insert("start_time", &start.format("%-I:%M %p").to_string());
        ctx.insert("end_time", &end.format("%-I:%M %p").to_string());
        if !confirmation.session.location.is_empty() {
            ctx.insert("location", &confirmation.session.location);
        }
        ctx
    }
}
