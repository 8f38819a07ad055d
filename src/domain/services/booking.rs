use std::sync::{Arc, LazyLock};
use regex::Regex;
use tracing::{info, warn};

use crate::domain::models::{
    booking::{Booking, NewBookingParams},
    class_definition::ClassDefinition,
    session::Session,
};
use crate::domain::ports::{BookingRepository, ClassRepository, SessionRepository};
use crate::domain::services::capacity::CapacityLedger;
use crate::domain::services::notification::BookingNotifier;
use crate::error::AppError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

pub struct BookingRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone)]
pub struct BookingConfirmation {
    pub booking: Booking,
    pub session: Session,
    pub class: ClassDefinition,
}

pub struct BookingService {
    ledger: CapacityLedger,
    session_repo: Arc<dyn SessionRepository>,
    class_repo: Arc<dyn ClassRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    notifier: BookingNotifier,
}

impl BookingService {
    pub fn new(
        session_repo: Arc<dyn SessionRepository>,
        class_repo: Arc<dyn ClassRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        notifier: BookingNotifier,
    ) -> Self {
        Self {
            ledger: CapacityLedger::new(session_repo.clone(), booking_repo.clone()),
            session_repo,
            class_repo,
            booking_repo,
            notifier,
        }
    }

    pub fn ledger(&self) -> &CapacityLedger {
        &self.ledger
    }

    /// Validates, checks capacity and duplicates, persists, then notifies.
    ///
    /// Notification is best effort: delivery failures are logged and the
    /// booking is still reported as confirmed.
    pub async fn submit_booking(&self, session_id: &str, request: BookingRequest) -> Result<BookingConfirmation, AppError> {
        let request = validate_booking_request(request)?;

        let session = self.session_repo.find_by_id(session_id).await?
            .ok_or(AppError::NotFound("Session not found".into()))?;

        if !self.ledger.has_capacity(session_id).await? {
            return Err(AppError::SessionFull);
        }
        if self.ledger.is_already_booked(session_id, &request.customer_email).await? {
            return Err(AppError::DuplicateBooking);
        }

        let class = self.class_repo.find_by_id(&session.class_id).await?
            .ok_or(AppError::NotFound("Class not found".into()))?;

        let booking = Booking::new(NewBookingParams {
            session_id: session.id.clone(),
            name: request.customer_name,
            email: request.customer_email,
            phone: request.customer_phone,
        });

        let created = match self.booking_repo.create_confirmed(&booking).await {
            Ok(created) => created,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Booking rejected at commit");
                return Err(e);
            }
        };
        info!(booking_id = %created.id, session_id = %session.id, "Booking confirmed");

        let confirmation = BookingConfirmation { booking: created, session, class };
        self.notifier.notify_booking(&confirmation).await;

        Ok(confirmation)
    }
}

fn validate_booking_request(request: BookingRequest) -> Result<BookingRequest, AppError> {
    let customer_name = request.customer_name.trim().to_string();
    let customer_email = request.customer_email.trim().to_string();
    let customer_phone = request.customer_phone.trim().to_string();

    if customer_name.is_empty() || customer_email.is_empty() || customer_phone.is_empty() {
        return Err(AppError::Validation("Please fill in all required fields.".into()));
    }
    if !is_valid_email(&customer_email) {
        return Err(AppError::Validation("Please enter a valid email address.".into()));
    }

    Ok(BookingRequest { customer_name, customer_email, customer_phone })
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}
