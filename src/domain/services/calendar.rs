use crate::domain::models::{booking::Booking, class_definition::ClassDefinition, session::Session};
use icalendar::{Calendar, Component, Event as IcalEvent, EventLike};

/// Generates an iCalendar (.ics) string for a confirmed booking
pub fn generate_ics(class: &ClassDefinition, session: &Session, booking: &Booking) -> String {
    let mut calendar = Calendar::new();

    let mut ical_event = IcalEvent::new();
    ical_event
        .summary(&class.name)
        .description(&class.description)
        .starts(session.start_time)
        .ends(session.end_time)
        .uid(&booking.id);
    if !session.location.is_empty() {
        ical_event.location(&session.location);
    }

    calendar.push(ical_event.done());
    calendar.to_string()
}
