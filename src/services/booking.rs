use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use rusqlite::Connection;

use crate::db::{self, queries};
use crate::models::BookingStatus;
use crate::services::tools::{BookAppointmentArgs, GetAvailableSlotsArgs};

pub const BOOKING_DETAILS_ERROR: &str =
    "Sorry, there was an error with the booking details. Please try again.";

const STUB_SLOTS: [&str; 3] = ["2:00 PM", "3:00 PM", "4:30 PM"];

/// Domain operations the assistant's tools act on.
///
/// Expected failures (unknown service, unreadable time) come back as `Ok`
/// with a customer-facing message. `Err` is reserved for the unexpected.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn get_available_slots(&self, args: &GetAvailableSlotsArgs) -> anyhow::Result<Vec<String>>;
    async fn book_appointment(&self, args: &BookAppointmentArgs) -> anyhow::Result<String>;
}

pub struct SqliteBookingBackend {
    db: Arc<Mutex<Connection>>,
    booking_date: NaiveDate,
}

impl SqliteBookingBackend {
    pub fn new(db: Arc<Mutex<Connection>>, booking_date: NaiveDate) -> Self {
        Self { db, booking_date }
    }
}

#[async_trait]
impl BookingBackend for SqliteBookingBackend {
    async fn get_available_slots(&self, args: &GetAvailableSlotsArgs) -> anyhow::Result<Vec<String>> {
        tracing::info!(
            service = %args.service_name,
            staff = %args.staff_name,
            date = %args.date_str,
            "checking availability"
        );
        // No schedule data yet: every day offers the same slots.
        Ok(STUB_SLOTS.iter().map(|s| s.to_string()).collect())
    }

    async fn book_appointment(&self, args: &BookAppointmentArgs) -> anyhow::Result<String> {
        tracing::info!(
            phone = %args.customer_phone,
            service = %args.service_name,
            staff = %args.staff_name,
            time = %args.appointment_time_str,
            "attempting to book appointment"
        );

        let mut conn = db::lock(&self.db)?;
        // Dropping without commit rolls back.
        let tx = conn.transaction()?;

        let customer = queries::find_customer_by_phone(&tx, &args.customer_phone)?;
        let service = queries::find_service_by_name(&tx, &args.service_name)?;
        let staff = queries::find_staff_by_name(&tx, &args.staff_name)?;

        let (Some(customer), Some(service), Some(staff)) = (customer, service, staff) else {
            tracing::warn!("could not resolve customer, service or staff for booking");
            return Ok(BOOKING_DETAILS_ERROR.to_string());
        };

        let Some(time) = parse_time(&args.appointment_time_str) else {
            tracing::warn!(time = %args.appointment_time_str, "unparseable appointment time");
            return Ok(format!(
                "Sorry, I couldn't understand the time '{}'. Please use a format like 3:00 PM.",
                args.appointment_time_str
            ));
        };

        let start_time = self.booking_date.and_time(time);
        let end_time = start_time + Duration::minutes(service.duration_minutes);

        let booking_id = queries::insert_booking(
            &tx,
            customer.id,
            staff.id,
            service.id,
            &start_time,
            &end_time,
            &BookingStatus::Confirmed,
        )?;
        tx.commit()?;

        tracing::info!(booking_id, "saved booking");

        Ok(format!(
            "Success! Your {} with {} is booked for {}.",
            args.service_name, args.staff_name, args.appointment_time_str
        ))
    }
}

/// Accepts 12-hour clock times such as `3:00 PM` or `03:00pm`.
fn parse_time(s: &str) -> Option<NaiveTime> {
    let normalized = s.trim().to_uppercase();
    ["%I:%M %p", "%I:%M%p"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&normalized, fmt).ok())
}
