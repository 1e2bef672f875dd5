use chrono::{NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{Booking, BookingStatus, Customer, Service, Staff};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `%name%` for a `LIKE ... ESCAPE '\'` match, with the name's own
/// wildcards taken literally.
fn contains_pattern(name: &str) -> String {
    let escaped = name
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Customers ──

pub fn get_or_create_customer(conn: &Connection, phone: &str) -> anyhow::Result<Customer> {
    if let Some(customer) = find_customer_by_phone(conn, phone)? {
        tracing::debug!(customer_id = customer.id, "found existing customer");
        return Ok(customer);
    }

    tracing::info!(phone, "creating new customer");
    let now = Utc::now().naive_utc().format(DATETIME_FORMAT).to_string();
    conn.execute(
        "INSERT INTO customers (phone_number, created_at) VALUES (?1, ?2)
         ON CONFLICT(phone_number) DO NOTHING",
        params![phone, now],
    )?;

    find_customer_by_phone(conn, phone)?
        .ok_or_else(|| anyhow::anyhow!("customer {phone} missing after insert"))
}

pub fn find_customer_by_phone(conn: &Connection, phone: &str) -> anyhow::Result<Option<Customer>> {
    let customer = conn
        .query_row(
            "SELECT id, phone_number, full_name, created_at FROM customers WHERE phone_number = ?1",
            params![phone],
            |row| {
                let created_at: String = row.get(3)?;
                Ok(Customer {
                    id: row.get(0)?,
                    phone_number: row.get(1)?,
                    full_name: row.get(2)?,
                    created_at: parse_datetime(&created_at),
                })
            },
        )
        .optional()?;
    Ok(customer)
}

// ── Catalogue ──

/// Case-insensitive substring match; the first registered service wins.
pub fn find_service_by_name(conn: &Connection, name: &str) -> anyhow::Result<Option<Service>> {
    let service = conn
        .query_row(
            "SELECT id, name, duration_minutes, price FROM services
             WHERE name LIKE ?1 ESCAPE '\\' ORDER BY id LIMIT 1",
            params![contains_pattern(name)],
            |row| {
                Ok(Service {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    duration_minutes: row.get(2)?,
                    price: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(service)
}

pub fn find_staff_by_name(conn: &Connection, name: &str) -> anyhow::Result<Option<Staff>> {
    let staff = conn
        .query_row(
            "SELECT id, name FROM staff WHERE name LIKE ?1 ESCAPE '\\' ORDER BY id LIMIT 1",
            params![contains_pattern(name)],
            |row| {
                Ok(Staff {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(staff)
}

// ── Bookings ──

pub fn insert_booking(
    conn: &Connection,
    customer_id: i64,
    staff_id: i64,
    service_id: i64,
    start_time: &NaiveDateTime,
    end_time: &NaiveDateTime,
    status: &BookingStatus,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO bookings (customer_id, staff_id, service_id, start_time, end_time, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            customer_id,
            staff_id,
            service_id,
            start_time.format(DATETIME_FORMAT).to_string(),
            end_time.format(DATETIME_FORMAT).to_string(),
            status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_bookings_for_customer(conn: &Connection, customer_id: i64) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, customer_id, staff_id, service_id, start_time, end_time, status
         FROM bookings WHERE customer_id = ?1 ORDER BY start_time ASC",
    )?;

    let rows = stmt.query_map(params![customer_id], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &Row) -> rusqlite::Result<Booking> {
    let start_time: String = row.get(4)?;
    let end_time: String = row.get(5)?;
    let status: String = row.get(6)?;
    Ok(Booking {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        staff_id: row.get(2)?,
        service_id: row.get(3)?,
        start_time: parse_datetime(&start_time),
        end_time: parse_datetime(&end_time),
        status: BookingStatus::parse(&status).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(6, "status".to_string(), Type::Text)
        })?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn test_get_or_create_customer_is_stable() {
        let conn = db::init_db(":memory:").unwrap();
        let first = get_or_create_customer(&conn, "15551234567").unwrap();
        let second = get_or_create_customer(&conn, "15551234567").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.phone_number, "15551234567");
    }

    #[test]
    fn test_find_service_case_insensitive_substring() {
        let conn = db::init_db(":memory:").unwrap();
        let service = find_service_by_name(&conn, "haircut").unwrap().unwrap();
        assert_eq!(service.name, "Men's Haircut");
        assert_eq!(service.duration_minutes, 30);

        assert!(find_service_by_name(&conn, "Manicure").unwrap().is_none());
    }

    #[test]
    fn test_find_staff() {
        let conn = db::init_db(":memory:").unwrap();
        assert_eq!(find_staff_by_name(&conn, "sarah").unwrap().unwrap().name, "Sarah");
        assert!(find_staff_by_name(&conn, "Bob").unwrap().is_none());
    }

    #[test]
    fn test_wildcards_in_names_are_literal() {
        let conn = db::init_db(":memory:").unwrap();
        for name in ["%", "_", "S_rah", "%arah"] {
            assert!(find_staff_by_name(&conn, name).unwrap().is_none(), "{name}");
        }
        assert!(find_service_by_name(&conn, "%").unwrap().is_none());
        assert!(find_service_by_name(&conn, "Men_s").unwrap().is_none());
        assert!(find_service_by_name(&conn, "men's hair").unwrap().is_some());
    }

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern(" Sarah "), "%Sarah%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_insert_and_list_bookings() {
        let conn = db::init_db(":memory:").unwrap();
        let customer = get_or_create_customer(&conn, "15551234567").unwrap();
        let service = find_service_by_name(&conn, "Men's Haircut").unwrap().unwrap();
        let staff = find_staff_by_name(&conn, "Sarah").unwrap().unwrap();

        let start = NaiveDateTime::parse_from_str("2025-08-29 15:00:00", DATETIME_FORMAT).unwrap();
        let end = NaiveDateTime::parse_from_str("2025-08-29 15:30:00", DATETIME_FORMAT).unwrap();
        insert_booking(
            &conn,
            customer.id,
            staff.id,
            service.id,
            &start,
            &end,
            &BookingStatus::Confirmed,
        )
        .unwrap();

        let bookings = get_bookings_for_customer(&conn, customer.id).unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].start_time, start);
        assert_eq!(bookings[0].end_time, end);
        assert_eq!(bookings[0].status, BookingStatus::Confirmed);
    }
}
