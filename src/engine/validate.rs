use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use thiserror::Error;
use ulid::Ulid;
use url::Url;

use crate::limits::*;
use crate::model::*;

use super::availability::is_taken;
use super::slots::is_bookable;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

/// Why a submission was turned down. `Display` is the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Name and Email cannot be empty.")]
    MissingContact,
    #[error("Invalid email format.")]
    InvalidEmail,
    #[error("Bookings are not available on Sundays.")]
    ClosedDay,
    #[error("Cannot book on a past date.")]
    PastDate,
    #[error("The selected time slot is invalid (e.g., outside hours, lunch break).")]
    InvalidSlot,
    #[error("This time slot is already booked by another appointment.")]
    SlotTaken,
    #[error("{0} is too long.")]
    TooLong(&'static str),
    #[error("Please provide image URL, description, and category.")]
    MissingImageFields,
    #[error("Please enter a valid image URL.")]
    InvalidImageUrl,
}

impl Rejection {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::MissingContact => "missing_contact",
            Rejection::InvalidEmail => "invalid_email",
            Rejection::ClosedDay => "closed_day",
            Rejection::PastDate => "past_date",
            Rejection::InvalidSlot => "invalid_slot",
            Rejection::SlotTaken => "slot_taken",
            Rejection::TooLong(_) => "too_long",
            Rejection::MissingImageFields => "missing_image_fields",
            Rejection::InvalidImageUrl => "invalid_image_url",
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Trim and check contact fields. Returns `(name, email, service)`.
pub fn check_contact(
    name: &str,
    email: &str,
    service: Option<&str>,
) -> Result<(String, String, Option<String>), Rejection> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(Rejection::MissingContact);
    }
    if !is_valid_email(email) {
        return Err(Rejection::InvalidEmail);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Rejection::TooLong("Name"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(Rejection::TooLong("Email"));
    }
    let service = service.map(str::trim).filter(|s| !s.is_empty());
    if service.is_some_and(|s| s.len() > MAX_SERVICE_LEN) {
        return Err(Rejection::TooLong("Service"));
    }
    Ok((name.to_string(), email.to_string(), service.map(str::to_string)))
}

/// Decide whether `req` may become a committed booking. `exclude_id` is the
/// booking being edited, so it never collides with itself.
///
/// Returns the request with trimmed fields on success.
pub fn check_booking(
    hours: &BusinessHours,
    req: &BookingRequest,
    bookings: &[Booking],
    exclude_id: Option<&str>,
    now: NaiveDateTime,
) -> Result<BookingRequest, Rejection> {
    let (name, email, service) = check_contact(&req.name, &req.email, req.service.as_deref())?;

    if hours.is_closed_on(req.date) {
        return Err(Rejection::ClosedDay);
    }
    if req.date < now.date() {
        return Err(Rejection::PastDate);
    }
    if !is_bookable(hours, req.date, req.time, now) {
        return Err(Rejection::InvalidSlot);
    }
    if is_taken(bookings, req.date, req.time, exclude_id) {
        return Err(Rejection::SlotTaken);
    }

    Ok(BookingRequest {
        date: req.date,
        time: req.time,
        name,
        email,
        service,
    })
}

/// Validate a fresh submission and mint its booking.
pub fn validate_new_booking(
    hours: &BusinessHours,
    req: &BookingRequest,
    bookings: &[Booking],
    now: NaiveDateTime,
) -> Result<Booking, Rejection> {
    let req = check_booking(hours, req, bookings, None, now)?;
    Ok(Booking {
        id: fresh_id(|id| bookings.iter().any(|b| b.id == id)),
        date: req.date,
        time: req.time,
        name: req.name,
        email: req.email,
        service: req.service,
    })
}

/// Trim and check a new gallery image. Returns `(src, alt)`.
pub fn check_image(src: &str, alt: &str) -> Result<(String, String), Rejection> {
    let src = src.trim();
    let alt = alt.trim();
    if src.is_empty() || alt.is_empty() {
        return Err(Rejection::MissingImageFields);
    }
    if src.len() > MAX_IMAGE_URL_LEN {
        return Err(Rejection::TooLong("Image URL"));
    }
    if alt.len() > MAX_IMAGE_ALT_LEN {
        return Err(Rejection::TooLong("Image description"));
    }
    Url::parse(src).map_err(|_| Rejection::InvalidImageUrl)?;
    Ok((src.to_string(), alt.to_string()))
}

/// Timestamp-prefixed random id that `taken` does not already know.
pub fn fresh_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = Ulid::new().to_string();
        if !taken(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    const HOURS: BusinessHours = BusinessHours::standard();

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        parse_time(s).unwrap()
    }

    fn now() -> NaiveDateTime {
        date("2025-06-01").and_time(time("08:00"))
    }

    fn request(d: &str, t: &str, name: &str, email: &str) -> BookingRequest {
        BookingRequest {
            date: date(d),
            time: time(t),
            name: name.into(),
            email: email.into(),
            service: None,
        }
    }

    fn booking(id: &str, d: &str, t: &str) -> Booking {
        Booking {
            id: id.into(),
            date: date(d),
            time: time(t),
            name: "Taken".into(),
            email: "taken@example.com".into(),
            service: None,
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a b@c d"));
    }

    #[test]
    fn rejects_blank_contact() {
        let r = request("2025-06-10", "09:00", "   ", "a@b.com");
        assert_eq!(check_booking(&HOURS, &r, &[], None, now()), Err(Rejection::MissingContact));
        let r = request("2025-06-10", "09:00", "Ann", " ");
        assert_eq!(check_booking(&HOURS, &r, &[], None, now()), Err(Rejection::MissingContact));
    }

    #[test]
    fn rejects_malformed_email() {
        let r = request("2025-06-10", "09:00", "Ann", "a@b");
        assert_eq!(check_booking(&HOURS, &r, &[], None, now()), Err(Rejection::InvalidEmail));
    }

    #[test]
    fn rejects_closed_and_past_days() {
        let r = request("2025-06-08", "09:00", "Ann", "a@b.com");
        assert_eq!(check_booking(&HOURS, &r, &[], None, now()), Err(Rejection::ClosedDay));
        let r = request("2025-05-30", "09:00", "Ann", "a@b.com");
        assert_eq!(check_booking(&HOURS, &r, &[], None, now()), Err(Rejection::PastDate));
    }

    #[test]
    fn rejects_times_off_the_grid() {
        for t in ["08:00", "13:00", "13:45", "18:00", "09:30"] {
            let r = request("2025-06-10", t, "Ann", "a@b.com");
            assert_eq!(
                check_booking(&HOURS, &r, &[], None, now()),
                Err(Rejection::InvalidSlot),
                "{t} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_elapsed_slot_today() {
        let now = date("2025-06-10").and_time(time("12:10"));
        let r = request("2025-06-10", "12:00", "Ann", "a@b.com");
        assert_eq!(check_booking(&HOURS, &r, &[], None, now), Err(Rejection::InvalidSlot));
    }

    #[test]
    fn rejects_taken_slot_but_not_self() {
        let existing = vec![booking("x", "2025-06-10", "10:45")];
        let r = request("2025-06-10", "10:45", "Ann", "a@b.com");
        assert_eq!(check_booking(&HOURS, &r, &existing, None, now()), Err(Rejection::SlotTaken));
        assert!(check_booking(&HOURS, &r, &existing, Some("x"), now()).is_ok());
    }

    #[test]
    fn same_input_fails_the_same_way() {
        let r = request("2025-06-10", "13:00", "Ann", "a@b.com");
        let first = check_booking(&HOURS, &r, &[], None, now());
        let second = check_booking(&HOURS, &r, &[], None, now());
        assert_eq!(first, second);
    }

    #[test]
    fn new_booking_trims_and_gets_fresh_id() {
        let existing = vec![booking("x", "2025-06-10", "10:45")];
        let mut r = request("2025-06-10", "11:00", "  Ann  ", " ann@example.com ");
        r.service = Some("  ".into());
        let b = validate_new_booking(&HOURS, &r, &existing, now()).unwrap();
        assert_eq!(b.name, "Ann");
        assert_eq!(b.email, "ann@example.com");
        assert_eq!(b.service, None);
        assert_ne!(b.id, "x");
        assert!(!b.id.is_empty());
    }

    #[test]
    fn long_name_rejected() {
        let r = request("2025-06-10", "11:00", &"n".repeat(MAX_NAME_LEN + 1), "a@b.com");
        assert_eq!(check_booking(&HOURS, &r, &[], None, now()), Err(Rejection::TooLong("Name")));
    }

    #[test]
    fn fresh_id_skips_taken() {
        let first = fresh_id(|_| false);
        let second = fresh_id(|id| id == first);
        assert_ne!(first, second);
    }

    #[test]
    fn image_checks() {
        assert_eq!(check_image(" ", "alt"), Err(Rejection::MissingImageFields));
        assert_eq!(check_image("not a url", "alt"), Err(Rejection::InvalidImageUrl));
        let (src, alt) = check_image(" https://example.com/a.jpg ", " Fade ").unwrap();
        assert_eq!(src, "https://example.com/a.jpg");
        assert_eq!(alt, "Fade");
    }
}
