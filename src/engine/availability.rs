use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::*;

use super::slots::generate_slots;

// ── Availability filter ───────────────────────────────────────────

/// Flag each slot of `date` as booked iff some booking other than
/// `exclude_id` sits on exactly that (date, time).
pub fn mark_booked(
    date: NaiveDate,
    slots: &[NaiveTime],
    bookings: &[Booking],
    exclude_id: Option<&str>,
) -> Vec<SlotStatus> {
    slots
        .iter()
        .map(|&time| SlotStatus {
            time,
            booked: is_taken(bookings, date, time, exclude_id),
        })
        .collect()
}

/// True if a booking other than `exclude_id` occupies (date, time).
pub fn is_taken(bookings: &[Booking], date: NaiveDate, time: NaiveTime, exclude_id: Option<&str>) -> bool {
    bookings
        .iter()
        .any(|b| b.occupies(date, time) && Some(b.id.as_str()) != exclude_id)
}

/// Unbooked slots for `date`, in order.
pub fn free_slots(
    hours: &BusinessHours,
    date: NaiveDate,
    bookings: &[Booking],
    exclude_id: Option<&str>,
    now: NaiveDateTime,
) -> Vec<NaiveTime> {
    let slots = generate_slots(hours, date, now);
    mark_booked(date, &slots, bookings, exclude_id)
        .into_iter()
        .filter(|s| !s.booked)
        .map(|s| s.time)
        .collect()
}

/// Slot picker view of a date: closed, past, or the flagged slot list.
pub fn day_availability(
    hours: &BusinessHours,
    date: NaiveDate,
    bookings: &[Booking],
    exclude_id: Option<&str>,
    now: NaiveDateTime,
) -> DayAvailability {
    if date < now.date() {
        return DayAvailability::Past;
    }
    if hours.is_closed_on(date) {
        return DayAvailability::Closed;
    }
    let slots = generate_slots(hours, date, now);
    DayAvailability::Open(mark_booked(date, &slots, bookings, exclude_id))
}

/// Time the edit form should show after its date changes: keep `current`
/// while it is still free for `date`, otherwise fall back to the first
/// free slot.
pub fn suggest_edit_time(
    hours: &BusinessHours,
    booking_id: &str,
    date: NaiveDate,
    current: Option<NaiveTime>,
    bookings: &[Booking],
    now: NaiveDateTime,
) -> Option<NaiveTime> {
    let free = free_slots(hours, date, bookings, Some(booking_id), now);
    match current {
        Some(t) if free.contains(&t) => Some(t),
        _ => free.first().copied(),
    }
}
