use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::BusinessHours;

// ── Slot generation ───────────────────────────────────────────────

/// Ordered start times bookable on `date`, ignoring existing bookings.
///
/// Closed weekday and past dates yield nothing. Candidates step by
/// `slot_minutes` inside each hour of `[open_hour, close_hour)`, skipping
/// lunch hours and anything at or after closing. On `now`'s own date,
/// starts strictly before `now` are dropped.
pub fn generate_slots(hours: &BusinessHours, date: NaiveDate, now: NaiveDateTime) -> Vec<NaiveTime> {
    let today = now.date();
    if hours.is_closed_on(date) || date < today || hours.slot_minutes == 0 {
        return Vec::new();
    }

    let closing_minute = hours.close_hour * 60;
    let mut slots = Vec::new();

    for hour in hours.open_hour..hours.close_hour {
        if hours.is_lunch_hour(hour) {
            continue;
        }
        let mut minute = 0;
        while minute < 60 {
            let candidate = hour * 60 + minute;
            minute += hours.slot_minutes;

            if candidate >= closing_minute {
                continue;
            }
            let Some(time) = NaiveTime::from_hms_opt(candidate / 60, candidate % 60, 0) else {
                continue;
            };
            if date == today && date.and_time(time) < now {
                continue;
            }
            slots.push(time);
        }
    }

    slots
}

/// Whether `time` is one of the generated slots for `date`.
pub fn is_bookable(hours: &BusinessHours, date: NaiveDate, time: NaiveTime, now: NaiveDateTime) -> bool {
    generate_slots(hours, date, now).contains(&time)
}

/// Date the booking page opens on: today, or the next day when today is
/// the closed weekday.
pub fn default_booking_date(hours: &BusinessHours, today: NaiveDate) -> NaiveDate {
    if hours.is_closed_on(today) {
        today.checked_add_days(Days::new(1)).unwrap_or(today)
    } else {
        today
    }
}
