use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Calendar dates are always `YYYY-MM-DD`, no timezone.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Slot times are always 24h `HH:MM`.
pub const TIME_FORMAT: &str = "%H:%M";

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Serde adapter keeping slot times as `HH:MM` strings in persisted JSON.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

// ── Business hours ───────────────────────────────────────────────

/// Opening hours and slot granularity. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub open_hour: u32,
    /// Exclusive: no slot starts at or after this hour.
    pub close_hour: u32,
    pub lunch_start_hour: u32,
    /// Exclusive end of the lunch break.
    pub lunch_end_hour: u32,
    pub slot_minutes: u32,
    pub closed_weekday: Weekday,
}

impl BusinessHours {
    pub const fn standard() -> Self {
        Self {
            open_hour: 9,
            close_hour: 18,
            lunch_start_hour: 13,
            lunch_end_hour: 14,
            slot_minutes: 45,
            closed_weekday: Weekday::Sun,
        }
    }

    pub fn is_closed_on(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        date.weekday() == self.closed_weekday
    }

    pub fn is_lunch_hour(&self, hour: u32) -> bool {
        self.lunch_start_hour <= hour && hour < self.lunch_end_hour
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self::standard()
    }
}

// ── Bookings ─────────────────────────────────────────────────────

/// A committed reservation of one slot. Persisted as part of the whole
/// booking list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl Booking {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Same slot as `(date, time)`.
    pub fn occupies(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.date == date && self.time == time
    }
}

/// Mutable fields submitted by the booking form or the edit modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub name: String,
    pub email: String,
    pub service: Option<String>,
}

// ── Gallery ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageCategory {
    Hair,
    Beard,
    Other,
}

impl ImageCategory {
    pub const ALL: [ImageCategory; 3] = [ImageCategory::Hair, ImageCategory::Beard, ImageCategory::Other];
}

impl fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImageCategory::Hair => "Hair",
            ImageCategory::Beard => "Beard",
            ImageCategory::Other => "Other",
        };
        f.write_str(s)
    }
}

impl FromStr for ImageCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hair" => Ok(ImageCategory::Hair),
            "beard" => Ok(ImageCategory::Beard),
            "other" => Ok(ImageCategory::Other),
            other => Err(format!("unknown image category: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: String,
    pub src: String,
    pub alt: String,
    pub category: ImageCategory,
}

/// Images shown when nothing has been stored yet (or the stored blob is unreadable).
pub fn default_gallery() -> Vec<GalleryImage> {
    let seed = [
        ("placeholder1", "haircut1", "Modern Haircut Example", ImageCategory::Hair),
        ("placeholder2", "shave2", "Classic Shave Example", ImageCategory::Other),
        ("placeholder3", "beard3", "Stylish Beard Trim", ImageCategory::Beard),
        ("placeholder4", "haircut2", "Fade Haircut", ImageCategory::Hair),
        ("placeholder5", "beardtrim2", "Long Beard Styling", ImageCategory::Beard),
    ];
    seed.into_iter()
        .map(|(id, photo, alt, category)| GalleryImage {
            id: id.into(),
            src: format!("https://picsum.photos/seed/{photo}/300/200"),
            alt: alt.into(),
            category,
        })
        .collect()
}

// ── Events ───────────────────────────────────────────────────────

/// Committed state changes, broadcast after they are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Event {
    BookingCreated(Booking),
    BookingUpdated(Booking),
    BookingDeleted { id: String },
    ImageAdded(GalleryImage),
    ImageDeleted { id: String },
    AdminLoggedIn,
    AdminLoggedOut,
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStatus {
    pub time: NaiveTime,
    pub booked: bool,
}

/// What the slot picker shows for one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayAvailability {
    Closed,
    Past,
    Open(Vec<SlotStatus>),
}

impl DayAvailability {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            DayAvailability::Closed => Some("We are closed on Sundays. Please select another day."),
            DayAvailability::Past => {
                Some("Please select a current or future date to see available slots.")
            }
            DayAvailability::Open(slots) if slots.is_empty() => Some(
                "No slots available for this date. This could be due to it being fully booked, a past date, or outside business hours.",
            ),
            DayAvailability::Open(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dashboard {
    pub total_bookings: usize,
    pub total_gallery_images: usize,
}
