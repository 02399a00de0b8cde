use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::*;

use super::availability::{day_availability, suggest_edit_time};
use super::slots::default_booking_date;
use super::{Engine, EngineError};

impl Engine {
    /// Slot picker for the public booking page.
    pub async fn day_view(&self, date: NaiveDate, now: NaiveDateTime) -> DayAvailability {
        let guard = self.state.read().await;
        day_availability(self.hours(), date, &guard.bookings, None, now)
    }

    /// Slot picker inside the edit modal: booking `id` does not block its own slot.
    pub async fn edit_view(&self, id: &str, date: NaiveDate, now: NaiveDateTime) -> Result<DayAvailability, EngineError> {
        let guard = self.state.read().await;
        Self::require_admin(&guard)?;
        if !guard.bookings.iter().any(|b| b.id == id) {
            return Err(EngineError::NotFound(id.to_string()));
        }
        Ok(day_availability(self.hours(), date, &guard.bookings, Some(id), now))
    }

    /// Time the edit modal should preselect after its date changes.
    /// `current` defaults to the booking's stored time.
    pub async fn suggest_edit_time(
        &self,
        id: &str,
        date: NaiveDate,
        current: Option<NaiveTime>,
        now: NaiveDateTime,
    ) -> Result<Option<NaiveTime>, EngineError> {
        let guard = self.state.read().await;
        Self::require_admin(&guard)?;
        let booking = guard
            .bookings
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        let current = current.or(Some(booking.time));
        Ok(suggest_edit_time(self.hours(), id, date, current, &guard.bookings, now))
    }

    pub fn default_booking_date(&self, today: NaiveDate) -> NaiveDate {
        default_booking_date(self.hours(), today)
    }

    pub async fn booking(&self, id: &str) -> Result<Booking, EngineError> {
        let guard = self.state.read().await;
        Self::require_admin(&guard)?;
        guard
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    /// Admin booking table, ordered by appointment start.
    pub async fn bookings_sorted(&self, order: SortOrder) -> Result<Vec<Booking>, EngineError> {
        let guard = self.state.read().await;
        Self::require_admin(&guard)?;
        let mut list = guard.bookings.clone();
        list.sort_by_key(Booking::starts_at);
        if order == SortOrder::Desc {
            list.reverse();
        }
        Ok(list)
    }

    pub async fn dashboard(&self) -> Result<Dashboard, EngineError> {
        let guard = self.state.read().await;
        Self::require_admin(&guard)?;
        Ok(Dashboard {
            total_bookings: guard.bookings.len(),
            total_gallery_images: guard.gallery.len(),
        })
    }

    /// Public gallery, newest first. `None` shows every category.
    pub async fn gallery(&self, filter: Option<ImageCategory>) -> Vec<GalleryImage> {
        let guard = self.state.read().await;
        guard
            .gallery
            .iter()
            .filter(|img| filter.is_none_or(|c| img.category == c))
            .cloned()
            .collect()
    }
}
