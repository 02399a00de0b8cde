mod availability;
mod error;
mod mutations;
mod queries;
mod slots;
mod validate;
#[cfg(test)]
mod tests;

pub use availability::{day_availability, free_slots, is_taken, mark_booked, suggest_edit_time};
pub use error::EngineError;
pub use slots::{default_booking_date, generate_slots, is_bookable};
pub use validate::{Rejection, check_booking, check_contact, check_image, fresh_id, is_valid_email, validate_new_booking};

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDateTime;
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::AdminCredentials;
use crate::model::*;
use crate::notify::NotifyHub;
use crate::store::{self, ADMIN_KEY, BOOKINGS_KEY, GALLERY_KEY, KeyValueStore};

/// Current local wall-clock time, no timezone.
pub fn now_local() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Everything the shop keeps between requests.
#[derive(Debug, Clone, Default)]
pub struct ShopState {
    pub bookings: Vec<Booking>,
    pub gallery: Vec<GalleryImage>,
    pub is_admin: bool,
}

/// Application controller: owns the booking and gallery lists plus the
/// admin flag, and is the only writer of the stores behind them.
///
/// Mutations hold the state write lock across validate → persist → apply,
/// so a failed store write leaves memory untouched.
pub struct Engine {
    hours: BusinessHours,
    admin: AdminCredentials,
    pub(super) state: RwLock<ShopState>,
    store: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    pub notify: Arc<NotifyHub>,
}

impl Engine {
    /// Load state from `store` (durable lists) and `session` (admin flag).
    /// Missing or unreadable blobs fall back to defaults.
    pub async fn open(
        hours: BusinessHours,
        admin: AdminCredentials,
        store: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        notify: Arc<NotifyHub>,
    ) -> Self {
        let bookings: Vec<Booking> = store::load_json_or(store.as_ref(), BOOKINGS_KEY, Vec::new).await;
        let gallery: Vec<GalleryImage> = store::load_json_or(store.as_ref(), GALLERY_KEY, default_gallery).await;
        let is_admin = matches!(session.get(ADMIN_KEY).await, Ok(Some(ref v)) if v == "true");

        info!(
            "loaded {} bookings, {} gallery images (admin session: {is_admin})",
            bookings.len(),
            gallery.len()
        );
        metrics::gauge!(crate::observability::GALLERY_IMAGES).set(gallery.len() as f64);

        Self {
            hours,
            admin,
            state: RwLock::new(ShopState { bookings, gallery, is_admin }),
            store,
            session,
            notify,
        }
    }

    pub fn hours(&self) -> &BusinessHours {
        &self.hours
    }

    pub async fn is_admin(&self) -> bool {
        self.state.read().await.is_admin
    }

    /// Snapshot of the whole state.
    pub async fn snapshot(&self) -> ShopState {
        self.state.read().await.clone()
    }

    pub(super) fn require_admin(state: &ShopState) -> Result<(), EngineError> {
        if state.is_admin {
            Ok(())
        } else {
            Err(EngineError::Unauthorized)
        }
    }

    /// Rewrite one whole list under `key`.
    pub(super) async fn persist<T: serde::Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), EngineError> {
        let started = Instant::now();
        let result = store::save_json(self.store.as_ref(), key, value).await;
        metrics::histogram!(crate::observability::STORE_WRITE_DURATION_SECONDS, "key" => key.to_string())
            .record(started.elapsed().as_secs_f64());
        result.map_err(|e| {
            tracing::error!("failed to save {key}: {e}");
            EngineError::Store(e.to_string())
        })
    }

    pub(super) async fn persist_admin_flag(&self, is_admin: bool) -> Result<(), EngineError> {
        let value = if is_admin { "true" } else { "false" };
        self.session
            .put(ADMIN_KEY, value)
            .await
            .map_err(|e| EngineError::Store(e.to_string()))
    }

    pub(super) fn credentials(&self) -> &AdminCredentials {
        &self.admin
    }
}
