use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::limits::*;
use crate::model::*;
use crate::observability::{self, error_label};
use crate::store::{BOOKINGS_KEY, GALLERY_KEY};

use super::validate::{check_booking, check_image, fresh_id, validate_new_booking};
use super::{Engine, EngineError};

fn record_rejection(err: &EngineError) {
    metrics::counter!(observability::BOOKING_REJECTIONS_TOTAL, "reason" => error_label(err)).increment(1);
}

impl Engine {
    /// Booking flow submission. Open to everyone.
    pub async fn create_booking(&self, req: BookingRequest, now: NaiveDateTime) -> Result<Booking, EngineError> {
        let mut guard = self.state.write().await;
        if guard.bookings.len() >= MAX_BOOKINGS {
            return Err(EngineError::LimitExceeded("too many bookings"));
        }

        let booking = match validate_new_booking(self.hours(), &req, &guard.bookings, now) {
            Ok(b) => b,
            Err(rejection) => {
                warn!("booking rejected for {} {}: {rejection}", req.date, format_time(req.time));
                let err = EngineError::Rejected(rejection);
                record_rejection(&err);
                return Err(err);
            }
        };

        let mut next = guard.bookings.clone();
        next.push(booking.clone());
        self.persist(BOOKINGS_KEY, &next).await?;
        guard.bookings = next;

        info!("booking {} confirmed for {} at {}", booking.id, booking.date, format_time(booking.time));
        metrics::counter!(observability::BOOKINGS_CREATED_TOTAL).increment(1);
        self.notify.send(&Event::BookingCreated(booking.clone()));
        Ok(booking)
    }

    /// Admin edit: replace name, email, date and time of booking `id`.
    /// The booking's own slot never counts as a collision. A `None`
    /// service keeps the stored one.
    pub async fn edit_booking(&self, id: &str, req: BookingRequest, now: NaiveDateTime) -> Result<Booking, EngineError> {
        let mut guard = self.state.write().await;
        Self::require_admin(&guard)?;
        let pos = guard
            .bookings
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;

        let checked = match check_booking(self.hours(), &req, &guard.bookings, Some(id), now) {
            Ok(r) => r,
            Err(rejection) => {
                warn!("edit of booking {id} rejected: {rejection}");
                let err = EngineError::Rejected(rejection);
                record_rejection(&err);
                return Err(err);
            }
        };

        let current = &guard.bookings[pos];
        let updated = Booking {
            id: current.id.clone(),
            date: checked.date,
            time: checked.time,
            name: checked.name,
            email: checked.email,
            service: checked.service.or_else(|| current.service.clone()),
        };

        let mut next = guard.bookings.clone();
        next[pos] = updated.clone();
        self.persist(BOOKINGS_KEY, &next).await?;
        guard.bookings = next;

        info!("booking {id} moved to {} at {}", updated.date, format_time(updated.time));
        metrics::counter!(observability::BOOKINGS_UPDATED_TOTAL).increment(1);
        self.notify.send(&Event::BookingUpdated(updated.clone()));
        Ok(updated)
    }

    pub async fn delete_booking(&self, id: &str) -> Result<(), EngineError> {
        let mut guard = self.state.write().await;
        Self::require_admin(&guard)?;
        if !guard.bookings.iter().any(|b| b.id == id) {
            return Err(EngineError::NotFound(id.to_string()));
        }

        let next: Vec<Booking> = guard.bookings.iter().filter(|b| b.id != id).cloned().collect();
        self.persist(BOOKINGS_KEY, &next).await?;
        guard.bookings = next;

        info!("booking {id} deleted");
        metrics::counter!(observability::BOOKINGS_DELETED_TOTAL).increment(1);
        self.notify.send(&Event::BookingDeleted { id: id.to_string() });
        Ok(())
    }

    /// Add an image at the front of the gallery.
    pub async fn add_gallery_image(
        &self,
        src: &str,
        alt: &str,
        category: ImageCategory,
    ) -> Result<GalleryImage, EngineError> {
        let mut guard = self.state.write().await;
        Self::require_admin(&guard)?;
        if guard.gallery.len() >= MAX_GALLERY_IMAGES {
            return Err(EngineError::LimitExceeded("too many gallery images"));
        }
        let (src, alt) = check_image(src, alt)?;

        let image = GalleryImage {
            id: fresh_id(|id| guard.gallery.iter().any(|img| img.id == id)),
            src,
            alt,
            category,
        };
        let mut next = Vec::with_capacity(guard.gallery.len() + 1);
        next.push(image.clone());
        next.extend(guard.gallery.iter().cloned());
        self.persist(GALLERY_KEY, &next).await?;
        guard.gallery = next;

        info!("gallery image {} added ({})", image.id, image.category);
        metrics::gauge!(observability::GALLERY_IMAGES).set(guard.gallery.len() as f64);
        self.notify.send(&Event::ImageAdded(image.clone()));
        Ok(image)
    }

    pub async fn delete_gallery_image(&self, id: &str) -> Result<(), EngineError> {
        let mut guard = self.state.write().await;
        Self::require_admin(&guard)?;
        if !guard.gallery.iter().any(|img| img.id == id) {
            return Err(EngineError::NotFound(id.to_string()));
        }

        let next: Vec<GalleryImage> = guard.gallery.iter().filter(|img| img.id != id).cloned().collect();
        self.persist(GALLERY_KEY, &next).await?;
        guard.gallery = next;

        info!("gallery image {id} deleted");
        metrics::gauge!(observability::GALLERY_IMAGES).set(guard.gallery.len() as f64);
        self.notify.send(&Event::ImageDeleted { id: id.to_string() });
        Ok(())
    }

    /// Check credentials and set the session flag. A failed attempt with
    /// non-empty input clears the flag.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), EngineError> {
        let mut guard = self.state.write().await;
        match self.credentials().check(email, password) {
            Ok(()) => {
                self.persist_admin_flag(true).await?;
                guard.is_admin = true;
                info!("admin logged in");
                metrics::counter!(observability::ADMIN_LOGINS_TOTAL, "status" => "ok").increment(1);
                self.notify.send(&Event::AdminLoggedIn);
                Ok(())
            }
            Err(err @ crate::auth::LoginError::MissingInput) => Err(err.into()),
            Err(err) => {
                warn!("admin login failed");
                metrics::counter!(observability::ADMIN_LOGINS_TOTAL, "status" => "denied").increment(1);
                if guard.is_admin {
                    self.persist_admin_flag(false).await?;
                    guard.is_admin = false;
                    self.notify.send(&Event::AdminLoggedOut);
                }
                Err(err.into())
            }
        }
    }

    pub async fn logout(&self) -> Result<(), EngineError> {
        let mut guard = self.state.write().await;
        if !guard.is_admin {
            return Ok(());
        }
        self.persist_admin_flag(false).await?;
        guard.is_admin = false;
        info!("admin logged out");
        self.notify.send(&Event::AdminLoggedOut);
        Ok(())
    }
}
