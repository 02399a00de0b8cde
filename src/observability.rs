use std::net::SocketAddr;

use crate::engine::EngineError;

/// Counter: bookings committed by the booking flow.
pub const BOOKINGS_CREATED_TOTAL: &str = "fades_bookings_created_total";

/// Counter: bookings changed by the admin edit flow.
pub const BOOKINGS_UPDATED_TOTAL: &str = "fades_bookings_updated_total";

/// Counter: bookings removed by an admin.
pub const BOOKINGS_DELETED_TOTAL: &str = "fades_bookings_deleted_total";

/// Counter: failed create/edit submissions. Labels: reason.
pub const BOOKING_REJECTIONS_TOTAL: &str = "fades_booking_rejections_total";

/// Gauge: images currently in the gallery.
pub const GALLERY_IMAGES: &str = "fades_gallery_images";

/// Counter: admin login attempts. Labels: status.
pub const ADMIN_LOGINS_TOTAL: &str = "fades_admin_logins_total";

/// Histogram: whole-list store write duration in seconds. Labels: key.
pub const STORE_WRITE_DURATION_SECONDS: &str = "fades_store_write_duration_seconds";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map an engine error to a short label for metrics.
pub fn error_label(err: &EngineError) -> &'static str {
    match err {
        EngineError::Rejected(r) => r.label(),
        EngineError::NotFound(_) => "not_found",
        EngineError::Login(_) => "login_failed",
        EngineError::Unauthorized => "unauthorized",
        EngineError::LimitExceeded(_) => "limit_exceeded",
        EngineError::Store(_) => "store",
    }
}
