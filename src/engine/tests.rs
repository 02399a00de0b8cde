use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ulid::Ulid;

use super::*;
use crate::auth::{AdminCredentials, LoginError};
use crate::notify::{NotifyHub, Topic};
use crate::store::{FileStore, MemoryStore};

const ADMIN_EMAIL: &str = "owner@fades.test";
const ADMIN_PASSWORD: &str = "hunter22";

fn date(s: &str) -> NaiveDate {
    parse_date(s).unwrap()
}

fn time(s: &str) -> NaiveTime {
    parse_time(s).unwrap()
}

fn now() -> NaiveDateTime {
    date("2025-06-01").and_time(time("08:00"))
}

fn request(d: &str, t: &str, name: &str) -> BookingRequest {
    BookingRequest {
        date: date(d),
        time: time(t),
        name: name.into(),
        email: format!("{}@example.com", name.to_lowercase()),
        service: None,
    }
}

fn test_data_dir(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join("fades_test_engine")
        .join(format!("{name}_{}", Ulid::new()))
}

async fn engine_with(hours: BusinessHours, store: Arc<dyn KeyValueStore>) -> Engine {
    Engine::open(
        hours,
        AdminCredentials::new(ADMIN_EMAIL.into(), ADMIN_PASSWORD.into()),
        store,
        Arc::new(MemoryStore::new()),
        Arc::new(NotifyHub::new()),
    )
    .await
}

async fn memory_engine() -> Engine {
    engine_with(BusinessHours::standard(), Arc::new(MemoryStore::new())).await
}

async fn admin_engine() -> Engine {
    let engine = memory_engine().await;
    engine.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    engine
}

// ── Booking flow ─────────────────────────────────────────

#[tokio::test]
async fn create_booking_marks_slot_booked() {
    let engine = memory_engine().await;
    let b = engine
        .create_booking(request("2025-06-10", "10:45", "Ann"), now())
        .await
        .unwrap();

    let DayAvailability::Open(slots) = engine.day_view(date("2025-06-10"), now()).await else {
        panic!("expected open day");
    };
    let slot = slots.iter().find(|s| s.time == b.time).unwrap();
    assert!(slot.booked);
    assert_eq!(slots.iter().filter(|s| s.booked).count(), 1);
}

#[tokio::test]
async fn double_booking_rejected() {
    let engine = memory_engine().await;
    engine
        .create_booking(request("2025-06-10", "10:45", "Ann"), now())
        .await
        .unwrap();
    let err = engine
        .create_booking(request("2025-06-10", "10:45", "Bob"), now())
        .await
        .unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::SlotTaken));
    assert_eq!(engine.snapshot().await.bookings.len(), 1);
}

#[tokio::test]
async fn quarter_hour_scenario() {
    let hours = BusinessHours { slot_minutes: 15, ..BusinessHours::standard() };
    let engine = engine_with(hours, Arc::new(MemoryStore::new())).await;

    engine
        .create_booking(request("2025-06-10", "10:30", "Ann"), now())
        .await
        .unwrap();
    let err = engine
        .create_booking(request("2025-06-10", "10:30", "Bob"), now())
        .await
        .unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::SlotTaken));

    let b = engine
        .create_booking(request("2025-06-10", "11:15", "Bob"), now())
        .await
        .unwrap();
    assert_eq!(b.time, time("11:15"));
}

#[tokio::test]
async fn create_rejects_closed_past_and_off_grid() {
    let engine = memory_engine().await;
    let cases = [
        ("2025-06-08", "10:00", Rejection::ClosedDay),
        ("2025-05-31", "10:00", Rejection::PastDate),
        ("2025-06-10", "13:00", Rejection::InvalidSlot),
        ("2025-06-10", "18:00", Rejection::InvalidSlot),
    ];
    for (d, t, expected) in cases {
        let err = engine.create_booking(request(d, t, "Ann"), now()).await.unwrap_err();
        assert_eq!(err.rejection(), Some(&expected), "{d} {t}");
    }
    assert!(engine.snapshot().await.bookings.is_empty());
}

#[tokio::test]
async fn create_notifies_subscribers() {
    let engine = memory_engine().await;
    let mut rx = engine.notify.subscribe(Topic::Bookings);
    let b = engine
        .create_booking(request("2025-06-10", "09:00", "Ann"), now())
        .await
        .unwrap();
    assert_eq!(rx.recv().await.unwrap(), Event::BookingCreated(b));
}

// ── Admin gate ───────────────────────────────────────────

#[tokio::test]
async fn admin_operations_require_login() {
    let engine = memory_engine().await;
    let b = engine
        .create_booking(request("2025-06-10", "09:00", "Ann"), now())
        .await
        .unwrap();

    assert!(matches!(engine.delete_booking(&b.id).await, Err(EngineError::Unauthorized)));
    assert!(matches!(engine.dashboard().await, Err(EngineError::Unauthorized)));
    assert!(matches!(
        engine.bookings_sorted(SortOrder::Asc).await,
        Err(EngineError::Unauthorized)
    ));
    assert!(matches!(
        engine.add_gallery_image("https://x.test/a.jpg", "A", ImageCategory::Hair).await,
        Err(EngineError::Unauthorized)
    ));
    assert!(matches!(
        engine.edit_booking(&b.id, request("2025-06-10", "09:45", "Ann"), now()).await,
        Err(EngineError::Unauthorized)
    ));
    assert!(matches!(
        engine.delete_gallery_image("placeholder1").await,
        Err(EngineError::Unauthorized)
    ));
    assert!(matches!(
        engine.edit_view(&b.id, date("2025-06-10"), now()).await,
        Err(EngineError::Unauthorized)
    ));
    assert!(matches!(
        engine.suggest_edit_time(&b.id, date("2025-06-11"), None, now()).await,
        Err(EngineError::Unauthorized)
    ));
    assert!(matches!(engine.booking(&b.id).await, Err(EngineError::Unauthorized)));

    // Nothing changed behind the gate.
    let state = engine.snapshot().await;
    assert_eq!(state.bookings, vec![b]);
    assert_eq!(state.gallery, default_gallery());
}

#[tokio::test]
async fn login_and_logout() {
    let engine = memory_engine().await;
    assert!(!engine.is_admin().await);

    let err = engine.login(ADMIN_EMAIL, "").await.unwrap_err();
    assert!(matches!(err, EngineError::Login(LoginError::MissingInput)));

    engine.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    assert!(engine.is_admin().await);

    engine.logout().await.unwrap();
    assert!(!engine.is_admin().await);
    assert!(matches!(engine.dashboard().await, Err(EngineError::Unauthorized)));
}

#[tokio::test]
async fn failed_login_clears_session() {
    let engine = admin_engine().await;
    let err = engine.login(ADMIN_EMAIL, "wrong").await.unwrap_err();
    assert!(matches!(err, EngineError::Login(LoginError::InvalidCredentials)));
    assert!(!engine.is_admin().await);
}

#[tokio::test]
async fn session_flag_survives_reopen_with_same_session_store() {
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let creds = AdminCredentials::new(ADMIN_EMAIL.into(), ADMIN_PASSWORD.into());

    let first = Engine::open(BusinessHours::standard(), creds.clone(), store.clone(), session.clone(), Arc::new(NotifyHub::new())).await;
    first.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    let second = Engine::open(BusinessHours::standard(), creds, store, session, Arc::new(NotifyHub::new())).await;
    assert!(second.is_admin().await);
}

// ── Edit flow ────────────────────────────────────────────

#[tokio::test]
async fn edit_to_same_slot_succeeds() {
    let engine = admin_engine().await;
    let b = engine
        .create_booking(request("2025-06-10", "10:45", "Ann"), now())
        .await
        .unwrap();

    let updated = engine
        .edit_booking(&b.id, request("2025-06-10", "10:45", "Annie"), now())
        .await
        .unwrap();
    assert_eq!(updated.id, b.id);
    assert_eq!(updated.name, "Annie");
    assert_eq!(engine.snapshot().await.bookings, vec![updated]);
}

#[tokio::test]
async fn edit_into_other_booking_rejected() {
    let engine = admin_engine().await;
    let a = engine
        .create_booking(request("2025-06-10", "10:45", "Ann"), now())
        .await
        .unwrap();
    engine
        .create_booking(request("2025-06-10", "11:00", "Bob"), now())
        .await
        .unwrap();

    let err = engine
        .edit_booking(&a.id, request("2025-06-10", "11:00", "Ann"), now())
        .await
        .unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::SlotTaken));
    assert_eq!(engine.booking(&a.id).await.unwrap().time, time("10:45"));
}

#[tokio::test]
async fn edit_keeps_service_when_omitted() {
    let engine = admin_engine().await;
    let mut req = request("2025-06-10", "10:45", "Ann");
    req.service = Some("Beard trim".into());
    let b = engine.create_booking(req, now()).await.unwrap();

    let updated = engine
        .edit_booking(&b.id, request("2025-06-11", "09:00", "Ann"), now())
        .await
        .unwrap();
    assert_eq!(updated.service.as_deref(), Some("Beard trim"));
    assert_eq!(updated.date, date("2025-06-11"));
}

#[tokio::test]
async fn edit_unknown_booking() {
    let engine = admin_engine().await;
    let err = engine
        .edit_booking("nope", request("2025-06-10", "10:45", "Ann"), now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(id) if id == "nope"));
}

#[tokio::test]
async fn edit_view_excludes_self() {
    let engine = admin_engine().await;
    let b = engine
        .create_booking(request("2025-06-10", "10:45", "Ann"), now())
        .await
        .unwrap();
    let DayAvailability::Open(slots) = engine.edit_view(&b.id, date("2025-06-10"), now()).await.unwrap() else {
        panic!("expected open day");
    };
    assert!(slots.iter().all(|s| !s.booked));
}

#[tokio::test]
async fn suggestion_uses_stored_time_by_default() {
    let engine = admin_engine().await;
    let b = engine
        .create_booking(request("2025-06-10", "10:45", "Ann"), now())
        .await
        .unwrap();
    engine
        .create_booking(request("2025-06-11", "10:45", "Bob"), now())
        .await
        .unwrap();

    let same_day = engine.suggest_edit_time(&b.id, date("2025-06-10"), None, now()).await.unwrap();
    assert_eq!(same_day, Some(time("10:45")));

    let other_day = engine.suggest_edit_time(&b.id, date("2025-06-11"), None, now()).await.unwrap();
    assert_eq!(other_day, Some(time("09:00")));
}

#[tokio::test]
async fn delete_booking_frees_slot() {
    let engine = admin_engine().await;
    let b = engine
        .create_booking(request("2025-06-10", "10:45", "Ann"), now())
        .await
        .unwrap();
    engine.delete_booking(&b.id).await.unwrap();
    assert!(engine.snapshot().await.bookings.is_empty());
    engine
        .create_booking(request("2025-06-10", "10:45", "Bob"), now())
        .await
        .unwrap();
    assert!(matches!(engine.delete_booking(&b.id).await, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn bookings_sorted_by_start() {
    let engine = admin_engine().await;
    for (d, t) in [("2025-06-11", "09:00"), ("2025-06-10", "15:00"), ("2025-06-10", "09:45")] {
        engine.create_booking(request(d, t, "Ann"), now()).await.unwrap();
    }
    let asc: Vec<_> = engine
        .bookings_sorted(SortOrder::Asc)
        .await
        .unwrap()
        .iter()
        .map(Booking::starts_at)
        .collect();
    assert!(asc.windows(2).all(|w| w[0] <= w[1]));

    let desc = engine.bookings_sorted(SortOrder::Desc).await.unwrap();
    assert_eq!(desc[0].date, date("2025-06-11"));
}

// ── Gallery ──────────────────────────────────────────────

#[tokio::test]
async fn gallery_defaults_and_filter() {
    let engine = memory_engine().await;
    assert_eq!(engine.gallery(None).await.len(), 5);
    let beards = engine.gallery(Some(ImageCategory::Beard)).await;
    assert_eq!(beards.len(), 2);
    assert!(beards.iter().all(|img| img.category == ImageCategory::Beard));
}

#[tokio::test]
async fn gallery_add_prepends_and_delete() {
    let engine = admin_engine().await;
    let img = engine
        .add_gallery_image("https://example.com/fade.jpg", "Skin fade", ImageCategory::Hair)
        .await
        .unwrap();
    let all = engine.gallery(None).await;
    assert_eq!(all[0], img);
    assert_eq!(all.len(), 6);

    engine.delete_gallery_image(&img.id).await.unwrap();
    assert_eq!(engine.gallery(None).await.len(), 5);
    assert_eq!(engine.dashboard().await.unwrap().total_gallery_images, 5);
}

#[tokio::test]
async fn gallery_rejects_bad_url() {
    let engine = admin_engine().await;
    let err = engine
        .add_gallery_image("not a url", "Skin fade", ImageCategory::Hair)
        .await
        .unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::InvalidImageUrl));
}

// ── Persistence ──────────────────────────────────────────

#[tokio::test]
async fn bookings_survive_reopen() {
    let dir = test_data_dir("reopen");
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&dir).await.unwrap());
    let engine = engine_with(BusinessHours::standard(), store).await;
    let b = engine
        .create_booking(request("2025-06-10", "10:45", "Ann"), now())
        .await
        .unwrap();
    drop(engine);

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&dir).await.unwrap());
    let reopened = engine_with(BusinessHours::standard(), store).await;
    assert_eq!(reopened.snapshot().await.bookings, vec![b]);
}

#[tokio::test]
async fn corrupt_store_falls_back_to_defaults() {
    let store = MemoryStore::new();
    store.put(crate::store::BOOKINGS_KEY, "[{broken").await.unwrap();
    store.put(crate::store::GALLERY_KEY, "nope").await.unwrap();

    let engine = engine_with(BusinessHours::standard(), Arc::new(store)).await;
    let state = engine.snapshot().await;
    assert!(state.bookings.is_empty());
    assert_eq!(state.gallery, default_gallery());
}

#[tokio::test]
async fn every_mutation_rewrites_whole_list() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_with(BusinessHours::standard(), store.clone()).await;
    engine
        .create_booking(request("2025-06-10", "10:45", "Ann"), now())
        .await
        .unwrap();
    engine
        .create_booking(request("2025-06-10", "11:00", "Bob"), now())
        .await
        .unwrap();

    let raw = store.get(crate::store::BOOKINGS_KEY).await.unwrap().unwrap();
    let stored: Vec<Booking> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored, engine.snapshot().await.bookings);
}

/// Memory store whose writes start failing once `fail` is set.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail: AtomicBool,
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> io::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(io::Error::other("disk full"));
        }
        self.inner.put(key, value).await
    }
}

#[tokio::test]
async fn failed_write_leaves_state_untouched() {
    let store = Arc::new(FlakyStore::default());
    let engine = engine_with(BusinessHours::standard(), store.clone()).await;
    engine.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    let b = engine
        .create_booking(request("2025-06-10", "10:45", "Ann"), now())
        .await
        .unwrap();

    store.fail.store(true, Ordering::SeqCst);
    let before = engine.snapshot().await;

    let err = engine
        .create_booking(request("2025-06-10", "11:00", "Bob"), now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));

    let err = engine
        .edit_booking(&b.id, request("2025-06-11", "09:00", "Ann"), now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));

    let err = engine.delete_gallery_image("placeholder1").await.unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));

    let after = engine.snapshot().await;
    assert_eq!(after.bookings, before.bookings);
    assert_eq!(after.gallery, before.gallery);
    assert_eq!(after.bookings, vec![b]);

    // Slot still free for the next successful write.
    store.fail.store(false, Ordering::SeqCst);
    engine
        .create_booking(request("2025-06-10", "11:00", "Bob"), now())
        .await
        .unwrap();
}
