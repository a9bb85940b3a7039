//! Shared fixtures for the booking tests: a SQLite store in a temp dir and
//! recording fakes of the calendar and email services.
#![allow(dead_code)]

use chrono::{DateTime, Duration, SubsecRound, Utc};
use clinic_booking::{BookingState, FulfillmentDispatcher, FulfillmentTask};
use clinic_common::models::{NewUser, Slot, User, UserRole};
use clinic_common::services::{
    BoxFuture, BoxedCalendarService, BoxedError, BoxedNotificationService, CalendarEvent,
    CalendarEventResult, CalendarService, EmailNotification, NotificationResult,
    NotificationService, ServiceFactory,
};
use clinic_config::{BookingConfig, DatabaseConfig};
use clinic_db::{DbClient, SlotRepository, SqlSlotRepository, SqlUserRepository, UserRepository};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use tempfile::TempDir;
use tokio::sync::mpsc;

pub async fn test_db() -> (TempDir, DbClient) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("clinic.db").display());
    let db = DbClient::from_config(&DatabaseConfig {
        url,
        max_connections: 8,
        acquire_timeout_secs: 10,
    })
    .await
    .expect("db client");
    clinic_db::init_schema(&db).await.expect("schema");
    (dir, db)
}

pub fn booking_config() -> BookingConfig {
    BookingConfig {
        time_zone: "UTC".to_string(),
        statement_timeout_ms: 5_000,
        fulfillment_queue_capacity: 64,
        fulfillment_max_attempts: 3,
        fulfillment_retry_backoff_ms: 10,
    }
}

/// Booking state plus the receiving end of its fulfillment queue.
pub fn booking_state(db: &DbClient) -> (Arc<BookingState>, mpsc::Receiver<FulfillmentTask>) {
    let config = booking_config();
    let (dispatcher, receiver) = FulfillmentDispatcher::channel(config.fulfillment_queue_capacity);
    let state = BookingState::new(db.clone(), dispatcher, &config).expect("booking state");
    (Arc::new(state), receiver)
}

pub fn drain(receiver: &mut mpsc::Receiver<FulfillmentTask>) -> Vec<FulfillmentTask> {
    let mut tasks = Vec::new();
    while let Ok(task) = receiver.try_recv() {
        tasks.push(task);
    }
    tasks
}

pub async fn create_user(
    db: &DbClient,
    email: &str,
    role: UserRole,
    calendar_id: Option<&str>,
) -> User {
    let (first, last) = email
        .split('@')
        .next()
        .and_then(|local| local.split_once('.'))
        .unwrap_or(("Test", "User"));

    SqlUserRepository::new(db.clone())
        .create_user(NewUser {
            email: email.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            role,
            calendar_id: calendar_id.map(str::to_string),
        })
        .await
        .expect("create user")
}

pub async fn doctor(db: &DbClient, email: &str) -> User {
    create_user(db, email, UserRole::Doctor, None).await
}

pub async fn patient(db: &DbClient, email: &str) -> User {
    create_user(db, email, UserRole::Patient, None).await
}

pub fn hours_from_now(hours: i64) -> DateTime<Utc> {
    (Utc::now() + Duration::hours(hours)).trunc_subsecs(0)
}

/// Insert a 30 minute slot directly through the repository, bypassing the
/// future-start validation of the slot service.
pub async fn slot_at(db: &DbClient, doctor_id: &str, starts_at: DateTime<Utc>) -> Slot {
    SqlSlotRepository::new(db.clone())
        .insert_slot(doctor_id, starts_at, starts_at + Duration::minutes(30))
        .await
        .expect("insert slot")
        .expect("no overlap")
}

pub async fn count_appointments(db: &DbClient, slot_id: &str) -> i64 {
    use sqlx::Row;

    sqlx::query("SELECT COUNT(*) AS n FROM appointments WHERE slot_id = $1")
        .bind(slot_id)
        .fetch_one(db.pool())
        .await
        .expect("count")
        .try_get("n")
        .expect("count column")
}

/// Poll `check` until it holds or the deadline passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    check()
}

// --- Fakes ---

/// Calendar that records every created event and can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingCalendar {
    pub created: Arc<Mutex<Vec<(String, CalendarEvent)>>>,
    pub attempts: Arc<AtomicUsize>,
    pub failing: Arc<AtomicBool>,
}

impl RecordingCalendar {
    pub fn failing() -> Self {
        let calendar = Self::default();
        calendar.failing.store(true, Ordering::SeqCst);
        calendar
    }

    pub fn created(&self) -> Vec<(String, CalendarEvent)> {
        self.created.lock().unwrap().clone()
    }
}

impl CalendarService for RecordingCalendar {
    type Error = std::io::Error;

    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if self.failing.load(Ordering::SeqCst) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "calendar unavailable",
                ));
            }
            self.created.lock().unwrap().push((calendar_id, event));
            Ok(CalendarEventResult {
                event_id: Some(format!("evt-{attempt}")),
                status: "confirmed".to_string(),
            })
        })
    }

    fn delete_event(
        &self,
        _calendar_id: &str,
        _event_id: &str,
        _notify_attendees: bool,
    ) -> BoxFuture<'_, (), Self::Error> {
        Box::pin(async { Ok(()) })
    }
}

/// Notification service that records every payload and can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<EmailNotification>>>,
    pub attempts: Arc<AtomicUsize>,
    pub failing: Arc<AtomicBool>,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.failing.store(true, Ordering::SeqCst);
        mailer
    }

    pub fn sent(&self) -> Vec<EmailNotification> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationService for RecordingMailer {
    type Error = std::io::Error;

    fn send_email(
        &self,
        notification: EmailNotification,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "email function timed out",
                ));
            }
            self.sent.lock().unwrap().push(notification);
            Ok(NotificationResult {
                id: "req-1".to_string(),
                status: "sent".to_string(),
            })
        })
    }
}

pub struct FakeServices {
    pub calendar: Option<RecordingCalendar>,
    pub mailer: Option<RecordingMailer>,
}

impl ServiceFactory for FakeServices {
    fn calendar_service(&self) -> Option<Arc<dyn CalendarService<Error = BoxedError>>> {
        self.calendar.clone().map(|calendar| {
            Arc::new(BoxedCalendarService::new(calendar)) as Arc<dyn CalendarService<Error = BoxedError>>
        })
    }

    fn notification_service(&self) -> Option<Arc<dyn NotificationService<Error = BoxedError>>> {
        self.mailer.clone().map(|mailer| {
            Arc::new(BoxedNotificationService::new(mailer))
                as Arc<dyn NotificationService<Error = BoxedError>>
        })
    }
}
