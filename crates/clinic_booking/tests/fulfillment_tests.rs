mod fixtures;

use clinic_booking::fulfillment::FulfillmentError;
use clinic_booking::{
    BookingGuard, BookingRequest, FulfillmentDispatcher, FulfillmentTask, FulfillmentWorker,
};
use clinic_common::models::{CalendarOwner, SlotStatus, UserRole};
use clinic_common::services::EmailNotification;
use clinic_db::{
    AppointmentRepository, CalendarEventRepository, SlotRepository, SqlAppointmentRepository,
    SqlCalendarEventRepository, SqlSlotRepository,
};
use fixtures::*;
use std::sync::atomic::Ordering;
use std::time::Duration;

async fn booked_appointment(db: &clinic_db::DbClient) -> clinic_common::models::Appointment {
    let d1 = create_user(db, "dana.doe@example.com", UserRole::Doctor, Some("dana-cal")).await;
    let p1 = create_user(db, "pat.one@example.com", UserRole::Patient, Some("pat-cal")).await;
    let slot = slot_at(db, &d1.id, hours_from_now(24)).await;

    let (dispatcher, _receiver) = FulfillmentDispatcher::channel(8);
    BookingGuard::new(db.clone(), dispatcher, Duration::from_secs(5))
        .attempt_book(BookingRequest {
            slot_id: slot.id,
            patient_id: p1.id,
            reason: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_calendar_sync_writes_event_once_per_owner() {
    let (_dir, db) = test_db().await;
    let appointment = booked_appointment(&db).await;
    let calendar = RecordingCalendar::default();
    let services = FakeServices {
        calendar: Some(calendar.clone()),
        mailer: None,
    };
    let worker = FulfillmentWorker::new(db.clone(), &services, &booking_config()).unwrap();

    let doctor_sync = FulfillmentTask::CalendarSync {
        appointment_id: appointment.id.clone(),
        owner: CalendarOwner::Doctor,
    };
    worker.process(doctor_sync.clone()).await.unwrap();
    worker
        .process(FulfillmentTask::CalendarSync {
            appointment_id: appointment.id.clone(),
            owner: CalendarOwner::Patient,
        })
        .await
        .unwrap();
    // A replayed task finds the recorded event and does nothing.
    worker.process(doctor_sync).await.unwrap();

    let created = calendar.created();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].0, "dana-cal");
    assert_eq!(created[0].1.summary, "Appointment with pat one");
    assert_eq!(created[0].1.attendees, vec!["pat.one@example.com".to_string()]);
    assert_eq!(created[1].0, "pat-cal");
    assert_eq!(created[1].1.summary, "Appointment with Dr. dana doe");

    let links = SqlCalendarEventRepository::new(db.clone())
        .list_for_appointment(&appointment.id)
        .await
        .unwrap();
    assert_eq!(links.len(), 2);
}

#[tokio::test]
async fn test_calendar_failure_is_retried_then_dropped_without_touching_booking() {
    let (_dir, db) = test_db().await;
    let appointment = booked_appointment(&db).await;
    let calendar = RecordingCalendar::failing();
    let services = FakeServices {
        calendar: Some(calendar.clone()),
        mailer: None,
    };
    let worker = FulfillmentWorker::new(db.clone(), &services, &booking_config()).unwrap();

    let result = worker
        .process(FulfillmentTask::CalendarSync {
            appointment_id: appointment.id.clone(),
            owner: CalendarOwner::Doctor,
        })
        .await;

    assert!(matches!(result, Err(FulfillmentError::Calendar(_))));
    assert_eq!(calendar.attempts.load(Ordering::SeqCst), 3);

    let stored = SqlAppointmentRepository::new(db.clone())
        .find_by_id(&appointment.id)
        .await
        .unwrap();
    assert_eq!(stored, Some(appointment.clone()));
    let slot = SqlSlotRepository::new(db.clone())
        .find_by_id(&appointment.slot_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(slot.status, SlotStatus::Booked);
    assert!(SqlCalendarEventRepository::new(db.clone())
        .find_event(&appointment.id, CalendarOwner::Doctor)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_users_without_calendar_are_skipped() {
    let (_dir, db) = test_db().await;
    let d1 = doctor(&db, "dana.doe@example.com").await;
    let p1 = patient(&db, "pat.one@example.com").await;
    let slot = slot_at(&db, &d1.id, hours_from_now(24)).await;
    let appointment = SqlAppointmentRepository::new(db.clone())
        .reserve_slot(&clinic_db::ReservationRequest {
            slot_id: slot.id,
            patient_id: p1.id,
            reason: String::new(),
            requested_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let calendar = RecordingCalendar::default();
    let services = FakeServices {
        calendar: Some(calendar.clone()),
        mailer: None,
    };
    let worker = FulfillmentWorker::new(db.clone(), &services, &booking_config()).unwrap();

    worker
        .process(FulfillmentTask::CalendarSync {
            appointment_id: appointment.id,
            owner: CalendarOwner::Doctor,
        })
        .await
        .unwrap();
    assert_eq!(calendar.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_booking_confirmation_payload_is_sent() {
    let (_dir, db) = test_db().await;
    let appointment = booked_appointment(&db).await;
    let mailer = RecordingMailer::default();
    let services = FakeServices {
        calendar: None,
        mailer: Some(mailer.clone()),
    };
    let worker = FulfillmentWorker::new(db.clone(), &services, &booking_config()).unwrap();

    worker
        .process(FulfillmentTask::BookingConfirmationEmail {
            appointment_id: appointment.id.clone(),
        })
        .await
        .unwrap();

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        EmailNotification::BookingConfirmation {
            to_email,
            doctor_name,
            reason,
            ..
        } => {
            assert_eq!(to_email, "pat.one@example.com");
            assert_eq!(doctor_name, "Dr. dana doe");
            assert_eq!(reason, "General Consultation");
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_user_is_not_retried() {
    let (_dir, db) = test_db().await;
    let mailer = RecordingMailer::default();
    let services = FakeServices {
        calendar: None,
        mailer: Some(mailer.clone()),
    };
    let worker = FulfillmentWorker::new(db.clone(), &services, &booking_config()).unwrap();

    let result = worker
        .process(FulfillmentTask::WelcomeEmail {
            user_id: "ghost".to_string(),
        })
        .await;

    assert!(matches!(result, Err(FulfillmentError::NotFound(_))));
    assert_eq!(mailer.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_disabled_integrations_are_noops() {
    let (_dir, db) = test_db().await;
    let appointment = booked_appointment(&db).await;
    let services = FakeServices {
        calendar: None,
        mailer: None,
    };
    let worker = FulfillmentWorker::new(db.clone(), &services, &booking_config()).unwrap();

    for task in FulfillmentTask::for_booking(&appointment.id) {
        worker.process(task).await.unwrap();
    }
}

#[tokio::test]
async fn test_unknown_time_zone_is_a_config_error() {
    let (_dir, db) = test_db().await;
    let services = FakeServices {
        calendar: None,
        mailer: None,
    };
    let mut config = booking_config();
    config.time_zone = "Mars/Olympus".to_string();

    assert!(FulfillmentWorker::new(db, &services, &config).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_drains_queue_after_booking() {
    let (_dir, db) = test_db().await;
    let d1 = create_user(&db, "dana.doe@example.com", UserRole::Doctor, Some("dana-cal")).await;
    let p1 = create_user(&db, "pat.one@example.com", UserRole::Patient, None).await;
    let slot = slot_at(&db, &d1.id, hours_from_now(24)).await;

    let calendar = RecordingCalendar::default();
    let mailer = RecordingMailer::failing();
    let services = FakeServices {
        calendar: Some(calendar.clone()),
        mailer: Some(mailer.clone()),
    };
    let config = booking_config();
    let (dispatcher, receiver) = FulfillmentDispatcher::channel(config.fulfillment_queue_capacity);
    let worker = FulfillmentWorker::new(db.clone(), &services, &config).unwrap();
    let handle = worker.spawn(receiver);

    let guard = BookingGuard::new(db.clone(), dispatcher, config.statement_timeout());
    let appointment = guard
        .attempt_book(BookingRequest {
            slot_id: slot.id.clone(),
            patient_id: p1.id.clone(),
            reason: Some("Check-up".to_string()),
        })
        .await
        .unwrap();

    assert!(eventually(|| calendar.created().len() == 1).await);
    assert!(eventually(|| mailer.attempts.load(Ordering::SeqCst) == 3).await);

    // Email kept failing; the appointment is untouched.
    let stored = SqlAppointmentRepository::new(db.clone())
        .find_by_slot(&slot.id)
        .await
        .unwrap();
    assert_eq!(stored, Some(appointment));

    drop(guard);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker stops once the queue closes")
        .unwrap();
}
