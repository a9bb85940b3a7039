//! Google Calendar service implementation.
//!
//! This module provides an implementation of the CalendarService trait for Google Calendar.

use chrono_tz::Tz;
use clinic_common::services::{BoxFuture, CalendarEvent, CalendarEventResult, CalendarService};
use clinic_config::GcalConfig;
use google_calendar3::api::{
    Event, EventAttendee, EventDateTime, EventReminder as GoogleReminder, EventReminders,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::HubType;

/// Errors that can occur when interacting with Google Calendar.
#[derive(Error, Debug)]
pub enum GcalServiceError {
    #[error("Google API Error: {0}")]
    ApiError(#[from] google_calendar3::Error),
    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

/// Resolve the configured time zone, defaulting to UTC.
pub fn resolve_time_zone(time_zone: Option<&str>) -> Result<Tz, GcalServiceError> {
    match time_zone {
        None | Some("") => Ok(Tz::UTC),
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| GcalServiceError::InvalidTimeZone(name.to_string())),
    }
}

/// Convert a calendar event into the Google API representation.
///
/// Times are sent as instants; `time_zone` only controls how Google renders
/// them. Reminders always override the calendar defaults.
pub fn to_google_event(event: &CalendarEvent, time_zone: Tz) -> Result<Event, GcalServiceError> {
    if event.end_time <= event.start_time {
        return Err(GcalServiceError::InvalidEvent(
            "End time must be after start time".to_string(),
        ));
    }

    let attendees = event
        .attendees
        .iter()
        .map(|email| EventAttendee {
            email: Some(email.clone()),
            ..Default::default()
        })
        .collect::<Vec<_>>();

    let overrides = event
        .reminders
        .iter()
        .map(|reminder| GoogleReminder {
            method: Some(reminder.method.clone()),
            minutes: Some(reminder.minutes),
        })
        .collect::<Vec<_>>();

    Ok(Event {
        summary: Some(event.summary.clone()),
        description: event.description.clone(),
        start: Some(EventDateTime {
            date_time: Some(event.start_time),
            time_zone: Some(time_zone.name().to_string()),
            ..Default::default()
        }),
        end: Some(EventDateTime {
            date_time: Some(event.end_time),
            time_zone: Some(time_zone.name().to_string()),
            ..Default::default()
        }),
        attendees: (!attendees.is_empty()).then_some(attendees),
        reminders: Some(EventReminders {
            use_default: Some(false),
            overrides: Some(overrides),
        }),
        ..Default::default()
    })
}

/// True when Google reports the event as missing or already gone.
pub(crate) fn is_gone(err: &google_calendar3::Error) -> bool {
    match err {
        google_calendar3::Error::BadRequest(body) => matches!(
            body.get("error")
                .and_then(|e| e.get("code"))
                .and_then(|c| c.as_u64()),
            Some(404) | Some(410)
        ),
        google_calendar3::Error::Failure(response) => {
            matches!(response.status().as_u16(), 404 | 410)
        }
        _ => false,
    }
}

fn send_updates(notify_attendees: bool) -> &'static str {
    if notify_attendees {
        "all"
    } else {
        "none"
    }
}

/// Google Calendar service implementation.
pub struct GoogleCalendarService {
    calendar_hub: Arc<HubType>,
    time_zone: Tz,
}

impl GoogleCalendarService {
    /// Create a new Google Calendar service.
    pub fn new(calendar_hub: Arc<HubType>, config: &GcalConfig) -> Result<Self, GcalServiceError> {
        Ok(Self {
            calendar_hub,
            time_zone: resolve_time_zone(config.time_zone.as_deref())?,
        })
    }
}

impl CalendarService for GoogleCalendarService {
    type Error = GcalServiceError;

    /// Creates a new calendar event in the specified calendar.
    ///
    /// Attendees are notified by Google (`sendUpdates=all`).
    ///
    /// # Errors
    ///
    /// Returns a `GcalServiceError` if:
    /// * The end time is not after the start time (InvalidEvent)
    /// * The API call to Google Calendar fails (ApiError)
    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();
        let time_zone = self.time_zone;

        Box::pin(async move {
            let new_event = to_google_event(&event, time_zone)?;

            let (_response, created_event) = calendar_hub
                .events()
                .insert(new_event, &calendar_id)
                .send_updates("all")
                .doit()
                .await?;

            info!(
                "Created calendar event {:?} in calendar {}",
                created_event.id, calendar_id
            );

            Ok(CalendarEventResult {
                event_id: created_event.id,
                status: created_event
                    .status
                    .unwrap_or_else(|| "confirmed".to_string()),
            })
        })
    }

    /// Deletes an event from the specified calendar.
    ///
    /// Returns `Ok(())` if the event was deleted or did not exist anymore.
    fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        notify_attendees: bool,
    ) -> BoxFuture<'_, (), Self::Error> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let result = calendar_hub
                .events()
                .delete(&calendar_id, &event_id)
                .send_updates(send_updates(notify_attendees))
                .doit()
                .await;

            match result {
                Ok(_) => Ok(()),
                Err(e) if is_gone(&e) => {
                    debug!("Calendar event {} already gone", event_id);
                    Ok(())
                }
                Err(e) => Err(GcalServiceError::ApiError(e)),
            }
        })
    }
}
