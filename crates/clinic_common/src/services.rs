//! Service abstractions for external services.
//!
//! Calendar sync and email delivery are reached only through these traits so
//! the booking logic can run against fakes in tests and against nothing at all
//! when an integration is disabled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl BoxedError {
    pub fn new<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        BoxedError(Box::new(err))
    }
}

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// A trait for calendar service operations.
pub trait CalendarService: Send + Sync {
    /// Error type returned by calendar service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a calendar event.
    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error>;

    /// Delete a calendar event.
    fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        notify_attendees: bool,
    ) -> BoxFuture<'_, (), Self::Error>;
}

/// A trait for notification service operations.
pub trait NotificationService: Send + Sync {
    /// Error type returned by notification service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send an email notification.
    fn send_email(
        &self,
        notification: EmailNotification,
    ) -> BoxFuture<'_, NotificationResult, Self::Error>;
}

/// A factory for creating service instances.
///
/// A `None` return means the integration is disabled by configuration.
pub trait ServiceFactory: Send + Sync {
    /// Get a calendar service instance.
    fn calendar_service(&self) -> Option<Arc<dyn CalendarService<Error = BoxedError>>>;

    /// Get a notification service instance.
    fn notification_service(&self) -> Option<Arc<dyn NotificationService<Error = BoxedError>>>;
}

/// Adapts any calendar service to the boxed error type used by [`ServiceFactory`].
pub struct BoxedCalendarService<S> {
    inner: S,
}

impl<S> BoxedCalendarService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: CalendarService> CalendarService for BoxedCalendarService<S> {
    type Error = BoxedError;

    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
        let calendar_id = calendar_id.to_string();

        Box::pin(async move {
            self.inner
                .create_event(&calendar_id, event)
                .await
                .map_err(BoxedError::new)
        })
    }

    fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        notify_attendees: bool,
    ) -> BoxFuture<'_, (), Self::Error> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();

        Box::pin(async move {
            self.inner
                .delete_event(&calendar_id, &event_id, notify_attendees)
                .await
                .map_err(BoxedError::new)
        })
    }
}

/// Adapts any notification service to the boxed error type used by [`ServiceFactory`].
pub struct BoxedNotificationService<S> {
    inner: S,
}

impl<S> BoxedNotificationService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: NotificationService> NotificationService for BoxedNotificationService<S> {
    type Error = BoxedError;

    fn send_email(
        &self,
        notification: EmailNotification,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        Box::pin(async move {
            self.inner
                .send_email(notification)
                .await
                .map_err(BoxedError::new)
        })
    }
}

/// A reminder attached to a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventReminder {
    /// "email" or "popup".
    pub method: String,
    pub minutes: i32,
}

/// Data structures for calendar service operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// The summary or title of the event.
    pub summary: String,
    pub description: Option<String>,
    /// Attendee email addresses.
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub reminders: Vec<EventReminder>,
}

/// Represents the result of a calendar event operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventResult {
    /// The ID of the event.
    pub event_id: Option<String>,
    /// The status of the event.
    pub status: String,
}

/// Payloads understood by the email function, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailNotification {
    SignupWelcome {
        to_email: String,
        user_name: String,
        role: String,
    },
    BookingConfirmation {
        to_email: String,
        patient_email: String,
        patient_name: String,
        doctor_email: String,
        doctor_name: String,
        appointment_date: String,
        appointment_time: String,
        reason: String,
    },
}

impl EmailNotification {
    pub fn recipient(&self) -> &str {
        match self {
            EmailNotification::SignupWelcome { to_email, .. } => to_email,
            EmailNotification::BookingConfirmation { to_email, .. } => to_email,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            EmailNotification::SignupWelcome { .. } => "SIGNUP_WELCOME",
            EmailNotification::BookingConfirmation { .. } => "BOOKING_CONFIRMATION",
        }
    }
}

/// Represents the result of a notification operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    /// Request id sent along with the notification.
    pub id: String,
    /// The status of the notification.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_confirmation_payload_shape() {
        let notification = EmailNotification::BookingConfirmation {
            to_email: "pat@example.com".to_string(),
            patient_email: "pat@example.com".to_string(),
            patient_name: "Pat One".to_string(),
            doctor_email: "doc@example.com".to_string(),
            doctor_name: "Dr. Dana Doe".to_string(),
            appointment_date: "Monday, January 07, 2030".to_string(),
            appointment_time: "10:00 AM - 10:30 AM".to_string(),
            reason: "General Consultation".to_string(),
        };

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["action"], "BOOKING_CONFIRMATION");
        assert_eq!(value["doctor_name"], "Dr. Dana Doe");
        assert_eq!(value["to_email"], notification.recipient());
        assert_eq!(notification.action(), "BOOKING_CONFIRMATION");
    }

    #[test]
    fn test_welcome_payload_action() {
        let notification = EmailNotification::SignupWelcome {
            to_email: "pat@example.com".to_string(),
            user_name: "Pat".to_string(),
            role: "patient".to_string(),
        };
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["action"], "SIGNUP_WELCOME");
        assert_eq!(value["role"], "patient");
    }
}
