//! Google Calendar integration for the clinic booking service
//!
//! Provides the calendar hub built from a service account key and the
//! [`GoogleCalendarService`](service::GoogleCalendarService) implementation
//! of the shared calendar service trait.

pub mod auth;
#[cfg(test)]
mod auth_test;
pub mod service;
#[cfg(test)]
mod service_test;

pub use auth::{create_calendar_hub, AuthError, HubType};
pub use service::{GcalServiceError, GoogleCalendarService};
