//! Email notification client
//!
//! Delivers [`EmailNotification`](clinic_common::services::EmailNotification)
//! payloads to the email function over HTTP.

pub mod client;

pub use client::{EmailError, HttpEmailService};
