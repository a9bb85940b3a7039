// Declare modules within this crate
pub mod error; // Error handling
pub mod features; // Runtime feature flags
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Domain models shared by all crates
pub mod services; // External service abstractions

// Re-export error types and utilities for easier access
pub use error::{
    config_error, conflict, external_service_error, internal_error, invalid_state, not_found,
    validation_error, ClinicError, Context, HttpStatusCode,
};

pub use http::{client::create_client, IntoHttpResponse};

pub use logging::{init, init_with_config, init_with_level, log_error};

pub use features::{is_email_enabled, is_feature_enabled, is_gcal_enabled};
