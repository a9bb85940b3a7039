//! Runtime feature flags.
//!
//! An integration is enabled when its `use_*` flag is set *and* its
//! configuration section is present.

use clinic_config::AppConfig;

/// Check if a feature is enabled at runtime based on configuration.
pub fn is_feature_enabled<T>(use_feature: bool, feature_config: Option<&T>) -> bool {
    use_feature && feature_config.is_some()
}

/// Google Calendar sync for confirmed appointments.
pub fn is_gcal_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_gcal, config.gcal.as_ref())
}

/// Notifications through the external email function.
pub fn is_email_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_email, config.email.as_ref())
}
