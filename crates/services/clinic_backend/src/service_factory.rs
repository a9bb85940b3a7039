// --- File: crates/services/clinic_backend/src/service_factory.rs ---
//! Service factory implementation.
//!
//! Builds the external integrations enabled in the configuration and hands
//! them out through the [`ServiceFactory`] trait. An integration whose
//! feature is compiled out, or whose setup fails, is reported as disabled.
use clinic_common::services::{BoxedError, CalendarService, NotificationService, ServiceFactory};
use clinic_config::AppConfig;
use std::sync::Arc;
#[allow(unused_imports)] // used only by certain features
use {
    clinic_common::services::{BoxedCalendarService, BoxedNotificationService},
    clinic_common::{is_email_enabled, is_gcal_enabled},
    tracing::{error, info, warn},
};

#[cfg(feature = "gcal")]
use clinic_gcal::{create_calendar_hub, GoogleCalendarService};

#[cfg(feature = "email")]
use clinic_email::HttpEmailService;

pub struct ClinicServiceFactory {
    calendar_service: Option<Arc<dyn CalendarService<Error = BoxedError>>>,
    notification_service: Option<Arc<dyn NotificationService<Error = BoxedError>>>,
}

impl ClinicServiceFactory {
    pub async fn new(config: &AppConfig) -> Self {
        Self {
            calendar_service: Self::init_calendar(config).await,
            notification_service: Self::init_notifications(config),
        }
    }

    /// A factory with every integration disabled.
    pub fn disabled() -> Self {
        Self {
            calendar_service: None,
            notification_service: None,
        }
    }

    #[allow(unused_variables)]
    async fn init_calendar(
        config: &AppConfig,
    ) -> Option<Arc<dyn CalendarService<Error = BoxedError>>> {
        #[cfg(feature = "gcal")]
        {
            let gcal_config = config.gcal.as_ref().filter(|_| is_gcal_enabled(config))?;
            info!("Initializing Google Calendar service...");

            let hub = match create_calendar_hub(gcal_config).await {
                Ok(hub) => hub,
                Err(e) => {
                    error!("Failed to create Google Calendar hub: {}", e);
                    return None;
                }
            };
            match GoogleCalendarService::new(Arc::new(hub), gcal_config) {
                Ok(service) => {
                    info!("Google Calendar service initialized");
                    Some(Arc::new(BoxedCalendarService::new(service)))
                }
                Err(e) => {
                    error!("Invalid Google Calendar configuration: {}", e);
                    None
                }
            }
        }
        #[cfg(not(feature = "gcal"))]
        {
            if config.use_gcal {
                warn!("use_gcal is set but the gcal feature is not compiled in");
            }
            None
        }
    }

    #[allow(unused_variables)]
    fn init_notifications(
        config: &AppConfig,
    ) -> Option<Arc<dyn NotificationService<Error = BoxedError>>> {
        #[cfg(feature = "email")]
        {
            let email_config = config.email.as_ref().filter(|_| is_email_enabled(config))?;
            match HttpEmailService::new(email_config) {
                Ok(service) => {
                    info!("Email service initialized for {}", email_config.service_url);
                    Some(Arc::new(BoxedNotificationService::new(service)))
                }
                Err(e) => {
                    error!("Failed to initialize email service: {}", e);
                    None
                }
            }
        }
        #[cfg(not(feature = "email"))]
        {
            if config.use_email {
                warn!("use_email is set but the email feature is not compiled in");
            }
            None
        }
    }
}

impl ServiceFactory for ClinicServiceFactory {
    fn calendar_service(&self) -> Option<Arc<dyn CalendarService<Error = BoxedError>>> {
        self.calendar_service.clone()
    }

    fn notification_service(&self) -> Option<Arc<dyn NotificationService<Error = BoxedError>>> {
        self.notification_service.clone()
    }
}
