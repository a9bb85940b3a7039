//! Post-commit side effects of bookings and registrations.
//!
//! The booking path only ever calls [`FulfillmentDispatcher::dispatch`], which
//! never blocks and never fails the caller. A [`FulfillmentWorker`] drains the
//! queue, runs every task on its own tokio task and retries it with a linear
//! backoff. Nothing in here can modify an appointment.

use crate::messages::{appointment_event, booking_confirmation, welcome_email};
use crate::state::clinic_time_zone;
use chrono::{SubsecRound, Utc};
use chrono_tz::Tz;
use clinic_common::models::{CalendarEventLink, CalendarOwner};
use clinic_common::services::{BoxedError, CalendarService, NotificationService, ServiceFactory};
use clinic_common::ClinicError;
use clinic_config::BookingConfig;
use clinic_db::{
    AppointmentRepository, CalendarEventRepository, DbClient, DbError, SqlAppointmentRepository,
    SqlCalendarEventRepository, SqlUserRepository, UserRepository,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A unit of work queued after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentTask {
    CalendarSync {
        appointment_id: String,
        owner: CalendarOwner,
    },
    BookingConfirmationEmail {
        appointment_id: String,
    },
    WelcomeEmail {
        user_id: String,
    },
}

impl FulfillmentTask {
    /// The tasks that follow a confirmed booking.
    pub fn for_booking(appointment_id: &str) -> Vec<FulfillmentTask> {
        vec![
            FulfillmentTask::CalendarSync {
                appointment_id: appointment_id.to_string(),
                owner: CalendarOwner::Doctor,
            },
            FulfillmentTask::CalendarSync {
                appointment_id: appointment_id.to_string(),
                owner: CalendarOwner::Patient,
            },
            FulfillmentTask::BookingConfirmationEmail {
                appointment_id: appointment_id.to_string(),
            },
        ]
    }
}

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Calendar sync failed: {0}")]
    Calendar(BoxedError),

    #[error("Email delivery failed: {0}")]
    Email(BoxedError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl FulfillmentError {
    /// Missing records will not appear on a retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FulfillmentError::NotFound(_))
    }
}

/// Sending half of the fulfillment queue.
#[derive(Debug, Clone)]
pub struct FulfillmentDispatcher {
    sender: mpsc::Sender<FulfillmentTask>,
}

impl FulfillmentDispatcher {
    /// Create a bounded queue. The receiver goes to [`FulfillmentWorker::spawn`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<FulfillmentTask>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Enqueue without waiting. Returns whether the task was accepted.
    pub fn dispatch(&self, task: FulfillmentTask) -> bool {
        match self.sender.try_send(task) {
            Ok(()) => true,
            Err(TrySendError::Full(task)) => {
                warn!("Fulfillment queue full, dropping {:?}", task);
                false
            }
            Err(TrySendError::Closed(task)) => {
                warn!("Fulfillment queue closed, dropping {:?}", task);
                false
            }
        }
    }

    pub fn dispatch_all(&self, tasks: impl IntoIterator<Item = FulfillmentTask>) {
        for task in tasks {
            self.dispatch(task);
        }
    }
}

/// Executes fulfillment tasks against the calendar and email services.
#[derive(Clone)]
pub struct FulfillmentWorker {
    users: SqlUserRepository,
    appointments: SqlAppointmentRepository,
    calendar_events: SqlCalendarEventRepository,
    calendar: Option<Arc<dyn CalendarService<Error = BoxedError>>>,
    notifications: Option<Arc<dyn NotificationService<Error = BoxedError>>>,
    time_zone: Tz,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl FulfillmentWorker {
    pub fn new(
        db_client: DbClient,
        services: &dyn ServiceFactory,
        config: &BookingConfig,
    ) -> Result<Self, ClinicError> {
        let time_zone = clinic_time_zone(config)?;

        Ok(Self {
            users: SqlUserRepository::new(db_client.clone()),
            appointments: SqlAppointmentRepository::new(db_client.clone()),
            calendar_events: SqlCalendarEventRepository::new(db_client),
            calendar: services.calendar_service(),
            notifications: services.notification_service(),
            time_zone,
            max_attempts: config.fulfillment_max_attempts.max(1),
            retry_backoff: config.retry_backoff(),
        })
    }

    /// Run the worker on the current runtime until every dispatcher is dropped.
    pub fn spawn(self, receiver: mpsc::Receiver<FulfillmentTask>) -> JoinHandle<()> {
        tokio::spawn(self.run(receiver))
    }

    pub async fn run(self, mut receiver: mpsc::Receiver<FulfillmentTask>) {
        info!("Fulfillment worker started");
        while let Some(task) = receiver.recv().await {
            let worker = self.clone();
            tokio::spawn(async move {
                // Outcome is logged inside `process`.
                let _ = worker.process(task).await;
            });
        }
        info!("Fulfillment queue closed, worker stopping");
    }

    /// Execute a task, retrying retryable failures up to the configured limit.
    pub async fn process(&self, task: FulfillmentTask) -> Result<(), FulfillmentError> {
        let mut attempt = 1;
        loop {
            match self.execute(&task).await {
                Ok(()) => {
                    debug!("Fulfilled {:?} on attempt {}", task, attempt);
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        "Fulfillment attempt {}/{} for {:?} failed: {}",
                        attempt, self.max_attempts, task, e
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "Giving up on {:?} after {} attempt(s): {}",
                        task, attempt, e
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn execute(&self, task: &FulfillmentTask) -> Result<(), FulfillmentError> {
        match task {
            FulfillmentTask::CalendarSync {
                appointment_id,
                owner,
            } => self.sync_calendar(appointment_id, *owner).await,
            FulfillmentTask::BookingConfirmationEmail { appointment_id } => {
                self.send_booking_confirmation(appointment_id).await
            }
            FulfillmentTask::WelcomeEmail { user_id } => self.send_welcome(user_id).await,
        }
    }

    async fn sync_calendar(
        &self,
        appointment_id: &str,
        owner: CalendarOwner,
    ) -> Result<(), FulfillmentError> {
        let Some(calendar) = &self.calendar else {
            debug!("Calendar sync disabled, skipping {}", appointment_id);
            return Ok(());
        };

        if self
            .calendar_events
            .find_event(appointment_id, owner)
            .await?
            .is_some()
        {
            debug!(
                "Calendar event for {} ({}) already exists",
                appointment_id,
                owner.as_str()
            );
            return Ok(());
        }

        let details = self
            .appointments
            .find_details(appointment_id)
            .await?
            .ok_or_else(|| FulfillmentError::NotFound(format!("appointment {appointment_id}")))?;

        let owner_user = match owner {
            CalendarOwner::Doctor => &details.doctor,
            CalendarOwner::Patient => &details.patient,
        };
        let Some(calendar_id) = owner_user
            .calendar_id
            .as_deref()
            .filter(|_| owner_user.has_calendar_connected())
        else {
            debug!(
                "User {} has no calendar connected, skipping",
                owner_user.id
            );
            return Ok(());
        };

        let result = calendar
            .create_event(calendar_id, appointment_event(&details, owner))
            .await
            .map_err(FulfillmentError::Calendar)?;

        match result.event_id {
            Some(event_id) => {
                let link = CalendarEventLink {
                    appointment_id: appointment_id.to_string(),
                    owner,
                    event_id,
                    created_at: Utc::now().trunc_subsecs(0),
                };
                self.calendar_events.record_event(&link).await?;
                info!(
                    "Calendar event {} created for appointment {} ({})",
                    link.event_id,
                    appointment_id,
                    owner.as_str()
                );
            }
            None => warn!(
                "Calendar returned no event id for appointment {} ({})",
                appointment_id,
                owner.as_str()
            ),
        }
        Ok(())
    }

    async fn send_booking_confirmation(&self, appointment_id: &str) -> Result<(), FulfillmentError> {
        let Some(notifications) = &self.notifications else {
            debug!("Email disabled, skipping confirmation for {}", appointment_id);
            return Ok(());
        };

        let details = self
            .appointments
            .find_details(appointment_id)
            .await?
            .ok_or_else(|| FulfillmentError::NotFound(format!("appointment {appointment_id}")))?;

        notifications
            .send_email(booking_confirmation(&details, self.time_zone))
            .await
            .map_err(FulfillmentError::Email)?;
        Ok(())
    }

    async fn send_welcome(&self, user_id: &str) -> Result<(), FulfillmentError> {
        let Some(notifications) = &self.notifications else {
            debug!("Email disabled, skipping welcome for {}", user_id);
            return Ok(());
        };

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| FulfillmentError::NotFound(format!("user {user_id}")))?;

        notifications
            .send_email(welcome_email(&user))
            .await
            .map_err(FulfillmentError::Email)?;
        Ok(())
    }
}
