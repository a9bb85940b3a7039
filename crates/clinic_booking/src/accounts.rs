//! Registration and doctor availability.

use crate::fulfillment::{FulfillmentDispatcher, FulfillmentTask};
use clinic_common::models::{NewUser, User};
use clinic_common::{not_found, validation_error, ClinicError};
use clinic_db::{DbClient, SqlUserRepository, UserRepository};
use tracing::info;

#[derive(Debug, Clone)]
pub struct AccountService {
    users: SqlUserRepository,
    dispatcher: FulfillmentDispatcher,
}

fn validate(new_user: &NewUser) -> Result<(), ClinicError> {
    if new_user.first_name.trim().is_empty() || new_user.last_name.trim().is_empty() {
        return Err(validation_error("first and last name are required"));
    }
    let email = new_user.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(validation_error(format!("invalid email address: {email}"))),
    }
}

impl AccountService {
    pub fn new(db_client: DbClient, dispatcher: FulfillmentDispatcher) -> Self {
        Self {
            users: SqlUserRepository::new(db_client),
            dispatcher,
        }
    }

    /// Create a doctor or patient account and queue the welcome email.
    pub async fn register_user(&self, new_user: NewUser) -> Result<User, ClinicError> {
        validate(&new_user)?;

        let new_user = NewUser {
            email: new_user.email.trim().to_lowercase(),
            first_name: new_user.first_name.trim().to_string(),
            last_name: new_user.last_name.trim().to_string(),
            ..new_user
        };

        let user = self.users.create_user(new_user).await?;
        info!("Registered {} {}", user.role, user.id);

        self.dispatcher.dispatch(FulfillmentTask::WelcomeEmail {
            user_id: user.id.clone(),
        });
        Ok(user)
    }

    /// Doctors currently accepting appointments.
    pub async fn list_doctors(&self) -> Result<Vec<User>, ClinicError> {
        Ok(self.users.list_doctors(true).await?)
    }

    pub async fn set_accepting_appointments(
        &self,
        doctor_id: &str,
        accepting: bool,
    ) -> Result<(), ClinicError> {
        if self
            .users
            .set_accepting_appointments(doctor_id, accepting)
            .await?
        {
            info!(
                "Doctor {} is {} accepting appointments",
                doctor_id,
                if accepting { "now" } else { "no longer" }
            );
            Ok(())
        } else {
            Err(not_found(format!("doctor {doctor_id} not found")))
        }
    }
}
