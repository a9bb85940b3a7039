//! Repository for doctors and patients

use crate::error::DbError;
use clinic_common::models::{NewUser, User};

/// Repository for users
///
/// Authentication lives outside this service; a user row only carries what
/// booking and fulfillment need.
pub trait UserRepository {
    /// Create the `users` table if it doesn't already exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Store a new user.
    ///
    /// # Errors
    ///
    /// [`DbError::Conflict`] if the email is already registered.
    fn create_user(
        &self,
        user: NewUser,
    ) -> impl std::future::Future<Output = Result<User, DbError>> + Send;

    /// Find a user by id
    fn find_by_id(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, DbError>> + Send;

    /// Find a user by email
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, DbError>> + Send;

    /// List doctors ordered by last name, optionally only those accepting appointments.
    fn list_doctors(
        &self,
        accepting_only: bool,
    ) -> impl std::future::Future<Output = Result<Vec<User>, DbError>> + Send;

    /// Toggle whether a doctor accepts new bookings.
    ///
    /// # Returns
    ///
    /// `true` if a doctor with that id was updated
    fn set_accepting_appointments(
        &self,
        doctor_id: &str,
        accepting: bool,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;
}
