//! Read access to appointments.

use clinic_common::models::{AppointmentDetails, User, UserRole};
use clinic_common::{not_found, ClinicError};
use clinic_db::{
    AppointmentRepository, DbClient, SqlAppointmentRepository, SqlUserRepository, UserRepository,
};

#[derive(Debug, Clone)]
pub struct AppointmentQueries {
    users: SqlUserRepository,
    appointments: SqlAppointmentRepository,
}

impl AppointmentQueries {
    pub fn new(db_client: DbClient) -> Self {
        Self {
            users: SqlUserRepository::new(db_client.clone()),
            appointments: SqlAppointmentRepository::new(db_client),
        }
    }

    async fn require_role(&self, user_id: &str, role: UserRole) -> Result<User, ClinicError> {
        match self.users.find_by_id(user_id).await? {
            Some(user) if user.role == role => Ok(user),
            _ => Err(not_found(format!("{role} {user_id} not found"))),
        }
    }

    pub async fn get_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<AppointmentDetails, ClinicError> {
        self.appointments
            .find_details(appointment_id)
            .await?
            .ok_or_else(|| not_found(format!("appointment {appointment_id} not found")))
    }

    pub async fn list_patient_appointments(
        &self,
        patient_id: &str,
    ) -> Result<Vec<AppointmentDetails>, ClinicError> {
        self.require_role(patient_id, UserRole::Patient).await?;
        Ok(self.appointments.list_for_patient(patient_id).await?)
    }

    pub async fn list_doctor_appointments(
        &self,
        doctor_id: &str,
    ) -> Result<Vec<AppointmentDetails>, ClinicError> {
        self.require_role(doctor_id, UserRole::Doctor).await?;
        Ok(self.appointments.list_for_doctor(doctor_id).await?)
    }
}
