use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::booking::{
    Appointment, AppointmentFilter, AppointmentStatus, BookingError, BookingStore, BookingUnit,
    NewAppointment, SlotKey,
};
use crate::models::{AvailabilityWindow, DayOfWeek, Practitioner};

const APPOINTMENT_COLUMNS: &str = "id, branch_id, practitioner_id, client_id, appointment_date, \
     time_slot, status, reason, lens_type, notes, created_at, updated_at";

const PRACTITIONER_COLUMNS: &str = "id, staff_member_id, specialty, license_number, \
     years_experience, availability_windows, assigned_branch_ids, is_generally_available";

#[derive(Debug, FromRow)]
struct PractitionerRow {
    id: Uuid,
    staff_member_id: Uuid,
    specialty: String,
    license_number: String,
    years_experience: i32,
    availability_windows: Json<Vec<AvailabilityWindow>>,
    assigned_branch_ids: Vec<Uuid>,
    is_generally_available: bool,
}

impl From<PractitionerRow> for Practitioner {
    fn from(row: PractitionerRow) -> Self {
        Self {
            id: row.id,
            staff_member_id: row.staff_member_id,
            specialty: row.specialty,
            license_number: row.license_number,
            years_experience: row.years_experience,
            availability_windows: row.availability_windows.0,
            assigned_branch_ids: row.assigned_branch_ids,
            is_generally_available: row.is_generally_available,
        }
    }
}

/// Postgres-backed appointment storage
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    /// Create a new PgBookingStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn begin(&self) -> Result<Box<dyn BookingUnit>, BookingError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgBookingUnit { tx }))
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, BookingError> {
        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments WHERE id = $1",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, BookingError> {
        let appointments = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE ($1::uuid IS NULL OR branch_id = $1)
              AND ($2::date IS NULL OR appointment_date = $2)
              AND ($3::uuid IS NULL OR practitioner_id = $3)
              AND ($4::boolean OR status <> 'cancelled')
            ORDER BY appointment_date, time_slot, created_at
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(filter.branch_id)
        .bind(filter.date)
        .bind(filter.practitioner_id)
        .bind(filter.include_cancelled)
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Option<Appointment>, BookingError> {
        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            UPDATE appointments
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .bind(expected)
        .bind(new_status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn ping(&self) -> Result<(), BookingError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One database transaction; dropping it uncommitted rolls back
pub struct PgBookingUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingUnit for PgBookingUnit {
    async fn branch_exists(&mut self, branch_id: Uuid) -> Result<bool, BookingError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)")
            .bind(branch_id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(exists.0)
    }

    async fn find_practitioner(&mut self, id: Uuid) -> Result<Option<Practitioner>, BookingError> {
        let row = sqlx::query_as::<_, PractitionerRow>(&format!(
            "SELECT {} FROM practitioners WHERE id = $1",
            PRACTITIONER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Practitioner::from))
    }

    async fn practitioners_for(
        &mut self,
        branch_id: Uuid,
        weekday: DayOfWeek,
    ) -> Result<Vec<Practitioner>, BookingError> {
        let rows = sqlx::query_as::<_, PractitionerRow>(&format!(
            r#"
            SELECT {}
            FROM practitioners
            WHERE is_generally_available
              AND $1 = ANY(assigned_branch_ids)
              AND EXISTS (
                  SELECT 1 FROM jsonb_array_elements(availability_windows) w
                  WHERE w->>'weekday' = $2
              )
            ORDER BY created_at, id
            "#,
            PRACTITIONER_COLUMNS
        ))
        .bind(branch_id)
        .bind(weekday.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Practitioner::from).collect())
    }

    async fn occupied_practitioners(
        &mut self,
        practitioner_ids: &[Uuid],
        slot: &SlotKey,
    ) -> Result<HashSet<Uuid>, BookingError> {
        let occupied: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT practitioner_id
            FROM appointments
            WHERE practitioner_id = ANY($1)
              AND branch_id = $2
              AND appointment_date = $3
              AND time_slot = $4
              AND status <> 'cancelled'
            "#,
        )
        .bind(practitioner_ids)
        .bind(slot.branch_id)
        .bind(slot.date)
        .bind(slot.time.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(occupied.into_iter().map(|(id,)| id).collect())
    }

    async fn active_loads(
        &mut self,
        practitioner_ids: &[Uuid],
        branch_id: Uuid,
        date: NaiveDate,
    ) -> Result<HashMap<Uuid, i64>, BookingError> {
        let counts: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT practitioner_id, COUNT(*)
            FROM appointments
            WHERE practitioner_id = ANY($1)
              AND branch_id = $2
              AND appointment_date = $3
              AND status <> 'cancelled'
            GROUP BY practitioner_id
            "#,
        )
        .bind(practitioner_ids)
        .bind(branch_id)
        .bind(date)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(counts.into_iter().collect())
    }

    async fn insert_appointment(
        &mut self,
        new: &NewAppointment,
    ) -> Result<Appointment, BookingError> {
        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            INSERT INTO appointments
                (id, branch_id, practitioner_id, client_id, appointment_date, time_slot,
                 status, reason, lens_type, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(new.id)
        .bind(new.branch_id)
        .bind(new.practitioner_id)
        .bind(new.client_id)
        .bind(new.date)
        .bind(new.time_slot.as_str())
        .bind(new.status)
        .bind(&new.reason)
        .bind(&new.lens_type)
        .bind(&new.notes)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return BookingError::ConcurrentBookingLost(new.practitioner_id);
                }
                if db_err.is_foreign_key_violation() {
                    return BookingError::ValidationError(
                        "Branch or practitioner no longer exists".to_string(),
                    );
                }
            }
            BookingError::from(e)
        })?;

        Ok(appointment)
    }

    async fn commit(self: Box<Self>) -> Result<(), BookingError> {
        let PgBookingUnit { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), BookingError> {
        let PgBookingUnit { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
