// libs/appointment-cell/src/store/mod.rs
//
// Persistence seams of the scheduling core. Everything date-scoped is queried
// one calendar date at a time.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{Appointment, AppointmentPatch, AppointmentType, NewAppointment, NewAppointmentType, TypeStatus};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryStore;
pub use supabase::SupabaseStore;

/// How far a store can protect a write against concurrent bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteGuarantee {
    /// The overlap check and the write happen as one step.
    Atomic,
    /// Only a read followed by a separate write is possible. Two writers can
    /// still interleave between the two, so a double booking may slip through
    /// and has to be caught by a later read.
    ReReadThenWrite,
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Written(Appointment),
    /// Nothing was written; these appointments hold the requested time.
    Conflict(Vec<Appointment>),
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// All appointments on `date`, any status, ordered by start time.
    async fn query_by_date(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Appointment>>;

    async fn create(&self, appointment: NewAppointment) -> StoreResult<Appointment>;

    async fn update(&self, id: Uuid, patch: AppointmentPatch) -> StoreResult<Appointment>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    fn write_guarantee(&self) -> WriteGuarantee {
        WriteGuarantee::ReReadThenWrite
    }

    /// Create unless a time-holding appointment on the same date overlaps.
    async fn create_if_vacant(&self, _appointment: NewAppointment) -> StoreResult<CommitOutcome> {
        Err(StoreError::Unsupported("conditional create"))
    }

    /// Update unless the patched interval overlaps another time-holding
    /// appointment on its date.
    async fn update_if_vacant(&self, _id: Uuid, _patch: AppointmentPatch) -> StoreResult<CommitOutcome> {
        Err(StoreError::Unsupported("conditional update"))
    }
}

#[async_trait]
pub trait AppointmentTypeRegistry: Send + Sync {
    async fn list_all(&self) -> StoreResult<Vec<AppointmentType>>;

    async fn list_active(&self) -> StoreResult<Vec<AppointmentType>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(AppointmentType::is_active)
            .collect())
    }

    async fn get_type(&self, id: Uuid) -> StoreResult<Option<AppointmentType>>;

    async fn create_type(&self, new_type: NewAppointmentType) -> StoreResult<AppointmentType>;

    async fn set_type_status(&self, id: Uuid, status: TypeStatus) -> StoreResult<AppointmentType>;

    /// Time-holding appointments of `type_id` starting strictly after `as_of`.
    async fn count_future_appointments(&self, type_id: Uuid, as_of: NaiveDateTime) -> StoreResult<u64>;
}
