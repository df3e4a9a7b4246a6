// libs/appointment-cell/src/store/memory.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    Appointment, AppointmentPatch, AppointmentType, NewAppointment, NewAppointmentType, TypeStatus,
};
use crate::services::clock::record_timestamp;
use crate::services::conflict::find_conflicts;
use crate::store::{AppointmentStore, AppointmentTypeRegistry, CommitOutcome, WriteGuarantee};

#[derive(Default)]
struct Tables {
    appointments: HashMap<Uuid, Appointment>,
    types: HashMap<Uuid, AppointmentType>,
}

impl Tables {
    fn day(&self, date: NaiveDate) -> Vec<Appointment> {
        let mut day: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|a| a.appointment_date == date)
            .cloned()
            .collect();
        day.sort_by_key(|a| (a.start_minutes(), a.id));
        day
    }

    fn insert(&mut self, appointment: NewAppointment) -> Appointment {
        let created = Appointment::from_new(Uuid::new_v4(), appointment, record_timestamp());
        self.appointments.insert(created.id, created.clone());
        created
    }

    fn patched(&self, id: Uuid, patch: &AppointmentPatch) -> StoreResult<Appointment> {
        let mut appointment = self
            .appointments
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))?;
        patch.apply_to(&mut appointment);
        appointment.updated_at = record_timestamp();
        Ok(appointment)
    }
}

/// Process-local store. Appointments and types share one lock, so the
/// conditional writes check and write under the same guard.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an existing record verbatim (fixtures, imports).
    pub async fn insert_appointment(&self, appointment: Appointment) {
        self.tables
            .write()
            .await
            .appointments
            .insert(appointment.id, appointment);
    }

    pub async fn insert_type(&self, appointment_type: AppointmentType) {
        self.tables
            .write()
            .await
            .types
            .insert(appointment_type.id, appointment_type);
    }
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn query_by_date(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        Ok(self.tables.read().await.day(date))
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(self.tables.read().await.appointments.get(&id).cloned())
    }

    async fn create(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        Ok(self.tables.write().await.insert(appointment))
    }

    async fn update(&self, id: Uuid, patch: AppointmentPatch) -> StoreResult<Appointment> {
        let mut tables = self.tables.write().await;
        let updated = tables.patched(id, &patch)?;
        tables.appointments.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .appointments
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    fn write_guarantee(&self) -> WriteGuarantee {
        WriteGuarantee::Atomic
    }

    async fn create_if_vacant(&self, appointment: NewAppointment) -> StoreResult<CommitOutcome> {
        let mut tables = self.tables.write().await;
        let day = tables.day(appointment.appointment_date);
        let conflicts = find_conflicts(&day, appointment.start_minutes(), appointment.end_minutes(), None);

        if !conflicts.is_empty() {
            debug!("Conditional create refused, {} overlapping appointment(s)", conflicts.len());
            return Ok(CommitOutcome::Conflict(conflicts.into_iter().cloned().collect()));
        }

        Ok(CommitOutcome::Written(tables.insert(appointment)))
    }

    async fn update_if_vacant(&self, id: Uuid, patch: AppointmentPatch) -> StoreResult<CommitOutcome> {
        let mut tables = self.tables.write().await;
        let updated = tables.patched(id, &patch)?;

        if updated.occupies_time() {
            let day = tables.day(updated.appointment_date);
            let conflicts = find_conflicts(&day, updated.start_minutes(), updated.end_minutes(), Some(id));
            if !conflicts.is_empty() {
                debug!("Conditional update of {} refused, {} overlapping appointment(s)", id, conflicts.len());
                return Ok(CommitOutcome::Conflict(conflicts.into_iter().cloned().collect()));
            }
        }

        tables.appointments.insert(id, updated.clone());
        Ok(CommitOutcome::Written(updated))
    }
}

#[async_trait]
impl AppointmentTypeRegistry for InMemoryStore {
    async fn list_all(&self) -> StoreResult<Vec<AppointmentType>> {
        let mut types: Vec<AppointmentType> = self.tables.read().await.types.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(types)
    }

    async fn get_type(&self, id: Uuid) -> StoreResult<Option<AppointmentType>> {
        Ok(self.tables.read().await.types.get(&id).cloned())
    }

    async fn create_type(&self, new_type: NewAppointmentType) -> StoreResult<AppointmentType> {
        let created = AppointmentType {
            id: Uuid::new_v4(),
            name: new_type.name,
            duration_minutes: new_type.duration_minutes,
            status: TypeStatus::Active,
            created_at: record_timestamp(),
        };
        self.tables.write().await.types.insert(created.id, created.clone());
        Ok(created)
    }

    async fn set_type_status(&self, id: Uuid, status: TypeStatus) -> StoreResult<AppointmentType> {
        let mut tables = self.tables.write().await;
        let appointment_type = tables.types.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        appointment_type.status = status;
        Ok(appointment_type.clone())
    }

    async fn count_future_appointments(&self, type_id: Uuid, as_of: NaiveDateTime) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .appointments
            .values()
            .filter(|a| a.appointment_type_id == type_id)
            .filter(|a| a.occupies_time())
            .filter(|a| a.starts_at() > as_of)
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    use crate::models::AppointmentStatus;

    fn new_appointment(h: u32, m: u32, duration: u32) -> NewAppointment {
        NewAppointment {
            patient_id: Uuid::new_v4(),
            appointment_type_id: Uuid::new_v4(),
            appointment_type_name: "Consultation".into(),
            duration_minutes: duration,
            appointment_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            status: AppointmentStatus::Confirmed,
            doctor_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn conditional_create_refuses_overlap() {
        let store = InMemoryStore::new();
        let first = store.create(new_appointment(9, 0, 30)).await.unwrap();

        let outcome = store.create_if_vacant(new_appointment(9, 15, 30)).await.unwrap();
        match outcome {
            CommitOutcome::Conflict(conflicts) => assert_eq!(conflicts[0].id, first.id),
            other => panic!("expected conflict, got {:?}", other),
        }

        let outcome = store.create_if_vacant(new_appointment(9, 30, 30)).await.unwrap();
        assert!(matches!(outcome, CommitOutcome::Written(_)));
        assert_eq!(store.query_by_date(first.appointment_date).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn conditional_update_ignores_itself() {
        let store = InMemoryStore::new();
        let created = store.create(new_appointment(9, 0, 30)).await.unwrap();

        let patch = AppointmentPatch {
            duration_minutes: Some(45),
            ..Default::default()
        };
        let outcome = store.update_if_vacant(created.id, patch).await.unwrap();
        match outcome {
            CommitOutcome::Written(updated) => assert_eq!(updated.duration_minutes, 45),
            other => panic!("expected write, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_records_report_not_found() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.delete(id).await, Err(StoreError::NotFound(id)));
        assert_eq!(
            store.update(id, AppointmentPatch::default()).await,
            Err(StoreError::NotFound(id))
        );
    }
}
