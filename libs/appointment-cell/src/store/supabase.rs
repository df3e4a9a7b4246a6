// libs/appointment-cell/src/store/supabase.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    Appointment, AppointmentPatch, AppointmentType, NewAppointment, NewAppointmentType, TypeStatus,
};
use crate::services::clock::record_timestamp;
use crate::store::{AppointmentStore, AppointmentTypeRegistry, WriteGuarantee};

const APPOINTMENTS: &str = "/rest/v1/appointments";
const APPOINTMENT_TYPES: &str = "/rest/v1/appointment_types";

/// PostgREST-backed store. PostgREST has no conditional insert keyed on
/// interval overlap, so writes are [`WriteGuarantee::ReReadThenWrite`].
pub struct SupabaseStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn fetch_appointments(&self, query: &str) -> StoreResult<Vec<Appointment>> {
        let path = format!("{}?{}", APPOINTMENTS, query);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    async fn fetch_types(&self, query: &str) -> StoreResult<Vec<AppointmentType>> {
        let path = format!("{}?{}", APPOINTMENT_TYPES, query);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    /// Write with `return=representation` and decode the single echoed row.
    async fn write_one<T>(&self, method: Method, path: &str, body: Value, id: Option<Uuid>) -> StoreResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(method, path, Some(body), Some(SupabaseClient::return_representation()))
            .await?;

        match rows.into_iter().next() {
            Some(row) => Ok(serde_json::from_value(row)?),
            None => Err(match id {
                Some(id) => StoreError::NotFound(id),
                None => StoreError::Backend("write returned no rows".to_string()),
            }),
        }
    }
}

#[async_trait]
impl AppointmentStore for SupabaseStore {
    async fn query_by_date(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        debug!("Fetching appointments for {}", date);
        self.fetch_appointments(&format!(
            "appointment_date=eq.{}&order=start_time.asc",
            date.format("%Y-%m-%d")
        ))
        .await
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(self
            .fetch_appointments(&format!("id=eq.{}&limit=1", id))
            .await?
            .into_iter()
            .next())
    }

    async fn create(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        let mut body = serde_json::to_value(&appointment)?;
        let now = record_timestamp().to_rfc3339();
        if let Some(fields) = body.as_object_mut() {
            fields.insert("created_at".into(), json!(now));
            fields.insert("updated_at".into(), json!(now));
        }
        self.write_one(Method::POST, APPOINTMENTS, body, None).await
    }

    async fn update(&self, id: Uuid, patch: AppointmentPatch) -> StoreResult<Appointment> {
        let mut body = serde_json::to_value(&patch)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("updated_at".into(), json!(record_timestamp().to_rfc3339()));
        }
        let path = format!("{}?id=eq.{}", APPOINTMENTS, id);
        self.write_one(Method::PATCH, &path, body, Some(id)).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS, id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, Some(SupabaseClient::return_representation()))
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn write_guarantee(&self) -> WriteGuarantee {
        WriteGuarantee::ReReadThenWrite
    }
}

#[async_trait]
impl AppointmentTypeRegistry for SupabaseStore {
    async fn list_all(&self) -> StoreResult<Vec<AppointmentType>> {
        self.fetch_types("order=name.asc").await
    }

    async fn list_active(&self) -> StoreResult<Vec<AppointmentType>> {
        self.fetch_types("status=eq.active&order=name.asc").await
    }

    async fn get_type(&self, id: Uuid) -> StoreResult<Option<AppointmentType>> {
        Ok(self
            .fetch_types(&format!("id=eq.{}&limit=1", id))
            .await?
            .into_iter()
            .next())
    }

    async fn create_type(&self, new_type: NewAppointmentType) -> StoreResult<AppointmentType> {
        let body = json!({
            "name": new_type.name,
            "duration_minutes": new_type.duration_minutes,
            "status": TypeStatus::Active,
            "created_at": record_timestamp().to_rfc3339(),
        });
        self.write_one(Method::POST, APPOINTMENT_TYPES, body, None).await
    }

    async fn set_type_status(&self, id: Uuid, status: TypeStatus) -> StoreResult<AppointmentType> {
        let path = format!("{}?id=eq.{}", APPOINTMENT_TYPES, id);
        self.write_one(Method::PATCH, &path, json!({ "status": status }), Some(id))
            .await
    }

    async fn count_future_appointments(&self, type_id: Uuid, as_of: NaiveDateTime) -> StoreResult<u64> {
        // The date filter narrows the read; the exact start comparison is done here.
        let candidates = self
            .fetch_appointments(&format!(
                "appointment_type_id=eq.{}&appointment_date=gte.{}&status=neq.cancelled",
                type_id,
                as_of.date().format("%Y-%m-%d")
            ))
            .await?;

        Ok(candidates
            .iter()
            .filter(|a| a.occupies_time() && a.starts_at() > as_of)
            .count() as u64)
    }
}
