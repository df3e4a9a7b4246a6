// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::future::try_join;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::{AppConfig, StoreBackend};

use crate::error::{BookingError, BookingResult};
use crate::models::{
    minutes_of, Appointment, AppointmentPatch, AppointmentStatus, AppointmentType, BookingDraft,
    BookingPhase, ConsistencyReport, NewAppointment, Segment, Slot, MAX_NOTES_CHARS,
};
use crate::services::cache::DayCache;
use crate::services::clock::{Clock, SystemClock};
use crate::services::conflict::{find_conflicts, find_double_bookings};
use crate::services::hours::WorkingHours;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::segments::segment_day;
use crate::services::slots::generate_slots;
use crate::services::types::AppointmentTypeService;
use crate::store::{
    AppointmentStore, AppointmentTypeRegistry, CommitOutcome, InMemoryStore, SupabaseStore, WriteGuarantee,
};

/// Everything the validator settled on before touching the store.
struct ValidatedBooking {
    existing: Option<Appointment>,
    appointment_type: AppointmentType,
    patient_id: Uuid,
    status: AppointmentStatus,
    duration_minutes: u32,
    type_name: String,
    doctor_id: Option<Uuid>,
    notes: Option<String>,
    start: u32,
    end: u32,
}

pub struct AppointmentBookingService {
    hours: WorkingHours,
    store: Arc<dyn AppointmentStore>,
    types: Arc<dyn AppointmentTypeRegistry>,
    type_service: AppointmentTypeService,
    lifecycle_service: AppointmentLifecycleService,
    clock: Arc<dyn Clock>,
    display_cache: DayCache,
}

impl AppointmentBookingService {
    pub fn new(
        hours: WorkingHours,
        store: Arc<dyn AppointmentStore>,
        types: Arc<dyn AppointmentTypeRegistry>,
        clock: Arc<dyn Clock>,
        display_cache_ttl: Duration,
    ) -> Self {
        Self {
            hours,
            type_service: AppointmentTypeService::new(Arc::clone(&types), Arc::clone(&clock)),
            store,
            types,
            lifecycle_service: AppointmentLifecycleService::new(),
            clock,
            display_cache: DayCache::new(display_cache_ttl),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let hours = WorkingHours::from_config(config);
        let ttl = Duration::from_secs(config.display_cache_ttl_seconds);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        match config.store_backend {
            StoreBackend::Memory => {
                info!("Using in-memory appointment store");
                let store = Arc::new(InMemoryStore::new());
                Self::new(hours, store.clone(), store, clock, ttl)
            }
            StoreBackend::Supabase => {
                info!("Using Supabase appointment store at {}", config.supabase_url);
                let store = Arc::new(SupabaseStore::new(config));
                Self::new(hours, store.clone(), store, clock, ttl)
            }
        }
    }

    pub fn working_hours(&self) -> &WorkingHours {
        &self.hours
    }

    pub fn types(&self) -> &AppointmentTypeService {
        &self.type_service
    }

    // ==============================================================================
    // DISPLAY VIEWS
    // ==============================================================================

    /// Day listing for rendering, served from the display cache when fresh.
    async fn display_day(&self, date: NaiveDate) -> BookingResult<Vec<Appointment>> {
        if let Some(cached) = self.display_cache.get(date).await {
            debug!("Display cache hit for {}", date);
            return Ok(cached);
        }
        let appointments = self.store.query_by_date(date).await?;
        self.display_cache.put(date, appointments.clone()).await;
        Ok(appointments)
    }

    pub async fn get_slots(&self, date: NaiveDate) -> BookingResult<Vec<Slot>> {
        let appointments = self.display_day(date).await?;
        Ok(generate_slots(&self.hours, &appointments, date, self.clock.now()))
    }

    pub async fn get_segments(&self, date: NaiveDate) -> BookingResult<Vec<Segment>> {
        let appointments = self.display_day(date).await?;
        Ok(segment_day(&self.hours, &appointments, date))
    }

    pub async fn get_appointment(&self, id: Uuid) -> BookingResult<Appointment> {
        self.store.get(id).await?.ok_or(BookingError::NotFound(id))
    }

    /// Uncached listing of one date.
    pub async fn get_day(&self, date: NaiveDate) -> BookingResult<Vec<Appointment>> {
        Ok(self.store.query_by_date(date).await?)
    }

    /// Reports overlapping time-holding appointments left behind by racing
    /// writers on stores without atomic writes.
    pub async fn check_day_consistency(&self, date: NaiveDate) -> BookingResult<ConsistencyReport> {
        let appointments = self.store.query_by_date(date).await?;
        let double_bookings = find_double_bookings(&appointments);
        if !double_bookings.is_empty() {
            warn!("{} double booking(s) found on {}", double_bookings.len(), date);
        }
        Ok(ConsistencyReport {
            appointment_date: date,
            is_consistent: double_bookings.is_empty(),
            double_bookings,
        })
    }

    // ==============================================================================
    // BOOKING
    // ==============================================================================

    /// Validate a draft against a fresh read of its date and commit it.
    ///
    /// Nothing is written unless every check passes; a rejected attempt leaves
    /// the store exactly as it was.
    #[instrument(skip(self, draft), fields(appointment_id = ?draft.appointment_id, date = %draft.appointment_date))]
    pub async fn submit_booking(&self, draft: BookingDraft) -> BookingResult<Appointment> {
        debug!("Booking attempt {}", BookingPhase::Draft);

        let result = self.validate_and_commit(&draft).await;
        match &result {
            Ok(appointment) => info!(
                "Booking attempt {}: appointment {} on {} at {}",
                BookingPhase::Committed,
                appointment.id,
                appointment.appointment_date,
                appointment.start_time.format("%H:%M")
            ),
            Err(e) => warn!("Booking attempt {}: {}", BookingPhase::Rejected, e),
        }
        result
    }

    async fn validate_and_commit(&self, draft: &BookingDraft) -> BookingResult<Appointment> {
        let booking = self.validate_draft(draft).await?;
        debug!("Booking attempt {}", BookingPhase::Validating);

        if booking.status != AppointmentStatus::Cancelled {
            // Authoritative check against the store, never the display cache.
            let day = self.store.query_by_date(draft.appointment_date).await?;
            let conflicts = find_conflicts(&day, booking.start, booking.end, draft.appointment_id);
            if !conflicts.is_empty() {
                return Err(BookingError::Conflict {
                    conflicting: conflicts.iter().map(|a| a.id).collect(),
                });
            }
        }

        let committed = match &booking.existing {
            None => self.commit_create(draft, &booking).await?,
            Some(existing) => self.commit_update(draft, &booking, existing).await?,
        };

        self.display_cache.invalidate(committed.appointment_date).await;
        if let Some(existing) = &booking.existing {
            if existing.appointment_date != committed.appointment_date {
                self.display_cache.invalidate(existing.appointment_date).await;
            }
        }

        Ok(committed)
    }

    async fn load_existing(&self, id: Option<Uuid>) -> BookingResult<Option<Appointment>> {
        match id {
            Some(id) => Ok(Some(self.store.get(id).await?.ok_or(BookingError::NotFound(id))?)),
            None => Ok(None),
        }
    }

    async fn validate_draft(&self, draft: &BookingDraft) -> BookingResult<ValidatedBooking> {
        if draft.appointment_id.is_none() && draft.patient_id.is_none() {
            return Err(BookingError::validation("patient must be selected"));
        }
        let type_id = draft
            .appointment_type_id
            .ok_or_else(|| BookingError::validation("appointment type must be selected"))?;

        let (existing, appointment_type) = try_join(self.load_existing(draft.appointment_id), async {
            Ok::<_, BookingError>(self.types.get_type(type_id).await?)
        })
        .await?;

        let patient_id = match (&existing, draft.patient_id) {
            (Some(existing), Some(patient_id)) if patient_id != existing.patient_id => {
                return Err(BookingError::validation(
                    "the patient of an existing appointment cannot be changed",
                ));
            }
            (Some(existing), _) => existing.patient_id,
            (None, Some(patient_id)) => patient_id,
            (None, None) => return Err(BookingError::validation("patient must be selected")),
        };

        let status = match &existing {
            Some(existing) => {
                let next = draft.status.unwrap_or(existing.status);
                self.lifecycle_service
                    .validate_status_transition(existing.status, next)?;
                next
            }
            None => {
                let status = draft.status.unwrap_or_default();
                if status == AppointmentStatus::Cancelled {
                    return Err(BookingError::validation("a new appointment cannot start cancelled"));
                }
                status
            }
        };

        let appointment_type = appointment_type
            .ok_or_else(|| BookingError::validation(format!("unknown appointment type {}", type_id)))?;
        let keeps_own_type = existing
            .as_ref()
            .is_some_and(|e| e.appointment_type_id == type_id);
        if !appointment_type.is_active() && !keeps_own_type {
            return Err(BookingError::validation(format!(
                "appointment type '{}' is no longer offered",
                appointment_type.name
            )));
        }

        // An edit that keeps its type keeps the snapshot taken at booking time.
        let (duration_minutes, type_name) = match &existing {
            Some(existing) if keeps_own_type => {
                (existing.duration_minutes, existing.appointment_type_name.clone())
            }
            _ => (appointment_type.duration_minutes, appointment_type.name.clone()),
        };

        // Omitted on an edit means unchanged.
        let (doctor_id, notes) = match &existing {
            Some(existing) => (
                draft.doctor_id.unwrap_or(existing.doctor_id),
                match draft.notes.as_deref() {
                    Some(notes) => normalize_notes(Some(notes))?,
                    None => existing.notes.clone(),
                },
            ),
            None => (draft.doctor_id.flatten(), normalize_notes(draft.notes.as_deref())?),
        };

        let start = minutes_of(draft.start_time);
        let end = start + duration_minutes;
        self.hours.ensure_within(start, end)?;

        let moves = existing.as_ref().map_or(true, |e| {
            e.appointment_date != draft.appointment_date || e.start_time != draft.start_time
        });
        if moves {
            match self.hours.minimum_bookable_start(draft.appointment_date, self.clock.now()) {
                None => return Err(BookingError::validation("appointments cannot be booked on a past date")),
                Some(earliest) if start < earliest => {
                    return Err(BookingError::validation("the selected start time has already passed"));
                }
                Some(_) => {}
            }
        }

        Ok(ValidatedBooking {
            existing,
            appointment_type,
            patient_id,
            status,
            duration_minutes,
            type_name,
            doctor_id,
            notes,
            start,
            end,
        })
    }

    async fn commit_create(&self, draft: &BookingDraft, booking: &ValidatedBooking) -> BookingResult<Appointment> {
        let new_appointment = NewAppointment {
            patient_id: booking.patient_id,
            appointment_type_id: booking.appointment_type.id,
            appointment_type_name: booking.type_name.clone(),
            duration_minutes: booking.duration_minutes,
            appointment_date: draft.appointment_date,
            start_time: draft.start_time,
            status: booking.status,
            doctor_id: booking.doctor_id,
            notes: booking.notes.clone(),
        };

        match self.store.write_guarantee() {
            WriteGuarantee::Atomic => match self.store.create_if_vacant(new_appointment).await? {
                CommitOutcome::Written(created) => Ok(created),
                CommitOutcome::Conflict(conflicts) => Err(conflict_error(&conflicts)),
            },
            WriteGuarantee::ReReadThenWrite => {
                let created = self.store.create(new_appointment).await?;
                self.verify_after_write(&created, None).await?;
                Ok(created)
            }
        }
    }

    async fn commit_update(
        &self,
        draft: &BookingDraft,
        booking: &ValidatedBooking,
        existing: &Appointment,
    ) -> BookingResult<Appointment> {
        let patch = AppointmentPatch {
            appointment_type_id: Some(booking.appointment_type.id),
            appointment_type_name: Some(booking.type_name.clone()),
            duration_minutes: Some(booking.duration_minutes),
            appointment_date: Some(draft.appointment_date),
            start_time: Some(draft.start_time),
            status: Some(booking.status),
            doctor_id: Some(booking.doctor_id),
            notes: Some(booking.notes.clone()),
        };

        match self.store.write_guarantee() {
            WriteGuarantee::Atomic => match self.store.update_if_vacant(existing.id, patch).await? {
                CommitOutcome::Written(updated) => Ok(updated),
                CommitOutcome::Conflict(conflicts) => Err(conflict_error(&conflicts)),
            },
            WriteGuarantee::ReReadThenWrite => {
                let updated = self.store.update(existing.id, patch).await?;
                self.verify_after_write(&updated, Some(existing)).await?;
                Ok(updated)
            }
        }
    }

    /// Second read after a non-atomic write. If another writer slipped in
    /// between our check and our write, our own write is undone (deleted, or
    /// restored to `previous`) and the overlap is reported as a conflict.
    async fn verify_after_write(&self, written: &Appointment, previous: Option<&Appointment>) -> BookingResult<()> {
        if !written.occupies_time() {
            return Ok(());
        }

        let day = self.store.query_by_date(written.appointment_date).await?;
        let conflicts = find_conflicts(&day, written.start_minutes(), written.end_minutes(), Some(written.id));
        if conflicts.is_empty() {
            return Ok(());
        }

        warn!(
            "Concurrent booking detected for appointment {} on {}, undoing write",
            written.id, written.appointment_date
        );
        match previous {
            None => self.store.delete(written.id).await?,
            Some(previous) => {
                self.store
                    .update(previous.id, AppointmentPatch::restoring(previous))
                    .await?;
            }
        }
        self.display_cache.invalidate(written.appointment_date).await;

        Err(BookingError::Conflict {
            conflicting: conflicts.iter().map(|a| a.id).collect(),
        })
    }

    // ==============================================================================
    // CANCELLATION
    // ==============================================================================

    pub async fn cancel_appointment(&self, id: Uuid) -> BookingResult<Appointment> {
        let existing = self.store.get(id).await?.ok_or(BookingError::NotFound(id))?;
        self.lifecycle_service
            .validate_status_transition(existing.status, AppointmentStatus::Cancelled)?;

        let cancelled = self
            .store
            .update(id, AppointmentPatch::status(AppointmentStatus::Cancelled))
            .await?;
        self.display_cache.invalidate(cancelled.appointment_date).await;

        info!("Appointment {} cancelled", id);
        Ok(cancelled)
    }

    pub async fn delete_appointment(&self, id: Uuid) -> BookingResult<()> {
        let existing = self.store.get(id).await?.ok_or(BookingError::NotFound(id))?;
        self.store.delete(id).await?;
        self.display_cache.invalidate(existing.appointment_date).await;

        info!("Appointment {} deleted", id);
        Ok(())
    }
}

fn conflict_error(conflicts: &[Appointment]) -> BookingError {
    BookingError::Conflict {
        conflicting: conflicts.iter().map(|a| a.id).collect(),
    }
}

/// Blank notes are stored as none; longer than 500 characters is rejected.
fn normalize_notes(notes: Option<&str>) -> BookingResult<Option<String>> {
    let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if notes.chars().count() > MAX_NOTES_CHARS {
        return Err(BookingError::validation(format!(
            "notes are limited to {} characters",
            MAX_NOTES_CHARS
        )));
    }
    Ok(Some(notes.to_string()))
}
