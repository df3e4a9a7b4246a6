// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::BookingError;

pub const MAX_NOTES_CHARS: usize = 500;
pub const MIN_TYPE_DURATION_MINUTES: u32 = 15;
pub const MAX_TYPE_DURATION_MINUTES: u32 = 90;
pub const TYPE_DURATION_STEP_MINUTES: u32 = 15;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_type_id: Uuid,
    /// Type name as it was when the appointment was booked.
    pub appointment_type_name: String,
    /// Duration copied from the type at booking time.
    pub duration_minutes: u32,
    pub appointment_date: NaiveDate,
    #[serde(with = "clock_format")]
    pub start_time: NaiveTime,
    pub status: AppointmentStatus,
    pub doctor_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn from_new(id: Uuid, new: NewAppointment, now: DateTime<Utc>) -> Self {
        Self {
            id,
            patient_id: new.patient_id,
            appointment_type_id: new.appointment_type_id,
            appointment_type_name: new.appointment_type_name,
            duration_minutes: new.duration_minutes,
            appointment_date: new.appointment_date,
            start_time: new.start_time,
            status: new.status,
            doctor_id: new.doctor_id,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Wall-clock start as minutes since midnight.
    pub fn start_minutes(&self) -> u32 {
        minutes_of(self.start_time)
    }

    pub fn end_minutes(&self) -> u32 {
        self.start_minutes() + self.duration_minutes
    }

    /// Cancelled appointments keep their record but no longer hold the time.
    pub fn occupies_time(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.appointment_date.and_time(self.start_time)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        AppointmentStatus::Confirmed
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Fields supplied by the caller when creating an appointment; the store
/// generates the id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub appointment_type_id: Uuid,
    pub appointment_type_name: String,
    pub duration_minutes: u32,
    pub appointment_date: NaiveDate,
    #[serde(with = "clock_format")]
    pub start_time: NaiveTime,
    pub status: AppointmentStatus,
    pub doctor_id: Option<Uuid>,
    pub notes: Option<String>,
}

impl NewAppointment {
    pub fn start_minutes(&self) -> u32 {
        minutes_of(self.start_time)
    }

    pub fn end_minutes(&self) -> u32 {
        self.start_minutes() + self.duration_minutes
    }
}

/// Partial update of an appointment's mutable fields. `None` leaves a field
/// untouched; for the nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_type_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<NaiveDate>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "clock_format::serialize_option"
    )]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<Option<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Patch that puts every mutable field back to `appointment`'s values.
    pub fn restoring(appointment: &Appointment) -> Self {
        Self {
            appointment_type_id: Some(appointment.appointment_type_id),
            appointment_type_name: Some(appointment.appointment_type_name.clone()),
            duration_minutes: Some(appointment.duration_minutes),
            appointment_date: Some(appointment.appointment_date),
            start_time: Some(appointment.start_time),
            status: Some(appointment.status),
            doctor_id: Some(appointment.doctor_id),
            notes: Some(appointment.notes.clone()),
        }
    }

    pub fn apply_to(&self, appointment: &mut Appointment) {
        if let Some(type_id) = self.appointment_type_id {
            appointment.appointment_type_id = type_id;
        }
        if let Some(name) = &self.appointment_type_name {
            appointment.appointment_type_name = name.clone();
        }
        if let Some(duration) = self.duration_minutes {
            appointment.duration_minutes = duration;
        }
        if let Some(date) = self.appointment_date {
            appointment.appointment_date = date;
        }
        if let Some(start) = self.start_time {
            appointment.start_time = start;
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(doctor_id) = self.doctor_id {
            appointment.doctor_id = doctor_id;
        }
        if let Some(notes) = &self.notes {
            appointment.notes = notes.clone();
        }
    }
}

// ==============================================================================
// APPOINTMENT TYPE MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TypeStatus {
    Active,
    Passive,
}

impl fmt::Display for TypeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeStatus::Active => write!(f, "active"),
            TypeStatus::Passive => write!(f, "passive"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentType {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: u32,
    pub status: TypeStatus,
    pub created_at: DateTime<Utc>,
}

impl AppointmentType {
    pub fn is_active(&self) -> bool {
        self.status == TypeStatus::Active
    }

    /// Durations are multiples of 15 between 15 and 90 minutes inclusive.
    pub fn validate_duration(duration_minutes: u32) -> Result<(), BookingError> {
        let in_range = (MIN_TYPE_DURATION_MINUTES..=MAX_TYPE_DURATION_MINUTES).contains(&duration_minutes);
        if !in_range || duration_minutes % TYPE_DURATION_STEP_MINUTES != 0 {
            return Err(BookingError::validation(format!(
                "duration must be a multiple of {} between {} and {} minutes, got {}",
                TYPE_DURATION_STEP_MINUTES,
                MIN_TYPE_DURATION_MINUTES,
                MAX_TYPE_DURATION_MINUTES,
                duration_minutes
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointmentType {
    pub name: String,
    pub duration_minutes: u32,
}

impl NewAppointmentType {
    pub fn new(name: impl Into<String>, duration_minutes: u32) -> Result<Self, BookingError> {
        let candidate = Self {
            name: name.into().trim().to_string(),
            duration_minutes,
        };
        candidate.validate()?;
        Ok(candidate)
    }

    pub fn validate(&self) -> Result<(), BookingError> {
        if self.name.trim().is_empty() {
            return Err(BookingError::validation("appointment type name is required"));
        }
        AppointmentType::validate_duration(self.duration_minutes)
    }
}

// ==============================================================================
// BOOKING MODELS
// ==============================================================================

/// What the user has selected so far. `appointment_id` marks an edit of an
/// existing appointment.
///
/// On an edit, an omitted `doctor_id` or `notes` keeps the stored value.
/// `"doctor_id": null` unassigns the doctor and blank notes clear them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingDraft {
    #[serde(default)]
    pub appointment_id: Option<Uuid>,
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub appointment_type_id: Option<Uuid>,
    pub appointment_date: NaiveDate,
    #[serde(with = "clock_format")]
    pub start_time: NaiveTime,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub doctor_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Phases a single booking attempt moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingPhase {
    Draft,
    Validating,
    Committed,
    Rejected,
}

impl fmt::Display for BookingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingPhase::Draft => write!(f, "draft"),
            BookingPhase::Validating => write!(f, "validating"),
            BookingPhase::Committed => write!(f, "committed"),
            BookingPhase::Rejected => write!(f, "rejected"),
        }
    }
}

// ==============================================================================
// DERIVED VIEW MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Conflicting,
    Past,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    #[serde(with = "clock_format")]
    pub start: NaiveTime,
    pub status: SlotStatus,
}

impl Slot {
    pub fn is_selectable(&self) -> bool {
        self.status == SlotStatus::Available
    }
}

/// A `[start, end)` band of the day plus the appointments drawn inside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    #[serde(with = "clock_format")]
    pub start: NaiveTime,
    #[serde(with = "clock_format")]
    pub end: NaiveTime,
    pub appointments: Vec<Appointment>,
}

impl Segment {
    pub fn start_minutes(&self) -> u32 {
        minutes_of(self.start)
    }

    pub fn end_minutes(&self) -> u32 {
        minutes_of(self.end)
    }
}

// ==============================================================================
// CONSISTENCY MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoubleBooking {
    pub first: Uuid,
    pub second: Uuid,
    pub overlap_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsistencyReport {
    pub appointment_date: NaiveDate,
    pub is_consistent: bool,
    pub double_bookings: Vec<DoubleBooking>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeListQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeStatusRequest {
    pub status: TypeStatus,
}

// ==============================================================================
// TIME HELPERS
// ==============================================================================

/// Minutes since midnight, seconds dropped.
pub fn minutes_of(time: NaiveTime) -> u32 {
    use chrono::Timelike;
    time.hour() * 60 + time.minute()
}

/// Inverse of [`minutes_of`]; values past the end of the day clamp to 23:59.
pub fn time_of(minutes: u32) -> NaiveTime {
    const LAST_MINUTE: u32 = 23 * 60 + 59;
    if minutes > LAST_MINUTE {
        tracing::warn!("{} minutes is past the end of the day, showing 23:59", minutes);
    }
    let clamped = minutes.min(LAST_MINUTE);
    NaiveTime::from_hms_opt(clamped / 60, clamped % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// Tells an absent field (`None`, via `#[serde(default)]`) apart from an
/// explicit `null` (`Some(None)`).
pub mod nullable {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// `HH:MM` wall-clock serialization. Deserialization also accepts `HH:MM:SS`
/// and drops the seconds.
pub mod clock_format {
    use chrono::{NaiveTime, Timelike};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn serialize_option<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serialize(t, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid wall-clock time: {}", raw)))
    }

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let trimmed = raw.trim();
        NaiveTime::parse_from_str(trimmed, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .ok()
            .and_then(|t| t.with_second(0))
    }
}
