use std::env;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_DAY_START: &str = "08:00";
pub const DEFAULT_DAY_END: &str = "17:30";
pub const DEFAULT_SLOT_CADENCE_MINUTES: u32 = 30;
pub const DEFAULT_DISPLAY_CACHE_TTL_SECONDS: u64 = 15;
pub const DEFAULT_SERVER_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_token: Option<String>,
    pub store_backend: StoreBackend,
    pub clinic_day_start: NaiveTime,
    pub clinic_day_end: NaiveTime,
    pub slot_cadence_minutes: u32,
    pub display_cache_ttl_seconds: u64,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_token: None,
            store_backend: StoreBackend::Memory,
            clinic_day_start: parse_clock(DEFAULT_DAY_START).unwrap_or(NaiveTime::MIN),
            clinic_day_end: parse_clock(DEFAULT_DAY_END).unwrap_or(NaiveTime::MIN),
            slot_cadence_minutes: DEFAULT_SLOT_CADENCE_MINUTES,
            display_cache_ttl_seconds: DEFAULT_DISPLAY_CACHE_TTL_SECONDS,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let supabase_url = env::var("SUPABASE_URL").unwrap_or_else(|_| {
            warn!("SUPABASE_URL not set, using empty value");
            String::new()
        });
        let supabase_anon_key = env::var("SUPABASE_ANON_PUBLIC_KEY").unwrap_or_else(|_| {
            warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
            String::new()
        });
        let supabase_service_token = env::var("SUPABASE_SERVICE_TOKEN").ok();

        let store_backend = match env::var("APPOINTMENT_STORE").ok().as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("supabase") => StoreBackend::Supabase,
            Some(other) => {
                warn!("APPOINTMENT_STORE={} not recognised, choosing from SUPABASE_URL", other);
                default_backend(&supabase_url)
            }
            None => default_backend(&supabase_url),
        };

        let config = Self {
            supabase_url,
            supabase_anon_key,
            supabase_service_token,
            store_backend,
            clinic_day_start: clock_var("CLINIC_DAY_START", defaults.clinic_day_start),
            clinic_day_end: clock_var("CLINIC_DAY_END", defaults.clinic_day_end),
            slot_cadence_minutes: parsed_var("SLOT_CADENCE_MINUTES", defaults.slot_cadence_minutes),
            display_cache_ttl_seconds: parsed_var(
                "DISPLAY_CACHE_TTL_SECONDS",
                defaults.display_cache_ttl_seconds,
            ),
            server_port: parsed_var("SERVER_PORT", defaults.server_port),
        };

        if config.store_backend == StoreBackend::Supabase && !config.is_supabase_configured() {
            warn!("Supabase store selected but SUPABASE_URL / SUPABASE_ANON_PUBLIC_KEY are missing");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

/// Parses a wall-clock `HH:MM` value.
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

fn default_backend(supabase_url: &str) -> StoreBackend {
    if supabase_url.is_empty() {
        StoreBackend::Memory
    } else {
        StoreBackend::Supabase
    }
}

fn clock_var(name: &str, default: NaiveTime) -> NaiveTime {
    match env::var(name) {
        Ok(raw) => parse_clock(&raw).unwrap_or_else(|| {
            warn!("{}={} is not a HH:MM time, using {}", name, raw, default.format("%H:%M"));
            default
        }),
        Err(_) => default,
    }
}

fn parsed_var<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{}={} could not be parsed, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
