// libs/appointment-cell/src/services/cache.rs
use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::Appointment;

struct CachedDay {
    appointments: Vec<Appointment>,
    fetched_at: Instant,
}

/// Short-lived per-date copy of the appointment list, used only to render
/// slots and segments. Booking validation never reads from it.
pub struct DayCache {
    ttl: Duration,
    entries: RwLock<HashMap<NaiveDate, CachedDay>>,
}

impl DayCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, date: NaiveDate) -> Option<Vec<Appointment>> {
        let entries = self.entries.read().await;
        let cached = entries.get(&date)?;
        if cached.fetched_at.elapsed() >= self.ttl {
            debug!("Display cache entry for {} expired", date);
            return None;
        }
        Some(cached.appointments.clone())
    }

    /// Store a fresh listing and drop every entry that has outlived the TTL.
    pub async fn put(&self, date: NaiveDate, appointments: Vec<Appointment>) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, cached| cached.fetched_at.elapsed() < self.ttl);
        if entries.len() < before {
            debug!("Evicted {} expired display cache entries", before - entries.len());
        }
        entries.insert(
            date,
            CachedDay {
                appointments,
                fetched_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate(&self, date: NaiveDate) {
        self.entries.write().await.remove(&date);
    }
}
