// libs/appointment-cell/src/services/types.rs
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};
use crate::models::{AppointmentType, NewAppointmentType, TypeStatus};
use crate::services::clock::Clock;
use crate::store::AppointmentTypeRegistry;

pub struct AppointmentTypeService {
    registry: Arc<dyn AppointmentTypeRegistry>,
    clock: Arc<dyn Clock>,
}

impl AppointmentTypeService {
    pub fn new(registry: Arc<dyn AppointmentTypeRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    pub async fn create_type(&self, new_type: NewAppointmentType) -> BookingResult<AppointmentType> {
        let new_type = NewAppointmentType::new(new_type.name, new_type.duration_minutes)?;
        let created = self.registry.create_type(new_type).await?;
        info!(
            "Created appointment type {} ({}, {} min)",
            created.id, created.name, created.duration_minutes
        );
        Ok(created)
    }

    pub async fn list_types(&self, active_only: bool) -> BookingResult<Vec<AppointmentType>> {
        let types = if active_only {
            self.registry.list_active().await?
        } else {
            self.registry.list_all().await?
        };
        Ok(types)
    }

    pub async fn get_type(&self, id: Uuid) -> BookingResult<AppointmentType> {
        self.registry
            .get_type(id)
            .await?
            .ok_or(BookingError::NotFound(id))
    }

    /// Activate or deactivate a type. Deactivation is refused while any
    /// appointment of the type still starts in the future.
    pub async fn set_type_status(&self, id: Uuid, status: TypeStatus) -> BookingResult<AppointmentType> {
        let current = self.get_type(id).await?;
        if current.status == status {
            debug!("Appointment type {} already {}", id, status);
            return Ok(current);
        }

        if status == TypeStatus::Passive {
            let now = self.clock.now();
            let count = self.registry.count_future_appointments(id, now).await?;
            if count > 0 {
                warn!(
                    "Refusing to deactivate appointment type {}: {} future booking(s)",
                    id, count
                );
                return Err(BookingError::HasFutureBookings { count });
            }
        }

        let updated = self.registry.set_type_status(id, status).await?;
        info!("Appointment type {} set {}", id, status);
        Ok(updated)
    }
}
