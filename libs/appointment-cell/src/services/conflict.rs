// libs/appointment-cell/src/services/conflict.rs
//
// The one overlap predicate used by slot generation, segmentation, booking
// validation and the consistency scan.

use uuid::Uuid;

use crate::models::{Appointment, DoubleBooking};

/// Half-open interval overlap: `[s1, e1)` and `[s2, e2)` share an instant.
/// An interval ending exactly where the other begins does not overlap.
pub fn overlaps(s1: u32, e1: u32, s2: u32, e2: u32) -> bool {
    s1.max(s2) < e1.min(e2)
}

/// Minutes shared by two intervals, zero when they do not overlap.
pub fn overlap_minutes(s1: u32, e1: u32, s2: u32, e2: u32) -> u32 {
    if overlaps(s1, e1, s2, e2) {
        e1.min(e2) - s1.max(s2)
    } else {
        0
    }
}

pub fn appointment_overlaps(appointment: &Appointment, start: u32, end: u32) -> bool {
    overlaps(appointment.start_minutes(), appointment.end_minutes(), start, end)
}

/// Appointments holding time inside `[start, end)`, skipping `exclude` (the
/// appointment being edited) and cancelled appointments.
pub fn find_conflicts<'a>(
    appointments: &'a [Appointment],
    start: u32,
    end: u32,
    exclude: Option<Uuid>,
) -> Vec<&'a Appointment> {
    appointments
        .iter()
        .filter(|a| Some(a.id) != exclude)
        .filter(|a| a.occupies_time())
        .filter(|a| appointment_overlaps(a, start, end))
        .collect()
}

/// Every pair of time-holding appointments of one day that overlap each other.
pub fn find_double_bookings(appointments: &[Appointment]) -> Vec<DoubleBooking> {
    let mut active: Vec<&Appointment> = appointments.iter().filter(|a| a.occupies_time()).collect();
    active.sort_by_key(|a| (a.start_minutes(), a.id));

    let mut found = Vec::new();
    for (i, first) in active.iter().enumerate() {
        for second in &active[i + 1..] {
            // Sorted by start: nothing further down can overlap `first`.
            if second.start_minutes() >= first.end_minutes() {
                break;
            }
            let minutes = overlap_minutes(
                first.start_minutes(),
                first.end_minutes(),
                second.start_minutes(),
                second.end_minutes(),
            );
            if minutes > 0 {
                found.push(DoubleBooking {
                    first: first.id,
                    second: second.id,
                    overlap_minutes: minutes,
                });
            }
        }
    }
    found
}
