// libs/appointment-cell/src/services/slots.rs
use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{time_of, Appointment, Slot, SlotStatus};
use crate::services::conflict::find_conflicts;
use crate::services::hours::WorkingHours;

/// Candidate start times for `date` at the working-hours cadence.
///
/// Each slot's `[start, start + cadence)` window is checked against the day's
/// appointments, which makes the result a coarse availability hint: the
/// duration actually booked is checked again when the booking is submitted.
/// Slots earlier than the minimum bookable start are `Past`; on a date before
/// today every slot is `Past`.
pub fn generate_slots(
    hours: &WorkingHours,
    appointments: &[Appointment],
    date: NaiveDate,
    now: NaiveDateTime,
) -> Vec<Slot> {
    let cadence = hours.slot_cadence();
    let minimum_start = hours.minimum_bookable_start(date, now);
    let day: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.appointment_date == date)
        .cloned()
        .collect();

    let mut slots = Vec::new();
    let mut start = hours.day_start();
    while start + cadence <= hours.day_end() {
        let is_past = match minimum_start {
            Some(earliest) => start < earliest,
            None => true,
        };

        let status = if is_past {
            SlotStatus::Past
        } else if !find_conflicts(&day, start, start + cadence, None).is_empty() {
            SlotStatus::Conflicting
        } else {
            SlotStatus::Available
        };

        slots.push(Slot {
            start: time_of(start),
            status,
        });
        start += cadence;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};
    use uuid::Uuid;

    use crate::models::AppointmentStatus;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn appointment(h: u32, m: u32, duration: u32, status: AppointmentStatus) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            appointment_type_id: Uuid::new_v4(),
            appointment_type_name: "Consultation".into(),
            duration_minutes: duration,
            appointment_date: date(),
            start_time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            status,
            doctor_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn yesterday_evening() -> NaiveDateTime {
        date().pred_opt().unwrap().and_hms_opt(20, 0, 0).unwrap()
    }

    fn status_at(slots: &[Slot], h: u32, m: u32) -> SlotStatus {
        let wanted = NaiveTime::from_hms_opt(h, m, 0).unwrap();
        slots.iter().find(|s| s.start == wanted).map(|s| s.status).unwrap()
    }

    #[test]
    fn empty_day_offers_every_half_hour_until_five() {
        let slots = generate_slots(&WorkingHours::default(), &[], date(), yesterday_evening());
        assert_eq!(slots.len(), 19);
        assert_eq!(slots[0].start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(slots[18].start, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert!(slots.iter().all(Slot::is_selectable));
    }

    #[test]
    fn booked_window_marks_overlapping_slots_conflicting() {
        let booked = vec![appointment(10, 0, 60, AppointmentStatus::Confirmed)];
        let slots = generate_slots(&WorkingHours::default(), &booked, date(), yesterday_evening());

        assert_eq!(status_at(&slots, 9, 30), SlotStatus::Available);
        assert_eq!(status_at(&slots, 10, 0), SlotStatus::Conflicting);
        assert_eq!(status_at(&slots, 10, 30), SlotStatus::Conflicting);
        assert_eq!(status_at(&slots, 11, 0), SlotStatus::Available);
    }

    #[test]
    fn short_appointment_blocks_the_whole_cadence_window() {
        let booked = vec![appointment(9, 15, 15, AppointmentStatus::Pending)];
        let slots = generate_slots(&WorkingHours::default(), &booked, date(), yesterday_evening());
        assert_eq!(status_at(&slots, 9, 0), SlotStatus::Conflicting);
        assert_eq!(status_at(&slots, 9, 30), SlotStatus::Available);
    }

    #[test]
    fn cancelled_appointments_free_their_slots() {
        let booked = vec![appointment(10, 0, 30, AppointmentStatus::Cancelled)];
        let slots = generate_slots(&WorkingHours::default(), &booked, date(), yesterday_evening());
        assert_eq!(status_at(&slots, 10, 0), SlotStatus::Available);
    }

    #[test]
    fn slots_before_the_rounded_current_time_are_past() {
        let now = date().and_hms_opt(10, 7, 0).unwrap();
        let slots = generate_slots(&WorkingHours::default(), &[], date(), now);

        assert_eq!(status_at(&slots, 8, 0), SlotStatus::Past);
        assert_eq!(status_at(&slots, 10, 0), SlotStatus::Past);
        assert_eq!(status_at(&slots, 10, 30), SlotStatus::Available);
        assert!(slots
            .iter()
            .filter(|s| s.start < NaiveTime::from_hms_opt(10, 10, 0).unwrap())
            .all(|s| !s.is_selectable()));
    }

    #[test]
    fn past_takes_precedence_over_conflicting() {
        let booked = vec![appointment(9, 0, 30, AppointmentStatus::Confirmed)];
        let now = date().and_hms_opt(12, 0, 0).unwrap();
        let slots = generate_slots(&WorkingHours::default(), &booked, date(), now);
        assert_eq!(status_at(&slots, 9, 0), SlotStatus::Past);
    }

    #[test]
    fn every_slot_of_a_past_date_is_past() {
        let now = date().succ_opt().unwrap().and_hms_opt(7, 0, 0).unwrap();
        let slots = generate_slots(&WorkingHours::default(), &[], date(), now);
        assert!(slots.iter().all(|s| s.status == SlotStatus::Past));
    }

    #[test]
    fn cadence_follows_configured_hours() {
        let hours = WorkingHours::new(9 * 60, 12 * 60, 45).unwrap();
        let slots = generate_slots(&hours, &[], date(), yesterday_evening());
        let starts: Vec<NaiveTime> = slots.iter().map(|s| s.start).collect();
        assert_eq!(
            starts,
            vec![
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(9, 45, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
                NaiveTime::from_hms_opt(11, 15, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn same_snapshot_gives_same_slots() {
        let booked = vec![
            appointment(9, 0, 30, AppointmentStatus::Confirmed),
            appointment(13, 0, 90, AppointmentStatus::Pending),
        ];
        let now = date().and_hms_opt(8, 20, 0).unwrap();
        let first = generate_slots(&WorkingHours::default(), &booked, date(), now);
        let second = generate_slots(&WorkingHours::default(), &booked, date(), now);
        assert_eq!(first, second);
    }
}
