// libs/appointment-cell/src/services/segments.rs
//
// Day-view layout: the working day is cut at every hour mark and at every
// appointment boundary, so each appointment starts and ends exactly on a
// segment edge and no fixed grid is needed.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{time_of, Appointment, Segment};
use crate::services::conflict::appointment_overlaps;
use crate::services::hours::WorkingHours;

/// Sorted, deduplicated cut points of the day, `day_start` first and
/// `day_end` last. Appointment edges are clipped to working hours.
pub fn breakpoints(hours: &WorkingHours, appointments: &[Appointment]) -> Vec<u32> {
    let (day_start, day_end) = (hours.day_start(), hours.day_end());

    let mut points = BTreeSet::new();
    points.insert(day_start);
    points.insert(day_end);

    let first_hour = day_start.div_ceil(60) * 60;
    points.extend((first_hour..=day_end).step_by(60));

    for appointment in appointments.iter().filter(|a| a.occupies_time()) {
        points.insert(appointment.start_minutes().clamp(day_start, day_end));
        points.insert(appointment.end_minutes().clamp(day_start, day_end));
    }

    points.into_iter().collect()
}

/// Partition `[day_start, day_end)` into consecutive segments, each holding
/// the appointments that overlap it ordered by start time then id.
pub fn segment_day(hours: &WorkingHours, appointments: &[Appointment], date: NaiveDate) -> Vec<Segment> {
    let mut day: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.appointment_date == date && a.occupies_time())
        .cloned()
        .collect();
    day.sort_by_key(|a| (a.start_minutes(), a.id));

    let points = breakpoints(hours, &day);

    points
        .windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            Segment {
                start: time_of(start),
                end: time_of(end),
                appointments: day
                    .iter()
                    .filter(|a| appointment_overlaps(a, start, end))
                    .cloned()
                    .collect(),
            }
        })
        .collect()
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

    fn appointment(h: u32, m: u32, duration: u32) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            appointment_type_id: Uuid::new_v4(),
            appointment_type_name: "Consultation".into(),
            duration_minutes: duration,
            appointment_date: date(),
            start_time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            status: AppointmentStatus::Confirmed,
            doctor_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn assert_covers_day(hours: &WorkingHours, segments: &[Segment]) {
        assert_eq!(segments.first().unwrap().start_minutes(), hours.day_start());
        assert_eq!(segments.last().unwrap().end_minutes(), hours.day_end());
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "segments must be contiguous");
        }
        assert!(segments.iter().all(|s| s.start < s.end));
    }

    #[test]
    fn empty_day_is_cut_at_hour_marks() {
        let hours = WorkingHours::default();
        let segments = segment_day(&hours, &[], date());

        // 08:00..17:00 hourly plus the trailing half hour.
        assert_eq!(segments.len(), 10);
        assert_eq!(segments[9].start_minutes(), 17 * 60);
        assert_eq!(segments[9].end_minutes(), 17 * 60 + 30);
        assert_covers_day(&hours, &segments);
    }

    #[test]
    fn appointments_add_breakpoints_and_fill_segments() {
        let hours = WorkingHours::default();
        let booked = vec![appointment(9, 0, 30), appointment(10, 0, 60)];
        let points = breakpoints(&hours, &booked);

        for expected in [480, 540, 570, 600, 660, 1050] {
            assert!(points.contains(&expected), "missing breakpoint {}", expected);
        }

        let segments = segment_day(&hours, &booked, date());
        assert_covers_day(&hours, &segments);

        let gap = segments.iter().find(|s| s.start_minutes() == 570).unwrap();
        assert_eq!(gap.end_minutes(), 600);
        assert!(gap.appointments.is_empty());

        let hour = segments.iter().find(|s| s.start_minutes() == 600).unwrap();
        assert_eq!(hour.end_minutes(), 660);
        assert_eq!(hour.appointments.len(), 1);
        assert_eq!(hour.appointments[0].id, booked[1].id);
    }

    #[test]
    fn every_appointment_edge_is_a_breakpoint() {
        let hours = WorkingHours::default();
        let booked = vec![
            appointment(8, 15, 45),
            appointment(9, 40, 15),
            appointment(11, 30, 90),
            appointment(16, 45, 75),
        ];
        let points = breakpoints(&hours, &booked);
        for a in &booked {
            let start = a.start_minutes().clamp(hours.day_start(), hours.day_end());
            let end = a.end_minutes().clamp(hours.day_start(), hours.day_end());
            assert!(points.contains(&start));
            assert!(points.contains(&end));
        }
        assert_covers_day(&hours, &segment_day(&hours, &booked, date()));
    }

    #[test]
    fn appointment_running_past_closing_is_clipped() {
        let hours = WorkingHours::default();
        let booked = vec![appointment(17, 0, 60)];
        let segments = segment_day(&hours, &booked, date());

        assert_eq!(segments.last().unwrap().end_minutes(), 1050);
        let last = segments.last().unwrap();
        assert_eq!(last.appointments.len(), 1);
    }

    #[test]
    fn overlapping_appointments_stack_in_start_then_id_order() {
        let hours = WorkingHours::default();
        let mut a = appointment(9, 0, 60);
        let mut b = appointment(9, 0, 30);
        a.id = Uuid::from_u128(2);
        b.id = Uuid::from_u128(1);
        let c = appointment(9, 15, 15);

        let segments = segment_day(&hours, &[a.clone(), c.clone(), b.clone()], date());
        let first = segments.iter().find(|s| s.start_minutes() == 555).unwrap();
        let ids: Vec<Uuid> = first.appointments.iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![b.id, a.id, c.id]);
    }

    #[test]
    fn cancelled_and_other_day_appointments_are_ignored() {
        let hours = WorkingHours::default();
        let mut cancelled = appointment(9, 10, 20);
        cancelled.status = AppointmentStatus::Cancelled;
        let mut tomorrow = appointment(12, 10, 20);
        tomorrow.appointment_date = date().succ_opt().unwrap();

        let segments = segment_day(&hours, &[cancelled, tomorrow], date());
        assert_eq!(segments.len(), 10);
        assert!(segments.iter().all(|s| s.appointments.is_empty()));
    }

    #[test]
    fn off_hour_opening_still_starts_the_partition() {
        let hours = WorkingHours::new(8 * 60 + 15, 12 * 60, 30).unwrap();
        let segments = segment_day(&hours, &[], date());
        assert_eq!(segments[0].start_minutes(), 495);
        assert_eq!(segments[0].end_minutes(), 540);
        assert_covers_day(&hours, &segments);
    }
}
