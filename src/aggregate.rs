//! Attendance statistics. Everything here is a pure projection of the
//! records it is given; nothing is cached between calls.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use strum::IntoEnumIterator;

use crate::model::{
    AttendanceRecord, AttendanceStats, AttendanceStatus, ReportRow, ReportStats, Roster,
    RosterCounts, RosterEntry, Student, StudentReport, StudentSummary, TrendPoint, YearLevel,
    YearSummary,
};

/// Share of `part` in `total` as a percentage; 0 for an empty scope.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    present: usize,
    absent: usize,
    late: usize,
    total: usize,
}

impl Tally {
    fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
        }
        self.total += 1;
    }

    fn of<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> Self {
        let mut tally = Tally::default();
        for record in records {
            tally.add(record.status);
        }
        tally
    }

    fn rate(&self) -> f64 {
        percentage(self.present, self.total)
    }
}

/// Dashboard figures for `as_of`.
///
/// The three day counts only look at records dated `as_of`, but
/// `attendance_rate` is taken over the whole collection, so it does not move
/// when `as_of` changes. The dashboard has always shown it this way.
pub fn compute_daily_stats(
    total_students: usize,
    records: &[AttendanceRecord],
    as_of: NaiveDate,
) -> AttendanceStats {
    let today = Tally::of(records.iter().filter(|r| r.date == as_of));
    let overall = Tally::of(records);

    AttendanceStats {
        total_students,
        present_today: today.present,
        absent_today: today.absent,
        late_today: today.late,
        attendance_rate: overall.rate(),
    }
}

fn summarize(student: &Student, tally: Tally) -> StudentSummary {
    StudentSummary {
        student_id: student.id.clone(),
        name: student.name.clone(),
        year: student.year,
        present: tally.present,
        absent: tally.absent,
        late: tally.late,
        total: tally.total,
        rate: tally.rate(),
    }
}

/// Per-student counts, best attendance first. Students with equal rates keep
/// their input order.
pub fn compute_student_summaries(
    students: &[Student],
    records: &[AttendanceRecord],
) -> Vec<StudentSummary> {
    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for record in records {
        tallies
            .entry(record.student_id.as_str())
            .or_default()
            .add(record.status);
    }

    let mut summaries: Vec<StudentSummary> = students
        .iter()
        .map(|s| summarize(s, tallies.get(s.id.as_str()).copied().unwrap_or_default()))
        .collect();
    // sort_by is stable
    summaries.sort_by(|a, b| b.rate.partial_cmp(&a.rate).unwrap_or(Ordering::Equal));
    summaries
}

/// Selection applied to report views. `None` for year or subject means "All".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilter {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub year: Option<YearLevel>,
    pub subject_id: Option<String>,
}

impl ReportFilter {
    /// From `days` days before `end` through `end`, both inclusive, so the
    /// window spans `days + 1` calendar days. All years and subjects.
    /// `None` when the start falls outside the representable date range.
    pub fn trailing(end: NaiveDate, days: i64) -> Option<Self> {
        let start = Duration::try_days(days).and_then(|d| end.checked_sub_signed(d))?;
        Some(Self {
            start,
            end,
            year: None,
            subject_id: None,
        })
    }

    pub fn admits(&self, record: &AttendanceRecord, students: &HashMap<&str, &Student>) -> bool {
        let in_range = record.date >= self.start && record.date <= self.end;
        let year_match = match self.year {
            None => true,
            Some(year) => students
                .get(record.student_id.as_str())
                .is_some_and(|s| s.year == year),
        };
        let subject_match = self
            .subject_id
            .as_deref()
            .is_none_or(|id| record.subject_id == id);
        in_range && year_match && subject_match
    }
}

pub fn index_students(students: &[Student]) -> HashMap<&str, &Student> {
    students.iter().map(|s| (s.id.as_str(), s)).collect()
}

pub fn filter_records<'a>(
    records: &'a [AttendanceRecord],
    filter: &ReportFilter,
    students: &HashMap<&str, &Student>,
) -> Vec<&'a AttendanceRecord> {
    records
        .iter()
        .filter(|r| filter.admits(r, students))
        .collect()
}

/// Counts and rate over the records the filter admits.
pub fn compute_filtered_stats(
    records: &[AttendanceRecord],
    filter: &ReportFilter,
    students: &HashMap<&str, &Student>,
) -> ReportStats {
    let tally = Tally::of(filter_records(records, filter, students));
    ReportStats {
        total_records: tally.total,
        present_count: tally.present,
        absent_count: tally.absent,
        late_count: tally.late,
        attendance_rate: tally.rate(),
    }
}

/// Daily rate over the given records, oldest date first. Days without records
/// are left out rather than reported as zero.
pub fn compute_trend<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> Vec<TrendPoint> {
    let mut by_date: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date).or_default().add(record.status);
    }
    by_date
        .into_iter()
        .map(|(date, tally)| TrendPoint {
            date,
            rate: tally.rate(),
        })
        .collect()
}

/// Average student rate per year level, one entry for every level.
pub fn compute_year_summaries(summaries: &[StudentSummary]) -> Vec<YearSummary> {
    YearLevel::iter()
        .map(|year| {
            let rates: Vec<f64> = summaries
                .iter()
                .filter(|s| s.year == year)
                .map(|s| s.rate)
                .collect();
            let average_rate = if rates.is_empty() {
                0.0
            } else {
                rates.iter().sum::<f64>() / rates.len() as f64
            };
            YearSummary {
                year,
                student_count: rates.len(),
                average_rate,
            }
        })
        .collect()
}

/// Summary of one student plus their `recent_limit` latest marks, newest first.
pub fn student_report(
    student: &Student,
    records: &[AttendanceRecord],
    recent_limit: usize,
) -> StudentReport {
    let mut own: Vec<&AttendanceRecord> =
        records.iter().filter(|r| r.student_id == student.id).collect();
    let summary = summarize(student, Tally::of(own.iter().copied()));

    own.sort_by(|a, b| b.date.cmp(&a.date).then(b.marked_at.cmp(&a.marked_at)));
    StudentReport {
        summary,
        recent: own.into_iter().take(recent_limit).cloned().collect(),
    }
}

/// The marking sheet for one class: students of `year` enrolled in
/// `subject_id` whose name contains `search` (case-insensitive), each with the
/// mark already recorded for `date`, if any.
pub fn build_roster(
    students: &[Student],
    records: &[AttendanceRecord],
    year: YearLevel,
    subject_id: &str,
    date: NaiveDate,
    search: &str,
) -> Roster {
    let needle = search.trim().to_lowercase();
    let marks: HashMap<&str, AttendanceStatus> = records
        .iter()
        .filter(|r| r.subject_id == subject_id && r.date == date)
        .map(|r| (r.student_id.as_str(), r.status))
        .collect();

    let mut counts = RosterCounts::default();
    let entries = students
        .iter()
        .filter(|s| s.year == year)
        .filter(|s| s.subjects.iter().any(|id| id == subject_id))
        .filter(|s| needle.is_empty() || s.name.to_lowercase().contains(&needle))
        .map(|s| {
            let status = marks.get(s.id.as_str()).copied();
            match status {
                Some(AttendanceStatus::Present) => counts.present += 1,
                Some(AttendanceStatus::Absent) => counts.absent += 1,
                Some(AttendanceStatus::Late) => counts.late += 1,
                None => counts.unmarked += 1,
            }
            RosterEntry {
                student: s.clone(),
                status,
            }
        })
        .collect();

    Roster { entries, counts }
}

/// Flat rows handed to exporters. Records whose student is gone show
/// `Unknown` for name and year.
pub fn report_rows<'a>(
    records: impl IntoIterator<Item = &'a AttendanceRecord>,
    students: &HashMap<&str, &Student>,
) -> Vec<ReportRow> {
    records
        .into_iter()
        .map(|r| {
            let student = students.get(r.student_id.as_str());
            ReportRow {
                date: r.date,
                student: student.map_or_else(|| "Unknown".to_string(), |s| s.name.clone()),
                year: student.map_or_else(|| "Unknown".to_string(), |s| s.year.to_string()),
                subject: r.subject_id.clone(),
                status: r.status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn student(id: &str, year: YearLevel) -> Student {
        Student {
            id: id.into(),
            name: format!("Student {id}"),
            year,
            subjects: vec!["MATH".into()],
            user_id: 1,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn record(student_id: &str, subject_id: &str, date: NaiveDate, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("{student_id}_{date}_{subject_id}"),
            student_id: student_id.into(),
            subject_id: subject_id.into(),
            date,
            status,
            marked_by: 1,
            marked_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            user_id: 1,
        }
    }

    use AttendanceStatus::{Absent, Late, Present};

    #[test]
    fn daily_counts_for_three_students() {
        let records = vec![
            record("a", "MATH", day(5), Present),
            record("b", "MATH", day(5), Present),
            record("c", "MATH", day(5), Absent),
        ];
        let stats = compute_daily_stats(3, &records, day(5));
        assert_eq!(stats.total_students, 3);
        assert_eq!(stats.present_today, 2);
        assert_eq!(stats.absent_today, 1);
        assert_eq!(stats.late_today, 0);
    }

    #[test]
    fn daily_counts_add_up_to_records_on_that_day() {
        let records = vec![
            record("a", "MATH", day(5), Present),
            record("b", "MATH", day(5), Late),
            record("a", "ICT", day(5), Absent),
            record("a", "MATH", day(6), Present),
        ];
        let stats = compute_daily_stats(2, &records, day(5));
        let on_day = records.iter().filter(|r| r.date == day(5)).count();
        assert_eq!(stats.present_today + stats.absent_today + stats.late_today, on_day);
    }

    #[test]
    fn dashboard_rate_ignores_the_reference_date() {
        // all-time rate by design of the dashboard; only the day counts move
        let records = vec![
            record("a", "MATH", day(5), Present),
            record("a", "MATH", day(6), Absent),
            record("b", "MATH", day(6), Late),
            record("b", "MATH", day(7), Present),
        ];
        let on_fifth = compute_daily_stats(2, &records, day(5));
        let on_sixth = compute_daily_stats(2, &records, day(6));
        let empty_day = compute_daily_stats(2, &records, day(20));

        assert_eq!(on_fifth.attendance_rate, 50.0);
        assert_eq!(on_fifth.attendance_rate, on_sixth.attendance_rate);
        assert_eq!(on_fifth.attendance_rate, empty_day.attendance_rate);
        assert_ne!(on_fifth.present_today, on_sixth.present_today);
        assert_eq!(empty_day.present_today + empty_day.absent_today + empty_day.late_today, 0);
    }

    #[test]
    fn no_records_means_zero_rate() {
        let stats = compute_daily_stats(4, &[], day(1));
        assert_eq!(stats.attendance_rate, 0.0);
        assert_eq!(stats.total_students, 4);
    }

    #[test]
    fn summaries_sorted_by_rate_with_stable_ties() {
        let students = vec![
            student("zero1", YearLevel::Year7),
            student("half", YearLevel::Year7),
            student("full", YearLevel::Year8),
            student("zero2", YearLevel::Year8),
            student("half2", YearLevel::Year9),
        ];
        let records = vec![
            record("half", "MATH", day(1), Present),
            record("half", "MATH", day(2), Absent),
            record("full", "MATH", day(1), Present),
            record("half2", "MATH", day(1), Late),
            record("half2", "MATH", day(2), Present),
            record("zero2", "MATH", day(1), Absent),
        ];

        let summaries = compute_student_summaries(&students, &records);
        let order: Vec<&str> = summaries.iter().map(|s| s.student_id.as_str()).collect();
        assert_eq!(order, vec!["full", "half", "half2", "zero1", "zero2"]);

        for pair in summaries.windows(2) {
            assert!(pair[0].rate >= pair[1].rate);
        }
        let zero1 = summaries.iter().find(|s| s.student_id == "zero1").unwrap();
        assert_eq!((zero1.total, zero1.rate), (0, 0.0));
        let zero2 = summaries.iter().find(|s| s.student_id == "zero2").unwrap();
        assert_eq!((zero2.absent, zero2.total), (1, 1));
    }

    #[test]
    fn date_window_is_inclusive_on_both_ends() {
        let students = vec![student("a", YearLevel::Year7)];
        let records: Vec<AttendanceRecord> =
            (1..=31).map(|d| record("a", "MATH", day(d), Present)).collect();
        let filter = ReportFilter {
            start: day(10),
            end: day(20),
            year: None,
            subject_id: None,
        };
        let index = index_students(&students);

        let kept = filter_records(&records, &filter, &index);
        assert_eq!(kept.len(), 11);
        assert!(kept.iter().all(|r| r.date >= day(10) && r.date <= day(20)));
        assert_eq!(compute_filtered_stats(&records, &filter, &index).total_records, 11);
    }

    #[test]
    fn trailing_window_spans_days_plus_one() {
        let filter = ReportFilter::trailing(day(31), 30).unwrap();
        assert_eq!(filter.start, day(1));
        assert_eq!((filter.end - filter.start).num_days() + 1, 31);
    }

    #[test]
    fn trailing_window_off_the_calendar_is_none() {
        assert!(ReportFilter::trailing(NaiveDate::MIN, 30).is_none());
        assert!(ReportFilter::trailing(day(31), i64::MAX).is_none());
        assert_eq!(
            ReportFilter::trailing(NaiveDate::MIN, 0).map(|f| f.start),
            Some(NaiveDate::MIN)
        );
    }

    #[test]
    fn year_and_subject_filters_combine() {
        let students = vec![student("a", YearLevel::Year7), student("b", YearLevel::Year8)];
        let records = vec![
            record("a", "MATH", day(3), Present),
            record("a", "ICT", day(3), Absent),
            record("b", "MATH", day(3), Late),
            record("ghost", "MATH", day(3), Present),
        ];
        let index = index_students(&students);
        let mut filter = ReportFilter::trailing(day(31), 30).unwrap();

        filter.year = Some(YearLevel::Year7);
        let stats = compute_filtered_stats(&records, &filter, &index);
        assert_eq!((stats.total_records, stats.present_count, stats.absent_count), (2, 1, 1));
        assert_eq!(stats.attendance_rate, 50.0);

        filter.subject_id = Some("MATH".into());
        let stats = compute_filtered_stats(&records, &filter, &index);
        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.attendance_rate, 100.0);

        filter.year = None;
        let stats = compute_filtered_stats(&records, &filter, &index);
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.late_count, 1);
    }

    #[test]
    fn trend_is_ascending_without_gap_filling() {
        let records = vec![
            record("a", "MATH", day(9), Absent),
            record("a", "MATH", day(2), Present),
            record("b", "MATH", day(2), Absent),
            record("b", "MATH", day(9), Present),
            record("c", "MATH", day(9), Present),
        ];
        let trend = compute_trend(&records);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date, day(2));
        assert_eq!(trend[0].rate, 50.0);
        assert_eq!(trend[1].date, day(9));
        assert!((trend[1].rate - 200.0 / 3.0).abs() < 1e-9);

        assert_eq!(compute_trend(&records), trend);
        assert!(compute_trend(&[]).is_empty());
    }

    #[test]
    fn year_summaries_average_student_rates() {
        let students = vec![
            student("a", YearLevel::Year7),
            student("b", YearLevel::Year7),
            student("c", YearLevel::Year9),
        ];
        let records = vec![
            record("a", "MATH", day(1), Present),
            record("b", "MATH", day(1), Absent),
            record("c", "MATH", day(1), Present),
        ];
        let years = compute_year_summaries(&compute_student_summaries(&students, &records));
        assert_eq!(years.len(), 6);
        assert_eq!(years[0].year, YearLevel::Year7);
        assert_eq!((years[0].student_count, years[0].average_rate), (2, 50.0));
        assert_eq!(years[1].average_rate, 0.0);
        assert_eq!(years[2].average_rate, 100.0);
    }

    #[test]
    fn student_report_lists_latest_marks_first() {
        let a = student("a", YearLevel::Year7);
        let records: Vec<AttendanceRecord> = (1..=12)
            .map(|d| record("a", "MATH", day(d), if d % 2 == 0 { Present } else { Late }))
            .chain(std::iter::once(record("b", "MATH", day(3), Present)))
            .collect();

        let report = student_report(&a, &records, 10);
        assert_eq!(report.summary.total, 12);
        assert_eq!(report.summary.present, 6);
        assert_eq!(report.recent.len(), 10);
        assert_eq!(report.recent[0].date, day(12));
        assert_eq!(report.recent[9].date, day(3));
    }

    #[test]
    fn roster_counts_unmarked_students() {
        let mut c = student("c", YearLevel::Year7);
        c.subjects = vec!["ICT".into()];
        let students = vec![
            student("a", YearLevel::Year7),
            student("b", YearLevel::Year7),
            c,
            student("d", YearLevel::Year8),
        ];
        let records = vec![
            record("a", "MATH", day(4), Late),
            record("b", "MATH", day(3), Present),
        ];

        let roster = build_roster(&students, &records, YearLevel::Year7, "MATH", day(4), "");
        assert_eq!(roster.entries.len(), 2);
        assert_eq!(roster.entries[0].status, Some(Late));
        assert_eq!(roster.entries[1].status, None);
        assert_eq!(
            roster.counts,
            RosterCounts {
                present: 0,
                absent: 0,
                late: 1,
                unmarked: 1
            }
        );

        let searched = build_roster(&students, &records, YearLevel::Year7, "MATH", day(4), "STUDENT B");
        assert_eq!(searched.entries.len(), 1);
        assert_eq!(searched.entries[0].student.id, "b");
    }

    #[test]
    fn report_rows_mark_missing_students_unknown() {
        let students = vec![student("a", YearLevel::Year10)];
        let records = vec![
            record("a", "MATH", day(2), Present),
            record("gone", "MATH", day(2), Absent),
        ];
        let rows = report_rows(&records, &index_students(&students));
        assert_eq!(rows[0].student, "Student a");
        assert_eq!(rows[0].year, "Year 10");
        assert_eq!(rows[1].student, "Unknown");
        assert_eq!(rows[1].year, "Unknown");
    }
}
