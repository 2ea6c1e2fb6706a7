use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::models::{
    AttendanceMark, AttendanceRecord, ReportRow, Status, Student, StudentAttendance,
};

/// Shapes joined roster rows into report rows, one status per anchor.
///
/// Marks on dates outside `anchors` are ignored. Duplicate marks on the same
/// cell collapse to the highest-precedence status.
pub fn build_matrix(entries: Vec<StudentAttendance>, anchors: &[NaiveDate]) -> Vec<ReportRow> {
    entries
        .into_iter()
        .map(|entry| {
            let mut cells: HashMap<NaiveDate, Status> = HashMap::new();
            for mark in &entry.marks {
                let status = Status::from_mark(mark);
                cells
                    .entry(mark.date)
                    .and_modify(|current| *current = (*current).max(status))
                    .or_insert(status);
            }

            let statuses: BTreeMap<String, Status> = anchors
                .iter()
                .map(|anchor| {
                    let status = cells.get(anchor).copied().unwrap_or(Status::Absent);
                    (anchor.to_string(), status)
                })
                .collect();

            ReportRow {
                student_id: entry.student.id,
                student_name: entry.student.name,
                student_address: entry.student.address,
                student_status: entry.student.active.into(),
                statuses,
            }
        })
        .collect()
}

/// In-memory counterpart of the roster query: drops deleted students,
/// applies the name filter, orders the roster and attaches anchor-date marks.
pub fn join_roster(
    students: &[Student],
    records: &[AttendanceRecord],
    anchors: &[NaiveDate],
    search: Option<&str>,
) -> Vec<StudentAttendance> {
    let anchor_set: HashSet<NaiveDate> = anchors.iter().copied().collect();
    let mut restricted: Vec<&AttendanceRecord> = records
        .iter()
        .filter(|r| anchor_set.contains(&r.date))
        .collect();
    // Same mark order as the roster query: date, then record id.
    restricted.sort_by_key(|r| (r.date, r.id));

    let mut marks_by_student: HashMap<i64, Vec<AttendanceMark>> = HashMap::new();
    for record in restricted {
        marks_by_student
            .entry(record.student_id)
            .or_default()
            .push(AttendanceMark {
                date: record.date,
                bonus: record.bonus,
            });
    }

    let needle = search.map(str::to_lowercase);
    let mut roster: Vec<&Student> = students
        .iter()
        .filter(|s| !s.deleted)
        .filter(|s| match &needle {
            Some(needle) => s.name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .collect();
    roster.sort_by(|a, b| roster_order(a, b));

    roster
        .into_iter()
        .map(|student| StudentAttendance {
            student: student.clone(),
            marks: marks_by_student.remove(&student.id).unwrap_or_default(),
        })
        .collect()
}

/// Name ascending, case-insensitive first, then exact name, then id.
pub fn roster_order(a: &Student, b: &Student) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn student(id: i64, name: &str) -> Student {
        Student {
            id,
            name: name.to_string(),
            address: format!("Jl. Merdeka {id}"),
            active: true,
            deleted: false,
        }
    }

    fn record(id: i64, student_id: i64, date: NaiveDate, bonus: bool) -> AttendanceRecord {
        AttendanceRecord {
            id,
            student_id,
            date,
            bonus,
        }
    }

    fn january_anchors() -> Vec<NaiveDate> {
        vec![
            date(2025, 1, 5),
            date(2025, 1, 12),
            date(2025, 1, 19),
            date(2025, 1, 26),
        ]
    }

    fn build(
        students: &[Student],
        records: &[AttendanceRecord],
        search: Option<&str>,
    ) -> Vec<ReportRow> {
        let anchors = january_anchors();
        build_matrix(join_roster(students, records, &anchors, search), &anchors)
    }

    #[test]
    fn january_example_matches_expected_rows() {
        let students = vec![student(2, "Budi"), student(1, "Ana")];
        let records = vec![
            record(1, 1, date(2025, 1, 5), false),
            record(2, 1, date(2025, 1, 12), true),
        ];

        let rows = build(&students, &records, None);
        assert_eq!(rows.len(), 2);

        let ana = &rows[0];
        assert_eq!(ana.student_name, "Ana");
        assert_eq!(ana.statuses["2025-01-05"], Status::Present);
        assert_eq!(ana.statuses["2025-01-12"], Status::Bonus);
        assert_eq!(ana.statuses["2025-01-19"], Status::Absent);
        assert_eq!(ana.statuses["2025-01-26"], Status::Absent);

        let budi = &rows[1];
        assert_eq!(budi.student_name, "Budi");
        assert_eq!(budi.statuses.len(), 4);
        assert!(budi.statuses.values().all(|s| *s == Status::Absent));
    }

    #[test]
    fn records_off_the_anchor_dates_are_ignored() {
        let students = vec![student(1, "Ana")];
        // Monday and a Sunday from the previous month.
        let records = vec![
            record(1, 1, date(2025, 1, 6), false),
            record(2, 1, date(2024, 12, 29), true),
        ];
        let rows = build(&students, &records, None);
        assert!(rows[0].statuses.values().all(|s| *s == Status::Absent));
    }

    #[test]
    fn bonus_wins_over_duplicate_plain_records() {
        let students = vec![student(1, "Ana")];
        let records = vec![
            record(1, 1, date(2025, 1, 5), true),
            record(7, 1, date(2025, 1, 5), false),
            record(3, 1, date(2025, 1, 12), false),
            record(4, 1, date(2025, 1, 12), false),
        ];
        let rows = build(&students, &records, None);
        assert_eq!(rows[0].statuses["2025-01-05"], Status::Bonus);
        assert_eq!(rows[0].statuses["2025-01-12"], Status::Present);

        let reversed: Vec<_> = records.into_iter().rev().collect();
        let again = build(&students, &reversed, None);
        assert_eq!(rows, again);
    }

    #[test]
    fn marks_follow_date_then_record_id() {
        let students = vec![student(1, "Ana")];
        let records = vec![
            record(9, 1, date(2025, 1, 12), false),
            record(2, 1, date(2025, 1, 12), true),
            record(5, 1, date(2025, 1, 5), false),
        ];
        let joined = join_roster(&students, &records, &january_anchors(), None);
        let marks: Vec<(NaiveDate, bool)> = joined[0]
            .marks
            .iter()
            .map(|mark| (mark.date, mark.bonus))
            .collect();
        assert_eq!(
            marks,
            vec![
                (date(2025, 1, 5), false),
                (date(2025, 1, 12), true),
                (date(2025, 1, 12), false)
            ]
        );
    }

    #[test]
    fn deleted_students_are_left_out() {
        let mut gone = student(3, "Citra");
        gone.deleted = true;
        let students = vec![student(1, "Ana"), gone];
        let rows = build(&students, &[], None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_id, 1);
    }

    #[test]
    fn inactive_students_still_report() {
        let mut dormant = student(4, "Dewi");
        dormant.active = false;
        let rows = build(&[dormant], &[], None);
        assert_eq!(rows[0].student_status, StudentStatus::Inactive);
    }

    #[test]
    fn empty_roster_and_empty_anchors() {
        assert!(build(&[], &[], None).is_empty());

        let students = vec![student(1, "Ana")];
        let records = vec![record(1, 1, date(2025, 1, 5), false)];
        let rows = build_matrix(join_roster(&students, &records, &[], None), &[]);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].statuses.is_empty());
    }

    #[test]
    fn roster_order_is_name_then_id() {
        let students = vec![
            student(5, "budi"),
            student(3, "Ana"),
            student(2, "Budi"),
            student(1, "Budi"),
        ];
        let ids: Vec<i64> = build(&students, &[], None)
            .iter()
            .map(|row| row.student_id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2, 5]);
    }

    #[test]
    fn search_is_case_insensitive_and_only_narrows() {
        let students = vec![
            student(1, "Ana"),
            student(2, "Budi"),
            student(3, "Hana Putri"),
            student(4, "Banu"),
        ];
        let all: HashSet<i64> = build(&students, &[], None)
            .iter()
            .map(|row| row.student_id)
            .collect();

        for term in ["ana", "AN", "budi", "zzz", ""] {
            let subset: HashSet<i64> = build(&students, &[], Some(term))
                .iter()
                .map(|row| row.student_id)
                .collect();
            assert!(subset.is_subset(&all), "{term} widened the roster");
        }

        let hits: Vec<i64> = build(&students, &[], Some("ANA"))
            .iter()
            .map(|row| row.student_id)
            .collect();
        assert_eq!(hits, vec![1, 3]);
    }

    #[test]
    fn rebuilding_yields_identical_rows() {
        let students = vec![student(2, "Budi"), student(1, "Ana")];
        let records = vec![record(1, 2, date(2025, 1, 19), true)];
        assert_eq!(build(&students, &records, None), build(&students, &records, None));
    }

    #[test]
    fn tally_counts_each_status() {
        let students = vec![student(1, "Ana")];
        let records = vec![
            record(1, 1, date(2025, 1, 5), false),
            record(2, 1, date(2025, 1, 12), true),
        ];
        let tally = build(&students, &records, None)[0].tally();
        assert_eq!(tally.present, 1);
        assert_eq!(tally.bonus, 1);
        assert_eq!(tally.absent, 2);
    }
}
