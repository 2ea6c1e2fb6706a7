use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub active: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// Attendance row as exported from the logging side. Extra columns such as
/// `notes` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub date: NaiveDate,
    pub bonus: bool,
}

/// One attendance hit on an anchor date, as carried by the roster join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceMark {
    pub date: NaiveDate,
    pub bonus: bool,
}

/// A roster member with the marks restricted to the report's anchor dates.
#[derive(Debug, Clone)]
pub struct StudentAttendance {
    pub student: Student,
    pub marks: Vec<AttendanceMark>,
}

/// Cell value of the matrix. Ordering is precedence: when a cell has several
/// records the greatest status wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Absent,
    Present,
    Bonus,
}

impl Status {
    pub fn from_mark(mark: &AttendanceMark) -> Self {
        if mark.bonus {
            Status::Bonus
        } else {
            Status::Present
        }
    }

    /// Short wire code: `H` (hadir) for present, `B` for bonus, none for absent.
    pub fn code(self) -> Option<&'static str> {
        match self {
            Status::Absent => None,
            Status::Present => Some("H"),
            Status::Bonus => Some("B"),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.code() {
            Some(code) => serializer.serialize_str(code),
            None => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Inactive,
}

impl StudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
        }
    }
}

impl From<bool> for StudentStatus {
    fn from(active: bool) -> Self {
        if active {
            StudentStatus::Active
        } else {
            StudentStatus::Inactive
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub student_id: i64,
    pub student_name: String,
    pub student_address: String,
    pub student_status: StudentStatus,
    /// Keyed by anchor date as `YYYY-MM-DD`.
    #[serde(flatten)]
    pub statuses: BTreeMap<String, Status>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub present: usize,
    pub bonus: usize,
    pub absent: usize,
}

impl ReportRow {
    pub fn tally(&self) -> Tally {
        self.statuses
            .values()
            .fold(Tally::default(), |mut tally, status| {
                match status {
                    Status::Absent => tally.absent += 1,
                    Status::Present => tally.present += 1,
                    Status::Bonus => tally.bonus += 1,
                }
                tally
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPage {
    pub rows: Vec<ReportRow>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_rows: usize,
    pub per_page: u32,
}
