//! Schedule views and the per-enrollment override record.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::Result;
use crate::models::LectureId;
use crate::storage::Record;
use crate::storage::record::{RecordFormat, optional};

/// Status shown when no override says otherwise.
pub const DEFAULT_STATUS: &str = "수강중";

/// Rank for weekdays that cannot be recognized.
pub const UNKNOWN_WEEKDAY: u8 = 99;

/// Weekday rank of a day-of-week string, Monday = 1 … Sunday = 7.
///
/// Only the first comma-separated token counts, so "월, 수" ranks as
/// Monday. Full names such as "화요일" are accepted.
pub fn weekday_rank(day_of_week: &str) -> u8 {
    let first = day_of_week.split(',').next().unwrap_or_default().trim();
    match first.chars().next() {
        Some('월') => 1,
        Some('화') => 2,
        Some('수') => 3,
        Some('목') => 4,
        Some('금') => 5,
        Some('토') => 6,
        Some('일') => 7,
        _ => UNKNOWN_WEEKDAY,
    }
}

/// One row of the per-enrollment override file.
///
/// Values here were set for a specific enrollment and take precedence over
/// the lecture master for day, room and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentOverride {
    pub enrollment_id: String,
    pub lecture_id: LectureId,
    pub status: Option<String>,
    pub day_of_week: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub room: Option<String>,
    pub note: Option<String>,
}

impl EnrollmentOverride {
    /// "start~end", or whichever end is present.
    pub fn time_range(&self) -> Option<String> {
        match (self.start_time.as_deref(), self.end_time.as_deref()) {
            (Some(start), Some(end)) => Some(format!("{start}~{end}")),
            (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
            (None, None) => None,
        }
    }
}

impl Record for EnrollmentOverride {
    type Id = String;

    const FORMAT: RecordFormat = RecordFormat::new("enrollment", b'/', "enrollmentId", 7);

    fn id(&self) -> String {
        self.enrollment_id.clone()
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            enrollment_id: fields[0].clone(),
            lecture_id: LectureId::parse(&fields[1])?,
            status: optional(&fields[2]),
            day_of_week: optional(&fields[3]),
            start_time: optional(&fields[4]),
            end_time: optional(&fields[5]),
            room: optional(&fields[6]),
            note: fields.get(7).and_then(|note| optional(note)),
        })
    }

    fn foreign_key(&self) -> Option<String> {
        Some(self.lecture_id.to_string())
    }
}

/// A reconciled schedule line. Day, time and room are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub lecture_id: LectureId,
    pub title: String,
    pub subject: String,
    pub academy: String,
    pub instructor: String,
    pub day_of_week: String,
    pub time: String,
    pub room: String,
    pub status: String,
}

impl ScheduleEntry {
    pub fn weekday_rank(&self) -> u8 {
        weekday_rank(&self.day_of_week)
    }

    /// Weekday first, then the time string compared lexicographically.
    pub fn schedule_order(&self, other: &Self) -> Ordering {
        self.weekday_rank()
            .cmp(&other.weekday_rank())
            .then_with(|| self.time.cmp(&other.time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_rank() {
        assert_eq!(weekday_rank("월"), 1);
        assert_eq!(weekday_rank("화요일"), 2);
        assert_eq!(weekday_rank(" 수, 금"), 3);
        assert_eq!(weekday_rank("일"), 7);
        assert_eq!(weekday_rank("-"), UNKNOWN_WEEKDAY);
        assert_eq!(weekday_rank(""), UNKNOWN_WEEKDAY);
        assert_eq!(weekday_rank("Mon"), UNKNOWN_WEEKDAY);
    }

    #[test]
    fn test_override_time_range() {
        let fields = EnrollmentOverride::FORMAT
            .parse_line("E1/L001/수강중/월/18:00/20:00/301호")
            .unwrap();
        let row = EnrollmentOverride::from_fields(&fields).unwrap();
        assert_eq!(row.time_range().as_deref(), Some("18:00~20:00"));
        assert!(row.note.is_none());

        let fields = EnrollmentOverride::FORMAT
            .parse_line("E2/L002//화/19:00///메모")
            .unwrap();
        let row = EnrollmentOverride::from_fields(&fields).unwrap();
        assert_eq!(row.time_range().as_deref(), Some("19:00"));
        assert!(row.status.is_none());
        assert!(row.room.is_none());
        assert_eq!(row.note.as_deref(), Some("메모"));
    }
}
