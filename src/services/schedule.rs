// src/services/schedule.rs

//! Schedule reconciliation.
//!
//! A schedule line is assembled from three sources that are maintained
//! independently and do not share a schema:
//!
//! 1. the per-enrollment override file,
//! 2. the lecture master file, whose trailing columns are read from the end,
//! 3. the cached [`Lecture`] entity.
//!
//! Each field takes the first present value in its own precedence order
//! and falls back to a placeholder, so day, time and room are never empty.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::models::{
    DEFAULT_STATUS, EnrollmentOverride, Lecture, LectureId, LectureLayout, ScheduleEntry,
    TailColumn,
};
use crate::storage::local::read_optional;
use crate::storage::record::RecordFormat;
use crate::storage::{EntityStore, Record, UserDirectory};
use crate::utils::{PLACEHOLDER, first_present};

/// Schedule-relevant columns of one lecture master row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MasterRow {
    pub academy: String,
    pub subject: String,
    pub title: String,
    pub instructor: String,
    pub day_of_week: Option<String>,
    pub time: Option<String>,
    pub room: Option<String>,
}

impl MasterRow {
    /// Read a split master row. Leading columns are positional; day, time
    /// and room are taken from the end according to the row's layout.
    pub fn from_fields(fields: &[String]) -> Self {
        let layout = LectureLayout::detect(fields);
        let head = |idx: usize| fields.get(idx).cloned().unwrap_or_default();
        let tail = |column| layout.get(fields, column).map(str::to_string);

        Self {
            academy: head(1),
            subject: head(2),
            title: head(4),
            instructor: head(5),
            day_of_week: tail(TailColumn::DayOfWeek),
            time: tail(TailColumn::Time),
            room: tail(TailColumn::Room),
        }
    }
}

/// Merge the three sources for one lecture.
///
/// Returns `None` only when no source knows the lecture at all.
///
/// | field  | 1st      | 2nd      | 3rd    |
/// |--------|----------|----------|--------|
/// | day    | override | master   | entity |
/// | time   | master   | override | entity |
/// | room   | override | master   | entity |
/// | status | override | default  |        |
pub fn reconcile_entry(
    lecture_id: LectureId,
    overrides: Option<&EnrollmentOverride>,
    master: Option<&MasterRow>,
    lecture: Option<&Lecture>,
) -> Option<ScheduleEntry> {
    if overrides.is_none() && master.is_none() && lecture.is_none() {
        return None;
    }

    let override_time = overrides.and_then(EnrollmentOverride::time_range);

    let day_of_week = first_present([
        overrides.and_then(|o| o.day_of_week.as_deref()),
        master.and_then(|m| m.day_of_week.as_deref()),
        lecture.map(|l| l.day_of_week.as_str()),
    ]);
    let time = first_present([
        master.and_then(|m| m.time.as_deref()),
        override_time.as_deref(),
        lecture.map(|l| l.time.as_str()),
    ]);
    let room = first_present([
        overrides.and_then(|o| o.room.as_deref()),
        master.and_then(|m| m.room.as_deref()),
        lecture.map(|l| l.room.as_str()),
    ]);
    let status = first_present([overrides.and_then(|o| o.status.as_deref())]);

    let title = first_present([
        lecture.map(|l| l.title.as_str()),
        master.map(|m| m.title.as_str()),
    ])
    .map(str::to_string)
    .unwrap_or_else(|| lecture_id.to_string());

    Some(ScheduleEntry {
        lecture_id,
        title,
        subject: describe(
            lecture.map(|l| l.subject.as_str()),
            master.map(|m| m.subject.as_str()),
        ),
        academy: describe(
            lecture.map(|l| l.academy.as_str()),
            master.map(|m| m.academy.as_str()),
        ),
        instructor: describe(
            lecture.map(|l| l.instructor.as_str()),
            master.map(|m| m.instructor.as_str()),
        ),
        day_of_week: day_of_week.unwrap_or(PLACEHOLDER).to_string(),
        time: time.unwrap_or(PLACEHOLDER).to_string(),
        room: room.unwrap_or(PLACEHOLDER).to_string(),
        status: status.unwrap_or(DEFAULT_STATUS).to_string(),
    })
}

/// Descriptive fields prefer the loaded entity, then the fresh master row.
fn describe(from_lecture: Option<&str>, from_master: Option<&str>) -> String {
    first_present([from_lecture, from_master])
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

/// Builds reconciled schedules for users.
pub struct ScheduleReconciler<'a> {
    lectures: &'a EntityStore<Lecture>,
    users: &'a UserDirectory,
    master_path: &'a Path,
    overrides_path: &'a Path,
}

impl<'a> ScheduleReconciler<'a> {
    pub fn new(
        lectures: &'a EntityStore<Lecture>,
        users: &'a UserDirectory,
        master_path: &'a Path,
        overrides_path: &'a Path,
    ) -> Self {
        Self {
            lectures,
            users,
            master_path,
            overrides_path,
        }
    }

    /// The user's schedule ordered by weekday, then by time string.
    ///
    /// Unknown users and lectures no source knows about give no entries.
    pub fn get_my_schedule(&self, user_id: &str) -> Result<Vec<ScheduleEntry>> {
        let lecture_ids = self.users.enrolled_lectures(user_id)?;
        if lecture_ids.is_empty() {
            log::debug!("User {} has no enrolled lectures", user_id);
            return Ok(Vec::new());
        }

        let master = self.load_master()?;
        let overrides = self.load_overrides()?;

        let mut entries: Vec<ScheduleEntry> = lecture_ids
            .into_iter()
            .filter_map(|id| self.build(id, &overrides, &master))
            .collect();

        // stable: equal keys keep enrollment order
        entries.sort_by(ScheduleEntry::schedule_order);
        Ok(entries)
    }

    /// One reconciled entry, reading both files fresh.
    pub fn entry(&self, lecture_id: LectureId) -> Result<Option<ScheduleEntry>> {
        let master = self.load_master()?;
        let overrides = self.load_overrides()?;
        Ok(self.build(lecture_id, &overrides, &master))
    }

    fn build(
        &self,
        lecture_id: LectureId,
        overrides: &HashMap<LectureId, EnrollmentOverride>,
        master: &HashMap<LectureId, MasterRow>,
    ) -> Option<ScheduleEntry> {
        let lecture = self.lectures.find_by_id(&lecture_id);
        let entry = reconcile_entry(
            lecture_id,
            overrides.get(&lecture_id),
            master.get(&lecture_id),
            lecture.as_ref(),
        );
        if entry.is_none() {
            log::warn!("Lecture {} is enrolled but unknown to every source", lecture_id);
        }
        entry
    }

    /// Master rows keyed by lecture; later rows win.
    fn load_master(&self) -> Result<HashMap<LectureId, MasterRow>> {
        let format = <Lecture as Record>::FORMAT;
        read_keyed(self.master_path, format, |fields| {
            Ok((LectureId::parse(&fields[0])?, MasterRow::from_fields(fields)))
        })
    }

    /// Override rows keyed by lecture; later rows win.
    fn load_overrides(&self) -> Result<HashMap<LectureId, EnrollmentOverride>> {
        read_keyed(self.overrides_path, EnrollmentOverride::FORMAT, |fields| {
            let row = EnrollmentOverride::from_fields(fields)?;
            Ok((row.lecture_id, row))
        })
    }
}

/// Read a file fresh into a map, skipping lines that don't parse.
fn read_keyed<V>(
    path: &Path,
    format: RecordFormat,
    parse: impl Fn(&[String]) -> Result<(LectureId, V)>,
) -> Result<HashMap<LectureId, V>> {
    let Some(content) = read_optional(path)? else {
        log::warn!("No {} file found at {}", format.name, path.display());
        return Ok(HashMap::new());
    };

    let mut rows = HashMap::new();
    for (line_no, fields) in format.records(&content) {
        match fields.and_then(|fields| parse(fields.as_slice())) {
            Ok((id, row)) => {
                rows.insert(id, row);
            }
            Err(e) if e.is_line_local() => {
                log::warn!("{}:{}: skipping line: {}", path.display(), line_no, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn master(line: &str) -> MasterRow {
        let fields = <Lecture as Record>::FORMAT.parse_line(line).unwrap();
        MasterRow::from_fields(&fields)
    }

    fn override_row(line: &str) -> EnrollmentOverride {
        let fields = EnrollmentOverride::FORMAT.parse_line(line).unwrap();
        EnrollmentOverride::from_fields(&fields).unwrap()
    }

    #[test]
    fn test_master_row_without_image() {
        let row = master(
            "L001/A01/수학/2025/수학 개념완성/김민수/개념원리/150000/25000/301호/설명/고3/4.5/10/30/월, 수/18:00~20:00",
        );
        assert_eq!(row.day_of_week.as_deref(), Some("월, 수"));
        assert_eq!(row.time.as_deref(), Some("18:00~20:00"));
        assert_eq!(row.room.as_deref(), Some("301호"));
        assert_eq!(row.title, "수학 개념완성");
    }

    #[test]
    fn test_master_row_with_image() {
        let row = master(
            "L002/A02/영어/2025/영어 독해/이영희/리딩파워/120000/20000/202호/설명/고3/4.8/30/30/화/19:00~21:00/eng.png",
        );
        assert_eq!(row.day_of_week.as_deref(), Some("화"));
        assert_eq!(row.time.as_deref(), Some("19:00~21:00"));
        assert_eq!(row.room.as_deref(), Some("202호"));
    }

    #[test]
    fn test_precedence_override_master_entity() {
        let ov = override_row("E1/L001/휴강/금/09:00/11:00/별관 1호");
        let row = master(
            "L001/A01/수학/2025/수학/김/교재/1/1/301호/설명/고3/4.5/10/30/월/18:00~20:00",
        );

        let entry = reconcile_entry(LectureId::new(1), Some(&ov), Some(&row), None).unwrap();
        // day and room from the override, time from the master
        assert_eq!(entry.day_of_week, "금");
        assert_eq!(entry.room, "별관 1호");
        assert_eq!(entry.time, "18:00~20:00");
        assert_eq!(entry.status, "휴강");
    }

    #[test]
    fn test_override_time_used_when_master_has_none() {
        let ov = override_row("E1/L001//-/09:00/11:00/");
        let row = master("L001/A01/수학/2025/수학/김/교재/1/1/ /설명/고3/4.5/10/30/ /-");

        let entry = reconcile_entry(LectureId::new(1), Some(&ov), Some(&row), None).unwrap();
        assert_eq!(entry.time, "09:00~11:00");
        assert_eq!(entry.day_of_week, "-");
        assert_eq!(entry.room, "-");
        assert_eq!(entry.status, DEFAULT_STATUS);
    }

    #[test]
    fn test_unknown_everywhere_is_none() {
        assert!(reconcile_entry(LectureId::new(9), None, None, None).is_none());

        let ov = override_row("E9/L009/수강중/목/10:00/12:00/A관");
        let entry = reconcile_entry(LectureId::new(9), Some(&ov), None, None).unwrap();
        assert_eq!(entry.title, "L009");
        assert_eq!(entry.subject, "-");
        assert_eq!(entry.day_of_week, "목");
    }

    #[test]
    fn test_get_my_schedule_sorted_by_weekday() {
        let (_tmp, catalog) = fixtures::catalog();
        let schedule = catalog.schedule_reconciler().get_my_schedule("u1").unwrap();

        let days: Vec<_> = schedule.iter().map(|e| e.day_of_week.as_str()).collect();
        // u1 enrolled L002 (화) before L001 (월, 수 overridden to 월)
        assert_eq!(days, vec!["월", "화"]);
        assert_eq!(schedule[0].lecture_id, LectureId::new(1));
        assert_eq!(schedule[0].room, "별관 2층");
        assert_eq!(schedule[1].time, "19:00~21:00");
    }

    #[test]
    fn test_entities_fill_in_when_files_vanish() {
        let (tmp, catalog) = fixtures::catalog();
        std::fs::remove_file(tmp.path().join("lectures.txt")).unwrap();
        std::fs::remove_file(tmp.path().join("enrollments.txt")).unwrap();

        let entry = catalog
            .schedule_reconciler()
            .entry(LectureId::new(1))
            .unwrap()
            .unwrap();
        assert_eq!(entry.day_of_week, "월, 수");
        assert_eq!(entry.room, "301호");
        assert_eq!(entry.status, DEFAULT_STATUS);
    }

    #[test]
    fn test_unknown_user_has_empty_schedule() {
        let (_tmp, catalog) = fixtures::catalog();
        assert!(catalog.schedule_reconciler().get_my_schedule("ghost").unwrap().is_empty());
    }
}
