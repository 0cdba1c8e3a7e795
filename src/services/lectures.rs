// src/services/lectures.rs

//! Lecture search and enrollment.
//!
//! Filters run over the cached catalog in a fixed order (subject, grade,
//! academy, keyword) and each one is skipped when its argument is empty or
//! the "all" sentinel. Enrollment is a small state machine over the cache
//! and the user file.

use serde::Serialize;

use crate::error::Result;
use crate::models::{Lecture, LectureId};
use crate::storage::{EntityStore, UserDirectory};
use crate::utils::contains_ignore_case;

/// Filter value meaning "no filter".
pub const ALL: &str = "전체";

/// Tokens of the combined final-year / repeat-student bucket.
const SENIOR_TOKEN: &str = "고3";
const REPEAT_TOKEN: &str = "N수";

/// A filter argument, `None` when it is empty or [`ALL`].
fn active(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty() && value != ALL).then(|| value.to_string())
}

/// Grade filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GradeBucket {
    #[default]
    Any,
    /// "고3/N수": matches either grade
    Combined,
    /// Substring of the lecture's grade string
    Token(String),
}

impl GradeBucket {
    pub fn parse(raw: &str) -> Self {
        let Some(value) = active(raw) else {
            return Self::Any;
        };
        if contains_ignore_case(&value, SENIOR_TOKEN) && contains_ignore_case(&value, REPEAT_TOKEN) {
            Self::Combined
        } else {
            Self::Token(value)
        }
    }

    pub fn matches(&self, grade: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Combined => {
                grade.contains(SENIOR_TOKEN) || contains_ignore_case(grade, REPEAT_TOKEN)
            }
            Self::Token(token) => grade.contains(token.as_str()),
        }
    }
}

/// Sort order of the result list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortKey {
    /// File order
    #[default]
    Unsorted,
    RatingDesc,
    /// A known sort option with no ordering behind it yet; results keep
    /// file order.
    Unimplemented(String),
}

impl SortKey {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | ALL | "기본" => Self::Unsorted,
            "평점순" | "별점순" | "rating" => Self::RatingDesc,
            other => Self::Unimplemented(other.to_string()),
        }
    }

    pub fn is_implemented(&self) -> bool {
        !matches!(self, Self::Unimplemented(_))
    }

    fn apply(&self, lectures: &mut [Lecture]) {
        match self {
            Self::Unsorted => {}
            // stable, so equal ratings keep file order
            Self::RatingDesc => lectures.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
            Self::Unimplemented(key) => {
                log::debug!("Sort key '{}' has no ordering; keeping file order", key);
            }
        }
    }
}

/// One catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LectureQuery {
    /// Exact subject
    pub subject: Option<String>,
    pub grade: GradeBucket,
    /// Exact academy
    pub academy: Option<String>,
    /// Case-insensitive, over title or instructor
    pub keyword: Option<String>,
    pub sort: SortKey,
}

impl LectureQuery {
    /// Build a query from raw filter values as a form would submit them.
    pub fn from_raw(subject: &str, grade: &str, academy: &str, sort: &str, keyword: &str) -> Self {
        Self {
            subject: active(subject),
            grade: GradeBucket::parse(grade),
            academy: active(academy),
            keyword: Some(keyword.trim().to_string()).filter(|k| !k.is_empty()),
            sort: SortKey::parse(sort),
        }
    }

    fn matches(&self, lecture: &Lecture) -> bool {
        self.subject.as_ref().is_none_or(|s| lecture.subject == *s)
            && self.grade.matches(&lecture.grade)
            && self.academy.as_ref().is_none_or(|a| lecture.academy == *a)
            && self.keyword.as_ref().is_none_or(|k| {
                contains_ignore_case(&lecture.title, k) || contains_ignore_case(&lecture.instructor, k)
            })
    }
}

/// Result of an enrollment request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollOutcome {
    /// Enrolled; carries the lecture with its updated count
    Enrolled { lecture: Lecture },
    AlreadyEnrolled,
    NotFound,
    Full,
    UnknownUser,
}

impl EnrollOutcome {
    pub fn is_enrolled(&self) -> bool {
        matches!(self, Self::Enrolled { .. })
    }

    /// Short machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Enrolled { .. } => "ENROLLED",
            Self::AlreadyEnrolled => "ALREADY_ENROLLED",
            Self::NotFound => "NOT_FOUND",
            Self::Full => "FULL",
            Self::UnknownUser => "UNKNOWN_USER",
        }
    }
}

/// Search and enrollment over the lecture catalog.
pub struct LectureQueryPipeline<'a> {
    lectures: &'a EntityStore<Lecture>,
    users: &'a UserDirectory,
}

impl<'a> LectureQueryPipeline<'a> {
    pub fn new(lectures: &'a EntityStore<Lecture>, users: &'a UserDirectory) -> Self {
        Self { lectures, users }
    }

    /// Run a query over the full catalog.
    pub fn query(&self, query: &LectureQuery) -> Vec<Lecture> {
        let mut lectures = self.lectures.find_where(|lecture| query.matches(lecture));
        query.sort.apply(&mut lectures);
        log::debug!("Lecture query {:?} matched {}", query, lectures.len());
        lectures
    }

    /// [`query`](Self::query) from raw filter values.
    pub fn search(
        &self,
        subject: &str,
        grade: &str,
        academy: &str,
        sort: &str,
        keyword: &str,
    ) -> Vec<Lecture> {
        self.query(&LectureQuery::from_raw(subject, grade, academy, sort, keyword))
    }

    /// Enroll a user in a lecture.
    ///
    /// Checks run in a fixed order: already enrolled, lecture exists,
    /// capacity. On success the user file gains the lecture first and the
    /// cached count is raised only once that write succeeded, both under
    /// the lecture store's write lock.
    pub fn enroll_lecture(&self, user_id: &str, lecture_id: LectureId) -> Result<EnrollOutcome> {
        let Some(user) = self.users.find(user_id)? else {
            return Ok(EnrollOutcome::UnknownUser);
        };
        if user.is_enrolled(lecture_id) {
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }

        let outcome = self.lectures.update(&lecture_id, |lecture| -> Result<EnrollOutcome> {
            if lecture.is_full() {
                return Ok(EnrollOutcome::Full);
            }
            Ok(match self.users.add_lecture(user_id, lecture_id)? {
                Some(true) => {
                    lecture.current_enrolled += 1;
                    EnrollOutcome::Enrolled {
                        lecture: lecture.clone(),
                    }
                }
                Some(false) => EnrollOutcome::AlreadyEnrolled,
                None => EnrollOutcome::UnknownUser,
            })
        });

        let outcome = outcome.unwrap_or(Ok(EnrollOutcome::NotFound))?;
        match &outcome {
            EnrollOutcome::Enrolled { lecture } => log::info!(
                "Enrolled {} in {} ({}/{})",
                user_id,
                lecture_id,
                lecture.current_enrolled,
                lecture.capacity
            ),
            other => log::info!("Enrollment of {} in {} rejected: {}", user_id, lecture_id, other.reason()),
        }
        Ok(outcome)
    }
}
