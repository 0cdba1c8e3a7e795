//! Lecture identifiers, the lecture entity and the lecture master row layout.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{AppError, Result};
use crate::storage::Record;
use crate::storage::record::{
    RecordFormat, join_list, optional, parse_number, parse_number_or_default, split_list,
};

/// Canonical lecture identifier.
///
/// Lecture IDs show up both as `L001` and as bare numbers depending on
/// which file they come from. Both spellings resolve to the same value and
/// the canonical rendering is `L` followed by at least three digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct LectureId(u32);

impl LectureId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Parse either ID spelling.
    ///
    /// Accepts an optional `L`/`l` prefix followed by ASCII digits. Anything
    /// else is rejected instead of guessed at.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('L')
            .or_else(|| trimmed.strip_prefix('l'))
            .unwrap_or(trimmed);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::InvalidLectureId(raw.to_string()));
        }
        digits
            .parse()
            .map(Self)
            .map_err(|_| AppError::InvalidLectureId(raw.to_string()))
    }
}

impl fmt::Display for LectureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{:03}", self.0)
    }
}

impl FromStr for LectureId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<u32> for LectureId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<LectureId> for String {
    fn from(id: LectureId) -> Self {
        id.to_string()
    }
}

/// Lecture IDs read from a comma-separated list field.
///
/// The tokens are kept exactly as read, including ones that are not valid
/// IDs, so writing the field back reproduces it. Only the valid IDs are
/// visible to callers and serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LectureIdList {
    ids: Vec<LectureId>,
    tokens: Vec<String>,
}

impl LectureIdList {
    /// Parse a list field, logging and hiding tokens that are not IDs.
    pub fn parse(format: &'static str, value: &str) -> Self {
        let tokens = split_list(value);
        let ids = tokens
            .iter()
            .filter_map(|token| match LectureId::parse(token) {
                Ok(id) => Some(id),
                Err(e) => {
                    log::warn!("Skipping lecture id in {} record: {}", format, e);
                    None
                }
            })
            .collect();
        Self { ids, tokens }
    }

    pub fn ids(&self) -> &[LectureId] {
        &self.ids
    }

    pub fn contains(&self, lecture_id: LectureId) -> bool {
        self.ids.contains(&lecture_id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Append an ID unless present. New entries use the canonical spelling.
    pub fn push(&mut self, lecture_id: LectureId) -> bool {
        if self.contains(lecture_id) {
            return false;
        }
        self.ids.push(lecture_id);
        self.tokens.push(lecture_id.to_string());
        true
    }

    /// The field as stored on disk.
    pub fn to_field(&self) -> String {
        join_list(&self.tokens)
    }
}

impl FromIterator<LectureId> for LectureIdList {
    fn from_iter<I: IntoIterator<Item = LectureId>>(iter: I) -> Self {
        let mut list = Self::default();
        for lecture_id in iter {
            list.push(lecture_id);
        }
        list
    }
}

impl Serialize for LectureIdList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.ids)
    }
}

static IMAGE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|bmp|webp)$").expect("image pattern is valid")
});

/// Whether a token looks like an image filename.
pub fn is_image_file(token: &str) -> bool {
    IMAGE_FILE.is_match(token.trim())
}

/// Column counted backwards from the end of a lecture master row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailColumn {
    Room,
    Description,
    Grade,
    Rating,
    CurrentEnrolled,
    Capacity,
    DayOfWeek,
    Time,
    Image,
}

/// Shape of a lecture master row.
///
/// The row ends in an optional image filename, so every trailing column
/// sits at a different distance from the end depending on whether it is
/// present. Each variant carries its own fixed offset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LectureLayout {
    /// `.../dayOfWeek/time/imageFilename`
    WithImage,
    /// `.../dayOfWeek/time`
    WithoutImage,
}

impl LectureLayout {
    /// Pick the layout by inspecting the last column.
    pub fn detect<S: AsRef<str>>(fields: &[S]) -> Self {
        match fields.last() {
            Some(last) if is_image_file(last.as_ref()) => Self::WithImage,
            _ => Self::WithoutImage,
        }
    }

    /// Distance from the end of the row (1 = last column).
    pub const fn offset(self, column: TailColumn) -> Option<usize> {
        use TailColumn::*;
        match (self, column) {
            (Self::WithImage, Image) => Some(1),
            (Self::WithImage, Time) => Some(2),
            (Self::WithImage, DayOfWeek) => Some(3),
            (Self::WithImage, Capacity) => Some(4),
            (Self::WithImage, CurrentEnrolled) => Some(5),
            (Self::WithImage, Rating) => Some(6),
            (Self::WithImage, Grade) => Some(7),
            (Self::WithImage, Description) => Some(8),
            (Self::WithImage, Room) => Some(9),
            (Self::WithoutImage, Image) => None,
            (Self::WithoutImage, Time) => Some(1),
            (Self::WithoutImage, DayOfWeek) => Some(2),
            (Self::WithoutImage, Capacity) => Some(3),
            (Self::WithoutImage, CurrentEnrolled) => Some(4),
            (Self::WithoutImage, Rating) => Some(5),
            (Self::WithoutImage, Grade) => Some(6),
            (Self::WithoutImage, Description) => Some(7),
            (Self::WithoutImage, Room) => Some(8),
        }
    }

    /// Read a trailing column, `None` if the row is too short.
    pub fn get<'a, S: AsRef<str>>(self, fields: &'a [S], column: TailColumn) -> Option<&'a str> {
        let offset = self.offset(column)?;
        let index = fields.len().checked_sub(offset)?;
        fields.get(index).map(AsRef::as_ref)
    }
}

/// A tutoring lecture in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lecture {
    pub id: LectureId,
    pub academy: String,
    pub subject: String,
    pub year: String,
    pub title: String,
    pub instructor: String,
    pub textbook: Option<String>,
    pub price: i64,
    pub textbook_price: i64,
    pub room: String,
    pub description: String,

    /// Target grades, e.g. "고2, 고3"
    pub grade: String,

    pub rating: f64,
    pub current_enrolled: u32,
    pub capacity: u32,

    /// Comma-separated weekday tokens, e.g. "월, 수"
    pub day_of_week: String,

    pub time: String,
    pub image: Option<String>,
}

impl Lecture {
    pub fn is_full(&self) -> bool {
        self.current_enrolled >= self.capacity
    }

    pub fn seats_left(&self) -> u32 {
        self.capacity.saturating_sub(self.current_enrolled)
    }
}

impl Record for Lecture {
    type Id = LectureId;

    const FORMAT: RecordFormat = RecordFormat::new("lecture", b'/', "lectureId", 17);

    fn id(&self) -> LectureId {
        self.id
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        let format = Self::FORMAT.name;
        let layout = LectureLayout::detect(fields);
        let tail = |column| layout.get(fields, column).unwrap_or_default();

        Ok(Self {
            id: LectureId::parse(&fields[0])?,
            academy: fields[1].clone(),
            subject: fields[2].clone(),
            year: fields[3].clone(),
            title: fields[4].clone(),
            instructor: fields[5].clone(),
            textbook: optional(&fields[6]),
            price: parse_number(format, "lecturePrice", &fields[7])?,
            textbook_price: parse_number_or_default(format, "textbookPrice", &fields[8])?,
            room: tail(TailColumn::Room).to_string(),
            description: tail(TailColumn::Description).to_string(),
            grade: tail(TailColumn::Grade).to_string(),
            rating: parse_number(format, "rating", tail(TailColumn::Rating))?,
            current_enrolled: parse_number(format, "currentEnrolled", tail(TailColumn::CurrentEnrolled))?,
            capacity: parse_number(format, "capacity", tail(TailColumn::Capacity))?,
            day_of_week: tail(TailColumn::DayOfWeek).to_string(),
            time: tail(TailColumn::Time).to_string(),
            image: layout.get(fields, TailColumn::Image).and_then(optional),
        })
    }

    fn name(&self) -> Option<&str> {
        Some(&self.title)
    }

    fn foreign_key(&self) -> Option<String> {
        Some(self.academy.clone())
    }
}
