//! Textbook and review data structures.

use serde::Serialize;

use crate::error::Result;
use crate::models::LectureId;
use crate::storage::Record;
use crate::storage::record::{RecordFormat, parse_number, parse_number_or_default};

/// A textbook sold alongside a lecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Textbook {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub subject: String,
    pub lecture_id: LectureId,
    pub instructor_name: String,
}

impl Record for Textbook {
    type Id = String;

    const FORMAT: RecordFormat = RecordFormat::new("textbook", b'/', "id", 6);

    fn id(&self) -> String {
        self.id.clone()
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            id: fields[0].clone(),
            name: fields[1].clone(),
            price: parse_number_or_default(Self::FORMAT.name, "price", &fields[2])?,
            subject: fields[3].clone(),
            lecture_id: LectureId::parse(&fields[4])?,
            instructor_name: fields[5].clone(),
        })
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    /// Textbooks are looked up by the lecture they belong to.
    fn foreign_key(&self) -> Option<String> {
        Some(self.lecture_id.to_string())
    }
}

/// A student's review of an instructor's lecture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: String,
    pub instructor_id: String,
    pub lecture_id: LectureId,
    pub user_id: String,
    pub rating: f64,
    pub content: String,
}

impl Record for Review {
    type Id = String;

    const FORMAT: RecordFormat = RecordFormat::new("review", b'/', "instructorId", 6);

    fn id(&self) -> String {
        self.id.clone()
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            instructor_id: fields[0].clone(),
            lecture_id: LectureId::parse(&fields[1])?,
            id: fields[2].clone(),
            user_id: fields[3].clone(),
            rating: parse_number(Self::FORMAT.name, "rating", &fields[4])?,
            // free text may itself contain the delimiter
            content: fields[5..].join("/"),
        })
    }

    fn foreign_key(&self) -> Option<String> {
        Some(self.instructor_id.clone())
    }
}
