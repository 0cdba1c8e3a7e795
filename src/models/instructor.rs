//! Instructor data structure.

use serde::Serialize;

use crate::error::Result;
use crate::models::{LectureId, LectureIdList};
use crate::storage::record::{RecordFormat, join_list, optional, parse_number_or_default, split_list};
use crate::storage::{Record, WritableRecord};

/// Directory prefixed to the bare profile image filename stored on disk.
pub const PROFILE_IMAGE_DIR: &str = "images/instructors/";

/// An instructor and their roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instructor {
    pub id: String,
    pub name: String,
    pub academy_id: String,
    pub introduction: String,
    pub subject: String,

    /// Textbook IDs as stored; only the first one is meaningful
    pub textbook_ids: Vec<String>,

    pub lecture_ids: LectureIdList,

    /// Enrolled students, no duplicates
    pub student_ids: Vec<String>,

    pub rating: f64,

    /// Rating as stored, written back while `rating` still matches it
    #[serde(skip)]
    pub rating_text: String,

    /// Profile image path including [`PROFILE_IMAGE_DIR`]
    pub profile_image: Option<String>,
}

impl Instructor {
    /// The instructor's textbook, if one is recorded.
    pub fn textbook_id(&self) -> Option<&str> {
        self.textbook_ids.first().map(String::as_str)
    }

    pub fn teaches(&self, lecture_id: LectureId) -> bool {
        self.lecture_ids.contains(lecture_id)
    }

    pub fn has_student(&self, student_id: &str) -> bool {
        self.student_ids.iter().any(|id| id == student_id)
    }

    /// Append a student unless already present. Returns whether it was added.
    pub fn add_student(&mut self, student_id: &str) -> bool {
        let student_id = student_id.trim();
        if student_id.is_empty() || self.has_student(student_id) {
            return false;
        }
        self.student_ids.push(student_id.to_string());
        true
    }

    fn rating_field(&self) -> String {
        let unchanged = match self.rating_text.trim() {
            "" => self.rating == 0.0,
            text => text.parse::<f64>().is_ok_and(|rating| rating == self.rating),
        };
        if unchanged {
            self.rating_text.clone()
        } else {
            format!("{:.1}", self.rating)
        }
    }
}

/// Stored filename → path used by the rest of the application.
fn image_path(filename: &str) -> Option<String> {
    optional(filename).map(|name| format!("{PROFILE_IMAGE_DIR}{name}"))
}

/// Path → bare filename as stored on disk.
fn image_filename(path: &str) -> &str {
    let name = path.strip_prefix(PROFILE_IMAGE_DIR).unwrap_or(path);
    name.rsplit('/').next().unwrap_or(name)
}

impl Record for Instructor {
    type Id = String;

    const FORMAT: RecordFormat = RecordFormat::new("instructor", b'/', "id", 9);

    fn id(&self) -> String {
        self.id.clone()
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        let format = Self::FORMAT.name;
        Ok(Self {
            id: fields[0].clone(),
            name: fields[1].clone(),
            academy_id: fields[2].clone(),
            introduction: fields[3].clone(),
            subject: fields[4].clone(),
            textbook_ids: split_list(&fields[5]),
            lecture_ids: LectureIdList::parse(format, &fields[6]),
            student_ids: split_list(&fields[7]),
            rating: parse_number_or_default(format, "rating", &fields[8])?,
            rating_text: fields[8].clone(),
            profile_image: fields.get(9).and_then(|name| image_path(name)),
        })
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn foreign_key(&self) -> Option<String> {
        Some(self.academy_id.clone())
    }
}

impl WritableRecord for Instructor {
    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.academy_id.clone(),
            self.introduction.clone(),
            self.subject.clone(),
            join_list(&self.textbook_ids),
            self.lecture_ids.to_field(),
            join_list(&self.student_ids),
            self.rating_field(),
            self.profile_image
                .as_deref()
                .map(image_filename)
                .unwrap_or_default()
                .to_string(),
        ]
    }
}
