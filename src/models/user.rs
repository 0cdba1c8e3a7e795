//! User record data structure.

use serde::Serialize;

use crate::error::Result;
use crate::models::{LectureId, LectureIdList};
use crate::storage::record::{RecordFormat, join_list, split_list};
use crate::storage::{Record, WritableRecord};

/// A student account with its enrollment membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub user_id: String,

    #[serde(skip_serializing)]
    pub password: String,

    pub name: String,
    pub birth_date: String,

    /// Grade label, e.g. "고3"
    pub grade: String,

    pub lecture_ids: LectureIdList,
    pub payment_ids: Vec<String>,
}

impl UserRecord {
    pub fn is_enrolled(&self, lecture_id: LectureId) -> bool {
        self.lecture_ids.contains(lecture_id)
    }

    /// Record an enrollment. Returns false when already present.
    pub fn add_lecture(&mut self, lecture_id: LectureId) -> bool {
        self.lecture_ids.push(lecture_id)
    }
}

impl Record for UserRecord {
    type Id = String;

    const FORMAT: RecordFormat = RecordFormat::new("user", b'/', "userId", 5);

    fn id(&self) -> String {
        self.user_id.clone()
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        let list = |idx: usize| fields.get(idx).map(|raw| split_list(raw)).unwrap_or_default();
        Ok(Self {
            user_id: fields[0].clone(),
            password: fields[1].clone(),
            name: fields[2].clone(),
            birth_date: fields[3].clone(),
            grade: fields[4].clone(),
            lecture_ids: fields
                .get(5)
                .map(|raw| LectureIdList::parse(Self::FORMAT.name, raw))
                .unwrap_or_default(),
            payment_ids: list(6),
        })
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl WritableRecord for UserRecord {
    fn to_fields(&self) -> Vec<String> {
        vec![
            self.user_id.clone(),
            self.password.clone(),
            self.name.clone(),
            self.birth_date.clone(),
            self.grade.clone(),
            self.lecture_ids.to_field(),
            join_list(&self.payment_ids),
        ]
    }
}
