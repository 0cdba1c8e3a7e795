// src/services/instructors.rs

//! Instructor profiles and rosters.

use serde::Serialize;

use crate::error::Result;
use crate::models::{Instructor, Lecture, LectureId, Review, Textbook, UserRecord};
use crate::storage::{EntityStore, UserDirectory};

/// An instructor with the entities it refers to resolved.
///
/// References that do not resolve are left out rather than reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructorProfile {
    pub instructor: Instructor,
    pub textbook: Option<Textbook>,
    pub lectures: Vec<Lecture>,
    pub reviews: Vec<Review>,
    pub average_review_rating: Option<f64>,
}

pub struct InstructorDirectory<'a> {
    instructors: &'a EntityStore<Instructor>,
    textbooks: &'a EntityStore<Textbook>,
    reviews: &'a EntityStore<Review>,
    lectures: &'a EntityStore<Lecture>,
    users: &'a UserDirectory,
}

impl<'a> InstructorDirectory<'a> {
    pub fn new(
        instructors: &'a EntityStore<Instructor>,
        textbooks: &'a EntityStore<Textbook>,
        reviews: &'a EntityStore<Review>,
        lectures: &'a EntityStore<Lecture>,
        users: &'a UserDirectory,
    ) -> Self {
        Self {
            instructors,
            textbooks,
            reviews,
            lectures,
            users,
        }
    }

    pub fn profile(&self, instructor_id: &str) -> Option<InstructorProfile> {
        let instructor = self.instructors.find_by_id(&instructor_id.to_string())?;

        let textbook = instructor
            .textbook_id()
            .and_then(|id| self.textbooks.find_by_id(&id.to_string()));
        let lectures = instructor
            .lecture_ids
            .ids()
            .iter()
            .filter_map(|id| self.lectures.find_by_id(id))
            .collect();
        let reviews = self.reviews.find_by_foreign_key(&instructor.id);
        let average_review_rating = average_rating(&reviews);

        Some(InstructorProfile {
            instructor,
            textbook,
            lectures,
            reviews,
            average_review_rating,
        })
    }

    /// Instructors whose name contains `name`, ignoring case.
    pub fn search(&self, name: &str) -> Vec<Instructor> {
        self.instructors.find_by_name(name)
    }

    pub fn by_academy(&self, academy_id: &str) -> Vec<Instructor> {
        self.instructors.find_by_foreign_key(academy_id.trim())
    }

    /// The instructor teaching a lecture: the one listing its ID, or
    /// failing that the one with the lecture's instructor name.
    pub fn instructor_of(&self, lecture: &Lecture) -> Option<Instructor> {
        let mut listed = self.instructors.find_where(|i| i.teaches(lecture.id));
        if !listed.is_empty() {
            return Some(listed.swap_remove(0));
        }
        self.instructors
            .find_where(|i| i.name == lecture.instructor)
            .into_iter()
            .next()
    }

    /// Add a student to an instructor's roster and persist the roster file.
    ///
    /// Returns `None` for an unknown instructor and `Some(false)` when the
    /// student was already listed; the file is only rewritten on change.
    pub fn register_student(&self, instructor_id: &str, student_id: &str) -> Result<Option<bool>> {
        let added = self
            .instructors
            .mutate(&instructor_id.to_string(), |instructor| {
                instructor.add_student(student_id)
            })?;
        if added == Some(true) {
            log::info!("Registered student {} with instructor {}", student_id, instructor_id);
        }
        Ok(added)
    }

    /// Register a student with whoever teaches `lecture`.
    pub fn register_for_lecture(&self, lecture: &Lecture, student_id: &str) -> Result<Option<bool>> {
        match self.instructor_of(lecture) {
            Some(instructor) => self.register_student(&instructor.id, student_id),
            None => {
                log::debug!("No instructor found for lecture {}", lecture.id);
                Ok(None)
            }
        }
    }

    /// Students on an instructor's roster, `None` for an unknown instructor.
    pub fn roster(&self, instructor_id: &str) -> Result<Option<Vec<UserRecord>>> {
        let Some(instructor) = self.instructors.find_by_id(&instructor_id.to_string()) else {
            return Ok(None);
        };
        self.users.find_many(&instructor.student_ids).map(Some)
    }

    pub fn reviews_for_lecture(&self, lecture_id: LectureId) -> Vec<Review> {
        self.reviews.find_where(|review| review.lecture_id == lecture_id)
    }

    /// The textbook for a lecture; the last one recorded wins.
    pub fn textbook_for_lecture(&self, lecture_id: LectureId) -> Option<Textbook> {
        self.textbooks
            .find_by_foreign_key(&lecture_id.to_string())
            .pop()
    }
}

fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    Some(reviews.iter().map(|r| r.rating).sum::<f64>() / reviews.len() as f64)
}
