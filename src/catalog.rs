// src/catalog.rs

//! Store construction and per-user views.
//!
//! A [`Catalog`] is built once at process start and owns every store.
//! Callers identify the acting user with a [`Session`] instead of any
//! process-wide "current user".

use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::models::{
    Config, Instructor, Lecture, LectureId, Payment, Review, ScheduleEntry, Textbook,
};
use crate::services::{
    EnrollOutcome, InstructorDirectory, LectureQueryPipeline, PaymentAggregator, PaymentSummary,
    ScheduleReconciler,
};
use crate::storage::{EntityStore, UserDirectory};

/// The acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// An enrolled lecture with its textbook, if one is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrolledLecture {
    pub lecture: Lecture,
    pub textbook: Option<Textbook>,
}

/// Every store of the catalog, loaded from one data directory.
pub struct Catalog {
    config: Config,
    lectures: EntityStore<Lecture>,
    instructors: EntityStore<Instructor>,
    textbooks: EntityStore<Textbook>,
    reviews: EntityStore<Review>,
    payments: EntityStore<Payment>,
    users: UserDirectory,
    overrides_path: PathBuf,
}

impl Catalog {
    /// Load every store. Missing files give empty stores.
    pub fn open(config: &Config) -> Result<Self> {
        let data = &config.data;
        log::info!("Opening catalog in {}", data.dir.display());

        Ok(Self {
            lectures: EntityStore::load(data.path(&data.lectures))?,
            instructors: EntityStore::load(data.path(&data.instructors))?,
            textbooks: EntityStore::load(data.path(&data.textbooks))?,
            reviews: EntityStore::load(data.path(&data.reviews))?,
            payments: EntityStore::load(data.path(&data.payments))?,
            users: UserDirectory::new(data.path(&data.users)),
            overrides_path: data.path(&data.enrollments),
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn lectures(&self) -> &EntityStore<Lecture> {
        &self.lectures
    }

    pub fn instructors(&self) -> &EntityStore<Instructor> {
        &self.instructors
    }

    pub fn textbooks(&self) -> &EntityStore<Textbook> {
        &self.textbooks
    }

    pub fn reviews(&self) -> &EntityStore<Review> {
        &self.reviews
    }

    pub fn payments(&self) -> &EntityStore<Payment> {
        &self.payments
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn schedule_reconciler(&self) -> ScheduleReconciler<'_> {
        ScheduleReconciler::new(
            &self.lectures,
            &self.users,
            self.lectures.path(),
            &self.overrides_path,
        )
    }

    pub fn lecture_query(&self) -> LectureQueryPipeline<'_> {
        LectureQueryPipeline::new(&self.lectures, &self.users)
    }

    pub fn payment_aggregator(&self) -> PaymentAggregator<'_> {
        PaymentAggregator::new(&self.payments, &self.lectures)
    }

    pub fn instructor_directory(&self) -> InstructorDirectory<'_> {
        InstructorDirectory::new(
            &self.instructors,
            &self.textbooks,
            &self.reviews,
            &self.lectures,
            &self.users,
        )
    }

    /// Start a session if the credentials match.
    pub fn login(&self, user_id: &str, password: &str) -> Result<Option<Session>> {
        let session = self
            .users
            .authenticate(user_id, password)?
            .map(|user| Session::new(user.user_id));
        if session.is_none() {
            log::info!("Login failed for {}", user_id);
        }
        Ok(session)
    }

    pub fn my_schedule(&self, session: &Session) -> Result<Vec<ScheduleEntry>> {
        self.schedule_reconciler().get_my_schedule(session.user_id())
    }

    /// Enrolled lectures in enrollment order. Unknown lecture IDs are skipped.
    pub fn my_lectures(&self, session: &Session) -> Result<Vec<EnrolledLecture>> {
        let directory = self.instructor_directory();
        Ok(self
            .users
            .enrolled_lectures(session.user_id())?
            .into_iter()
            .filter_map(|id| self.lectures.find_by_id(&id))
            .map(|lecture| EnrolledLecture {
                textbook: directory.textbook_for_lecture(lecture.id),
                lecture,
            })
            .collect())
    }

    pub fn my_payments(&self, session: &Session) -> PaymentSummary {
        self.payment_aggregator()
            .summary(session.user_id(), self.config.query.recent_payments)
    }

    /// Enroll the session's user and add them to the instructor's roster.
    ///
    /// The roster update follows a successful enrollment; if it fails the
    /// enrollment still stands and the failure is logged.
    pub fn enroll(&self, session: &Session, lecture_id: LectureId) -> Result<EnrollOutcome> {
        let outcome = self
            .lecture_query()
            .enroll_lecture(session.user_id(), lecture_id)?;

        if let EnrollOutcome::Enrolled { lecture } = &outcome {
            if let Err(e) = self
                .instructor_directory()
                .register_for_lecture(lecture, session.user_id())
            {
                log::warn!(
                    "Enrolled {} in {} but the instructor roster was not updated: {}",
                    session.user_id(),
                    lecture_id,
                    e
                );
            }
        }
        Ok(outcome)
    }
}
