// src/models/mod.rs

//! Domain models for the lecture catalog.
//!
//! Entities mirror the backing files one-to-one; `ScheduleEntry` is the
//! only derived view and is rebuilt on every query.

mod config;
mod instructor;
pub mod lecture;
mod payment;
mod schedule;
mod textbook;
mod user;

// Re-export all public types
pub use config::{Config, DataConfig, LoggingConfig, QueryConfig};
pub use instructor::{Instructor, PROFILE_IMAGE_DIR};
pub use lecture::{Lecture, LectureId, LectureIdList, LectureLayout, TailColumn};
pub use payment::{Payment, PaymentKind};
pub use schedule::{DEFAULT_STATUS, EnrollmentOverride, ScheduleEntry, UNKNOWN_WEEKDAY, weekday_rank};
pub use textbook::{Review, Textbook};
pub use user::UserRecord;
