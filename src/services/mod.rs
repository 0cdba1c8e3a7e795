//! Service layer for the lecture catalog.
//!
//! Services borrow the stores owned by [`Catalog`](crate::catalog::Catalog)
//! and hold no state of their own:
//! - Schedule reconciliation (`ScheduleReconciler`)
//! - Lecture search and enrollment (`LectureQueryPipeline`)
//! - Payment history and totals (`PaymentAggregator`)
//! - Instructor profiles and rosters (`InstructorDirectory`)

mod instructors;
mod lectures;
mod payments;
mod schedule;

pub use instructors::{InstructorDirectory, InstructorProfile};
pub use lectures::{ALL, EnrollOutcome, GradeBucket, LectureQuery, LectureQueryPipeline, SortKey};
pub use payments::{MonthlyTotal, PaymentAggregator, PaymentLine, PaymentSummary, UNKNOWN_MONTH};
pub use schedule::{MasterRow, ScheduleReconciler, reconcile_entry};
