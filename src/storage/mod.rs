//! Storage layer for the flat-file backed entities.
//!
//! ## Backing files
//!
//! ```text
//! {data_dir}/
//! ├── instructors.txt    # id/name/academyId/.../rating/profileImage   (rewritten on mutation)
//! ├── textbooks.txt      # id/name/price/subject/lectureId/instructorName
//! ├── reviews.txt        # instructorId/lectureId/id/userId/rating/content
//! ├── lectures.txt       # lecture master, optional trailing image column
//! ├── payments.txt       # paymentId/userId/lectureId/amount/... (append-only)
//! ├── users.txt          # read fresh on every query
//! └── enrollments.txt    # per-enrollment schedule overrides
//! ```
//!
//! Entity files are loaded once into an [`EntityStore`]; the user file is
//! read through [`UserDirectory`] every time because it is the system of
//! record for enrollment membership.

pub mod local;
pub mod record;
mod store;
mod users;

use std::fmt;
use std::hash::Hash;

use crate::error::Result;
use record::RecordFormat;

// Re-export for convenience
pub use store::{EntityStore, LoadSummary};
pub use users::UserDirectory;

/// An entity that can be parsed from one line of a backing file.
pub trait Record: Clone + Send + Sync {
    /// Primary key
    type Id: Clone + Eq + Hash + fmt::Display + Send + Sync;

    /// Line format of the backing file
    const FORMAT: RecordFormat;

    fn id(&self) -> Self::Id;

    /// Build the entity from the trimmed fields of one line.
    ///
    /// Called only with at least `FORMAT.min_fields` fields.
    fn from_fields(fields: &[String]) -> Result<Self>;

    /// Display name matched by [`EntityStore::find_by_name`].
    fn name(&self) -> Option<&str> {
        None
    }

    /// Secondary key indexed by [`EntityStore::find_by_foreign_key`].
    fn foreign_key(&self) -> Option<String> {
        None
    }
}

/// A record that can be written back to its backing file.
pub trait WritableRecord: Record {
    /// Fields in file order, before joining with the delimiter.
    fn to_fields(&self) -> Vec<String>;

    fn to_line(&self) -> String {
        Self::FORMAT.join(&self.to_fields())
    }
}
