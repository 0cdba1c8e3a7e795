//! User file access.
//!
//! The user file is the system of record for enrollment membership, so it
//! is read on every call instead of being cached.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;
use crate::models::{LectureId, UserRecord};
use crate::storage::local::{read_optional, render_lines, write_atomic};
use crate::storage::{Record, WritableRecord};

/// Fresh-read view over the user file.
pub struct UserDirectory {
    path: PathBuf,
    // serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

struct Snapshot {
    content: String,
    /// Winning record per user ID with the 1-based line it came from
    users: Vec<(usize, UserRecord)>,
}

impl Snapshot {
    fn into_users(self) -> Vec<UserRecord> {
        self.users.into_iter().map(|(_, user)| user).collect()
    }
}

impl UserDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every well-formed user; later duplicate IDs win.
    pub fn find_all(&self) -> Result<Vec<UserRecord>> {
        Ok(self.snapshot()?.into_users())
    }

    pub fn find(&self, user_id: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .snapshot()?
            .into_users()
            .into_iter()
            .find(|user| user.user_id == user_id))
    }

    /// Users for the given IDs, in the order asked. Unknown IDs are skipped.
    pub fn find_many(&self, user_ids: &[String]) -> Result<Vec<UserRecord>> {
        let users = self.snapshot()?.into_users();
        Ok(user_ids
            .iter()
            .filter_map(|id| users.iter().find(|user| &user.user_id == id).cloned())
            .collect())
    }

    /// Look a user up by ID and password.
    pub fn authenticate(&self, user_id: &str, password: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .find(user_id)?
            .filter(|user| user.password == password))
    }

    /// Lecture IDs the user is enrolled in; empty for unknown users.
    pub fn enrolled_lectures(&self, user_id: &str) -> Result<Vec<LectureId>> {
        Ok(self
            .find(user_id)?
            .map(|user| user.lecture_ids.ids().to_vec())
            .unwrap_or_default())
    }

    /// Append a lecture to a user's membership and rewrite the file.
    ///
    /// Only the user's own line changes; the header, other rows and any
    /// unparseable lines are written back verbatim. Returns `None` for an
    /// unknown user and `Some(false)` when the user already had the lecture
    /// (the file is left untouched).
    pub fn add_lecture(&self, user_id: &str, lecture_id: LectureId) -> Result<Option<bool>> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let snapshot = self.snapshot()?;
        let Some((target, mut user)) = snapshot
            .users
            .into_iter()
            .find(|(_, user)| user.user_id == user_id)
        else {
            return Ok(None);
        };
        if !user.add_lecture(lecture_id) {
            return Ok(Some(false));
        }

        let updated = user.to_line();
        let content = render_lines(
            None,
            snapshot.content.lines().enumerate().map(|(idx, line)| {
                if idx + 1 == target {
                    updated.clone()
                } else {
                    line.to_string()
                }
            }),
        );
        write_atomic(&self.path, &content)?;
        log::debug!("Added {} to user {} in {}", lecture_id, user_id, self.path.display());
        Ok(Some(true))
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let format = UserRecord::FORMAT;
        let Some(content) = read_optional(&self.path)? else {
            log::warn!("No user file found at {}", self.path.display());
            return Ok(Snapshot {
                content: String::new(),
                users: Vec::new(),
            });
        };

        let mut users: Vec<(usize, UserRecord)> = Vec::new();
        for (line_no, fields) in format.records(&content) {
            match fields.and_then(|fields| UserRecord::from_fields(&fields)) {
                Ok(user) => match users.iter_mut().find(|(_, u)| u.user_id == user.user_id) {
                    Some(existing) => *existing = (line_no, user),
                    None => users.push((line_no, user)),
                },
                Err(e) if e.is_line_local() => {
                    log::warn!("{}:{}: skipping line: {}", self.path.display(), line_no, e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Snapshot { content, users })
    }
}
