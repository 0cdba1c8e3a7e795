// src/lib.rs

//! Lecture catalog core: flat-file records, schedule reconciliation,
//! lecture search, enrollment and payment history.

pub mod catalog;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod fixtures;

pub use catalog::{Catalog, EnrolledLecture, Session};
