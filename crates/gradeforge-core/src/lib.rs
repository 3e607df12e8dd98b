//! gradeforge-core — Grading engine, analytics, and collaborator traits.
//!
//! This crate defines the fundamental data model, traits, and grading logic
//! that the entire gradeforge system builds on.

pub mod analytics;
pub mod error;
pub mod grader;
pub mod insights;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod processor;
pub mod report;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_util;
