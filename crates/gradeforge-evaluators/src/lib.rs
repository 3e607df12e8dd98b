//! gradeforge-evaluators — Answer evaluator implementations.
//!
//! Implements the `AnswerEvaluator` trait with an offline length-band
//! heuristic and an OpenAI-compatible API client, plus a configurable
//! factory for choosing between them.

pub mod config;
pub mod heuristic;
pub mod mock;
pub mod openai;

pub use config::{create_evaluator, load_config, EvaluatorConfig, GradeforgeConfig};
pub use gradeforge_core::error::EvaluatorError;
