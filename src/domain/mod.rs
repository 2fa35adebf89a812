//! Core domain models for nuup
//!
//! This module contains the fundamental types used throughout the application:
//! - Reference kinds for supported declaration file formats
//! - File references and their classified form
//! - The update request handed over by the resolution stage
//! - Per-reference execution results and their aggregate

mod execution_result;
mod file_reference;
mod reference_kind;
mod request;
mod summary;

pub use execution_result::{ExecutionResult, FailureKind, CLASSIFY_STEP};
pub use file_reference::{normalize_path, ClassifiedReference, FileReference};
pub use reference_kind::ReferenceKind;
pub use request::UpdateRequest;
pub use summary::AggregatedResult;
