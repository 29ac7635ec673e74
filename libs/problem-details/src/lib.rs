//! RFC 7807 Problem Details data model
//!
//! This crate provides the pure data types for problem details error
//! payloads, with no dependencies on HTTP frameworks. It includes:
//! - the problem payload itself (`Problem`)
//! - the structured-error capability (`ProblemDetailsException`)
//! - debug introspection of error chains (`ExceptionDetail`)
//! - JSON and XML rendering of payloads
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod exception;
pub mod problem;
pub mod sanitize;
pub mod xml;

// Re-export commonly used types
pub use exception::{ExceptionDetail, ExceptionFrame, ProblemDetailsException};
pub use problem::{APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, Problem};
