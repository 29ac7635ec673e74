//! Content-negotiated RFC 7807 problem details responses
//!
//! This crate turns application errors into problem details HTTP
//! responses:
//! - `Accept`-header negotiation between JSON and XML representations
//! - a response factory that assembles, renders and writes the payload
//! - a not-found handler, as a plain `process(request, next)` step and as
//!   a tower `Layer`/`Service`
//!
//! The payload model itself lives in the `problem-details` crate.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod factory;
pub mod negotiate;
pub mod not_found;

pub use factory::{ProblemDetailsResponseFactory, ProblemResponseError, ResponseFactoryFn};
pub use negotiate::Representation;
pub use not_found::{NotFoundLayer, NotFoundService, ProblemDetailsNotFoundHandler, RequestHandler};

// Re-export the payload model for convenience
pub use problem_details::{
    APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, Problem, ProblemDetailsException,
};
