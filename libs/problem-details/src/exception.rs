//! The structured-error capability and debug introspection of error chains.
//!
//! An error that wants to drive the problem details payload (status, title,
//! type, extra members) is expressed as a [`ProblemDetailsException`]. The
//! response factory recognizes it with `downcast_ref`; every other error is
//! treated as generic and never trusted for a status code or message
//! exposure.

use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt::Write as _;
use std::panic::Location;
use thiserror::Error;

/// An error carrying its own problem details.
///
/// Carries the canonical members plus additional extension data, an
/// optional machine code, and the construction site (captured via
/// `#[track_caller]`) for debug payloads.
#[derive(Debug, Error)]
#[error("{detail}")]
pub struct ProblemDetailsException {
    status: StatusCode,
    detail: String,
    title: String,
    type_url: String,
    additional: Map<String, Value>,
    code: i64,
    file: &'static str,
    line: u32,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ProblemDetailsException {
    /// Create a structured problem details error.
    #[track_caller]
    pub fn new(
        status: StatusCode,
        detail: impl Into<String>,
        title: impl Into<String>,
        type_url: impl Into<String>,
    ) -> Self {
        let location = Location::caller();
        Self {
            status,
            detail: detail.into(),
            title: title.into(),
            type_url: type_url.into(),
            additional: Map::new(),
            code: 0,
            file: location.file(),
            line: location.line(),
            source: None,
        }
    }

    /// Attach an additional payload member. Unserializable values are
    /// dropped, mirroring [`crate::Problem::with_extension`].
    #[must_use]
    pub fn with_additional(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Some(value) = crate::sanitize::extension_value(value) {
            self.additional.insert(key.into(), value);
        }
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    #[must_use]
    pub fn additional(&self) -> &Map<String, Value> {
        &self.additional
    }

    #[must_use]
    pub fn code(&self) -> i64 {
        self.code
    }

    #[must_use]
    pub fn file(&self) -> &'static str {
        self.file
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// One rendered error in a cause chain.
#[derive(Debug, Clone, Serialize)]
pub struct ExceptionFrame {
    pub class: String,
    pub code: i64,
    pub message: String,
    pub file: String,
    pub line: u32,
}

/// The `exception` extension member attached to payloads in debug mode.
///
/// `stack` holds the chain of causes, innermost (earliest) first, each
/// rendered with the same five scalar fields; `trace` is the rendered
/// chain of the outermost error.
#[derive(Debug, Clone, Serialize)]
pub struct ExceptionDetail {
    pub class: String,
    pub code: i64,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub trace: String,
    pub stack: Vec<ExceptionFrame>,
}

/// Capability check: does this error carry structured problem details?
#[must_use]
pub fn as_problem_details<'a>(
    error: &'a (dyn StdError + 'static),
) -> Option<&'a ProblemDetailsException> {
    error.downcast_ref::<ProblemDetailsException>()
}

/// Introspect an error and its cause chain for the debug payload.
pub fn extract<E>(error: &E) -> ExceptionDetail
where
    E: StdError + 'static,
{
    let erased: &(dyn StdError + 'static) = error;
    let outer = frame_for(erased, std::any::type_name::<E>());

    let mut stack = Vec::new();
    let mut source = erased.source();
    while let Some(cause) = source {
        stack.push(frame_for(cause, ""));
        source = cause.source();
    }
    // innermost (earliest) cause comes first
    stack.reverse();

    ExceptionDetail {
        class: outer.class,
        code: outer.code,
        message: outer.message,
        file: outer.file,
        line: outer.line,
        trace: render_chain(erased),
        stack,
    }
}

/// Render a single chain entry. Structured errors contribute their real
/// location and code; the type of a generic cause is not recoverable at
/// the `dyn` level, so its class stays empty.
fn frame_for(error: &(dyn StdError + 'static), class_hint: &str) -> ExceptionFrame {
    match as_problem_details(error) {
        Some(structured) => ExceptionFrame {
            class: std::any::type_name::<ProblemDetailsException>().to_owned(),
            code: structured.code(),
            message: structured.detail().to_owned(),
            file: structured.file().to_owned(),
            line: structured.line(),
        },
        None => ExceptionFrame {
            class: class_hint.to_owned(),
            code: 0,
            message: error.to_string(),
            file: String::new(),
            line: 0,
        },
    }
}

/// Render the full cause chain of an error as text.
fn render_chain(error: &dyn StdError) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    if source.is_some() {
        rendered.push_str("\n\nCaused by:");
    }
    while let Some(cause) = source {
        let _ = write!(rendered, "\n    {cause}");
        source = cause.source();
    }
    rendered
}
