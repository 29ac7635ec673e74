//! The problem details response factory.
//!
//! Orchestrates negotiation, payload assembly and rendering, then writes
//! the result onto a base response obtained from an injected
//! response-construction capability. All per-call state is local, so one
//! configured factory serves concurrent requests.

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderValue, Request, Response, StatusCode};
use problem_details::exception::{self, ExceptionDetail};
use problem_details::{Problem, problem};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

use crate::negotiate::Representation;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The injected response-construction capability: returns a fresh base
/// response the factory may set a status and headers on and write a body
/// into. Its failure is the only error class that propagates to callers.
pub type ResponseFactoryFn = Arc<dyn Fn() -> Result<Response<Bytes>, BoxError> + Send + Sync>;

/// Redaction hook applied to the extracted error detail before it is
/// attached as the `exception` extension.
pub type ExceptionFilter = Arc<dyn Fn(ExceptionDetail) -> ExceptionDetail + Send + Sync>;

/// Detail message substituted for error messages that are not safe to
/// expose.
pub const DEFAULT_DETAIL_MESSAGE: &str = "An unexpected error occurred";

/// Factory error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProblemResponseError {
    /// The injected response-construction capability failed
    #[error("failed to construct base response: {0}")]
    ResponseConstruction(#[source] BoxError),
}

/// Creates content-negotiated problem details responses.
///
/// Configured once at construction; payload assembly never fails, and the
/// error message of a generic error is masked unless explicitly exposed.
#[derive(Clone)]
pub struct ProblemDetailsResponseFactory {
    response_factory: ResponseFactoryFn,
    include_error_details: bool,
    exception_filter: Option<ExceptionFilter>,
    expose_message: bool,
    default_detail_message: String,
    types_map: HashMap<u16, String>,
    pretty_json: bool,
}

impl ProblemDetailsResponseFactory {
    pub fn new(response_factory: ResponseFactoryFn) -> Self {
        Self {
            response_factory,
            include_error_details: false,
            exception_filter: None,
            expose_message: false,
            default_detail_message: DEFAULT_DETAIL_MESSAGE.to_owned(),
            types_map: HashMap::new(),
            pretty_json: false,
        }
    }

    /// Attach the `exception` extension (class, code, message, file, line,
    /// trace and cause stack) to payloads built from errors.
    #[must_use]
    pub fn with_error_details(mut self) -> Self {
        self.include_error_details = true;
        self
    }

    #[must_use]
    pub fn with_exception_filter(mut self, filter: ExceptionFilter) -> Self {
        self.exception_filter = Some(filter);
        self
    }

    /// Expose the message of generic errors as the `detail` member instead
    /// of masking it with the default detail message.
    #[must_use]
    pub fn with_exposed_message(mut self) -> Self {
        self.expose_message = true;
        self
    }

    #[must_use]
    pub fn with_default_detail_message(mut self, message: impl Into<String>) -> Self {
        self.default_detail_message = message.into();
        self
    }

    /// Map status codes to canonical problem `type` URIs, consulted before
    /// the `https://httpstatus.es/{status}` fallback.
    #[must_use]
    pub fn with_types_map(mut self, types_map: HashMap<u16, String>) -> Self {
        self.types_map = types_map;
        self
    }

    #[must_use]
    pub fn with_pretty_json(mut self) -> Self {
        self.pretty_json = true;
        self
    }

    /// Create a problem details response from explicit members.
    ///
    /// `title` and `type` default from the status code (reason phrase and
    /// TypesMap/URI-template respectively).
    ///
    /// # Errors
    /// Fails only if the injected response-construction capability fails.
    pub fn create_response<B>(
        &self,
        request: &Request<B>,
        status: u16,
        detail: impl Into<String>,
    ) -> Result<Response<Bytes>, ProblemResponseError> {
        self.create_response_with(request, status, detail, None, None, Map::new())
    }

    /// [`Self::create_response`] with explicit title, type and additional
    /// extension members.
    ///
    /// # Errors
    /// Fails only if the injected response-construction capability fails.
    pub fn create_response_with<B>(
        &self,
        request: &Request<B>,
        status: u16,
        detail: impl Into<String>,
        title: Option<&str>,
        type_url: Option<&str>,
        additional: Map<String, Value>,
    ) -> Result<Response<Bytes>, ProblemResponseError> {
        let representation = negotiate(request);
        let status = normalize_status(status);
        let title =
            title.map_or_else(|| problem::default_title(status).to_owned(), ToOwned::to_owned);
        let type_url = type_url.map_or_else(|| self.type_for(status), ToOwned::to_owned);
        let payload = Problem::new(status, title, detail.into())
            .with_type(type_url)
            .with_extensions(additional);
        self.finalize(representation, &payload)
    }

    /// Create a problem details response from an error.
    ///
    /// A [`problem_details::ProblemDetailsException`] drives status, title,
    /// type, detail and additional members; any other error is served as a
    /// 500 with its message masked unless message exposure is enabled. A
    /// status-like code carried by a generic error is never trusted.
    ///
    /// # Errors
    /// Fails only if the injected response-construction capability fails.
    pub fn create_response_from_error<B, E>(
        &self,
        request: &Request<B>,
        error: &E,
    ) -> Result<Response<Bytes>, ProblemResponseError>
    where
        E: StdError + 'static,
    {
        let representation = negotiate(request);
        let erased: &(dyn StdError + 'static) = error;

        let mut payload = match exception::as_problem_details(erased) {
            Some(structured) => {
                let status = structured.status();
                let title = if structured.title().is_empty() {
                    problem::default_title(status).to_owned()
                } else {
                    structured.title().to_owned()
                };
                let type_url = if structured.type_url().is_empty() {
                    self.type_for(status)
                } else {
                    structured.type_url().to_owned()
                };
                Problem::new(status, title, structured.detail())
                    .with_type(type_url)
                    .with_extensions(structured.additional().clone())
            }
            None => {
                tracing::error!(error = %error, "serving unhandled error as problem details");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let detail = if self.expose_message {
                    error.to_string()
                } else {
                    self.default_detail_message.clone()
                };
                Problem::new(status, problem::default_title(status), detail)
                    .with_type(self.type_for(status))
            }
        };

        if self.include_error_details {
            let mut detail = exception::extract(error);
            if let Some(filter) = &self.exception_filter {
                detail = filter(detail);
            }
            payload = payload.with_extension("exception", detail);
        }

        self.finalize(representation, &payload)
    }

    fn type_for(&self, status: StatusCode) -> String {
        self.types_map
            .get(&status.as_u16())
            .cloned()
            .unwrap_or_else(|| problem::type_uri_for(status.as_u16()))
    }

    /// Obtain the base response, set status and `Content-Type`, and write
    /// the rendered body in a single assignment.
    fn finalize(
        &self,
        representation: Representation,
        payload: &Problem,
    ) -> Result<Response<Bytes>, ProblemResponseError> {
        let mut response =
            (self.response_factory)().map_err(ProblemResponseError::ResponseConstruction)?;
        *response.status_mut() = payload.status;
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static(representation.content_type()),
        );
        let body = match representation {
            Representation::Json => payload.to_json(self.pretty_json),
            Representation::Xml => problem_details::xml::render(payload),
        };
        *response.body_mut() = Bytes::from(body);
        Ok(response)
    }
}

fn negotiate<B>(request: &Request<B>) -> Representation {
    let accept = request
        .headers()
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    Representation::negotiate_or_default(accept)
}

/// Collapse anything outside the valid 100–599 range to 500.
fn normalize_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|code| code.as_u16() <= 599)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
