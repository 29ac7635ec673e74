//! Not-found handling on top of the response factory.
//!
//! Negotiation runs in decline mode here: if the client accepts neither
//! problem representation, the request is delegated untouched to the next
//! handler and its response is returned verbatim. Otherwise a 404 problem
//! details response is built with a `"Cannot {METHOD} {URI}!"` detail.
//!
//! Available as a plain `process(request, next)` step and as a tower
//! `Layer`/`Service` pair terminating a middleware stack.

use bytes::Bytes;
use futures_util::future::{Either, Ready, ready};
use http::header::ACCEPT;
use http::{Request, Response, StatusCode};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::factory::{ProblemDetailsResponseFactory, ProblemResponseError};
use crate::negotiate::Representation;

/// The delegation target when the client accepts neither representation.
pub trait RequestHandler<B> {
    fn handle(&self, request: &Request<B>) -> Response<Bytes>;
}

/// Stateless across requests; every call either delegates or builds a
/// fresh 404 via the factory.
#[derive(Clone)]
pub struct ProblemDetailsNotFoundHandler {
    factory: Arc<ProblemDetailsResponseFactory>,
}

impl ProblemDetailsNotFoundHandler {
    pub fn new(factory: Arc<ProblemDetailsResponseFactory>) -> Self {
        Self { factory }
    }

    /// Serve a 404 problem details response, or delegate to `next` when
    /// the `Accept` header matches neither representation.
    ///
    /// # Errors
    /// Fails only if the factory's response-construction capability fails.
    pub fn process<B>(
        &self,
        request: &Request<B>,
        next: &dyn RequestHandler<B>,
    ) -> Result<Response<Bytes>, ProblemResponseError> {
        if Representation::negotiate(accept_header(request)).is_none() {
            return Ok(next.handle(request));
        }
        self.factory
            .create_response(request, 404, not_found_detail(request))
    }
}

fn accept_header<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn not_found_detail<B>(request: &Request<B>) -> String {
    format!("Cannot {} {}!", request.method(), request.uri())
}

/// Tower layer form of [`ProblemDetailsNotFoundHandler`]: wraps the
/// service that plays the "next handler" role.
#[derive(Clone)]
pub struct NotFoundLayer {
    factory: Arc<ProblemDetailsResponseFactory>,
}

impl NotFoundLayer {
    pub fn new(factory: Arc<ProblemDetailsResponseFactory>) -> Self {
        Self { factory }
    }
}

impl<S> Layer<S> for NotFoundLayer {
    type Service = NotFoundService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        NotFoundService {
            inner,
            factory: Arc::clone(&self.factory),
        }
    }
}

/// Service that answers 404 problem details for acceptable requests and
/// forwards the rest to the inner service untouched.
#[derive(Clone)]
pub struct NotFoundService<S> {
    inner: S,
    factory: Arc<ProblemDetailsResponseFactory>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for NotFoundService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: From<Bytes>,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response<ResBody>, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        if Representation::negotiate(accept_header(&request)).is_none() {
            return Either::Right(self.inner.call(request));
        }
        let detail = not_found_detail(&request);
        let response = match self.factory.create_response(&request, 404, detail) {
            Ok(response) => response.map(ResBody::from),
            Err(error) => {
                // capability failure has no problem body to offer; serve a bare 404
                tracing::error!(error = %error, "problem details construction failed");
                let mut response = Response::new(ResBody::from(Bytes::new()));
                *response.status_mut() = StatusCode::NOT_FOUND;
                response
            }
        };
        Either::Left(ready(Ok(response)))
    }
}
