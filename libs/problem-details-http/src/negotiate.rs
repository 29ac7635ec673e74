//! `Accept`-header negotiation between the two problem representations.
//!
//! The header splits on commas; each candidate is stripped of parameters,
//! trimmed and lowercased, then checked against the acceptance table in
//! header order. The first candidate matching either family decides.
//!
//! Two call-site policies sit on top:
//! - the response factory always produces a representation and defaults to
//!   JSON when nothing matches ([`Representation::negotiate_or_default`]);
//! - the not-found handler declines and delegates instead
//!   ([`Representation::negotiate`] returning `None`).

use problem_details::{APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML};

/// The negotiated response representation, derived once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Json,
    Xml,
}

impl Representation {
    /// Negotiate a representation, or `None` if no candidate matches.
    #[must_use]
    pub fn negotiate(accept: &str) -> Option<Self> {
        accept.split(',').find_map(|candidate| {
            let media = candidate.split(';').next().unwrap_or_default();
            Self::match_media_type(&media.trim().to_ascii_lowercase())
        })
    }

    /// Negotiate a representation, defaulting to JSON when the header is
    /// empty, unparseable or matches neither family.
    #[must_use]
    pub fn negotiate_or_default(accept: &str) -> Self {
        Self::negotiate(accept).unwrap_or(Self::Json)
    }

    /// Exact or `+suffix` match against the acceptance table, including
    /// vendor subtypes such as `application/vnd.api+json`.
    fn match_media_type(media: &str) -> Option<Self> {
        let (main, subtype) = media.split_once('/')?;
        if main != "application" {
            return None;
        }
        if subtype == "json" || subtype.ends_with("+json") {
            Some(Self::Json)
        } else if subtype == "xml" || subtype.ends_with("+xml") {
            Some(Self::Xml)
        } else {
            None
        }
    }

    /// The canonical media type written to `Content-Type`.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => APPLICATION_PROBLEM_JSON,
            Self::Xml => APPLICATION_PROBLEM_XML,
        }
    }
}
