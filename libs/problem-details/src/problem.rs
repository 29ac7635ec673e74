//! RFC 7807 Problem Details payload (pure data model, no HTTP framework dependencies)

use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Content type for Problem Details rendered as JSON.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Content type for Problem Details rendered as XML.
pub const APPLICATION_PROBLEM_XML: &str = "application/problem+xml";

/// Fallback type URI template, formatted with the status code.
pub const TYPE_URI_TEMPLATE: &str = "https://httpstatus.es/";

/// Canonical payload members that extension data may never clobber.
const RESERVED_KEYS: [&str; 4] = ["type", "title", "status", "detail"];

/// Custom serializer for `StatusCode` to u16
#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// Custom deserializer for `StatusCode` from u16
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    StatusCode::from_u16(code).map_err(serde::de::Error::custom)
}

/// RFC 7807 Problem Details payload.
///
/// The four canonical members come first, followed by an open set of
/// extension members (flattened on serialization, insertion order kept).
/// A payload is constructed fresh per request and treated as immutable
/// once rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[must_use]
pub struct Problem {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence of the problem.
    /// Serializes as u16 for RFC 7807 compatibility.
    #[serde(
        serialize_with = "serialize_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub status: StatusCode,
    /// A human-readable explanation specific to this occurrence of the problem.
    pub detail: String,
    /// Extension members. Entries named after a canonical member are
    /// silently discarded at insertion time.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Problem {
    /// Create a new Problem with the given status, title, and detail.
    ///
    /// Statuses outside the valid 100–599 range collapse to 500; the
    /// payload invariant is that `status` is always a real HTTP status.
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        let status = if status.as_u16() > 599 {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            status
        };
        Self {
            type_url: type_uri_for(status.as_u16()),
            title: title.into(),
            status,
            detail: detail.into(),
            extensions: Map::new(),
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    /// Attach a single extension member.
    ///
    /// Entries whose value cannot be serialized are dropped entirely, as
    /// are entries that would clobber a canonical member.
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.insert_extension(key.into(), crate::sanitize::extension_value(value));
        self
    }

    /// Merge a set of extension members, applying the same guards as
    /// [`Problem::with_extension`] to each entry.
    pub fn with_extensions(mut self, entries: Map<String, Value>) -> Self {
        for (key, value) in entries {
            self.insert_extension(key, Some(value));
        }
        self
    }

    fn insert_extension(&mut self, key: String, value: Option<Value>) {
        if RESERVED_KEYS.contains(&key.as_str()) {
            return;
        }
        if let Some(value) = value {
            self.extensions.insert(key, value);
        }
    }

    /// Render the payload as JSON.
    ///
    /// Rendering is total: extension data was sanitized at insertion, so a
    /// serializer failure cannot occur for well-formed payloads, and any
    /// residual failure falls back to a minimal literal body.
    #[must_use]
    pub fn to_json(&self, pretty: bool) -> String {
        let rendered = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        rendered.unwrap_or_else(|_| {
            format!(
                r#"{{"type":"{}","title":"Internal Server Error","status":500,"detail":"An unexpected error occurred"}}"#,
                type_uri_for(500)
            )
        })
    }

    /// The payload as an ordered map, canonical members first.
    ///
    /// This is the input shape for the XML renderer.
    #[must_use]
    pub fn as_value_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("type".to_owned(), Value::String(self.type_url.clone()));
        map.insert("title".to_owned(), Value::String(self.title.clone()));
        map.insert("status".to_owned(), Value::from(self.status.as_u16()));
        map.insert("detail".to_owned(), Value::String(self.detail.clone()));
        for (key, value) in &self.extensions {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

/// The standard reason phrase for a status code, used as the default
/// `title` member.
#[must_use]
pub fn default_title(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

/// The fallback `type` URI for a status code.
#[must_use]
pub fn type_uri_for(status: u16) -> String {
    format!("{TYPE_URI_TEMPLATE}{status}")
}

/// Axum integration: make Problem directly usable as a response
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Problem {
    fn into_response(self) -> axum::response::Response {
        use axum::http::HeaderValue;

        let status = self.status;
        let mut resp = axum::Json(self).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn problem_serializes_status_as_u16() {
        let p = Problem::new(StatusCode::NOT_FOUND, "Not Found", "Resource not found");
        let json = p.to_json(false);
        assert!(json.contains("\"status\":404"));
    }

    #[test]
    fn problem_deserializes_status_and_extensions() {
        let json = r#"{"type":"https://httpstatus.es/404","title":"Not Found","status":404,"detail":"gone","foo":"bar"}"#;
        let p: Problem = serde_json::from_str(json).unwrap();
        assert_eq!(p.status, StatusCode::NOT_FOUND);
        assert_eq!(p.extensions.get("foo"), Some(&Value::from("bar")));
    }

    #[test]
    fn canonical_members_come_first_and_in_order() {
        let p = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "nope")
            .with_extension("zzz", 1)
            .with_extension("aaa", 2);
        let value: Value = serde_json::from_str(&p.to_json(false)).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["type", "title", "status", "detail", "zzz", "aaa"]);
    }

    #[test]
    fn extensions_cannot_clobber_canonical_members() {
        let p = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "nope")
            .with_extension("status", 200)
            .with_extension("detail", "spoofed")
            .with_extension("kept", true);
        assert_eq!(p.status, StatusCode::BAD_REQUEST);
        assert_eq!(p.detail, "nope");
        assert!(p.extensions.contains_key("kept"));
        assert!(!p.extensions.contains_key("status"));
        assert!(!p.extensions.contains_key("detail"));
    }

    #[test]
    fn unserializable_extension_is_dropped() {
        struct Handle;
        impl Serialize for Handle {
            fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("raw resource handle"))
            }
        }

        let p = Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "boom", "boom")
            .with_extension("resource", Handle)
            .with_extension("kept", "yes");
        assert!(!p.extensions.contains_key("resource"));
        assert_eq!(p.extensions.get("kept"), Some(&Value::from("yes")));
        assert!(!p.to_json(false).is_empty());
    }

    #[test]
    fn out_of_range_status_collapses_to_500() {
        let status = StatusCode::from_u16(799).unwrap();
        let p = Problem::new(status, "odd", "odd");
        assert_eq!(p.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn default_titles() {
        assert_eq!(default_title(StatusCode::NOT_FOUND), "Not Found");
        assert_eq!(default_title(StatusCode::from_u16(599).unwrap()), "Unknown Status");
    }

    #[test]
    fn type_uri_template() {
        assert_eq!(type_uri_for(404), "https://httpstatus.es/404");
    }

    #[cfg(feature = "axum")]
    #[test]
    fn problem_into_response_sets_status_and_content_type() {
        use axum::response::IntoResponse;

        let p = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "invalid payload");
        let resp = p.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let ct = resp
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        assert_eq!(ct, APPLICATION_PROBLEM_JSON);
    }
}
