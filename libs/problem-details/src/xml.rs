//! XML rendering of problem payloads.
//!
//! Payloads render under a `<problem>` root: scalars become text content,
//! arrays become repeated sibling elements under the parent key name, maps
//! become nested elements. Every mapping key at every depth is first
//! normalized into a valid XML element name; colliding names after
//! normalization are NOT de-duplicated and simply render as repeated
//! siblings (a known quirk, kept as-is).
//!
//! Built on quick-xml's event writer; text content is escaped on write.

use crate::problem::Problem;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::Value;

/// Emitted if the event writer ever fails; callers fall back to a literal body.
struct RenderError(String);

const FALLBACK_BODY: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    "<problem><type>https://httpstatus.es/500</type>",
    "<title>Internal Server Error</title><status>500</status>",
    "<detail>An unexpected error occurred</detail></problem>",
);

/// Normalize a mapping key into a valid XML element name.
///
/// The first character must be an ASCII letter or underscore; every other
/// character outside `[A-Za-z0-9_-]` (newlines included) becomes `_`.
#[must_use]
pub fn sanitize_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for (index, ch) in key.chars().enumerate() {
        let valid = if index == 0 {
            ch.is_ascii_alphabetic() || ch == '_'
        } else {
            ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
        };
        name.push(if valid { ch } else { '_' });
    }
    if name.is_empty() {
        name.push('_');
    }
    name
}

/// Render a payload as an XML document.
///
/// Rendering is total: writer failures (not reachable with an in-memory
/// buffer) fall back to a minimal literal body.
#[must_use]
pub fn render(problem: &Problem) -> String {
    try_render(problem).unwrap_or_else(|_| FALLBACK_BODY.to_owned())
}

fn try_render(problem: &Problem) -> Result<String, RenderError> {
    let mut writer = Writer::new(Vec::new());
    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(&mut writer, Event::Start(BytesStart::new("problem")))?;
    for (key, value) in problem.as_value_map() {
        write_value(&mut writer, &sanitize_key(&key), &value)?;
    }
    emit(&mut writer, Event::End(BytesEnd::new("problem")))?;
    String::from_utf8(writer.into_inner()).map_err(|e| RenderError(e.to_string()))
}

fn write_value<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
) -> Result<(), RenderError> {
    match value {
        Value::Array(items) => {
            for item in items {
                write_value(writer, name, item)?;
            }
        }
        Value::Object(map) => {
            emit(writer, Event::Start(BytesStart::new(name)))?;
            for (key, child) in map {
                write_value(writer, &sanitize_key(key), child)?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))?;
        }
        scalar => {
            let text = match scalar {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            emit(writer, Event::Start(BytesStart::new(name)))?;
            emit(writer, Event::Text(BytesText::new(&text)))?;
            emit(writer, Event::End(BytesEnd::new(name)))?;
        }
    }
    Ok(())
}

fn emit<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), RenderError> {
    writer
        .write_event(event)
        .map_err(|e| RenderError(e.to_string()))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;

    #[test]
    fn sanitize_key_rule_vectors() {
        assert_eq!(sanitize_key("A#-"), "A_-");
        assert_eq!(sanitize_key("-A-"), "_A-");
        assert_eq!(sanitize_key("#B-"), "_B-");
        assert_eq!(sanitize_key("C\n-"), "C_-");
        assert_eq!(sanitize_key("\nC-"), "_C-");
        assert_eq!(sanitize_key("already_fine-1"), "already_fine-1");
    }

    #[test]
    fn renders_canonical_members_as_elements() {
        let p = Problem::new(StatusCode::NOT_FOUND, "Not Found", "no such thing");
        let xml = render(&p);
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<problem>"));
        assert!(xml.contains("<type>https://httpstatus.es/404</type>"));
        assert!(xml.contains("<title>Not Found</title>"));
        assert!(xml.contains("<status>404</status>"));
        assert!(xml.contains("<detail>no such thing</detail>"));
        assert!(xml.ends_with("</problem>"));
    }

    #[test]
    fn renders_nested_maps_and_arrays() {
        let p = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "bad")
            .with_extension("errors", json!({"fields": ["email", "name"]}));
        let xml = render(&p);
        assert!(xml.contains("<errors><fields>email</fields><fields>name</fields></errors>"));
    }

    #[test]
    fn keys_are_sanitized_at_every_depth() {
        let p = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "bad")
            .with_extension("foo", json!({"A#-": {"\nC-": "deep"}}));
        let xml = render(&p);
        assert!(xml.contains("<A_-><_C->deep</_C-></A_->"));
    }

    #[test]
    fn colliding_sanitized_keys_render_as_repeated_siblings() {
        // "a b" and "a#b" both normalize to "a_b"; no de-duplication happens
        let p = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "bad")
            .with_extension("wrap", json!({"a b": 1, "a#b": 2}));
        let xml = render(&p);
        assert_eq!(xml.matches("<a_b>").count(), 2);
    }

    #[test]
    fn text_content_is_escaped() {
        let p = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "a < b & c");
        let xml = render(&p);
        assert!(xml.contains("<detail>a &lt; b &amp; c</detail>"));
    }

    #[test]
    fn null_renders_as_empty_element_text() {
        let p = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "bad")
            .with_extension("missing", Value::Null);
        let xml = render(&p);
        assert!(xml.contains("<missing></missing>"));
    }
}
