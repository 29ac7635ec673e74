#![allow(dead_code)] // each integration test binary uses a subset

//! Shared assertion helpers: parse a response body in either
//! representation back into a JSON value tree so scenario tests can make
//! the same assertions regardless of the negotiated format.

use bytes::Bytes;
use http::Response;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Value};

pub fn json_payload(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

pub fn xml_payload(response: &Response<Bytes>) -> Value {
    parse_xml(std::str::from_utf8(response.body()).unwrap())
}

pub fn payload_for(content_type: &str, response: &Response<Bytes>) -> Value {
    if content_type.contains("xml") {
        xml_payload(response)
    } else {
        json_payload(response)
    }
}

struct Element {
    name: String,
    children: Map<String, Value>,
    text: String,
}

/// Minimal XML reader for assertions. Repeated sibling elements collapse
/// into arrays; element text that parses as an integer is coerced to a
/// number (read-back concern only, the writer emits plain text).
pub fn parse_xml(xml: &str) -> Value {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Element {
        name: String::new(),
        children: Map::new(),
        text: String::new(),
    }];

    loop {
        match reader.read_event().unwrap() {
            Event::Start(start) => {
                stack.push(Element {
                    name: String::from_utf8(start.name().as_ref().to_vec()).unwrap(),
                    children: Map::new(),
                    text: String::new(),
                });
            }
            Event::Text(text) => {
                let unescaped = text.decode().unwrap();
                stack.last_mut().unwrap().text.push_str(&unescaped);
            }
            Event::End(_) => {
                let element = stack.pop().unwrap();
                let value = if element.children.is_empty() {
                    scalar_value(&element.text)
                } else {
                    Value::Object(element.children)
                };
                insert_merging(&mut stack.last_mut().unwrap().children, element.name, value);
            }
            Event::Empty(empty) => {
                let name = String::from_utf8(empty.name().as_ref().to_vec()).unwrap();
                insert_merging(
                    &mut stack.last_mut().unwrap().children,
                    name,
                    Value::String(String::new()),
                );
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut root = stack.pop().unwrap();
    root.children.remove("problem").unwrap()
}

fn scalar_value(text: &str) -> Value {
    text.parse::<i64>().map_or_else(|_| Value::from(text), Value::from)
}

fn insert_merging(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(siblings)) => siblings.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}
