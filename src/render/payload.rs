//! Payload encoding for each renderer family.

use html_escape::encode_text;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;

use crate::error::{DispatchError, DispatchResult};
use crate::render::kind::RendererKind;

/// Data produced by a handler or component, before serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Html { title: Option<String>, body: String },
    Data(Value),
    Text(String),
}

impl Payload {
    pub fn html(body: impl Into<String>) -> Self {
        Self::Html {
            title: None,
            body: body.into(),
        }
    }

    pub fn titled(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Html {
            title: Some(title.into()),
            body: body.into(),
        }
    }
}

/// Serialize `payload` as `kind`.
pub fn encode(kind: RendererKind, payload: &Payload) -> DispatchResult<String> {
    match kind {
        RendererKind::Page => Ok(match payload {
            Payload::Html { title, body } => layout(title.as_deref(), body),
            other => layout(None, &fragment(other)?),
        }),
        RendererKind::Fragment => fragment(payload),
        RendererKind::Json => match payload {
            Payload::Data(value) => to_json(value),
            Payload::Text(text) => to_json(&Value::String(text.clone())),
            Payload::Html { body, .. } => to_json(&Value::String(body.clone())),
        },
        RendererKind::Xml => match payload {
            Payload::Data(value) => to_xml("response", value),
            Payload::Text(text) | Payload::Html { body: text, .. } => {
                to_xml("response", &Value::String(text.clone()))
            }
        },
        RendererKind::Csv => match payload {
            Payload::Data(value) => to_csv(value),
            Payload::Text(text) | Payload::Html { body: text, .. } => Ok(text.clone()),
        },
        RendererKind::Text => match payload {
            Payload::Text(text) | Payload::Html { body: text, .. } => Ok(text.clone()),
            Payload::Data(value) => serde_json::to_string_pretty(value)
                .map_err(|e| DispatchError::Render(e.to_string())),
        },
        RendererKind::Redirect => Err(DispatchError::Render(
            "redirects carry no payload".to_string(),
        )),
    }
}

fn fragment(payload: &Payload) -> DispatchResult<String> {
    match payload {
        Payload::Html { body, .. } => Ok(body.clone()),
        Payload::Text(text) => Ok(format!("<p>{}</p>", encode_text(text))),
        Payload::Data(value) => {
            let pretty = serde_json::to_string_pretty(value)
                .map_err(|e| DispatchError::Render(e.to_string()))?;
            Ok(format!("<pre>{}</pre>", encode_text(&pretty)))
        }
    }
}

fn layout(title: Option<&str>, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        encode_text(title.unwrap_or("")),
        body
    )
}

fn to_json(value: &Value) -> DispatchResult<String> {
    serde_json::to_string(value).map_err(|e| DispatchError::Render(e.to_string()))
}

fn to_xml(root: &str, value: &Value) -> DispatchResult<String> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(render_err)?;
    writer.get_mut().push(b'\n');
    write_xml_element(&mut writer, root, value)?;
    String::from_utf8(writer.into_inner()).map_err(render_err)
}

fn write_xml_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
) -> DispatchResult<()> {
    let name = xml_name(name);
    match value {
        Value::Null => writer
            .write_event(Event::Empty(BytesStart::new(name.as_str())))
            .map_err(render_err),
        Value::Object(map) => {
            writer
                .write_event(Event::Start(BytesStart::new(name.as_str())))
                .map_err(render_err)?;
            for (key, child) in map {
                write_xml_element(writer, key, child)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name.as_str())))
                .map_err(render_err)
        }
        Value::Array(items) => {
            writer
                .write_event(Event::Start(BytesStart::new(name.as_str())))
                .map_err(render_err)?;
            for item in items {
                write_xml_element(writer, "item", item)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name.as_str())))
                .map_err(render_err)
        }
        scalar => {
            let text = match scalar {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            writer
                .write_event(Event::Start(BytesStart::new(name.as_str())))
                .map_err(render_err)?;
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(render_err)?;
            writer
                .write_event(Event::End(BytesEnd::new(name.as_str())))
                .map_err(render_err)
        }
    }
}

fn render_err(e: impl std::fmt::Display) -> DispatchError {
    DispatchError::Render(e.to_string())
}

// Keys become element names; anything outside [A-Za-z0-9_.-] is replaced.
fn xml_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn to_csv(value: &Value) -> DispatchResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    let err = |e: csv::Error| DispatchError::Render(e.to_string());

    match value {
        Value::Array(rows) => match rows.first() {
            Some(Value::Object(first)) => {
                let headers: Vec<&String> = first.keys().collect();
                wtr.write_record(headers.iter().map(|h| h.as_str())).map_err(err)?;
                for row in rows {
                    let record: Vec<String> = headers
                        .iter()
                        .map(|h| row.get(h.as_str()).map(cell).unwrap_or_default())
                        .collect();
                    wtr.write_record(&record).map_err(err)?;
                }
            }
            _ => {
                for row in rows {
                    let record: Vec<String> = match row {
                        Value::Array(cells) => cells.iter().map(cell).collect(),
                        other => vec![cell(other)],
                    };
                    wtr.write_record(&record).map_err(err)?;
                }
            }
        },
        Value::Object(map) => {
            wtr.write_record(map.keys()).map_err(err)?;
            let record: Vec<String> = map.values().map(cell).collect();
            wtr.write_record(&record).map_err(err)?;
        }
        other => {
            wtr.write_record([cell(other)]).map_err(err)?;
        }
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| DispatchError::Render(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DispatchError::Render(e.to_string()))
}
