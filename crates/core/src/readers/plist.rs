//! Property list reader: XML (`<plist>`) and binary (`bplist00`) encodings.

pub(crate) mod binary;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;

use crate::document::{Dictionary, Document, Value};
use crate::error::ReadError;
use crate::input::Input;
use crate::readers::FormatReader;

const FORMAT: &str = "plist";
const BINARY_MAGIC: &[u8] = b"bplist00";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub struct PlistReader;

impl FormatReader for PlistReader {
    fn matches(input: &mut Input<'_>) -> Result<bool, ReadError> {
        let raw = input.read_to_end()?;
        Ok(parse(&raw).is_ok())
    }

    fn read(input: &mut Input<'_>) -> Result<Document, ReadError> {
        let raw = input.read_to_end()?;
        parse(&raw).map(Document::new)
    }
}

/// Parse a complete property list, choosing the encoding from its header.
pub fn parse(raw: &[u8]) -> Result<Value, ReadError> {
    if raw.starts_with(BINARY_MAGIC) {
        return binary::parse(raw);
    }

    let body = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let text = std::str::from_utf8(body)
        .map_err(|e| ReadError::malformed(FORMAT, format!("invalid UTF-8: {e}")))?;
    let head = text.trim_start();
    if !head.starts_with("<?xml") && !head.starts_with("<plist") {
        return Err(ReadError::malformed(FORMAT, "missing XML or plist header"));
    }
    parse_xml(text)
}

/// Elements whose content is character data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Key,
    String,
    Integer,
    Real,
    Date,
    Data,
    True,
    False,
}

impl Scalar {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        Some(match tag {
            b"key" => Scalar::Key,
            b"string" => Scalar::String,
            b"integer" => Scalar::Integer,
            b"real" => Scalar::Real,
            b"date" => Scalar::Date,
            b"data" => Scalar::Data,
            b"true" => Scalar::True,
            b"false" => Scalar::False,
            _ => return None,
        })
    }
}

enum Frame {
    Array(Vec<Value>),
    Dict {
        map: Dictionary,
        key: Option<String>,
    },
}

/// Assembles values into nested containers as elements close.
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl TreeBuilder {
    fn push_value(&mut self, value: Value) -> Result<(), ReadError> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(ReadError::malformed(FORMAT, "more than one top-level value"));
                }
                self.root = Some(value);
            }
            Some(Frame::Array(items)) => items.push(value),
            Some(Frame::Dict { map, key }) => match key.take() {
                Some(k) => {
                    map.insert(k, value);
                }
                None => {
                    return Err(ReadError::malformed(
                        FORMAT,
                        format!("{} value without a <key> in <dict>", value.kind()),
                    ))
                }
            },
        }
        Ok(())
    }

    fn set_key(&mut self, name: String) -> Result<(), ReadError> {
        match self.stack.last_mut() {
            Some(Frame::Dict { key, .. }) if key.is_none() => {
                *key = Some(name);
                Ok(())
            }
            Some(Frame::Dict { .. }) => Err(ReadError::malformed(
                FORMAT,
                format!("<key>{name}</key> follows a key with no value"),
            )),
            _ => Err(ReadError::malformed(FORMAT, "<key> outside of <dict>")),
        }
    }

    fn close_dict(&mut self) -> Result<(), ReadError> {
        match self.stack.pop() {
            Some(Frame::Dict { map, key: None }) => self.push_value(Value::Dictionary(map)),
            Some(Frame::Dict { key: Some(k), .. }) => Err(ReadError::malformed(
                FORMAT,
                format!("key '{k}' has no value"),
            )),
            _ => Err(ReadError::malformed(FORMAT, "unbalanced </dict>")),
        }
    }

    fn close_array(&mut self) -> Result<(), ReadError> {
        match self.stack.pop() {
            Some(Frame::Array(items)) => self.push_value(Value::Array(items)),
            _ => Err(ReadError::malformed(FORMAT, "unbalanced </array>")),
        }
    }

    fn finish(&mut self, kind: Scalar, text: &str) -> Result<(), ReadError> {
        let value = match kind {
            Scalar::Key => return self.set_key(text.to_string()),
            Scalar::String => Value::String(text.to_string()),
            Scalar::Integer => Value::Integer(parse_integer(text.trim())?),
            Scalar::Real => Value::Real(text.trim().parse().map_err(|_| {
                ReadError::malformed(FORMAT, format!("invalid real '{}'", text.trim()))
            })?),
            Scalar::Date => Value::Date(parse_date(text.trim())?),
            Scalar::Data => Value::Data(decode_data(text)?),
            Scalar::True => Value::Boolean(true),
            Scalar::False => Value::Boolean(false),
        };
        self.push_value(value)
    }
}

fn parse_xml(text: &str) -> Result<Value, ReadError> {
    let mut reader = XmlReader::from_str(text);
    let mut tree = TreeBuilder::default();
    let mut scalar: Option<(Scalar, String)> = None;
    let mut plist_closed = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                let tag = name.as_ref();
                if scalar.is_some() || plist_closed {
                    return Err(unexpected_element(tag));
                }
                match tag {
                    b"plist" => {}
                    b"dict" => tree.stack.push(Frame::Dict {
                        map: Dictionary::new(),
                        key: None,
                    }),
                    b"array" => tree.stack.push(Frame::Array(Vec::new())),
                    _ => match Scalar::from_tag(tag) {
                        Some(kind) => scalar = Some((kind, String::new())),
                        None => return Err(unexpected_element(tag)),
                    },
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.local_name();
                let tag = name.as_ref();
                if scalar.is_some() || plist_closed {
                    return Err(unexpected_element(tag));
                }
                match tag {
                    b"dict" => tree.push_value(Value::Dictionary(Dictionary::new()))?,
                    b"array" => tree.push_value(Value::Array(Vec::new()))?,
                    _ => match Scalar::from_tag(tag) {
                        Some(kind) => tree.finish(kind, "")?,
                        None => return Err(unexpected_element(tag)),
                    },
                }
            }
            Ok(Event::Text(e)) => {
                let content = e.unescape().map_err(xml_error)?;
                match scalar.as_mut() {
                    Some((_, buf)) => buf.push_str(&content),
                    None if content.trim().is_empty() => {}
                    None => {
                        return Err(ReadError::malformed(
                            FORMAT,
                            format!("unexpected text '{}'", content.trim()),
                        ))
                    }
                }
            }
            Ok(Event::CData(e)) => match scalar.as_mut() {
                Some((_, buf)) => buf.push_str(&String::from_utf8_lossy(&e)),
                None => return Err(ReadError::malformed(FORMAT, "unexpected CDATA section")),
            },
            Ok(Event::End(e)) => {
                let name = e.local_name();
                let tag = name.as_ref();
                match tag {
                    b"plist" => plist_closed = true,
                    b"dict" => tree.close_dict()?,
                    b"array" => tree.close_array()?,
                    _ => match scalar.take() {
                        Some((kind, buf)) if Scalar::from_tag(tag) == Some(kind) => {
                            tree.finish(kind, &buf)?
                        }
                        _ => {
                            return Err(ReadError::malformed(
                                FORMAT,
                                format!("unexpected </{}>", String::from_utf8_lossy(tag)),
                            ))
                        }
                    },
                }
            }
            Ok(Event::Eof) => break,
            // Declaration, doctype, comments and processing instructions.
            Ok(_) => {}
            Err(e) => return Err(xml_error(e)),
        }
    }

    if scalar.is_some() || !tree.stack.is_empty() {
        return Err(ReadError::malformed(FORMAT, "unexpected end of file"));
    }
    tree.root
        .ok_or_else(|| ReadError::malformed(FORMAT, "no property list value found"))
}

fn unexpected_element(tag: &[u8]) -> ReadError {
    ReadError::malformed(
        FORMAT,
        format!("unexpected element <{}>", String::from_utf8_lossy(tag)),
    )
}

fn xml_error(e: quick_xml::Error) -> ReadError {
    ReadError::malformed(FORMAT, format!("XML error: {e}"))
}

/// Decimal or `0x`-prefixed hexadecimal, with an optional sign.
fn parse_integer(s: &str) -> Result<i64, ReadError> {
    let invalid = || ReadError::malformed(FORMAT, format!("invalid integer '{s}'"));
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(invalid());
    }
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) if hex.starts_with(['+', '-']) => return Err(invalid()),
        Some(hex) => i128::from_str_radix(hex, 16),
        None => digits.parse::<i128>(),
    }
    .map_err(|_| invalid())?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value)
        .map_err(|_| ReadError::malformed(FORMAT, format!("integer out of range '{s}'")))
}

fn parse_date(s: &str) -> Result<DateTime<Utc>, ReadError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ")
        .map(|naive| naive.and_utc())
        .map_err(|_| ReadError::malformed(FORMAT, format!("invalid date '{s}'")))
}

/// Base64 payload; line breaks and indentation are ignored.
fn decode_data(text: &str) -> Result<Vec<u8>, ReadError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| ReadError::malformed(FORMAT, format!("invalid base64 data: {e}")))
}
