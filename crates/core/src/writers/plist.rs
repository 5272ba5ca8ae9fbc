//! Property list writer: XML 1.0 plist with Apple's DOCTYPE and tab indentation.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use quick_xml::escape::escape;

use crate::document::{format_date, Document, Value};
use crate::error::WriteError;
use crate::writers::FormatWriter;

const PROLOGUE: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" ",
    "\"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
    "<plist version=\"1.0\">\n",
);

/// Base64 line width inside `<data>`.
const DATA_LINE_WIDTH: usize = 76;

pub struct PlistWriter;

impl FormatWriter for PlistWriter {
    fn write(doc: &Document, output: &mut dyn Write) -> Result<(), WriteError> {
        output.write_all(PROLOGUE.as_bytes())?;
        write_value(&doc.root, 0, output)?;
        writeln!(output, "</plist>")?;
        Ok(())
    }
}

fn write_value(value: &Value, depth: usize, out: &mut dyn Write) -> Result<(), WriteError> {
    let indent = "\t".repeat(depth);
    match value {
        Value::Null => {
            return Err(WriteError::Unsupported {
                format: "plist".into(),
                detail: "null values have no property list representation".into(),
            })
        }
        Value::Boolean(true) => writeln!(out, "{indent}<true/>")?,
        Value::Boolean(false) => writeln!(out, "{indent}<false/>")?,
        Value::Integer(i) => writeln!(out, "{indent}<integer>{i}</integer>")?,
        Value::Real(r) => writeln!(out, "{indent}<real>{r:?}</real>")?,
        Value::String(s) => writeln!(out, "{indent}<string>{}</string>", escape(s.as_str()))?,
        Value::Date(d) => writeln!(out, "{indent}<date>{}</date>", format_date(d))?,
        Value::Data(bytes) if bytes.is_empty() => writeln!(out, "{indent}<data></data>")?,
        Value::Data(bytes) => {
            let encoded = STANDARD.encode(bytes);
            writeln!(out, "{indent}<data>")?;
            for line in encoded.as_bytes().chunks(DATA_LINE_WIDTH) {
                // base64 output is ASCII
                writeln!(out, "{indent}{}", String::from_utf8_lossy(line))?;
            }
            writeln!(out, "{indent}</data>")?;
        }
        Value::Array(items) if items.is_empty() => writeln!(out, "{indent}<array/>")?,
        Value::Array(items) => {
            writeln!(out, "{indent}<array>")?;
            for item in items {
                write_value(item, depth + 1, out)?;
            }
            writeln!(out, "{indent}</array>")?;
        }
        Value::Dictionary(map) if map.is_empty() => writeln!(out, "{indent}<dict/>")?,
        Value::Dictionary(map) => {
            writeln!(out, "{indent}<dict>")?;
            for (key, item) in map {
                writeln!(out, "{indent}\t<key>{}</key>", escape(key.as_str()))?;
                write_value(item, depth + 1, out)?;
            }
            writeln!(out, "{indent}</dict>")?;
        }
    }
    Ok(())
}
