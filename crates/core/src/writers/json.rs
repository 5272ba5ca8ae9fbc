//! JSON writer: pretty-printed, two-space indent, trailing newline.

use std::io::Write;

use crate::document::Document;
use crate::error::WriteError;
use crate::writers::FormatWriter;

pub struct JsonWriter;

impl FormatWriter for JsonWriter {
    fn write(doc: &Document, output: &mut dyn Write) -> Result<(), WriteError> {
        serde_json::to_writer_pretty(&mut *output, &doc.root)
            .map_err(|e| WriteError::Serialize(e.to_string()))?;
        writeln!(output)?;
        Ok(())
    }
}
