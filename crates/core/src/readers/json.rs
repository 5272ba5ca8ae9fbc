//! JSON reader: any well-formed JSON document.

use crate::document::{Document, Value};
use crate::error::ReadError;
use crate::input::Input;
use crate::readers::FormatReader;

pub struct JsonReader;

impl FormatReader for JsonReader {
    fn matches(input: &mut Input<'_>) -> Result<bool, ReadError> {
        let raw = input.read_to_end()?;
        Ok(serde_json::from_slice::<Value>(strip_bom(&raw)).is_ok())
    }

    fn read(input: &mut Input<'_>) -> Result<Document, ReadError> {
        let raw = input.read_to_end()?;
        let root: Value = serde_json::from_slice(strip_bom(&raw))
            .map_err(|e| ReadError::malformed("JSON", e.to_string()))?;
        Ok(Document::new(root))
    }
}

fn strip_bom(raw: &[u8]) -> &[u8] {
    raw.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(raw)
}
