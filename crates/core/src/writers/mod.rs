//! Format writers: each format implements FormatWriter to emit a document.

pub mod json;
pub mod plist;

use std::io::Write;

use crate::document::Document;
use crate::error::WriteError;

pub trait FormatWriter: Send + Sync {
    /// Write the document to a byte sink.
    fn write(doc: &Document, output: &mut dyn Write) -> Result<(), WriteError>
    where
        Self: Sized;
}
