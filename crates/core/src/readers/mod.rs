//! Format readers: each format implements FormatReader to recognise and parse its files.

pub mod json;
pub mod plist;

use crate::document::Document;
use crate::error::ReadError;
use crate::input::Input;

pub trait FormatReader: Send + Sync {
    /// Check whether the input looks like this format. An `Err` means "no".
    fn matches(input: &mut Input<'_>) -> Result<bool, ReadError>
    where
        Self: Sized;

    /// Parse the whole input into a document.
    fn read(input: &mut Input<'_>) -> Result<Document, ReadError>
    where
        Self: Sized;
}
