//! Read and write LNT test-report files without knowing their format up front.
//!
//! Formats are registered once, in a fixed order, in [`registry`]. A caller
//! either names a format or passes [`AUTO`] to let every format's predicate
//! vote; the input is accepted only when exactly one format recognises it.

pub mod config;
pub mod convert;
pub mod detect;
pub mod document;
pub mod error;
pub mod input;
pub mod readers;
pub mod registry;
pub mod writers;

pub use convert::{convert, read_any, write_any, AUTO};
pub use detect::{guess_format, Resolution};
pub use document::{Dictionary, Document, Value};
pub use error::FormatsError;
pub use input::{Input, ReadSeek};
pub use registry::{format_names, get_format, registry, FormatDescriptor, FormatRegistry};

pub mod prelude {
    pub use crate::document::*;
    pub use crate::error::*;
    pub use crate::input::Input;
}
