//! The fixed, ordered set of formats known to the process.
//!
//! Each format is a [`FormatDescriptor`]: a unique name, a predicate that
//! recognises the format, and optional read and write capabilities. Which
//! implementation backs a name is decided once, in [`builtin_formats`];
//! detection and dispatch only ever see descriptors.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::document::Document;
use crate::error::{ReadError, WriteError};
use crate::input::Input;
use crate::readers::json::JsonReader;
use crate::readers::plist::PlistReader;
use crate::readers::FormatReader;
use crate::writers::json::JsonWriter;
use crate::writers::plist::PlistWriter;
use crate::writers::FormatWriter;

pub type PredicateFn = fn(&mut Input<'_>) -> Result<bool, ReadError>;
pub type ReadFn = fn(&mut Input<'_>) -> Result<Document, ReadError>;
pub type WriteFn = fn(&Document, &mut dyn Write) -> Result<(), WriteError>;

/// One supported format. Immutable once built.
#[derive(Clone, Copy)]
pub struct FormatDescriptor {
    name: &'static str,
    predicate: PredicateFn,
    read: Option<ReadFn>,
    write: Option<WriteFn>,
}

impl FormatDescriptor {
    /// A descriptor that can only recognise inputs; add capabilities with
    /// [`with_reader`](Self::with_reader) and [`with_writer`](Self::with_writer).
    /// A descriptor with an empty name is dropped by [`FormatRegistry::new`].
    pub fn new(name: &'static str, predicate: PredicateFn) -> Self {
        Self {
            name,
            predicate,
            read: None,
            write: None,
        }
    }

    pub fn with_reader(mut self, read: ReadFn) -> Self {
        self.read = Some(read);
        self
    }

    pub fn with_writer(mut self, write: WriteFn) -> Self {
        self.write = Some(write);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn can_read(&self) -> bool {
        self.read.is_some()
    }

    pub fn can_write(&self) -> bool {
        self.write.is_some()
    }

    /// Run the format's recognizer. The input is left wherever the
    /// predicate stopped; callers restore stream positions themselves.
    pub fn matches(&self, input: &mut Input<'_>) -> Result<bool, ReadError> {
        (self.predicate)(input)
    }

    pub fn reader(&self) -> Option<ReadFn> {
        self.read
    }

    pub fn writer(&self) -> Option<WriteFn> {
        self.write
    }
}

impl fmt::Debug for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatDescriptor")
            .field("name", &self.name)
            .field("read", &self.can_read())
            .field("write", &self.can_write())
            .finish()
    }
}

/// Ordered descriptors plus a name lookup table derived from them.
#[derive(Debug)]
pub struct FormatRegistry {
    formats: Vec<FormatDescriptor>,
    /// Name -> index into `formats`. A repeated name points at its last
    /// registration but keeps the position of its first.
    by_name: IndexMap<&'static str, usize>,
}

impl FormatRegistry {
    pub fn new(mut formats: Vec<FormatDescriptor>) -> Self {
        formats.retain(|format| {
            if format.name.is_empty() {
                tracing::warn!("format with an empty name ignored");
            }
            !format.name.is_empty()
        });
        let mut by_name = IndexMap::with_capacity(formats.len());
        for (index, format) in formats.iter().enumerate() {
            if by_name.insert(format.name, index).is_some() {
                tracing::warn!(
                    format = format.name,
                    "format registered twice; last one wins"
                );
            }
        }
        Self { formats, by_name }
    }

    /// The formats shipped with this crate.
    pub fn builtin() -> Self {
        Self::new(builtin_formats())
    }

    /// All descriptors in registration order. Detection tries them in this order.
    pub fn formats(&self) -> &[FormatDescriptor] {
        &self.formats
    }

    /// Exact-name lookup. `None` is an ordinary outcome, not an error.
    pub fn get(&self, name: &str) -> Option<&FormatDescriptor> {
        self.by_name.get(name).map(|&index| &self.formats[index])
    }

    /// Every registered name, once each.
    pub fn names(&self) -> Vec<&'static str> {
        self.by_name.keys().copied().collect()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Registration order matters: it is the order predicates run in.
pub fn builtin_formats() -> Vec<FormatDescriptor> {
    vec![
        FormatDescriptor::new("plist", PlistReader::matches)
            .with_reader(PlistReader::read)
            .with_writer(PlistWriter::write),
        FormatDescriptor::new("json", JsonReader::matches)
            .with_reader(JsonReader::read)
            .with_writer(JsonWriter::write),
    ]
}

static REGISTRY: OnceLock<FormatRegistry> = OnceLock::new();

/// The process-wide registry, built on first use and read-only afterwards.
pub fn registry() -> &'static FormatRegistry {
    REGISTRY.get_or_init(FormatRegistry::builtin)
}

/// Look up a built-in format by name.
pub fn get_format(name: &str) -> Option<&'static FormatDescriptor> {
    registry().get(name)
}

/// Names of all built-in formats.
pub fn format_names() -> Vec<&'static str> {
    registry().names()
}
