//! Format detection: run every registered predicate against an input and
//! accept the result only when exactly one format recognises it.

use std::io;

use crate::error::FormatsError;
use crate::input::Input;
use crate::registry::{registry, FormatDescriptor, FormatRegistry};

/// Outcome of running all predicates against one input.
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'r> {
    NoMatch,
    Unique(&'r FormatDescriptor),
    /// Two formats recognised the input; scanning stopped at the second.
    Ambiguous {
        first: &'r FormatDescriptor,
        second: &'r FormatDescriptor,
    },
}

impl<'r> Resolution<'r> {
    /// The matched format, if there is exactly one. Ambiguity counts as no match.
    pub fn format(self) -> Option<&'r FormatDescriptor> {
        match self {
            Resolution::Unique(format) => Some(format),
            Resolution::NoMatch | Resolution::Ambiguous { .. } => None,
        }
    }
}

/// Puts a stream back where detection found it, including when a predicate
/// unwinds.
struct PositionGuard<'g, 'a> {
    input: &'g mut Input<'a>,
    start: Option<u64>,
}

impl PositionGuard<'_, '_> {
    fn restore(&mut self) -> io::Result<()> {
        match self.start {
            Some(pos) => self.input.seek_to(pos),
            None => Ok(()),
        }
    }
}

impl Drop for PositionGuard<'_, '_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let _ = self.restore();
        }
    }
}

/// Try each format in order. Predicate errors count as "not recognised".
/// Only failing to reposition a stream is reported as an error.
pub fn resolve<'r>(
    formats: &'r [FormatDescriptor],
    input: &mut Input<'_>,
) -> Result<Resolution<'r>, FormatsError> {
    let start = input.position()?;
    let mut guard = PositionGuard { input, start };
    let mut found: Option<&'r FormatDescriptor> = None;

    for format in formats {
        guard.restore()?;
        let outcome = format.matches(guard.input);
        guard.restore()?;

        let matched = match outcome {
            Ok(matched) => {
                tracing::trace!(format = format.name(), matched, "predicate ran");
                matched
            }
            Err(e) => {
                tracing::debug!(
                    format = format.name(),
                    error = %e,
                    "predicate failed, treating as no match"
                );
                false
            }
        };
        if !matched {
            continue;
        }

        if let Some(first) = found {
            tracing::debug!(
                first = first.name(),
                second = format.name(),
                "input recognised by more than one format"
            );
            return Ok(Resolution::Ambiguous {
                first,
                second: format,
            });
        }
        found = Some(format);
    }

    Ok(found.map_or(Resolution::NoMatch, Resolution::Unique))
}

impl FormatRegistry {
    pub fn resolve(&self, input: &mut Input<'_>) -> Result<Resolution<'_>, FormatsError> {
        resolve(self.formats(), input)
    }

    /// The single format that recognises `input`, or `None` when zero or
    /// several do.
    pub fn guess(
        &self,
        input: &mut Input<'_>,
    ) -> Result<Option<&FormatDescriptor>, FormatsError> {
        self.resolve(input).map(Resolution::format)
    }
}

/// Guess the built-in format of `input`.
pub fn guess_format(
    input: &mut Input<'_>,
) -> Result<Option<&'static FormatDescriptor>, FormatsError> {
    registry().guess(input)
}
