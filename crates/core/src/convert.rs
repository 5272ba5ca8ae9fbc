//! Dispatch: route an input to a reader, and a document to a writer, by
//! format name or by auto-detection.

use std::io::Write;

use crate::document::Document;
use crate::error::FormatsError;
use crate::input::Input;
use crate::registry::{registry, FormatRegistry, ReadFn};

/// Format name that asks for auto-detection instead of a fixed format.
pub const AUTO: &str = "<auto>";

impl FormatRegistry {
    /// Read `input` as the named format, or as whichever single format
    /// recognises it when `format_name` is [`AUTO`]. Reader errors are
    /// returned unchanged.
    pub fn read_any(
        &self,
        input: &mut Input<'_>,
        format_name: &str,
    ) -> Result<Document, FormatsError> {
        let (name, read) = self.input_reader(input, format_name)?;
        tracing::debug!(format = name, input = %input.describe(), "reading");
        Ok(read(input)?)
    }

    /// Write `doc` in the named format. There is no auto-detection for output.
    pub fn write_any(
        &self,
        doc: &Document,
        output: &mut dyn Write,
        format_name: &str,
    ) -> Result<(), FormatsError> {
        let write = self
            .get(format_name)
            .and_then(|format| format.writer())
            .ok_or_else(|| FormatsError::UnknownOutputFormat {
                name: format_name.to_string(),
            })?;
        tracing::debug!(format = format_name, "writing");
        Ok(write(doc, output)?)
    }

    /// Read in one format and write in another. Both names are checked
    /// before anything is read.
    pub fn convert(
        &self,
        input: &mut Input<'_>,
        from: &str,
        output: &mut dyn Write,
        to: &str,
    ) -> Result<(), FormatsError> {
        if !self.get(to).is_some_and(|format| format.can_write()) {
            return Err(FormatsError::UnknownOutputFormat { name: to.to_string() });
        }
        let doc = self.read_any(input, from)?;
        self.write_any(&doc, output, to)
    }

    fn input_reader(
        &self,
        input: &mut Input<'_>,
        format_name: &str,
    ) -> Result<(&'static str, ReadFn), FormatsError> {
        let format = if format_name == AUTO {
            self.guess(input)?
                .ok_or_else(|| FormatsError::FormatDetection {
                    input: input.describe(),
                })?
        } else {
            self.get(format_name)
                .ok_or_else(|| FormatsError::UnknownFormat {
                    name: format_name.to_string(),
                })?
        };
        let read = format.reader().ok_or_else(|| FormatsError::UnknownFormat {
            name: format.name().to_string(),
        })?;
        Ok((format.name(), read))
    }
}

/// Read any built-in format. `format_name` may be [`AUTO`].
pub fn read_any(input: &mut Input<'_>, format_name: &str) -> Result<Document, FormatsError> {
    registry().read_any(input, format_name)
}

/// Write a document in a built-in format.
pub fn write_any(
    doc: &Document,
    output: &mut dyn Write,
    format_name: &str,
) -> Result<(), FormatsError> {
    registry().write_any(doc, output, format_name)
}

/// Read with one built-in format and write with another.
pub fn convert(
    input: &mut Input<'_>,
    from: &str,
    output: &mut dyn Write,
    to: &str,
) -> Result<(), FormatsError> {
    registry().convert(input, from, output, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Dictionary, Value};
    use crate::error::ReadError;
    use crate::readers::plist::binary::fixtures::{bplist, nested_arrays};
    use crate::registry::FormatDescriptor;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn yes(_: &mut Input<'_>) -> Result<bool, ReadError> {
        Ok(true)
    }

    fn always_fails(_: &mut Input<'_>) -> Result<Document, ReadError> {
        Err(ReadError::malformed("fake", "reader rejected input"))
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_auto_reads_json_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "report.json", r#"{"key": "value"}"#);

        let doc = read_any(&mut Input::path(&path), AUTO).unwrap();
        let mut expected = Dictionary::new();
        expected.insert("key".into(), Value::from("value"));
        assert_eq!(doc.root, Value::Dictionary(expected));
    }

    #[test]
    fn test_auto_matches_explicit() {
        let plist = concat!(
            "<?xml version=\"1.0\"?>\n",
            "<plist version=\"1.0\">\n",
            "<array><integer>4</integer></array>\n",
            "</plist>\n",
        );
        let mut auto_cursor = Cursor::new(plist.as_bytes().to_vec());
        let mut named_cursor = Cursor::new(plist.as_bytes().to_vec());
        let auto = read_any(&mut Input::stream(&mut auto_cursor), AUTO).unwrap();
        let named = read_any(&mut Input::stream(&mut named_cursor), "plist").unwrap();
        assert_eq!(auto, named);
    }

    #[test]
    fn test_auto_reads_binary_plist() {
        let raw = bplist(&[&[0xD1, 0x01, 0x02], &[0x51, b'n'], &[0x10, 0x07]], 0);
        let mut auto_cursor = Cursor::new(raw.clone());
        let mut named_cursor = Cursor::new(raw);
        let auto = read_any(&mut Input::stream(&mut auto_cursor), AUTO).unwrap();
        let named = read_any(&mut Input::stream(&mut named_cursor), "plist").unwrap();

        let mut expected = Dictionary::new();
        expected.insert("n".into(), Value::Integer(7));
        assert_eq!(auto.root, Value::Dictionary(expected));
        assert_eq!(auto, named);
    }

    #[test]
    fn test_auto_on_deeply_nested_binary_plist_is_detection_error() {
        let mut cursor = Cursor::new(nested_arrays(10_000));
        let err = read_any(&mut Input::stream(&mut cursor), AUTO).unwrap_err();
        assert!(matches!(err, FormatsError::FormatDetection { .. }));
    }

    #[test]
    fn test_auto_on_plain_text_path_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.txt", "nothing to see\n");

        let err = read_any(&mut Input::path(&path), AUTO).unwrap_err();
        assert!(matches!(err, FormatsError::FormatDetection { .. }));
        assert!(err.to_string().contains("notes.txt"));
    }

    #[test]
    fn test_auto_on_plain_text_stream_says_file() {
        let mut cursor = Cursor::new(b"nothing to see\n".to_vec());
        let err = read_any(&mut Input::stream(&mut cursor), AUTO).unwrap_err();
        assert_eq!(err.to_string(), "unable to guess input format for file");
    }

    #[test]
    fn test_ambiguous_auto_is_detection_error() {
        let registry = FormatRegistry::new(vec![
            FormatDescriptor::new("a", yes).with_reader(always_fails),
            FormatDescriptor::new("b", yes).with_reader(always_fails),
        ]);
        let mut cursor = Cursor::new(Vec::new());
        let err = registry.read_any(&mut Input::stream(&mut cursor), AUTO).unwrap_err();
        assert!(matches!(err, FormatsError::FormatDetection { .. }));
    }

    #[test]
    fn test_unknown_name() {
        let mut cursor = Cursor::new(b"{}".to_vec());
        let err = read_any(&mut Input::stream(&mut cursor), "nonexistent-format").unwrap_err();
        assert!(matches!(
            err,
            FormatsError::UnknownFormat { ref name } if name == "nonexistent-format"
        ));
        assert!(err.to_string().contains("nonexistent-format"));
    }

    #[test]
    fn test_explicit_name_does_not_fall_back() {
        // Valid JSON, but plist was asked for: the plist reader's error surfaces.
        let mut cursor = Cursor::new(br#"{"key": "value"}"#.to_vec());
        let err = read_any(&mut Input::stream(&mut cursor), "plist").unwrap_err();
        assert!(matches!(err, FormatsError::Read(ReadError::MalformedFile { .. })));
    }

    #[test]
    fn test_format_without_reader_is_unknown() {
        let registry = FormatRegistry::new(vec![FormatDescriptor::new("write-only", yes)]);
        let mut cursor = Cursor::new(Vec::new());
        let err = registry
            .read_any(&mut Input::stream(&mut cursor), "write-only")
            .unwrap_err();
        assert!(matches!(err, FormatsError::UnknownFormat { .. }));
    }

    #[test]
    fn test_reader_error_propagates_unchanged() {
        let registry =
            FormatRegistry::new(vec![FormatDescriptor::new("fake", yes).with_reader(always_fails)]);
        let mut cursor = Cursor::new(Vec::new());
        let err = registry.read_any(&mut Input::stream(&mut cursor), AUTO).unwrap_err();
        assert_eq!(err.to_string(), "Malformed fake file: reader rejected input");
    }

    #[test]
    fn test_write_unknown_output() {
        let mut out = Vec::new();
        let err = write_any(&Document::new(Value::Null), &mut out, "yaml").unwrap_err();
        assert!(matches!(err, FormatsError::UnknownOutputFormat { .. }));

        let registry = FormatRegistry::new(vec![
            FormatDescriptor::new("read-only", yes).with_reader(always_fails)
        ]);
        let err = registry
            .write_any(&Document::new(Value::Null), &mut out, "read-only")
            .unwrap_err();
        assert!(matches!(err, FormatsError::UnknownOutputFormat { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_convert_json_to_plist() {
        let mut cursor = Cursor::new(br#"{"Run": {"Order": 7}}"#.to_vec());
        let mut out = Vec::new();
        convert(&mut Input::stream(&mut cursor), AUTO, &mut out, "plist").unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("<key>Order</key>"));
        assert!(text.contains("<integer>7</integer>"));
    }

    #[test]
    fn test_convert_checks_output_before_reading() {
        let mut cursor = Cursor::new(b"not json".to_vec());
        let mut out = Vec::new();
        let err = convert(&mut Input::stream(&mut cursor), AUTO, &mut out, "csv").unwrap_err();
        assert!(matches!(err, FormatsError::UnknownOutputFormat { .. }));
        assert_eq!(cursor.position(), 0);
    }
}
