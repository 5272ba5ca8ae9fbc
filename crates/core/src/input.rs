//! Inputs accepted by predicates and readers: a path, or an open seekable stream.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Anything that can be both read and repositioned.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Label used in messages for inputs that have no path.
const STREAM_LABEL: &str = "file";

pub enum Input<'a> {
    /// A file opened afresh by every predicate and reader.
    Path(&'a Path),
    /// A caller-owned stream. Predicates and readers consume it from its
    /// current position.
    Stream(&'a mut dyn ReadSeek),
}

impl<'a> Input<'a> {
    pub fn path<P: AsRef<Path> + ?Sized>(path: &'a P) -> Self {
        Input::Path(path.as_ref())
    }

    pub fn stream<S: ReadSeek>(stream: &'a mut S) -> Self {
        Input::Stream(stream)
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Input::Stream(_))
    }

    /// Human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Input::Path(path) => format!("'{}'", path.display()),
            Input::Stream(_) => STREAM_LABEL.to_string(),
        }
    }

    /// A reader over the input's content. Paths are opened each call.
    pub fn reader(&mut self) -> io::Result<Box<dyn Read + '_>> {
        match self {
            Input::Path(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
            Input::Stream(stream) => Ok(Box::new(&mut **stream)),
        }
    }

    /// Read everything from the current position to the end.
    pub fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        match self {
            Input::Path(path) => std::fs::read(path),
            Input::Stream(stream) => {
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }

    /// Current stream position; `None` for paths.
    pub(crate) fn position(&mut self) -> io::Result<Option<u64>> {
        match self {
            Input::Path(_) => Ok(None),
            Input::Stream(stream) => stream.stream_position().map(Some),
        }
    }

    /// Move a stream back to `pos`. No-op for paths.
    pub(crate) fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        match self {
            Input::Path(_) => Ok(()),
            Input::Stream(stream) => stream.seek(SeekFrom::Start(pos)).map(|_| ()),
        }
    }
}

impl<'a> From<&'a Path> for Input<'a> {
    fn from(path: &'a Path) -> Self {
        Input::Path(path)
    }
}

impl std::fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Input::Stream(_) => f.write_str("Stream"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_describe() {
        let path = Path::new("/tmp/report.json");
        assert_eq!(Input::path(path).describe(), "'/tmp/report.json'");

        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert_eq!(Input::stream(&mut cursor).describe(), "file");
    }

    #[test]
    fn test_stream_reads_from_current_position() {
        let mut cursor = Cursor::new(b"skip-keep".to_vec());
        cursor.set_position(5);
        let mut input = Input::stream(&mut cursor);
        assert_eq!(input.read_to_end().unwrap(), b"keep");
        assert_eq!(input.position().unwrap(), Some(9));
        input.seek_to(5).unwrap();
        assert_eq!(input.position().unwrap(), Some(5));
    }

    #[test]
    fn test_path_reopens_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "abc").unwrap();

        let mut input = Input::path(&file);
        assert!(!input.is_stream());
        assert_eq!(input.read_to_end().unwrap(), b"abc");

        let mut again = String::new();
        input.reader().unwrap().read_to_string(&mut again).unwrap();
        assert_eq!(again, "abc");
        assert_eq!(input.position().unwrap(), None);
    }

    #[test]
    fn test_missing_path_is_io_error() {
        let mut input = Input::path("/nonexistent/report.plist");
        assert!(input.read_to_end().is_err());
    }
}
