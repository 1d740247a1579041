//! Pull a single integer record out of a newline-delimited file through a
//! read-only memory mapping.
//!
//! Every call maps the whole file, walks it front to back with `memchr` until
//! the requested line is bracketed, copies that line into a small stack
//! buffer and parses its leading integer. The map and the descriptor are
//! owned by locals, so both are gone when the call returns, whichever way it
//! returns.
//!
//! Cost is O(file size) per call. That is fine for the contrast it provides
//! against the in-memory kernel; it is not a fast path.

use std::fs::File;
use std::path::PathBuf;

use memmap2::Mmap;
use tracing::warn;

use crate::error::LineError;

/// Bytes of a line that are kept for parsing; the rest is dropped.
pub const LINE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct FileLineReader {
    path: PathBuf,
}

impl FileLineReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse the leading integer of line `line` (1-based).
    ///
    /// # Errors
    ///
    /// `LineNumberTooSmall` for 0, `NoSuchLine` past the end of the file,
    /// `NotNumeric` for a line without a numeric prefix, `Io` when the file
    /// cannot be opened or mapped.
    pub fn read_line(&self, line: usize) -> Result<i64, LineError> {
        if line < 1 {
            warn!(line, "line number too small");
            return Err(LineError::LineNumberTooSmall { line });
        }

        let file = File::open(&self.path).map_err(|source| self.io_error(source))?;
        let len = file
            .metadata()
            .map_err(|source| self.io_error(source))?
            .len();
        if len == 0 {
            warn!(line, path = %self.path.display(), "file does not have line");
            return Err(LineError::NoSuchLine { line });
        }

        // SAFETY: the map is private and read-only, and lives only for this
        // call. A concurrent truncation by another process is outside what
        // this harness guards against.
        let map = unsafe { Mmap::map(&file) }.map_err(|source| self.io_error(source))?;
        advise_sequential(&file, &map);

        let Some((start, end)) = locate_line(&map, line) else {
            warn!(line, path = %self.path.display(), "file does not have line");
            return Err(LineError::NoSuchLine { line });
        };

        let mut out = [0u8; LINE_CAPACITY];
        let copied = (end - start).min(LINE_CAPACITY - 1);
        out[..copied].copy_from_slice(&map[start..start + copied]);

        parse_leading_int(&out[..copied]).ok_or_else(|| {
            warn!(line, path = %self.path.display(), "line has no numeric prefix");
            LineError::NotNumeric { line }
        })
    }

    fn io_error(&self, source: std::io::Error) -> LineError {
        LineError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Byte range `[start, end)` of line `line` (1-based), trailing `\n` included.
///
/// Returns `None` when the line starts at or past the end of `bytes`.
pub fn locate_line(bytes: &[u8], line: usize) -> Option<(usize, usize)> {
    let preceding = line.checked_sub(1)?;

    let start = if preceding == 0 {
        0
    } else {
        memchr::memchr_iter(b'\n', bytes).nth(preceding - 1)? + 1
    };
    if start >= bytes.len() {
        return None;
    }

    let end = memchr::memchr(b'\n', &bytes[start..]).map_or(bytes.len(), |pos| start + pos + 1);
    Some((start, end))
}

/// Leading whitespace, optional sign, then digits. Anything after the digits
/// is ignored. `None` when there are no digits or the value overflows.
pub fn parse_leading_int(bytes: &[u8]) -> Option<i64> {
    let mut rest = bytes;
    while let [first, tail @ ..] = rest {
        if !first.is_ascii_whitespace() {
            break;
        }
        rest = tail;
    }

    let negative = match rest.first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    // Accumulate negatively so i64::MIN parses.
    let mut value: i64 = 0;
    for &b in &rest[..digits] {
        value = value.checked_mul(10)?.checked_sub(i64::from(b - b'0'))?;
    }
    if negative {
        Some(value)
    } else {
        value.checked_neg()
    }
}

#[cfg(unix)]
fn advise_sequential(file: &File, map: &Mmap) {
    // Both hints are advisory; failures are ignored.
    let _ = map.advise(memmap2::Advice::Sequential);
    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: the descriptor is open for the duration of the call.
        unsafe {
            let _ = libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_SEQUENTIAL);
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = file;
}

#[cfg(not(unix))]
fn advise_sequential(_file: &File, _map: &Mmap) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn reader_for(content: &[u8]) -> (NamedTempFile, FileLineReader) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        let reader = FileLineReader::new(file.path());
        (file, reader)
    }

    #[test]
    fn test_reads_each_line() {
        let (_file, reader) = reader_for(b"10\n20\n30\n");
        assert_eq!(reader.read_line(1).unwrap(), 10);
        assert_eq!(reader.read_line(2).unwrap(), 20);
        assert_eq!(reader.read_line(3).unwrap(), 30);
    }

    #[test]
    fn test_out_of_range_lines() {
        let (_file, reader) = reader_for(b"10\n20\n30\n");
        let zero = reader.read_line(0).unwrap_err();
        assert!(matches!(zero, LineError::LineNumberTooSmall { line: 0 }));
        assert!(zero.is_recoverable());

        let past = reader.read_line(4).unwrap_err();
        assert!(matches!(past, LineError::NoSuchLine { line: 4 }));
        assert!(past.is_recoverable());
    }

    #[test]
    fn test_last_line_without_newline() {
        let (_file, reader) = reader_for(b"1\n2\n345");
        assert_eq!(reader.read_line(3).unwrap(), 345);
        assert!(reader.read_line(4).is_err());
    }

    #[test]
    fn test_trailing_garbage_ignored() {
        let (_file, reader) = reader_for(b"42abc\n  -7 apples\n+5\n");
        assert_eq!(reader.read_line(1).unwrap(), 42);
        assert_eq!(reader.read_line(2).unwrap(), -7);
        assert_eq!(reader.read_line(3).unwrap(), 5);
    }

    #[test]
    fn test_non_numeric_line() {
        let (_file, reader) = reader_for(b"1\n\nabc\n");
        assert!(matches!(
            reader.read_line(2),
            Err(LineError::NotNumeric { line: 2 })
        ));
        let err = reader.read_line(3).unwrap_err();
        assert!(matches!(err, LineError::NotNumeric { line: 3 }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_long_line_is_truncated() {
        let mut content = vec![b'9'; LINE_CAPACITY + 20];
        content.push(b'\n');
        let (_file, reader) = reader_for(&content);
        // 99 nines overflow i64, so the truncated copy still fails to parse.
        assert!(matches!(
            reader.read_line(1),
            Err(LineError::NotNumeric { line: 1 })
        ));

        let mut content = b"123".to_vec();
        content.extend(std::iter::repeat(b' ').take(LINE_CAPACITY));
        content.extend_from_slice(b"456\n");
        let (_file, reader) = reader_for(&content);
        assert_eq!(reader.read_line(1).unwrap(), 123);
    }

    #[test]
    fn test_empty_file() {
        let (_file, reader) = reader_for(b"");
        assert!(matches!(
            reader.read_line(1),
            Err(LineError::NoSuchLine { line: 1 })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let reader = FileLineReader::new(dir.path().join("input.txt"));
        let err = reader.read_line(1).unwrap_err();
        assert!(matches!(err, LineError::Io { .. }));
        assert!(!err.is_recoverable());
        assert!(err.to_string().starts_with("failed to read "));
    }

    #[test]
    fn test_locate_line() {
        let bytes = b"ab\ncd\n\nef";
        assert_eq!(locate_line(bytes, 1), Some((0, 3)));
        assert_eq!(locate_line(bytes, 2), Some((3, 6)));
        assert_eq!(locate_line(bytes, 3), Some((6, 7)));
        assert_eq!(locate_line(bytes, 4), Some((7, 9)));
        assert_eq!(locate_line(bytes, 5), None);
        assert_eq!(locate_line(bytes, 0), None);
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int(b"0"), Some(0));
        assert_eq!(parse_leading_int(b"\t 12\n"), Some(12));
        assert_eq!(parse_leading_int(b"-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_leading_int(b"9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_leading_int(b"9223372036854775808"), None);
        assert_eq!(parse_leading_int(b"-"), None);
        assert_eq!(parse_leading_int(b"x1"), None);
        assert_eq!(parse_leading_int(b""), None);
    }
}
