use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, ErrorKind, Result};
use crate::io::{ReadOutcome, Reader};

/// A post-read observer. Called with exactly the bytes a `read` call
/// actually delivered; returning `false` aborts that read with
/// `StorPuttingAbortedByFilter`. Used to feed a running content-hash
/// context without a second pass over the file.
pub trait ReadFilter: Send + std::fmt::Debug {
    fn on_read(&mut self, data: &[u8]) -> bool;
}

/// Wraps a reader with zero or more [`ReadFilter`]s and an optional
/// cooperative abort flag.
///
/// Filters only ever see bytes from `read`, never from `peek`: the point
/// of a filter is to account for bytes that are actually being consumed
/// (and, during an upload, handed to the HTTP layer), and a peek-then-read
/// pair delivers the same bytes twice without consuming the second time —
/// counting both would double the accounted size.
#[derive(Debug)]
pub struct FilterReader {
    inner: Box<dyn Reader>,
    filters: Vec<Box<dyn ReadFilter>>,
    abort_flag: Option<Arc<AtomicBool>>,
}

impl FilterReader {
    pub fn new(inner: Box<dyn Reader>) -> Self {
        FilterReader {
            inner,
            filters: Vec::new(),
            abort_flag: None,
        }
    }

    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort_flag = Some(flag);
        self
    }

    pub fn add_filter(&mut self, filter: Box<dyn ReadFilter>) {
        self.filters.push(filter);
    }
}

impl Reader for FilterReader {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn size(&self) -> Result<u64> {
        self.inner.size()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        let outcome = self.inner.read(buf)?;
        if let ReadOutcome::Data(n) = outcome {
            for filter in &mut self.filters {
                if !filter.on_read(&buf[..n]) {
                    return Err(Error::new(
                        ErrorKind::StorPuttingAbortedByFilter,
                        "a post-read filter rejected the data it was handed",
                    ));
                }
            }
            if let Some(flag) = &self.abort_flag {
                if flag.load(Ordering::Relaxed) {
                    return Ok(ReadOutcome::Aborted);
                }
            }
        }
        Ok(outcome)
    }

    fn peek(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        self.inner.peek(buf)
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(pos)
    }

    fn advance(&mut self, delta: i64) -> Result<()> {
        self.inner.advance(delta)
    }

    fn duplicate(&self) -> Result<Box<dyn Reader>> {
        // Filters and the abort flag are this session's bookkeeping, not
        // part of the underlying data; a duplicate is a fresh, unfiltered
        // cursor onto the same bytes, same as any other reader variant.
        self.inner.duplicate()
    }

    fn section(&self, offset: u64, len: u64) -> Result<Box<dyn Reader>> {
        self.inner.section(offset, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::FileReader;
    use std::io::Write;

    #[derive(Debug, Default)]
    struct CountingFilter {
        bytes_seen: usize,
    }

    impl ReadFilter for CountingFilter {
        fn on_read(&mut self, data: &[u8]) -> bool {
            self.bytes_seen += data.len();
            true
        }
    }

    #[derive(Debug)]
    struct RejectingFilter;

    impl ReadFilter for RejectingFilter {
        fn on_read(&mut self, _data: &[u8]) -> bool {
            false
        }
    }

    fn write_temp(content: &[u8]) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("sdk-filter-reader-test-{}", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    #[test]
    fn filter_sees_only_actually_read_bytes() {
        let path = write_temp(b"hello world");
        let file_reader = FileReader::open(&path).unwrap();
        let mut reader = FilterReader::new(Box::new(file_reader));
        reader.add_filter(Box::new(CountingFilter::default()));
        let mut buf = [0u8; 5];
        reader.peek(&mut buf).unwrap();
        reader.read(&mut buf).unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejecting_filter_aborts_the_read() {
        let path = write_temp(b"hello world");
        let file_reader = FileReader::open(&path).unwrap();
        let mut reader = FilterReader::new(Box::new(file_reader));
        reader.add_filter(Box::new(RejectingFilter));
        let mut buf = [0u8; 5];
        let result = reader.read(&mut buf);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            Some(ErrorKind::StorPuttingAbortedByFilter)
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn abort_flag_surfaces_as_aborted_outcome() {
        let path = write_temp(b"hello world");
        let file_reader = FileReader::open(&path).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let mut reader = FilterReader::new(Box::new(file_reader)).with_abort_flag(flag);
        let mut buf = [0u8; 5];
        let outcome = reader.read(&mut buf).unwrap();
        assert_eq!(outcome, ReadOutcome::Aborted);
        let _ = std::fs::remove_file(&path);
    }
}
