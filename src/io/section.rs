use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::os::unix::fs::FileExt;
use std::sync::Arc;

use crate::error::{Error, ErrorKind, Result};
use crate::io::{ReadOutcome, Reader};

/// Whether a [`FileSectionReader`] owns an exclusive file descriptor
/// (seeks and reads normally) or shares a reference-counted one with
/// sibling sections of the same file (uses `pread` so concurrent sections
/// don't race each other's file offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdPolicy {
    Exclusive,
    Shared,
}

#[derive(Debug)]
enum Backing {
    Exclusive(File),
    Shared(Arc<File>),
}

/// A bounded `[offset, offset + len)` view over a file.
#[derive(Debug)]
pub struct FileSectionReader {
    backing: Backing,
    name: String,
    offset: u64,
    len: u64,
    pos: u64,
}

impl FileSectionReader {
    pub fn new(file: File, name: String, offset: u64, len: u64, policy: FdPolicy) -> Result<Self> {
        let backing = match policy {
            FdPolicy::Exclusive => {
                let mut file = file;
                file.seek(SeekFrom::Start(offset))
                    .map_err(|e| Error::new(ErrorKind::FileSeekingFailed, e.to_string()))?;
                Backing::Exclusive(file)
            }
            FdPolicy::Shared => Backing::Shared(Arc::new(file)),
        };
        Ok(FileSectionReader {
            backing,
            name,
            offset,
            len,
            pos: 0,
        })
    }

    pub(crate) fn new_shared(file: Arc<File>, name: String, offset: u64, len: u64) -> Self {
        FileSectionReader {
            backing: Backing::Shared(file),
            name,
            offset,
            len,
            pos: 0,
        }
    }

    fn remaining(&self) -> u64 {
        self.len - self.pos
    }
}

impl Reader for FileSectionReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> Result<u64> {
        Ok(self.len)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(ReadOutcome::Eof);
        }
        let want = (buf.len() as u64).min(remaining) as usize;
        let n = match &mut self.backing {
            Backing::Exclusive(f) => f
                .read(&mut buf[..want])
                .map_err(|e| Error::new(ErrorKind::FileReadingFailed, e.to_string()))?,
            Backing::Shared(f) => f
                .read_at(&mut buf[..want], self.offset + self.pos)
                .map_err(|e| Error::new(ErrorKind::FileReadingFailed, e.to_string()))?,
        };
        self.pos += n as u64;
        Ok(if n == 0 {
            ReadOutcome::Eof
        } else {
            ReadOutcome::Data(n)
        })
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.len {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "seek past the end of the section",
            ));
        }
        if let Backing::Exclusive(f) = &mut self.backing {
            f.seek(SeekFrom::Start(self.offset + pos))
                .map_err(|e| Error::new(ErrorKind::FileSeekingFailed, e.to_string()))?;
        }
        self.pos = pos;
        Ok(())
    }

    fn advance(&mut self, delta: i64) -> Result<()> {
        let new_pos = self.pos as i64 + delta;
        if new_pos < 0 {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "advance before the start of the section",
            ));
        }
        self.seek(new_pos as u64)
    }

    fn duplicate(&self) -> Result<Box<dyn Reader>> {
        match &self.backing {
            Backing::Exclusive(f) => {
                let cloned = f
                    .try_clone()
                    .map_err(|e| Error::new(ErrorKind::FileDuplicatingFailed, e.to_string()))?;
                Ok(Box::new(FileSectionReader::new(
                    cloned,
                    self.name.clone(),
                    self.offset,
                    self.len,
                    FdPolicy::Exclusive,
                )?))
            }
            Backing::Shared(f) => Ok(Box::new(FileSectionReader::new_shared(
                Arc::clone(f),
                self.name.clone(),
                self.offset,
                self.len,
            ))),
        }
    }

    fn section(&self, offset: u64, len: u64) -> Result<Box<dyn Reader>> {
        if offset.saturating_add(len) > self.len {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "nested section exceeds parent section's bounds",
            ));
        }
        match &self.backing {
            Backing::Exclusive(f) => {
                let cloned = f
                    .try_clone()
                    .map_err(|e| Error::new(ErrorKind::FileDuplicatingFailed, e.to_string()))?;
                Ok(Box::new(FileSectionReader::new(
                    cloned,
                    self.name.clone(),
                    self.offset + offset,
                    len,
                    FdPolicy::Exclusive,
                )?))
            }
            Backing::Shared(f) => Ok(Box::new(FileSectionReader::new_shared(
                Arc::clone(f),
                self.name.clone(),
                self.offset + offset,
                len,
            ))),
        }
    }
}

/// A bounded sub-range view over any [`Reader`], built in user space
/// without assuming the backing reader is a file.
#[derive(Debug)]
pub struct SectionReader {
    inner: Box<dyn Reader>,
    offset: u64,
    len: u64,
    pos: u64,
}

impl SectionReader {
    pub fn new(mut inner: Box<dyn Reader>, offset: u64, len: u64) -> Result<Self> {
        inner.seek(offset)?;
        Ok(SectionReader {
            inner,
            offset,
            len,
            pos: 0,
        })
    }

    fn remaining(&self) -> u64 {
        self.len - self.pos
    }
}

impl Reader for SectionReader {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn size(&self) -> Result<u64> {
        Ok(self.len)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(ReadOutcome::Eof);
        }
        let want = (buf.len() as u64).min(remaining) as usize;
        let outcome = self.inner.read(&mut buf[..want])?;
        if let ReadOutcome::Data(n) = outcome {
            self.pos += n as u64;
        }
        Ok(outcome)
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.len {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "seek past the end of the section",
            ));
        }
        self.inner.seek(self.offset + pos)?;
        self.pos = pos;
        Ok(())
    }

    fn advance(&mut self, delta: i64) -> Result<()> {
        let new_pos = self.pos as i64 + delta;
        if new_pos < 0 {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "advance before the start of the section",
            ));
        }
        self.seek(new_pos as u64)
    }

    fn duplicate(&self) -> Result<Box<dyn Reader>> {
        Ok(Box::new(SectionReader::new(
            self.inner.duplicate()?,
            self.offset,
            self.len,
        )?))
    }

    fn section(&self, offset: u64, len: u64) -> Result<Box<dyn Reader>> {
        if offset.saturating_add(len) > self.len {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "nested section exceeds parent section's bounds",
            ));
        }
        Ok(Box::new(SectionReader::new(
            self.inner.duplicate()?,
            self.offset + offset,
            len,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::FileReader;
    use std::io::Write;

    fn write_temp(content: &[u8]) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("sdk-section-reader-test-{}", std::process::id()));
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    #[test]
    fn section_never_reads_outside_its_bounds() {
        let path = write_temp(b"0123456789");
        let file_reader = FileReader::open(&path).unwrap();
        let mut section = file_reader.section(3, 4).unwrap();
        let mut buf = [0u8; 10];
        let outcome = section.read(&mut buf).unwrap();
        assert_eq!(outcome, ReadOutcome::Data(4));
        assert_eq!(&buf[..4], b"3456");
        assert_eq!(section.read(&mut buf).unwrap(), ReadOutcome::Eof);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn peek_does_not_change_subsequent_read() {
        let path = write_temp(b"abcdef");
        let file_reader = FileReader::open(&path).unwrap();
        let mut section = file_reader.section(0, 6).unwrap();
        let mut peek_buf = [0u8; 3];
        section.peek(&mut peek_buf).unwrap();
        assert_eq!(&peek_buf, b"abc");
        let mut read_buf = [0u8; 3];
        section.read(&mut read_buf).unwrap();
        assert_eq!(&read_buf, b"abc");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn shared_policy_sections_do_not_race_each_others_offset() {
        let path = write_temp(b"0123456789");
        let file = File::open(&path).unwrap();
        let shared = Arc::new(file);
        let mut a = FileSectionReader::new_shared(Arc::clone(&shared), "t".into(), 0, 5);
        let mut b = FileSectionReader::new_shared(Arc::clone(&shared), "t".into(), 5, 5);
        let mut buf_a = [0u8; 5];
        let mut buf_b = [0u8; 5];
        b.read(&mut buf_b).unwrap();
        a.read(&mut buf_a).unwrap();
        assert_eq!(&buf_a, b"01234");
        assert_eq!(&buf_b, b"56789");
        let _ = std::fs::remove_file(&path);
    }
}
