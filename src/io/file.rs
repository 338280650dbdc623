use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Error, ErrorKind, Result};
use crate::io::section::{FdPolicy, FileSectionReader};
use crate::io::{ReadOutcome, Reader};

/// A sequential reader over an OS file. `duplicate` reopens the file by
/// path rather than `dup`-ing the descriptor: a `dup`'d descriptor shares
/// its underlying file offset with the original on POSIX, which is the
/// opposite of the independent cursor this is supposed to hand back.
#[derive(Debug)]
pub struct FileReader {
    file: File,
    path: PathBuf,
    name: String,
    size: u64,
}

impl FileReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| {
            Error::new(ErrorKind::FileOpeningFailed, format!("{}: {}", path.display(), e))
        })?;
        let size = file
            .metadata()
            .map_err(|e| Error::new(ErrorKind::FileStatingFailed, e.to_string()))?
            .len();
        let name = path.display().to_string();
        Ok(FileReader {
            file,
            path,
            name,
            size,
        })
    }

    pub(crate) fn reopen_for_section(&self) -> Result<File> {
        File::open(&self.path).map_err(|e| {
            Error::new(
                ErrorKind::FileDuplicatingFailed,
                format!("{}: {}", self.path.display(), e),
            )
        })
    }
}

impl Reader for FileReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        let n = self
            .file
            .read(buf)
            .map_err(|e| Error::new(ErrorKind::FileReadingFailed, e.to_string()))?;
        Ok(if n == 0 {
            ReadOutcome::Eof
        } else {
            ReadOutcome::Data(n)
        })
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(pos))
            .map_err(|e| Error::new(ErrorKind::FileSeekingFailed, e.to_string()))?;
        Ok(())
    }

    fn advance(&mut self, delta: i64) -> Result<()> {
        self.file
            .seek(SeekFrom::Current(delta))
            .map_err(|e| Error::new(ErrorKind::FileSeekingFailed, e.to_string()))?;
        Ok(())
    }

    fn duplicate(&self) -> Result<Box<dyn Reader>> {
        Ok(Box::new(FileReader::open(&self.path)?))
    }

    fn section(&self, offset: u64, len: u64) -> Result<Box<dyn Reader>> {
        if offset.saturating_add(len) > self.size {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "section range exceeds file size",
            ));
        }
        let file = self.reopen_for_section()?;
        Ok(Box::new(FileSectionReader::new(
            file,
            self.name.clone(),
            offset,
            len,
            FdPolicy::Exclusive,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &[u8]) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("sdk-file-reader-test-{}", std::process::id()));
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    #[test]
    fn reads_whole_file_and_reports_size() {
        let path = write_temp(b"hello world");
        let mut reader = FileReader::open(&path).unwrap();
        assert_eq!(reader.size().unwrap(), 11);
        let mut buf = [0u8; 32];
        let outcome = reader.read(&mut buf).unwrap();
        assert_eq!(outcome, ReadOutcome::Data(11));
        assert_eq!(&buf[..11], b"hello world");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn duplicate_has_independent_cursor() {
        let path = write_temp(b"0123456789");
        let mut a = FileReader::open(&path).unwrap();
        let mut b = a.duplicate().unwrap();
        let mut buf = [0u8; 4];
        a.read(&mut buf).unwrap();
        assert_eq!(&buf, b"0123");
        let mut buf2 = [0u8; 4];
        b.read(&mut buf2).unwrap();
        assert_eq!(&buf2, b"0123");
        let _ = std::fs::remove_file(&path);
    }
}
