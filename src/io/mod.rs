//! A polymorphic byte source, used as the request-body side of uploads.
//!
//! The source's vtable-style polymorphism (a struct of function pointers
//! shared by every reader variant) becomes a plain trait here; the small
//! closed set of variants (file, file-section, generic section, filter)
//! each implement it directly rather than going through an indirection
//! layer that Rust doesn't need.

mod file;
mod filter;
mod section;

pub use file::FileReader;
pub use filter::{FilterReader, ReadFilter};
pub use section::{FdPolicy, FileSectionReader, SectionReader};

use crate::error::Result;

/// The result of a single `read`/`peek` call. A normal short read (fewer
/// bytes than the buffer holds) is still `Data(n)`; only a zero-byte read
/// is `Eof`. `Aborted` is the caller-triggered-cancellation outcome (an
/// upload's abort flag was observed set); it is not an [`crate::error::Error`]
/// because it is an expected, caller-requested termination rather than a
/// fault — a downstream filter *failing*, by contrast, is a fault and is
/// reported as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Data(usize),
    Eof,
    Aborted,
}

/// A byte source that can be read sequentially, peeked without consuming,
/// repositioned, duplicated onto an independent cursor, and bounded to a
/// sub-range.
pub trait Reader: Send + std::fmt::Debug {
    /// A diagnostic name (a file path, "<buffer>", etc.), not necessarily unique.
    fn name(&self) -> &str;

    /// The total size of the readable range, if known up front.
    fn size(&self) -> Result<u64>;

    /// Reads into `buf`, returning how much was read. May return fewer
    /// bytes than `buf.len()` even before EOF.
    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome>;

    /// Reads into `buf` without consuming: implemented as `read` followed
    /// by a negative `advance`, so it counts only once for any filter
    /// observing the *subsequent* real `read` of the same bytes. Readers
    /// with cheaper native peek semantics may override this.
    fn peek(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        let outcome = self.read(buf)?;
        if let ReadOutcome::Data(n) = outcome {
            self.advance(-(n as i64))?;
        }
        Ok(outcome)
    }

    /// Repositions the cursor to an absolute offset within this reader's range.
    fn seek(&mut self, pos: u64) -> Result<()>;

    /// Repositions the cursor by a relative offset.
    fn advance(&mut self, delta: i64) -> Result<()>;

    /// An independent cursor over the same underlying data.
    fn duplicate(&self) -> Result<Box<dyn Reader>>;

    /// A bounded sub-range view, `[offset, offset + len)`, of this reader.
    fn section(&self, offset: u64, len: u64) -> Result<Box<dyn Reader>>;
}
