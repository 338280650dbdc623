//! Resumable-upload checkpoint state: per-block progress, serialized to
//! and from the exact wire format a caller can persist between process
//! runs.

use crate::error::{Error, ErrorKind, Result};
use crate::io::Reader;
use crate::json::formatter::Formatter;
use crate::json::parser::Parser;
use crate::json::{JsonArray, JsonObject, Value};

/// One block's upload state. A block is done when `uploaded == size` and
/// `last_context` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub index: usize,
    pub offset: u64,
    pub size: u64,
    pub uploaded: u64,
    pub last_context: String,
    pub context_expiry: i64,
}

impl BlockRecord {
    pub fn new(index: usize, offset: u64, size: u64) -> Self {
        BlockRecord {
            index,
            offset,
            size,
            uploaded: 0,
            last_context: String::new(),
            context_expiry: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.uploaded == self.size && !self.last_context.is_empty()
    }

    pub fn remaining(&self) -> u64 {
        self.size - self.uploaded
    }
}

/// The full checkpoint for one resumable upload: total file size, the
/// fixed block size it was sliced with, and one [`BlockRecord`] per
/// block in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadProgress {
    pub total_size: u64,
    pub block_size: u64,
    pub blocks: Vec<BlockRecord>,
}

impl UploadProgress {
    /// Slices `total_size` into fixed `block_size` blocks (the last one
    /// possibly short), all starting fresh.
    pub fn new(total_size: u64, block_size: u64) -> Self {
        let mut blocks = Vec::new();
        let mut offset = 0u64;
        let mut index = 0usize;
        while offset < total_size || (total_size == 0 && index == 0) {
            let size = block_size.min(total_size - offset);
            blocks.push(BlockRecord::new(index, offset, size));
            offset += size;
            index += 1;
            if total_size == 0 {
                break;
            }
        }
        UploadProgress {
            total_size,
            block_size,
            blocks,
        }
    }

    pub fn is_done(&self) -> bool {
        self.blocks.iter().all(BlockRecord::is_done)
    }

    pub fn first_unfinished(&self) -> Option<&BlockRecord> {
        self.blocks.iter().find(|b| !b.is_done())
    }

    pub fn first_unfinished_mut(&mut self) -> Option<&mut BlockRecord> {
        self.blocks.iter_mut().find(|b| !b.is_done())
    }

    /// Reattaches a deserialized progress object to a fresh reader,
    /// failing unless the reader's size exactly matches the recorded
    /// total size — §4.9's resume precondition.
    pub fn attach(self, reader: &dyn Reader) -> Result<Self> {
        let size = reader.size()?;
        if size != self.total_size {
            return Err(Error::new(
                ErrorKind::StorInvalidResumableSession,
                format!(
                    "reader size {size} does not match recorded progress size {}",
                    self.total_size
                ),
            ));
        }
        Ok(self)
    }

    pub fn to_value(&self) -> Value {
        let mut obj = JsonObject::new();
        obj.set("total_size".into(), Value::Int(self.total_size as i64)).unwrap();
        obj.set("block_size".into(), Value::Int(self.block_size as i64)).unwrap();
        let mut blocks = JsonArray::new();
        for block in &self.blocks {
            let mut b = JsonObject::new();
            b.set("index".into(), Value::Int(block.index as i64)).unwrap();
            b.set("offset".into(), Value::Int(block.offset as i64)).unwrap();
            b.set("size".into(), Value::Int(block.size as i64)).unwrap();
            b.set("uploaded".into(), Value::Int(block.uploaded as i64)).unwrap();
            b.set("ctx".into(), block.last_context.as_str().into()).unwrap();
            b.set("expired_at".into(), Value::Int(block.context_expiry)).unwrap();
            blocks.push(Value::Object(b)).unwrap();
        }
        obj.set("blocks".into(), Value::Array(blocks)).unwrap();
        Value::Object(obj)
    }

    pub fn to_json_string(&self) -> String {
        let bytes = Formatter::to_vec(&self.to_value(), Default::default());
        String::from_utf8(bytes).expect("formatter only emits valid UTF-8")
    }

    pub fn from_json_str(src: &str) -> Result<Self> {
        let mut parser = Parser::parse_object();
        let (outcome, _) = parser.feed(src.as_bytes());
        let value = match outcome {
            crate::json::parser::Outcome::Done(v) => v,
            _ => return Err(Error::new(ErrorKind::JsonBadTextInput, "malformed progress JSON")),
        };
        Self::from_value(&value)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::new(ErrorKind::JsonNotThisType, "progress root is not an object"))?;
        let total_size = req_int(obj, "total_size")? as u64;
        let block_size = req_int(obj, "block_size")? as u64;
        let blocks_value = obj
            .get(b"blocks")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::new(ErrorKind::InvalidArgument, "progress missing 'blocks' array"))?;

        let mut blocks = Vec::with_capacity(blocks_value.len());
        for item in blocks_value.iter() {
            let b = item
                .as_object()
                .ok_or_else(|| Error::new(ErrorKind::JsonNotThisType, "block record is not an object"))?;
            let last_context = b
                .get(b"ctx")
                .and_then(Value::as_str)
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            blocks.push(BlockRecord {
                index: req_int(b, "index")? as usize,
                offset: req_int(b, "offset")? as u64,
                size: req_int(b, "size")? as u64,
                uploaded: req_int(b, "uploaded")? as u64,
                last_context,
                context_expiry: req_int(b, "expired_at")? as i64,
            });
        }

        Ok(UploadProgress {
            total_size,
            block_size,
            blocks,
        })
    }
}

fn req_int(obj: &JsonObject, key: &str) -> Result<i64> {
    obj.get(key.as_bytes())
        .and_then(Value::as_int)
        .ok_or_else(|| Error::new(ErrorKind::InvalidArgument, format!("progress missing '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn slices_file_into_fixed_blocks_with_short_tail() {
        let progress = UploadProgress::new(10 * 1024 * 1024, 4 * 1024 * 1024);
        assert_eq!(progress.blocks.len(), 3);
        assert_eq!(progress.blocks[2].size, 2 * 1024 * 1024);
    }

    #[test]
    fn not_done_until_every_block_has_a_context() {
        let mut progress = UploadProgress::new(1, 4 * 1024 * 1024);
        assert!(!progress.is_done());
        progress.blocks[0].uploaded = 1;
        progress.blocks[0].last_context = "ctx".to_string();
        assert!(progress.is_done());
    }

    #[test]
    fn json_round_trips() {
        let mut progress = UploadProgress::new(5 * 1024 * 1024, 4 * 1024 * 1024);
        progress.blocks[0].uploaded = progress.blocks[0].size;
        progress.blocks[0].last_context = "abc".to_string();
        progress.blocks[0].context_expiry = 1234;

        let json = progress.to_json_string();
        let restored = UploadProgress::from_json_str(&json).unwrap();
        assert_eq!(restored, progress);
    }

    #[test]
    fn from_json_rejects_missing_blocks_field() {
        assert!(UploadProgress::from_json_str(r#"{"total_size":1,"block_size":1}"#).is_err());
    }
}
