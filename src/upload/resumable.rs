//! The block/chunk resumable-upload engine: `mkblk` → `bput`* → `mkfile`,
//! with bounded retry and a caller-observable abort flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::constants::{CHUNK_SIZE, DEFAULT_MAX_RETRIES};
use crate::error::{Error, ErrorKind, Result};
use crate::http::{Connection, HeaderMap};
use crate::io::{ReadOutcome, Reader};
use crate::json::parser::Parser;
use crate::json::Value;
use crate::upload::progress::{BlockRecord, UploadProgress};

/// One successful chunk response, as returned by both `mkblk` and `bput`.
struct ChunkAck {
    ctx: String,
    crc32: u32,
    offset: u64,
    expired_at: i64,
}

fn parse_chunk_ack(body: &[u8]) -> Result<ChunkAck> {
    let mut parser = Parser::parse_object();
    let (outcome, _) = parser.feed(body);
    let value = match outcome {
        crate::json::parser::Outcome::Done(v) => v,
        _ => {
            return Err(Error::new(
                ErrorKind::StorInvalidChunkPutResult,
                "chunk response was not a complete JSON object",
            ))
        }
    };
    let obj = value.as_object().ok_or_else(|| {
        Error::new(ErrorKind::StorInvalidChunkPutResult, "chunk response root is not an object")
    })?;
    let ctx = obj
        .get(b"ctx")
        .and_then(Value::as_str)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if ctx.is_empty() {
        return Err(Error::new(
            ErrorKind::StorInvalidChunkPutResult,
            "chunk response carried an empty context",
        ));
    }
    let crc32 = obj
        .get(b"crc32")
        .and_then(Value::as_int)
        .ok_or_else(|| Error::new(ErrorKind::StorInvalidChunkPutResult, "chunk response missing 'crc32'"))?
        as u32;
    let offset = obj
        .get(b"offset")
        .and_then(Value::as_int)
        .ok_or_else(|| Error::new(ErrorKind::StorInvalidChunkPutResult, "chunk response missing 'offset'"))?
        as u64;
    let expired_at = obj.get(b"expired_at").and_then(Value::as_int).unwrap_or(0);
    Ok(ChunkAck {
        ctx,
        crc32,
        offset,
        expired_at,
    })
}

/// Drives the block/chunk engine for one file against one `up_host`.
/// `max_retries` bounds retry of a single chunk/mkfile call on a
/// retryable failure; `abort` is checked before every chunk read.
pub struct ResumableUploader {
    conn: Connection,
    up_host: String,
    uptoken: String,
    max_retries: u32,
    abort: Option<Arc<AtomicBool>>,
}

impl ResumableUploader {
    pub fn new(conn: Connection, up_host: impl Into<String>, uptoken: impl Into<String>) -> Self {
        ResumableUploader {
            conn,
            up_host: up_host.into(),
            uptoken: uptoken.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            abort: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_abort_flag(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = Some(abort);
        self
    }

    fn is_aborted(&self) -> bool {
        self.abort.as_ref().is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", format!("UpToken {}", self.uptoken));
        headers.insert("Content-Type", "application/octet-stream");
        headers
    }

    /// Runs §4.9's upload loop to completion (or a retryable failure,
    /// which surfaces as `Err` with `progress` left consistent for a
    /// later retry).
    pub async fn upload(&self, reader: &mut dyn Reader, progress: &mut UploadProgress, key: Option<&str>) -> Result<Value> {
        while let Some(idx) = progress.blocks.iter().position(|b| !b.is_done()) {
            self.drive_block(reader, &mut progress.blocks[idx]).await?;
        }
        self.mkfile(reader.size()?, key, progress).await
    }

    async fn drive_block(&self, reader: &dyn Reader, block: &mut BlockRecord) -> Result<()> {
        while !block.is_done() {
            if self.is_aborted() {
                return Err(Error::new(
                    ErrorKind::StorPuttingAbortedByFilter,
                    "resumable upload aborted",
                ));
            }

            reset_block_if_context_expired(block, crate::time::unix_now());

            let chunk_len = block.remaining().min(CHUNK_SIZE);
            let section = reader.section(block.offset + block.uploaded, chunk_len)?;
            let chunk = read_whole(section).await?;
            let crc = crc32fast::hash(&chunk);

            let ack = self.put_chunk(block, &chunk).await?;
            if ack.crc32 != crc {
                return Err(Error::new(
                    ErrorKind::StorInvalidChunkPutResult,
                    "server-reported chunk CRC32 did not match the local checksum",
                ));
            }
            if ack.offset != block.uploaded + chunk.len() as u64 {
                return Err(Error::new(
                    ErrorKind::StorInvalidChunkPutResult,
                    "server-reported block offset did not match the expected offset",
                ));
            }

            block.uploaded += chunk.len() as u64;
            block.last_context = ack.ctx;
            block.context_expiry = ack.expired_at;
        }
        Ok(())
    }

    async fn put_chunk(&self, block: &BlockRecord, chunk: &[u8]) -> Result<ChunkAck> {
        let url = if block.uploaded == 0 {
            format!("{}/mkblk/{}", self.up_host, block.size)
        } else {
            format!("{}/bput/{}/{}", self.up_host, block.last_context, block.uploaded)
        };
        let body = self.post_with_retry(&url, chunk.to_vec()).await?;
        parse_chunk_ack(&body)
    }

    async fn mkfile(&self, file_size: u64, key: Option<&str>, progress: &UploadProgress) -> Result<Value> {
        let mut url = format!("{}/mkfile/{}", self.up_host, file_size);
        if let Some(key) = key {
            url.push_str("/key/");
            url.push_str(&URL_SAFE_NO_PAD.encode(key.as_bytes()));
        }
        let ctxs: Vec<&str> = progress.blocks.iter().map(|b| b.last_context.as_str()).collect();
        let body = ctxs.join(",").into_bytes();
        let resp_body = self.post_with_retry(&url, body).await?;

        let mut parser = Parser::parse_object();
        let (outcome, _) = parser.feed(&resp_body);
        match outcome {
            crate::json::parser::Outcome::Done(value) => Ok(value),
            _ => Err(Error::new(
                ErrorKind::StorApiReturnNoValue,
                "mkfile response was not a complete JSON object",
            )),
        }
    }

    /// Posts `body` to `url`, retrying on a recoverable transport error
    /// or a retryable HTTP status up to `max_retries` times with
    /// exponential backoff, and returns the raw response bytes of the
    /// first successful (HTTP 200) reply.
    async fn post_with_retry(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>> {
        let headers = self.auth_headers();
        let mut attempt = 0u32;
        loop {
            let result = self.conn.post_bytes(url, &headers, body.clone()).await;
            match result {
                Ok((200, resp_body)) => return Ok(resp_body),
                Ok((status, resp_body)) => {
                    let msg = String::from_utf8_lossy(&resp_body).into_owned();
                    let err = Error::new(
                        ErrorKind::StorInvalidChunkPutResult,
                        format!("upload call returned HTTP {status}: {msg}"),
                    );
                    if attempt >= self.max_retries || !should_retry_status(status) {
                        return Err(err);
                    }
                }
                Err(e) if e.is_recoverable() && attempt < self.max_retries => {}
                Err(e) => return Err(e),
            }
            attempt += 1;
            tokio::time::sleep(backoff_delay(attempt)).await;
        }
    }
}

/// A chunk ack's `expired_at` is only meaningful once a chunk has
/// actually been uploaded for this block (`expired_at == 0` means "the
/// server didn't report one" and is never treated as expired). Expiry
/// discards the block's progress so it restarts from offset 0, per the
/// "expired context: treat like a chunk failure on that block" rule.
fn reset_block_if_context_expired(block: &mut BlockRecord, now: i64) {
    if block.uploaded > 0 && block.context_expiry != 0 && now >= block.context_expiry {
        block.uploaded = 0;
        block.last_context.clear();
        block.context_expiry = 0;
    }
}

fn should_retry_status(status: u16) -> bool {
    status == 0 || status >= 500 || status == 579 || status == 406
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(200 * 2u64.saturating_pow(attempt.min(6)))
}

async fn read_whole(mut reader: Box<dyn Reader>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 64 * 1024];
    loop {
        match reader.read(&mut chunk)? {
            ReadOutcome::Data(n) => buf.extend_from_slice(&chunk[..n]),
            ReadOutcome::Eof => break,
            ReadOutcome::Aborted => {
                return Err(Error::new(
                    ErrorKind::StorPuttingAbortedByFilter,
                    "chunk read was aborted",
                ))
            }
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_chunk_ack() {
        let ack = parse_chunk_ack(br#"{"ctx":"abc","checksum":"x","crc32":123,"offset":262144,"host":"h","expired_at":999}"#).unwrap();
        assert_eq!(ack.ctx, "abc");
        assert_eq!(ack.crc32, 123);
        assert_eq!(ack.offset, 262144);
        assert_eq!(ack.expired_at, 999);
    }

    #[test]
    fn rejects_empty_context() {
        let err = parse_chunk_ack(br#"{"ctx":"","crc32":1,"offset":0}"#).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::StorInvalidChunkPutResult));
    }

    #[test]
    fn backoff_grows_geometrically() {
        assert!(backoff_delay(2) > backoff_delay(1));
        assert!(backoff_delay(1) > backoff_delay(0));
    }

    #[test]
    fn expired_context_discards_block_progress() {
        let mut block = BlockRecord::new(0, 0, CHUNK_SIZE * 2);
        block.uploaded = CHUNK_SIZE;
        block.last_context = "ctx".to_string();
        block.context_expiry = 1_000;
        reset_block_if_context_expired(&mut block, 1_001);
        assert_eq!(block.uploaded, 0);
        assert!(block.last_context.is_empty());
        assert_eq!(block.context_expiry, 0);
    }

    #[test]
    fn unexpired_context_is_left_alone() {
        let mut block = BlockRecord::new(0, 0, CHUNK_SIZE * 2);
        block.uploaded = CHUNK_SIZE;
        block.last_context = "ctx".to_string();
        block.context_expiry = 1_000;
        reset_block_if_context_expired(&mut block, 999);
        assert_eq!(block.uploaded, CHUNK_SIZE);
        assert_eq!(block.last_context, "ctx");
    }

    #[test]
    fn zero_expiry_is_never_treated_as_expired() {
        let mut block = BlockRecord::new(0, 0, CHUNK_SIZE * 2);
        block.uploaded = CHUNK_SIZE;
        block.last_context = "ctx".to_string();
        block.context_expiry = 0;
        reset_block_if_context_expired(&mut block, 9_999_999_999);
        assert_eq!(block.uploaded, CHUNK_SIZE);
    }
}
