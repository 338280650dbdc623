//! Qiniu's content hash: SHA-1 per 4 MiB block, and — for multi-block
//! content — a second SHA-1 over the concatenated block digests. Either
//! way the result is a single tag byte followed by the final digest,
//! base64-url-safe-no-pad encoded.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha1::{Digest, Sha1};

use crate::constants::BLOCK_SIZE;
use crate::error::{Error, ErrorKind, Result};

const SINGLE_BLOCK_TAG: u8 = 0x16;
const MULTI_BLOCK_TAG: u8 = 0x96;

/// Incrementally computes a qetag over data fed in arbitrary-sized
/// chunks via [`update`](Self::update).
pub struct QetagBuilder {
    current_block: Vec<u8>,
    block_digests: Vec<[u8; 20]>,
    total_len: u64,
}

impl Default for QetagBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QetagBuilder {
    pub fn new() -> Self {
        QetagBuilder {
            current_block: Vec::with_capacity(BLOCK_SIZE as usize),
            block_digests: Vec::new(),
            total_len: 0,
        }
    }

    /// Feeds more content bytes, hashing and releasing any block that
    /// fills up along the way.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let mut rest = data;
        while !rest.is_empty() {
            let room = (BLOCK_SIZE as usize).saturating_sub(self.current_block.len());
            if room == 0 {
                return Err(Error::new(
                    ErrorKind::QetagUpdatingFailed,
                    "qetag block buffer overflowed its fixed capacity",
                ));
            }
            let take = room.min(rest.len());
            self.current_block.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            self.total_len += take as u64;
            if self.current_block.len() as u64 == BLOCK_SIZE {
                self.flush_block();
            }
        }
        Ok(())
    }

    fn flush_block(&mut self) {
        let digest = Sha1::digest(&self.current_block);
        self.block_digests.push(digest.into());
        self.current_block.clear();
    }

    /// Finishes the computation, returning the encoded qetag.
    pub fn finalize(mut self) -> Result<String> {
        if !self.current_block.is_empty() || self.block_digests.is_empty() {
            self.flush_block();
        }

        let (tag, digest) = if self.block_digests.len() == 1 {
            (SINGLE_BLOCK_TAG, self.block_digests[0].to_vec())
        } else {
            let mut concatenated = Vec::with_capacity(self.block_digests.len() * 20);
            for d in &self.block_digests {
                concatenated.extend_from_slice(d);
            }
            let outer = Sha1::digest(&concatenated);
            (MULTI_BLOCK_TAG, outer.to_vec())
        };

        let mut out = Vec::with_capacity(1 + digest.len());
        out.push(tag);
        out.extend_from_slice(&digest);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }
}

/// Computes the qetag of a single in-memory buffer.
pub fn qetag(data: &[u8]) -> Result<String> {
    let mut builder = QetagBuilder::new();
    for chunk in data.chunks(64 * 1024) {
        builder.update(chunk)?;
    }
    builder.finalize().map_err(|_| {
        Error::new(ErrorKind::QetagMakingDigestFailed, "failed to finalize qetag digest")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_hashes_as_a_single_empty_block() {
        let tag = qetag(b"").unwrap();
        let raw = URL_SAFE_NO_PAD.decode(&tag).unwrap();
        assert_eq!(raw[0], SINGLE_BLOCK_TAG);
        assert_eq!(raw.len(), 21);
    }

    #[test]
    fn same_input_hashes_identically() {
        let a = qetag(b"hello, world").unwrap();
        let b = qetag(b"hello, world").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn multi_block_input_uses_the_multi_block_tag() {
        let data = vec![0xABu8; (BLOCK_SIZE as usize) + 1];
        let tag = qetag(&data).unwrap();
        let raw = URL_SAFE_NO_PAD.decode(&tag).unwrap();
        assert_eq!(raw[0], MULTI_BLOCK_TAG);
    }

    #[test]
    fn incremental_update_matches_one_shot() {
        let data = vec![0x42u8; (BLOCK_SIZE as usize) * 2 + 17];
        let one_shot = qetag(&data).unwrap();

        let mut builder = QetagBuilder::new();
        for chunk in data.chunks(4096) {
            builder.update(chunk).unwrap();
        }
        let incremental = builder.finalize().unwrap();

        assert_eq!(one_shot, incremental);
    }
}
