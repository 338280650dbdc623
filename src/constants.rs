/// Fixed block size for the resumable uploader: 4 MiB.
pub const BLOCK_SIZE: u64 = 4 * 1024 * 1024;

/// Fixed chunk size within a block: 256 KiB.
pub const CHUNK_SIZE: u64 = 256 * 1024;

/// Maximum number of key/value pairs a [`crate::json::JsonObject`] may hold.
pub const JSON_OBJECT_MAX_CAPACITY: usize = 65_535;

/// Maximum number of values a [`crate::json::JsonArray`] may hold.
pub const JSON_ARRAY_MAX_CAPACITY: usize = 65_535;

/// Default pushdown-parser depth limit (levels of nested object/array).
pub const JSON_DEFAULT_DEPTH_LIMIT: usize = 4;

/// Minimum size of the tokenizer's multi-chunk text accumulator.
pub const JSON_TEXT_ACCUMULATOR_MIN: usize = 1024;

/// Maximum number of entries a [`crate::region::Service`] may hold.
pub const SERVICE_MAX_ENTRIES: usize = 255;

/// Region discovery falls back to this TTL (seconds) if the response omits one.
pub const DEFAULT_REGION_TTL_SECS: i64 = 86400;

/// Default bound on chunk/block retries before the uploader surfaces a
/// transport failure with progress preserved.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Region discovery endpoint.
pub const REGION_DISCOVERY_HOST: &str = "http://uc.qbox.me";

/// SHA-1 digest (hex) of an empty payload, used as the canonical hash of a
/// zero-length body.
pub const EMPTY_PAYLOAD_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

/// Uploads at or below this size go through a single POST rather than the
/// resumable block/chunk engine.
pub const SIMPLE_UPLOAD_THRESHOLD: u64 = BLOCK_SIZE;
