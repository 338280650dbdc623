//! The uploader: a caller-signed policy and token, a simple single-POST
//! path for small objects, and a resumable block/chunk engine with
//! persistable progress for everything else.

pub mod policy;
pub mod progress;
pub mod resumable;
pub mod simple;

pub use policy::UploadPolicy;
pub use progress::{BlockRecord, UploadProgress};
pub use resumable::ResumableUploader;
pub use simple::upload_simple;
