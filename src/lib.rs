#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

pub mod auth;
pub mod bytestr;
pub mod cdn;
pub mod constants;
pub mod credentials;
pub mod easy;
pub mod error;
pub mod http;
pub mod io;
pub mod json;
pub mod qetag;
pub mod region;
pub mod rpc;
mod time;
pub mod upload;

pub use credentials::{AccessKey, Credentials, SecretKey};
pub use error::{Error, ErrorKind, Result};
pub use region::{Region, RegionTable, SelectorFilter, SelectorStrategy, Service, ServiceEntry, ServiceKind, ServiceSelector};
pub use upload::{BlockRecord, ResumableUploader, UploadPolicy, UploadProgress};
