//! The batteries-included façade: object management (stat/copy/move/
//! delete/list/batch) and upload dispatch (simple vs. resumable, chosen
//! by size) over the lower-level `region`/`upload`/`rpc` primitives.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::auth::make_upload_token;
use crate::constants::SIMPLE_UPLOAD_THRESHOLD;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::http::Connection;
use crate::io::Reader;
use crate::json::Value;
use crate::region::{Region, Service, ServiceKind};
use crate::rpc;
use crate::upload::policy::UploadPolicy;
use crate::upload::progress::UploadProgress;
use crate::upload::resumable::ResumableUploader;
use crate::upload::simple::upload_simple;

fn encode_entry(bucket: &str, key: &str) -> String {
    URL_SAFE_NO_PAD.encode(format!("{bucket}:{key}").as_bytes())
}

fn base_url(region: &Region, kind: ServiceKind) -> String {
    let service: Service = region.service_or_default(kind);
    service
        .entries()
        .first()
        .map(|e| e.base_url.clone())
        .unwrap_or_else(|| Service::default_for(kind).entries()[0].base_url.clone())
}

/// Object metadata as `stat` returns it.
#[tracing::instrument(level = "debug", skip(conn, credentials))]
pub async fn stat(
    conn: &Connection,
    credentials: &Credentials,
    region: &Region,
    bucket: &str,
    key: &str,
) -> Result<Value> {
    let url = format!("{}/stat/{}", base_url(region, ServiceKind::Rs), encode_entry(bucket, key));
    rpc::call(conn, credentials, &url).await
}

#[tracing::instrument(level = "debug", skip(conn, credentials))]
pub async fn copy(
    conn: &Connection,
    credentials: &Credentials,
    region: &Region,
    src_bucket: &str,
    src_key: &str,
    dst_bucket: &str,
    dst_key: &str,
) -> Result<Value> {
    let url = format!(
        "{}/copy/{}/{}",
        base_url(region, ServiceKind::Rs),
        encode_entry(src_bucket, src_key),
        encode_entry(dst_bucket, dst_key)
    );
    rpc::call(conn, credentials, &url).await
}

#[tracing::instrument(level = "debug", skip(conn, credentials))]
pub async fn move_object(
    conn: &Connection,
    credentials: &Credentials,
    region: &Region,
    src_bucket: &str,
    src_key: &str,
    dst_bucket: &str,
    dst_key: &str,
) -> Result<Value> {
    let url = format!(
        "{}/move/{}/{}",
        base_url(region, ServiceKind::Rs),
        encode_entry(src_bucket, src_key),
        encode_entry(dst_bucket, dst_key)
    );
    rpc::call(conn, credentials, &url).await
}

#[tracing::instrument(level = "debug", skip(conn, credentials))]
pub async fn delete(
    conn: &Connection,
    credentials: &Credentials,
    region: &Region,
    bucket: &str,
    key: &str,
) -> Result<Value> {
    let url = format!("{}/delete/{}", base_url(region, ServiceKind::Rs), encode_entry(bucket, key));
    rpc::call(conn, credentials, &url).await
}

/// Lists up to `limit` keys under `prefix`, optionally continuing from a
/// previous call's `marker`.
#[tracing::instrument(level = "debug", skip(conn, credentials))]
pub async fn list(
    conn: &Connection,
    credentials: &Credentials,
    region: &Region,
    bucket: &str,
    prefix: &str,
    marker: Option<&str>,
    limit: u32,
) -> Result<Value> {
    let mut url = format!(
        "{}/list?bucket={}&prefix={}&limit={}",
        base_url(region, ServiceKind::Rsf),
        utf8_percent_encode(bucket, NON_ALPHANUMERIC),
        utf8_percent_encode(prefix, NON_ALPHANUMERIC),
        limit
    );
    if let Some(marker) = marker {
        url.push_str("&marker=");
        url.push_str(&utf8_percent_encode(marker, NON_ALPHANUMERIC).to_string());
    }
    rpc::call(conn, credentials, &url).await
}

/// Runs a batch of already-formatted `op=...` operation strings (e.g.
/// `"stat/<entry>"`, `"delete/<entry>"`) in one request.
#[tracing::instrument(level = "debug", skip(conn, credentials, ops))]
pub async fn batch(
    conn: &Connection,
    credentials: &Credentials,
    region: &Region,
    ops: &[String],
) -> Result<Value> {
    let url = format!("{}/batch", base_url(region, ServiceKind::Rs));
    let body: String = ops
        .iter()
        .map(|op| format!("op={op}"))
        .collect::<Vec<_>>()
        .join("&");
    rpc::call_with_body(conn, credentials, &url, body.as_bytes()).await
}

/// Uploads `reader` under `key` in `bucket`, dispatching to the simple
/// single-POST path at or below [`SIMPLE_UPLOAD_THRESHOLD`] and to the
/// resumable block/chunk engine above it.
#[tracing::instrument(level = "debug", skip(conn, credentials, reader), fields(bucket, key))]
pub async fn upload(
    conn: &Connection,
    credentials: &Credentials,
    region: &Region,
    bucket: &str,
    key: &str,
    mut reader: Box<dyn Reader>,
) -> Result<Value> {
    let size = reader.size()?;
    let policy = UploadPolicy::new(bucket, 3600).with_key(bucket, key);
    let uptoken = make_upload_token(credentials, &policy)?;
    let up_host = base_url(region, ServiceKind::Up);

    if size <= SIMPLE_UPLOAD_THRESHOLD {
        upload_simple(conn, &up_host, &uptoken, Some(key), key, reader).await
    } else {
        let mut progress = UploadProgress::new(size, crate::constants::BLOCK_SIZE);
        let uploader = ResumableUploader::new(conn.clone(), up_host, uptoken);
        uploader.upload(reader.as_mut(), &mut progress, Some(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_entry_as_urlsafe_base64_of_bucket_colon_key() {
        let encoded = encode_entry("mybucket", "path/to/key");
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        let decoded = URL_SAFE_NO_PAD.decode(&encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "mybucket:path/to/key");
    }
}
