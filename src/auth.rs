//! Request signing and upload-token assembly.
//!
//! Every signature here is the same primitive applied to a different
//! canonical string: HMAC-SHA1 over some bytes, base64-url-safe encoded,
//! joined to the access key with a colon.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::credentials::Credentials;
use crate::error::Result;
use crate::upload::policy::UploadPolicy;

type HmacSha1 = Hmac<Sha1>;

fn sign_bytes(secret_key: &str, data: &[u8]) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret_key.as_bytes())?;
    mac.update(data);
    let digest = mac.finalize().into_bytes();
    Ok(URL_SAFE_NO_PAD.encode(digest))
}

/// §6's canonical request string: `path?query\nbody`, where `query` and
/// the trailing `\n`+`body` are omitted when empty (a GET with no body
/// signs as just the path).
fn canonical_request_string(path: &str, query: &str, body: &[u8]) -> Vec<u8> {
    let mut s = String::with_capacity(path.len() + query.len() + 1);
    s.push_str(path);
    if !query.is_empty() {
        s.push('?');
        s.push_str(query);
    }
    let mut bytes = s.into_bytes();
    if !body.is_empty() {
        bytes.push(b'\n');
        bytes.extend_from_slice(body);
    }
    bytes
}

/// Builds the `Authorization: QBox <token>` value for an administrative
/// (non-upload) call.
pub fn sign_admin_request(
    credentials: &Credentials,
    path: &str,
    query: &str,
    body: &[u8],
) -> Result<String> {
    let canonical = canonical_request_string(path, query, body);
    let signature = sign_bytes(credentials.secret_key.as_ref(), &canonical)?;
    Ok(format!(
        "QBox {}:{}",
        credentials.access_key.as_ref(),
        signature
    ))
}

/// Builds an upload token: `<access_key>:<signature>:<encoded_policy>`,
/// where the signature covers the base64-url-safe-encoded policy bytes.
pub fn make_upload_token(credentials: &Credentials, policy: &UploadPolicy) -> Result<String> {
    let encoded_policy = policy.encode()?;
    let signature = sign_bytes(credentials.secret_key.as_ref(), encoded_policy.as_bytes())?;
    Ok(format!(
        "{}:{}:{}",
        credentials.access_key.as_ref(),
        signature,
        encoded_policy
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::policy::UploadPolicy;

    #[test]
    fn admin_signature_is_stable_for_same_input() {
        let creds = Credentials::new("ak", "sk");
        let a = sign_admin_request(&creds, "/stat/abc", "", b"").unwrap();
        let b = sign_admin_request(&creds, "/stat/abc", "", b"").unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("QBox ak:"));
    }

    #[test]
    fn different_bodies_sign_differently() {
        let creds = Credentials::new("ak", "sk");
        let a = sign_admin_request(&creds, "/p", "", b"one").unwrap();
        let b = sign_admin_request(&creds, "/p", "", b"two").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn upload_token_has_three_colon_separated_parts() {
        let creds = Credentials::new("ak", "sk");
        let policy = UploadPolicy::new("bucket", 3600);
        let token = make_upload_token(&creds, &policy).unwrap();
        let parts: Vec<&str> = token.splitn(3, ':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ak");
    }
}
