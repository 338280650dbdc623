//! A thin "sign, POST (or GET), parse the JSON body" helper shared by
//! every administrative call in [`crate::easy`].

use url::Url;

use crate::auth::sign_admin_request;
use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind, Result};
use crate::http::{Connection, HeaderMap};
use crate::json::parser::{Outcome, Parser};
use crate::json::Value;

/// Splits `url` into its path (and query, if any) for the purpose of
/// request signing, which signs against the path+query rather than the
/// full URL including scheme and host.
fn path_and_query(url: &str) -> Result<(String, String)> {
    let parsed = Url::parse(url)?;
    let query = parsed.query().unwrap_or("").to_string();
    Ok((parsed.path().to_string(), query))
}

/// Performs a signed administrative call with an empty body (the
/// `stat`/`list`/`delete`/`copy`/`move`/`batch` family all work this
/// way: the request's meaning is entirely in the URL path).
#[tracing::instrument(level = "debug", skip(conn, credentials), fields(url = %url))]
pub async fn call(conn: &Connection, credentials: &Credentials, url: &str) -> Result<Value> {
    call_with_body(conn, credentials, url, b"").await
}

/// Same as [`call`], but signs and sends a request body (used by
/// `batch`, whose operation list is form-encoded in the body).
pub async fn call_with_body(
    conn: &Connection,
    credentials: &Credentials,
    url: &str,
    body: &[u8],
) -> Result<Value> {
    let (path, query) = path_and_query(url)?;
    let token = sign_admin_request(credentials, &path, &query, body)?;

    let mut headers = HeaderMap::new();
    headers.insert("Authorization", token);
    if !body.is_empty() {
        headers.insert("Content-Type", "application/x-www-form-urlencoded");
    }

    let (status, resp_body) = if body.is_empty() {
        conn.get(url, &headers).await?
    } else {
        conn.post_bytes(url, &headers, body.to_vec()).await?
    };

    if status != 200 {
        let msg = String::from_utf8_lossy(&resp_body).into_owned();
        return Err(Error::new(
            ErrorKind::StorApiReturnNoValue,
            format!("API call to {url} returned HTTP {status}: {msg}"),
        ));
    }

    if resp_body.is_empty() {
        return Ok(Value::Null);
    }

    let mut parser = Parser::parse_object();
    let (outcome, _) = parser.feed(&resp_body);
    match outcome {
        Outcome::Done(value) => Ok(value),
        _ => Err(Error::new(
            ErrorKind::JsonBadTextInput,
            format!("response from {url} was not a complete JSON object"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_path_and_query() {
        let (path, query) = path_and_query("http://rs.qiniu.com/stat/abc123?extra=1").unwrap();
        assert_eq!(path, "/stat/abc123");
        assert_eq!(query, "extra=1");
    }

    #[test]
    fn handles_url_with_no_query() {
        let (path, query) = path_and_query("http://rs.qiniu.com/delete/abc123").unwrap();
        assert_eq!(path, "/delete/abc123");
        assert_eq!(query, "");
    }
}
