//! Direct single-POST upload for anything at or below
//! [`crate::constants::SIMPLE_UPLOAD_THRESHOLD`] — no block/chunk
//! bookkeeping, no resumability, one multipart form.

use crate::error::{Error, ErrorKind, Result};
use crate::http::{Connection, FormBuilder, HeaderMap};
use crate::io::Reader;
use crate::json::parser::{Outcome, Parser};
use crate::json::Value;

/// Uploads the whole of `reader` in a single multipart POST to `up_url`,
/// returning the parsed JSON response (typically `{hash, key}`).
#[tracing::instrument(level = "debug", skip(conn, reader, uptoken), fields(up_url = %up_url))]
pub async fn upload_simple(
    conn: &Connection,
    up_url: &str,
    uptoken: &str,
    key: Option<&str>,
    filename: &str,
    reader: Box<dyn Reader>,
) -> Result<Value> {
    let content_length = reader.size()?;

    let mut form = FormBuilder::new();
    form.add_text("token", uptoken)?;
    if let Some(key) = key {
        form.add_text("key", key)?;
    }
    form.add_streaming_file("file", filename, content_length, reader)?;

    let headers = HeaderMap::new();
    let reqwest_form = form.into_reqwest_form().await?;
    let (status, body) = conn.post_form(up_url, &headers, reqwest_form).await?;
    if status != 200 {
        return Err(Error::new(
            ErrorKind::StorApiReturnNoValue,
            format!("simple upload returned HTTP {status}"),
        ));
    }

    let mut parser = Parser::parse_object();
    let (outcome, _) = parser.feed(&body);
    match outcome {
        Outcome::Done(value) => Ok(value),
        _ => Err(Error::new(
            ErrorKind::JsonBadTextInput,
            "simple upload response was not a complete JSON object",
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{BLOCK_SIZE, SIMPLE_UPLOAD_THRESHOLD};

    #[test]
    fn threshold_matches_block_size() {
        assert_eq!(SIMPLE_UPLOAD_THRESHOLD, BLOCK_SIZE);
    }
}
