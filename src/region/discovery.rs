//! Looks a bucket's region up against the discovery service and turns
//! the response into a [`Region`].

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::constants::REGION_DISCOVERY_HOST;
use crate::error::{Error, ErrorKind, Result};
use crate::http::{Connection, HeaderMap};
use crate::json::parser::Parser;
use crate::json::Value;
use crate::region::{Region, Service, ServiceEntry, ServiceKind};

/// Queries `GET {REGION_DISCOVERY_HOST}/v1/query?ak=..&bucket=..` and
/// assembles the `up`/`io` service tables from the response, returning
/// them alongside the response's own `ttl` (falling back to
/// [`crate::constants::DEFAULT_REGION_TTL_SECS`] when absent, mirroring
/// the discovery service's own default).
#[tracing::instrument(level = "debug", skip(conn, access_key))]
pub async fn discover(conn: &Connection, access_key: &str, bucket: &str) -> Result<(Region, i64)> {
    let encoded_bucket = utf8_percent_encode(bucket, NON_ALPHANUMERIC).to_string();
    let url = format!(
        "{REGION_DISCOVERY_HOST}/v1/query?ak={access_key}&bucket={encoded_bucket}"
    );

    let headers = HeaderMap::new();
    let (status, body) = conn.get(&url, &headers).await?;
    if status != 200 {
        return Err(Error::new(
            ErrorKind::StorInvalidListResult,
            format!("region discovery returned HTTP {status}"),
        ));
    }

    let mut parser = Parser::parse_object();
    let (outcome, _) = parser.feed(&body);
    let root = match outcome {
        crate::json::parser::Outcome::Done(value) => value,
        _ => {
            return Err(Error::new(
                ErrorKind::JsonBadTextInput,
                "region discovery response was not a complete JSON object",
            ))
        }
    };
    parse_region_response(&root)
}

fn parse_region_response(root: &Value) -> Result<(Region, i64)> {
    let obj = root.as_object().ok_or_else(|| {
        Error::new(
            ErrorKind::JsonNotThisType,
            "region discovery response root is not an object",
        )
    })?;

    let ttl = obj
        .get(b"ttl")
        .and_then(Value::as_int)
        .unwrap_or(crate::constants::DEFAULT_REGION_TTL_SECS);

    let mut up = Service::new(ServiceKind::Up);
    let mut io = Service::new(ServiceKind::Io);

    for scheme_key in [b"http".as_slice(), b"https".as_slice()] {
        let Some(scheme_table) = obj.get(scheme_key).and_then(Value::as_object) else {
            continue;
        };
        add_entries(scheme_table, b"io", &mut io)?;
        add_entries(scheme_table, b"up", &mut up)?;
    }

    let mut region = Region::new();
    region.set_service(ServiceKind::Up, up);
    region.set_service(ServiceKind::Io, io);
    Ok((region, ttl))
}

fn add_entries(scheme_table: &crate::json::JsonObject, key: &[u8], service: &mut Service) -> Result<()> {
    let Some(list) = scheme_table.get(key).and_then(Value::as_array) else {
        return Ok(());
    };
    for item in list.iter() {
        let raw = item.as_str().ok_or_else(|| {
            Error::new(
                ErrorKind::JsonNotThisType,
                "service entry in region response was not a string",
            )
        })?;
        let raw = raw.as_str().map_err(|_| {
            Error::new(ErrorKind::BadUtf8Sequence, "service entry is not valid UTF-8")
        })?;
        service.add_entry(ServiceEntry::parse(raw)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parser::{Outcome, Parser};
    use tracing_test::traced_test;

    fn parse(src: &[u8]) -> Value {
        let mut parser = Parser::parse_object();
        match parser.feed(src).0 {
            Outcome::Done(v) => v,
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[traced_test]
    #[test]
    fn parses_full_response_with_both_schemes() {
        let value = parse(
            br#"{"ttl":60,"http":{"up":["http://up.qiniu.com"],"io":["http://iovip.qbox.me"]},"https":{"up":["https://up.qbox.me"],"io":["https://iovip.qbox.me"]}}"#,
        );
        let (region, ttl) = parse_region_response(&value).unwrap();
        assert_eq!(ttl, 60);
        let up = region.get_service(ServiceKind::Up).unwrap();
        assert_eq!(up.len(), 2);
        let io = region.get_service(ServiceKind::Io).unwrap();
        assert_eq!(io.len(), 2);
    }

    #[test]
    fn missing_ttl_falls_back_to_default() {
        let value = parse(br#"{"http":{"up":["http://up.qiniu.com"],"io":[]}}"#);
        let (_, ttl) = parse_region_response(&value).unwrap();
        assert_eq!(ttl, crate::constants::DEFAULT_REGION_TTL_SECS);
    }

    #[test]
    fn parses_hostname_prefixed_entries() {
        let value = parse(
            br#"{"ttl":60,"http":{"up":["-H upload.qiniup.com http://183.136.139.16"],"io":[]}}"#,
        );
        let (region, _) = parse_region_response(&value).unwrap();
        let up = region.get_service(ServiceKind::Up).unwrap();
        assert_eq!(up.entries()[0].hostname.as_deref(), Some("upload.qiniup.com"));
    }
}
