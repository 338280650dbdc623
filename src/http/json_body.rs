//! Feeds response bytes straight into a [`Parser`](crate::json::parser::Parser)
//! as they arrive, rather than buffering a whole response body first.

use crate::error::{Error, ErrorKind, Result};
use crate::json::parser::{Outcome, Parser, RootKind};
use crate::json::Value;

pub struct JsonBodyWriter {
    parser: Parser,
    result: Option<Value>,
}

impl JsonBodyWriter {
    pub fn new(root_kind: RootKind) -> Self {
        JsonBodyWriter {
            parser: Parser::with_depth_limit(root_kind, crate::constants::JSON_DEFAULT_DEPTH_LIMIT),
            result: None,
        }
    }

    /// Feeds the next chunk, returning how many bytes were consumed. A
    /// short count with no error simply means "need more input" —
    /// [`JsonBodyWriter::is_done`] tells the caller whether the root value
    /// has been fully assembled yet.
    pub fn write(&mut self, chunk: &[u8]) -> Result<usize> {
        if self.result.is_some() {
            return Ok(0);
        }
        let (outcome, consumed) = self.parser.feed(chunk);
        match outcome {
            Outcome::NeedMore => Ok(consumed),
            Outcome::Done(value) => {
                self.result = Some(value);
                Ok(consumed)
            }
            Outcome::Malformed(msg) => Err(Error::new(ErrorKind::JsonBadTextInput, msg)),
            Outcome::TooManyLevels => Err(Error::new(
                ErrorKind::JsonTooManyParsingLevels,
                "response body nested too deeply",
            )),
            Outcome::Overflow(true) => Err(Error::new(
                ErrorKind::OverflowUpperBound,
                "integer literal in response body overflows the upper bound",
            )),
            Outcome::Overflow(false) => Err(Error::new(
                ErrorKind::OverflowLowerBound,
                "integer literal in response body overflows the lower bound",
            )),
        }
    }

    pub fn is_done(&self) -> bool {
        self.result.is_some()
    }

    pub fn into_value(self) -> Option<Value> {
        self.result
    }

    /// Drains a whole buffer at once, failing if the body doesn't resolve
    /// to a complete value by the end of it.
    pub fn parse_complete(root_kind: RootKind, body: &[u8]) -> Result<Value> {
        let mut writer = JsonBodyWriter::new(root_kind);
        writer.write(body)?;
        writer.into_value().ok_or_else(|| {
            Error::new(
                ErrorKind::JsonNeedMoreTextInput,
                "response body ended before the JSON value was complete",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_object_body() {
        let value = JsonBodyWriter::parse_complete(RootKind::Object, br#"{"hash":"abc","key":"k"}"#)
            .unwrap();
        assert_eq!(
            value.as_object().unwrap().get(b"hash").unwrap().as_str().unwrap().as_str().unwrap(),
            "abc"
        );
    }

    #[test]
    fn incomplete_body_is_an_error() {
        let result = JsonBodyWriter::parse_complete(RootKind::Object, br#"{"hash":"abc""#);
        assert!(result.is_err());
    }

    #[test]
    fn overflowing_integer_reports_upper_bound_kind() {
        let err =
            JsonBodyWriter::parse_complete(RootKind::Object, br#"{"n":99999999999999999999999}"#)
                .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::OverflowUpperBound));
    }

    #[test]
    fn overflowing_negative_integer_reports_lower_bound_kind() {
        let err =
            JsonBodyWriter::parse_complete(RootKind::Object, br#"{"n":-99999999999999999999999}"#)
                .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::OverflowLowerBound));
    }

    #[test]
    fn can_be_fed_in_pieces() {
        let mut writer = JsonBodyWriter::new(RootKind::Object);
        writer.write(br#"{"a":"#).unwrap();
        assert!(!writer.is_done());
        writer.write(br#"1}"#).unwrap();
        assert!(writer.is_done());
        assert_eq!(
            writer.into_value().unwrap().as_object().unwrap().get(b"a"),
            Some(&Value::Int(1))
        );
    }
}
