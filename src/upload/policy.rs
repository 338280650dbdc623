//! The caller-signed JSON object granting an upload token its permissions:
//! which scope it may write to, until when, and what constraints and
//! callbacks apply.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{Error, ErrorKind, Result};
use crate::json::formatter::Formatter;
use crate::json::parser::Parser;
use crate::json::{JsonObject, Value};

/// §6's upload policy object. `scope` and `deadline` are required; every
/// other field is optional and omitted from the encoded form when unset.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPolicy {
    pub scope: String,
    pub deadline: i64,
    pub insert_only: Option<bool>,
    pub end_user: Option<String>,
    pub return_url: Option<String>,
    pub return_body: Option<String>,
    pub callback_url: Option<String>,
    pub callback_body: Option<String>,
    pub callback_body_type: Option<String>,
    pub save_key: Option<String>,
    pub fsize_limit: Option<i64>,
    pub detect_mime: Option<bool>,
    pub mime_limit: Option<String>,
    pub persistent_ops: Option<String>,
    pub persistent_notify_url: Option<String>,
    pub persistent_pipeline: Option<String>,
}

impl UploadPolicy {
    /// A policy scoped to `bucket` (no key restriction), expiring
    /// `ttl_secs` from now.
    pub fn new(bucket: impl Into<String>, ttl_secs: i64) -> Self {
        let now = crate::time::unix_now();
        UploadPolicy {
            scope: bucket.into(),
            deadline: now + ttl_secs,
            insert_only: None,
            end_user: None,
            return_url: None,
            return_body: None,
            callback_url: None,
            callback_body: None,
            callback_body_type: None,
            save_key: None,
            fsize_limit: None,
            detect_mime: None,
            mime_limit: None,
            persistent_ops: None,
            persistent_notify_url: None,
            persistent_pipeline: None,
        }
    }

    /// Restricts the policy to a single key within its bucket.
    pub fn with_key(mut self, bucket: &str, key: &str) -> Self {
        self.scope = format!("{bucket}:{key}");
        self
    }

    pub fn to_value(&self) -> Value {
        let mut obj = JsonObject::new();
        obj.set("scope".into(), self.scope.as_str().into()).unwrap();
        obj.set("deadline".into(), Value::Int(self.deadline)).unwrap();
        if let Some(v) = self.insert_only {
            obj.set("insertOnly".into(), Value::Bool(v)).unwrap();
        }
        if let Some(v) = &self.end_user {
            obj.set("endUser".into(), v.as_str().into()).unwrap();
        }
        if let Some(v) = &self.return_url {
            obj.set("returnUrl".into(), v.as_str().into()).unwrap();
        }
        if let Some(v) = &self.return_body {
            obj.set("returnBody".into(), v.as_str().into()).unwrap();
        }
        if let Some(v) = &self.callback_url {
            obj.set("callbackUrl".into(), v.as_str().into()).unwrap();
        }
        if let Some(v) = &self.callback_body {
            obj.set("callbackBody".into(), v.as_str().into()).unwrap();
        }
        if let Some(v) = &self.callback_body_type {
            obj.set("callbackBodyType".into(), v.as_str().into()).unwrap();
        }
        if let Some(v) = &self.save_key {
            obj.set("saveKey".into(), v.as_str().into()).unwrap();
        }
        if let Some(v) = self.fsize_limit {
            obj.set("fsizeLimit".into(), Value::Int(v)).unwrap();
        }
        if let Some(v) = self.detect_mime {
            obj.set("detectMime".into(), Value::Bool(v)).unwrap();
        }
        if let Some(v) = &self.mime_limit {
            obj.set("mimeLimit".into(), v.as_str().into()).unwrap();
        }
        if let Some(v) = &self.persistent_ops {
            obj.set("persistentOps".into(), v.as_str().into()).unwrap();
        }
        if let Some(v) = &self.persistent_notify_url {
            obj.set("persistentNotifyUrl".into(), v.as_str().into()).unwrap();
        }
        if let Some(v) = &self.persistent_pipeline {
            obj.set("persistentPipeline".into(), v.as_str().into()).unwrap();
        }
        Value::Object(obj)
    }

    /// Renders the policy as base64-url-safe-encoded JSON, the exact
    /// bytes an upload-token signature covers.
    pub fn encode(&self) -> Result<String> {
        let value = self.to_value();
        let json = Formatter::to_vec(&value, Default::default());
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| Error::new(ErrorKind::BadUtf8Sequence, e.to_string()))?;
        let mut parser = Parser::parse_object();
        let (outcome, _) = parser.feed(&bytes);
        let value = match outcome {
            crate::json::parser::Outcome::Done(v) => v,
            _ => return Err(Error::new(ErrorKind::JsonBadTextInput, "malformed upload policy")),
        };
        Self::from_value(&value)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::new(ErrorKind::JsonNotThisType, "upload policy root is not an object"))?;
        let scope = get_str(obj, "scope")?.ok_or_else(|| {
            Error::new(ErrorKind::InvalidArgument, "upload policy missing 'scope'")
        })?;
        let deadline = obj
            .get(b"deadline")
            .and_then(Value::as_int)
            .ok_or_else(|| Error::new(ErrorKind::InvalidArgument, "upload policy missing 'deadline'"))?;
        Ok(UploadPolicy {
            scope,
            deadline,
            insert_only: obj.get(b"insertOnly").and_then(Value::as_bool),
            end_user: get_str(obj, "endUser")?,
            return_url: get_str(obj, "returnUrl")?,
            return_body: get_str(obj, "returnBody")?,
            callback_url: get_str(obj, "callbackUrl")?,
            callback_body: get_str(obj, "callbackBody")?,
            callback_body_type: get_str(obj, "callbackBodyType")?,
            save_key: get_str(obj, "saveKey")?,
            fsize_limit: obj.get(b"fsizeLimit").and_then(Value::as_int),
            detect_mime: obj.get(b"detectMime").and_then(Value::as_bool),
            mime_limit: get_str(obj, "mimeLimit")?,
            persistent_ops: get_str(obj, "persistentOps")?,
            persistent_notify_url: get_str(obj, "persistentNotifyUrl")?,
            persistent_pipeline: get_str(obj, "persistentPipeline")?,
        })
    }
}

fn get_str(obj: &JsonObject, key: &str) -> Result<Option<String>> {
    match obj.get(key.as_bytes()) {
        None => Ok(None),
        Some(v) => {
            let s = v
                .as_str()
                .ok_or_else(|| Error::new(ErrorKind::JsonNotThisType, format!("'{key}' is not a string")))?;
            let s = s
                .as_str()
                .map_err(|_| Error::new(ErrorKind::BadUtf8Sequence, format!("'{key}' is not valid UTF-8")))?;
            Ok(Some(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_policy_round_trips() {
        let policy = UploadPolicy::new("mybucket", 3600);
        let encoded = policy.encode().unwrap();
        let decoded = UploadPolicy::decode(&encoded).unwrap();
        assert_eq!(decoded.scope, "mybucket");
        assert_eq!(decoded.deadline, policy.deadline);
    }

    #[test]
    fn key_scoped_policy_uses_bucket_colon_key() {
        let policy = UploadPolicy::new("b", 60).with_key("b", "k");
        assert_eq!(policy.scope, "b:k");
    }

    #[test]
    fn optional_fields_are_omitted_when_unset() {
        let policy = UploadPolicy::new("b", 60);
        let value = policy.to_value();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key(b"callbackUrl"));
        assert!(!obj.contains_key(b"saveKey"));
    }

    #[test]
    fn decode_rejects_missing_scope() {
        let mut formatter_input = JsonObject::new();
        formatter_input.set("deadline".into(), Value::Int(1)).unwrap();
        let value = Value::Object(formatter_input);
        let json = Formatter::to_vec(&value, Default::default());
        let encoded = URL_SAFE_NO_PAD.encode(json);
        assert!(UploadPolicy::decode(&encoded).is_err());
    }
}
