#![allow(dead_code)]

use crate::error::Error;
use std::env;
use std::fmt::{Debug, Formatter};

#[derive(Debug, Clone)]
pub struct AccessKey(pub String);

impl AsRef<str> for AccessKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl AccessKey {
    pub fn new(access_key: String) -> Self {
        Self(access_key)
    }
}

#[derive(Clone)]
pub struct SecretKey(pub String);

impl Debug for SecretKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey(<hidden>)")
    }
}

impl AsRef<str> for SecretKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl SecretKey {
    pub fn new(secret_key: String) -> Self {
        Self(secret_key)
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key: AccessKey,
    pub secret_key: SecretKey,
}

impl Credentials {
    pub fn new<S>(access_key: S, secret_key: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            access_key: AccessKey(access_key.into()),
            secret_key: SecretKey(secret_key.into()),
        }
    }

    pub fn try_from_env() -> Result<Self, Error> {
        let access_key = env::var("QINIU_ACCESS_KEY")?;
        let secret_key = env::var("QINIU_SECRET_KEY")?;

        Ok(Self {
            access_key: AccessKey(access_key),
            secret_key: SecretKey(secret_key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_key_debug_does_not_leak() {
        let secret = SecretKey::new("shh".to_string());
        assert_eq!(format!("{secret:?}"), "SecretKey(<hidden>)");
    }
}
