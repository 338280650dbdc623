//! A service's endpoint table: one kind of API (upload, download, object
//! management, object listing, general API) mapped to an ordered list of
//! candidate [`ServiceEntry`] base URLs.

use crate::constants::SERVICE_MAX_ENTRIES;
use crate::error::{Error, ErrorKind, Result};

/// Which API surface a [`Service`]'s entries serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Up,
    Io,
    Rs,
    Rsf,
    Api,
}

pub const SERVICE_KIND_COUNT: usize = 5;

impl ServiceKind {
    pub fn all() -> [ServiceKind; SERVICE_KIND_COUNT] {
        [
            ServiceKind::Up,
            ServiceKind::Io,
            ServiceKind::Rs,
            ServiceKind::Rsf,
            ServiceKind::Api,
        ]
    }

    fn index(self) -> usize {
        match self {
            ServiceKind::Up => 0,
            ServiceKind::Io => 1,
            ServiceKind::Rs => 2,
            ServiceKind::Rsf => 3,
            ServiceKind::Api => 4,
        }
    }
}

/// One candidate endpoint. `hostname`, when present, overrides the `Host`
/// header sent to `base_url` — some endpoints are reachable only by IP or
/// by a CDN node but must still present the canonical hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub base_url: String,
    pub hostname: Option<String>,
}

impl ServiceEntry {
    pub fn new(base_url: impl Into<String>) -> Self {
        ServiceEntry {
            base_url: base_url.into(),
            hostname: None,
        }
    }

    pub fn with_hostname(base_url: impl Into<String>, hostname: impl Into<String>) -> Self {
        ServiceEntry {
            base_url: base_url.into(),
            hostname: Some(hostname.into()),
        }
    }

    /// Parses one endpoint string as it appears in a region-discovery
    /// response: either a bare URL, or a `-H <hostname> <url>` pair where
    /// the hostname is everything between `-H` and the next whitespace
    /// run and the URL is everything from the next `http` onward.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "empty service entry string",
            ));
        }
        if let Some(flag_pos) = trimmed.find("-H") {
            let after_flag = trimmed[flag_pos + 2..].trim_start();
            let host_end = after_flag.find(char::is_whitespace).ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidArgument,
                    "malformed '-H' service entry: missing base URL after hostname",
                )
            })?;
            let hostname = after_flag[..host_end].to_string();
            let rest = &after_flag[host_end..];
            let url_pos = rest.find("http").ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidArgument,
                    "malformed '-H' service entry: no URL found",
                )
            })?;
            Ok(ServiceEntry::with_hostname(rest[url_pos..].trim(), hostname))
        } else {
            Ok(ServiceEntry::new(trimmed))
        }
    }

    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    pub fn is_http(&self) -> bool {
        self.base_url.starts_with("http://")
    }
}

/// A kind-tagged, bounded list of candidate endpoints. Capacity grows by
/// 1.5x starting from 4, capped at [`SERVICE_MAX_ENTRIES`] — a direct
/// analogue of `Vec`'s own growth, made explicit here only because the
/// cap itself is part of the documented contract.
#[derive(Debug, Clone)]
pub struct Service {
    kind: ServiceKind,
    entries: Vec<ServiceEntry>,
}

impl Service {
    pub fn new(kind: ServiceKind) -> Self {
        Service {
            kind,
            entries: Vec::with_capacity(4),
        }
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn entries(&self) -> &[ServiceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_entry(&mut self, entry: ServiceEntry) -> Result<()> {
        if self.entries.len() >= SERVICE_MAX_ENTRIES {
            return Err(Error::new(
                ErrorKind::OutOfCapacity,
                "service entry table is full",
            ));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// The hard-coded fallback for `kind`, used when region discovery
    /// hasn't run yet or returned nothing for this kind.
    pub fn default_for(kind: ServiceKind) -> Self {
        let base_url = match kind {
            ServiceKind::Up => "http://up.qiniu.com",
            ServiceKind::Io => "http://iovip.qbox.me",
            ServiceKind::Rs => "http://rs.qiniu.com",
            ServiceKind::Rsf => "http://rsf.qbox.me",
            ServiceKind::Api => "http://api.qiniu.com",
        };
        let mut svc = Service::new(kind);
        svc.entries.push(ServiceEntry::new(base_url));
        svc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_url() {
        let e = ServiceEntry::parse("http://up.qiniu.com").unwrap();
        assert_eq!(e.base_url, "http://up.qiniu.com");
        assert_eq!(e.hostname, None);
    }

    #[test]
    fn parses_hostname_prefixed_url() {
        let e = ServiceEntry::parse("-H upload.qiniup.com http://183.136.139.16").unwrap();
        assert_eq!(e.hostname.as_deref(), Some("upload.qiniup.com"));
        assert_eq!(e.base_url, "http://183.136.139.16");
    }

    #[test]
    fn classifies_scheme() {
        let http = ServiceEntry::new("http://a.com");
        let https = ServiceEntry::new("https://a.com");
        assert!(http.is_http() && !http.is_https());
        assert!(https.is_https() && !https.is_http());
    }

    #[test]
    fn default_services_cover_every_kind() {
        for kind in ServiceKind::all() {
            let svc = Service::default_for(kind);
            assert_eq!(svc.len(), 1);
            assert_eq!(svc.kind(), kind);
        }
    }

    #[test]
    fn rejects_entries_past_capacity() {
        let mut svc = Service::new(ServiceKind::Up);
        for i in 0..SERVICE_MAX_ENTRIES {
            svc.add_entry(ServiceEntry::new(format!("http://h{i}.example.com")))
                .unwrap();
        }
        assert!(svc.add_entry(ServiceEntry::new("http://overflow.example.com")).is_err());
    }
}
