//! A name-keyed cache of discovered [`Region`]s with per-entry TTL
//! expiry, backing the "ask the discovery service at most once per
//! region per TTL window" behavior the uploader relies on.

use std::time::{Duration, Instant};

use crate::constants::DEFAULT_REGION_TTL_SECS;
use crate::error::{Error, ErrorKind, Result};
use crate::region::Region;

struct RegionEntry {
    name: String,
    deadline: Instant,
    region: Region,
}

/// Unlike [`crate::region::Service`], a region table has no documented
/// capacity cap, so its backing `Vec` is left to its own default growth
/// strategy rather than a policy worth stating here.
#[derive(Default)]
pub struct RegionTable {
    entries: Vec<RegionEntry>,
}

impl RegionTable {
    pub fn new() -> Self {
        RegionTable {
            entries: Vec::with_capacity(4),
        }
    }

    /// Looks up `name`, failing with `no-such-entry` if it's missing or
    /// has passed its deadline. An expired entry is left in place (not
    /// evicted) — the next [`RegionTable::set_region`] call for the same
    /// name will overwrite it.
    pub fn get_region(&self, name: &str) -> Result<&Region> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::new(ErrorKind::NoSuchEntry, format!("no region info for {name}")))?;
        if Instant::now() > entry.deadline {
            return Err(Error::new(
                ErrorKind::NoSuchEntry,
                format!("region info for {name} has expired"),
            ));
        }
        Ok(&entry.region)
    }

    /// Inserts or replaces `name`'s region, good for `ttl_secs` from now
    /// (defaulting to [`DEFAULT_REGION_TTL_SECS`] when `None`, matching a
    /// discovery response that omitted its own `ttl` field).
    pub fn set_region(&mut self, name: impl Into<String>, ttl_secs: Option<i64>, region: Region) {
        let name = name.into();
        let deadline = Instant::now()
            + Duration::from_secs(ttl_secs.unwrap_or(DEFAULT_REGION_TTL_SECS).max(0) as u64);
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.deadline = deadline;
            entry.region = region;
            return;
        }
        self.entries.push(RegionEntry {
            name,
            deadline,
            region,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Region)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_region_is_no_such_entry() {
        let table = RegionTable::new();
        let err = table.get_region("bucket").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NoSuchEntry));
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut table = RegionTable::new();
        table.set_region("bucket", Some(60), Region::new());
        assert!(table.get_region("bucket").is_ok());
    }

    #[test]
    fn setting_again_overwrites_in_place() {
        let mut table = RegionTable::new();
        table.set_region("bucket", Some(60), Region::new());
        table.set_region("bucket", Some(60), Region::new());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn expired_entry_is_rejected() {
        let mut table = RegionTable::new();
        table.set_region("bucket", Some(0), Region::new());
        std::thread::sleep(Duration::from_millis(5));
        let err = table.get_region("bucket").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NoSuchEntry));
    }
}
