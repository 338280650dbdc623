//! Picks a candidate endpoint out of a [`Service`] and learns from failed
//! attempts, independently of how the service's entries were populated.
//!
//! The "next entry" and "register failure" behaviors are looked up by
//! strategy from two small function tables, mirroring the source's own
//! split — the two halves of a strategy are *not* symmetric. Under
//! `LastSucceededFirst`, `next_entry` always returns the same slot and
//! only `register_failed_entry` moves the cursor forward; under
//! `LeastFailuresFirst`, `next_entry` never moves the cursor at all and
//! all the work happens by re-sorting entries in place on failure; only
//! `RoundRobin` advances on every `next_entry` call and never reacts to
//! failure.

use super::service::{Service, ServiceEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    LastSucceededFirst,
    LeastFailuresFirst,
    RoundRobin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Any,
    NoHttp,
    NoHttps,
}

impl Filter {
    fn admits(self, entry: &ServiceEntry) -> bool {
        match self {
            Filter::Any => true,
            Filter::NoHttp => !entry.is_http(),
            Filter::NoHttps => !entry.is_https(),
        }
    }
}

#[derive(Debug, Clone)]
struct SelectorEntry {
    entry: ServiceEntry,
    failures: u16,
}

/// A selection cursor over a filtered copy of a [`Service`]'s entries.
/// Cheap to build and reset; holds its own entry list so repeated
/// selection doesn't re-filter the underlying service every call.
#[derive(Debug, Clone)]
pub struct ServiceSelector {
    strategy: Strategy,
    filter: Filter,
    entries: Vec<SelectorEntry>,
    next: usize,
}

impl ServiceSelector {
    pub fn new(service: &Service, strategy: Strategy, filter: Filter) -> Self {
        let mut sel = ServiceSelector {
            strategy,
            filter,
            entries: Vec::with_capacity(service.len()),
            next: 0,
        };
        sel.reset(service);
        sel
    }

    /// Rebuilds the filtered entry list from `service`, discarding all
    /// accumulated failure counts and cursor position.
    pub fn reset(&mut self, service: &Service) {
        self.next = 0;
        self.entries.clear();
        for entry in service.entries() {
            if self.filter.admits(entry) {
                self.entries.push(SelectorEntry {
                    entry: entry.clone(),
                    failures: 0,
                });
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The next candidate to try, or `None` if every entry was filtered
    /// out (or the service had none to begin with).
    pub fn next_entry(&mut self) -> Option<ServiceEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let entry = match self.strategy {
            Strategy::LastSucceededFirst | Strategy::LeastFailuresFirst => {
                self.entries[self.next].entry.clone()
            }
            Strategy::RoundRobin => {
                let e = self.entries[self.next].entry.clone();
                self.next += 1;
                if self.next == self.entries.len() {
                    self.next = 0;
                }
                e
            }
        };
        Some(entry)
    }

    /// Records that `entry` just failed, letting the strategy react:
    /// `LastSucceededFirst` moves on to the next slot, `LeastFailuresFirst`
    /// bubbles `entry` down past every entry with fewer recorded failures,
    /// `RoundRobin` does nothing (it already always moves on).
    ///
    /// A no-op if `entry` isn't a member of this selector (e.g. it was
    /// filtered out) or there's only one candidate to choose from.
    pub fn register_failed_entry(&mut self, entry: &ServiceEntry) {
        if self.entries.len() <= 1 {
            return;
        }
        let Some(i) = self.entries.iter().position(|e| &e.entry == entry) else {
            return;
        };

        let wrapped = self.entries[i].failures == u16::MAX;
        self.entries[i].failures = self.entries[i].failures.wrapping_add(1);

        match self.strategy {
            Strategy::LastSucceededFirst => {
                self.next += 1;
                if self.next == self.entries.len() {
                    self.next = 0;
                }
            }
            Strategy::LeastFailuresFirst => self.bubble_down(i),
            Strategy::RoundRobin => {}
        }

        if wrapped {
            for e in &mut self.entries {
                e.failures >>= 1;
            }
        }
    }

    /// Moves `self.entries[n]` to just before the first entry after it
    /// with a strictly greater failure count, shifting the entries in
    /// between up by one slot. Keeps the list sorted by ascending
    /// failure count without a full re-sort on every call.
    fn bubble_down(&mut self, n: usize) {
        let mut p = n + 1;
        while p < self.entries.len() && self.entries[n].failures >= self.entries[p].failures {
            p += 1;
        }
        if p == n + 1 {
            return;
        }
        let moved = self.entries.remove(n);
        self.entries.insert(p - 1, moved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::service::ServiceKind;

    fn service_with(urls: &[&str]) -> Service {
        let mut svc = Service::new(ServiceKind::Up);
        for u in urls {
            svc.add_entry(ServiceEntry::new(*u)).unwrap();
        }
        svc
    }

    #[test]
    fn last_succeeded_first_stays_put_until_failure() {
        let svc = service_with(&["http://a", "http://b", "http://c"]);
        let mut sel = ServiceSelector::new(&svc, Strategy::LastSucceededFirst, Filter::Any);
        assert_eq!(sel.next_entry().unwrap().base_url, "http://a");
        assert_eq!(sel.next_entry().unwrap().base_url, "http://a");
        sel.register_failed_entry(&ServiceEntry::new("http://a"));
        assert_eq!(sel.next_entry().unwrap().base_url, "http://b");
    }

    #[test]
    fn round_robin_advances_every_call_and_ignores_failure() {
        let svc = service_with(&["http://a", "http://b"]);
        let mut sel = ServiceSelector::new(&svc, Strategy::RoundRobin, Filter::Any);
        assert_eq!(sel.next_entry().unwrap().base_url, "http://a");
        assert_eq!(sel.next_entry().unwrap().base_url, "http://b");
        sel.register_failed_entry(&ServiceEntry::new("http://a"));
        assert_eq!(sel.next_entry().unwrap().base_url, "http://a");
    }

    #[test]
    fn least_failures_first_floats_healthier_entries_to_front() {
        let svc = service_with(&["http://a", "http://b", "http://c"]);
        let mut sel = ServiceSelector::new(&svc, Strategy::LeastFailuresFirst, Filter::Any);
        assert_eq!(sel.next_entry().unwrap().base_url, "http://a");
        sel.register_failed_entry(&ServiceEntry::new("http://a"));
        assert_eq!(sel.next_entry().unwrap().base_url, "http://b");
        sel.register_failed_entry(&ServiceEntry::new("http://b"));
        assert_eq!(sel.next_entry().unwrap().base_url, "http://c");
    }

    #[test]
    fn filter_excludes_https_entries() {
        let svc = service_with(&["http://a", "https://b"]);
        let sel = ServiceSelector::new(&svc, Strategy::RoundRobin, Filter::NoHttps);
        assert_eq!(sel.entries.len(), 1);
        assert_eq!(sel.entries[0].entry.base_url, "http://a");
    }

    #[test]
    fn single_entry_ignores_failure_registration() {
        let svc = service_with(&["http://only"]);
        let mut sel = ServiceSelector::new(&svc, Strategy::LastSucceededFirst, Filter::Any);
        sel.register_failed_entry(&ServiceEntry::new("http://only"));
        assert_eq!(sel.next_entry().unwrap().base_url, "http://only");
    }
}
