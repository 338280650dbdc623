//! Region/service topology: which base URLs serve which API for a given
//! bucket, how to discover them, how to pick among several candidates,
//! and how to cache the answer for a while.

pub mod discovery;
pub mod selector;
pub mod service;
pub mod table;

pub use selector::{Filter as SelectorFilter, ServiceSelector, Strategy as SelectorStrategy};
pub use service::{Service, ServiceEntry, ServiceKind, SERVICE_KIND_COUNT};
pub use table::RegionTable;

/// One region's full endpoint set: one [`Service`] per [`ServiceKind`].
/// `None` for a kind means discovery returned nothing for it and callers
/// should fall back to [`Service::default_for`].
#[derive(Debug, Clone)]
pub struct Region {
    services: [Option<Service>; SERVICE_KIND_COUNT],
}

impl Default for Region {
    fn default() -> Self {
        Region::new()
    }
}

impl Region {
    pub fn new() -> Self {
        Region {
            services: Default::default(),
        }
    }

    pub fn set_service(&mut self, kind: ServiceKind, service: Service) {
        self.services[kind_index(kind)] = Some(service);
    }

    pub fn get_service(&self, kind: ServiceKind) -> Option<&Service> {
        self.services[kind_index(kind)].as_ref()
    }

    /// The service for `kind`, falling back to the hard-coded default
    /// entry when this region never learned one.
    pub fn service_or_default(&self, kind: ServiceKind) -> Service {
        self.get_service(kind)
            .cloned()
            .unwrap_or_else(|| Service::default_for(kind))
    }
}

fn kind_index(kind: ServiceKind) -> usize {
    ServiceKind::all()
        .iter()
        .position(|k| *k == kind)
        .expect("ServiceKind::all covers every variant")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_kind_falls_back_to_default() {
        let rgn = Region::new();
        assert!(rgn.get_service(ServiceKind::Up).is_none());
        let svc = rgn.service_or_default(ServiceKind::Up);
        assert_eq!(svc.entries()[0].base_url, "http://up.qiniu.com");
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut rgn = Region::new();
        let mut svc = Service::new(ServiceKind::Io);
        svc.add_entry(ServiceEntry::new("http://iovip.example.com")).unwrap();
        rgn.set_service(ServiceKind::Io, svc);
        assert_eq!(
            rgn.get_service(ServiceKind::Io).unwrap().entries()[0].base_url,
            "http://iovip.example.com"
        );
    }
}
