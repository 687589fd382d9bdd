//! Active interface discovery.
//!
//! An interface is "active" when it is not loopback and carries at least one
//! IPv4 or IPv6 address. Enumeration order is the kernel's `getifaddrs` order.

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;

use crate::error::{Error, Result};

/// One interface as seen by the host, with its addresses folded together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEntry {
    pub name: String,
    pub loopback: bool,
    pub has_ip: bool,
}

impl InterfaceEntry {
    pub fn is_active(&self) -> bool {
        !self.loopback && self.has_ip
    }
}

/// Find the first active interface on this host.
pub fn find_active_interface() -> Result<String> {
    pick_active(list_interfaces()?)
}

/// Use `name` if the host knows about it and it is active.
pub fn require_interface(name: &str) -> Result<String> {
    list_interfaces()?
        .into_iter()
        .find(|entry| entry.name == name && entry.is_active())
        .map(|entry| entry.name)
        .ok_or(Error::NoActiveInterface)
}

/// First active entry in enumeration order
pub fn pick_active(entries: impl IntoIterator<Item = InterfaceEntry>) -> Result<String> {
    entries
        .into_iter()
        .find(InterfaceEntry::is_active)
        .map(|entry| entry.name)
        .ok_or(Error::NoActiveInterface)
}

/// All interfaces, one entry per name, in first-seen order
pub fn list_interfaces() -> Result<Vec<InterfaceEntry>> {
    let addrs = getifaddrs().map_err(|e| Error::InterfaceList(e.into()))?;

    let mut entries: Vec<InterfaceEntry> = Vec::new();
    for ifaddr in addrs {
        let has_ip = ifaddr
            .address
            .as_ref()
            .map(|addr| addr.as_sockaddr_in().is_some() || addr.as_sockaddr_in6().is_some())
            .unwrap_or(false);
        let loopback = ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK);

        match entries.iter_mut().find(|e| e.name == ifaddr.interface_name) {
            Some(entry) => {
                entry.has_ip |= has_ip;
                entry.loopback |= loopback;
            }
            None => entries.push(InterfaceEntry {
                name: ifaddr.interface_name,
                loopback,
                has_ip,
            }),
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, loopback: bool, has_ip: bool) -> InterfaceEntry {
        InterfaceEntry {
            name: name.into(),
            loopback,
            has_ip,
        }
    }

    #[test]
    fn skips_loopback_and_addressless() {
        let entries = vec![
            entry("lo", true, true),
            entry("docker0", false, false),
            entry("wlan0", false, true),
            entry("eth0", false, true),
        ];
        assert_eq!(pick_active(entries).unwrap(), "wlan0");
    }

    #[test]
    fn no_candidates_is_an_error() {
        assert!(matches!(pick_active(Vec::new()), Err(Error::NoActiveInterface)));

        let entries = vec![entry("lo", true, true), entry("eth0", false, false)];
        assert!(matches!(pick_active(entries), Err(Error::NoActiveInterface)));
    }

    #[test]
    fn host_listing_never_yields_loopback() {
        // Whatever this host has, discovery must respect the active rule.
        let entries = list_interfaces().unwrap();
        if let Ok(name) = pick_active(entries.clone()) {
            let chosen = entries.iter().find(|e| e.name == name).unwrap();
            assert!(!chosen.loopback);
            assert!(chosen.has_ip);
        }
    }
}
