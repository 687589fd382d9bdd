//! Seam to the external VPN command-line client.
//!
//! Everything the dashboard knows about servers and connection state comes
//! from a subprocess; [`VpnControl`] is the boundary so the selection flow
//! can be driven by a fake in tests.

pub mod command;
pub mod parse;

use crate::error::Result;

pub use command::VpnCommand;

/// Where a connect request should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// Let the client pick the best server.
    Best,
    Country(String),
    City { country: String, city: String },
    Group(String),
}

impl ConnectTarget {
    /// Arguments after the `connect` subcommand
    pub fn args(&self) -> Vec<&str> {
        match self {
            ConnectTarget::Best => Vec::new(),
            ConnectTarget::Country(country) => vec![country.as_str()],
            ConnectTarget::City { country, city } => vec![country.as_str(), city.as_str()],
            ConnectTarget::Group(group) => vec!["--group", group.as_str()],
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ConnectTarget::Best => "best available server".to_string(),
            ConnectTarget::Country(country) => display_name(country),
            ConnectTarget::City { country, city } => {
                format!("{}, {}", display_name(city), display_name(country))
            }
            ConnectTarget::Group(group) => format!("group {}", display_name(group)),
        }
    }
}

/// Location names come back as `United_States`; show them with spaces.
pub fn display_name(name: &str) -> String {
    name.replace('_', " ")
}

/// Connection details scraped from the client's status report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub connected: bool,
    pub hostname: Option<String>,
    pub ip: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

/// Operations the dashboard needs from the VPN client.
pub trait VpnControl {
    fn status(&self) -> Result<ConnectionInfo>;
    fn countries(&self) -> Result<Vec<String>>;
    fn cities(&self, country: &str) -> Result<Vec<String>>;
    fn groups(&self) -> Result<Vec<String>>;
    /// Returns the client's own summary line for the status bar.
    fn connect(&self, target: &ConnectTarget) -> Result<String>;
    fn disconnect(&self) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_arguments() {
        assert!(ConnectTarget::Best.args().is_empty());
        assert_eq!(ConnectTarget::Country("France".into()).args(), ["France"]);
        assert_eq!(
            ConnectTarget::City {
                country: "United_States".into(),
                city: "New_York".into(),
            }
            .args(),
            ["United_States", "New_York"]
        );
        assert_eq!(ConnectTarget::Group("P2P".into()).args(), ["--group", "P2P"]);
    }

    #[test]
    fn describes_targets_for_humans() {
        let target = ConnectTarget::City {
            country: "United_States".into(),
            city: "New_York".into(),
        };
        assert_eq!(target.describe(), "New York, United States");
        assert_eq!(ConnectTarget::Best.describe(), "best available server");
    }
}
