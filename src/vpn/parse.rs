//! Scraping the VPN client's text output.
//!
//! The client prints a spinner (`\r-\r  \r`) before real output and separates
//! list entries with newlines, commas or tabs depending on version.

use super::ConnectionInfo;

/// Split a `countries`/`cities`/`groups` listing into names.
pub fn parse_list(output: &str) -> Vec<String> {
    output
        .split(|c: char| matches!(c, '\n' | '\r' | ',' | '\t'))
        .map(str::trim)
        .filter(|item| !item.is_empty() && !is_spinner(item) && !is_notice(item))
        .map(str::to_string)
        .collect()
}

/// Parse the `status` report (`Key: Value` lines).
pub fn parse_status(output: &str) -> ConnectionInfo {
    let mut info = ConnectionInfo::default();

    for line in output.split(['\n', '\r']) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_start_matches(|c: char| !c.is_alphanumeric());
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match key.to_ascii_lowercase().as_str() {
            "status" => info.connected = value.eq_ignore_ascii_case("connected"),
            "hostname" | "current server" => info.hostname = Some(value.to_string()),
            "ip" | "server ip" | "your new ip" => info.ip = Some(value.to_string()),
            "country" => info.country = Some(value.to_string()),
            "city" => info.city = Some(value.to_string()),
            _ => {}
        }
    }

    info
}

/// The one-line summary of a connect/disconnect run: its last meaningful line.
pub fn summary_line(output: &str) -> String {
    output
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_spinner(line))
        .last()
        .unwrap_or_default()
        .to_string()
}

fn is_spinner(item: &str) -> bool {
    item.chars().all(|c| matches!(c, '-' | '\\' | '|' | '/' | ' '))
}

/// Openings of the client's own messages (update nags, login reminders).
/// Location and group names can contain spaces, so only these are dropped.
const NOTICE_PREFIXES: &[&str] = &[
    "a new version",
    "new feature",
    "please ",
    "you are not logged in",
    "we're having trouble",
    "whoops",
];

fn is_notice(item: &str) -> bool {
    if !(item.ends_with('!') || item.ends_with('.')) {
        return false;
    }
    let lower = item.to_ascii_lowercase();
    NOTICE_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_with_spinner_and_mixed_separators() {
        let output = "\r-\r  \r\r-\r  \rAlbania, Argentina\tAustralia\nUnited_States\n\n";
        assert_eq!(
            parse_list(output),
            ["Albania", "Argentina", "Australia", "United_States"]
        );
    }

    #[test]
    fn list_drops_update_banner() {
        let output = "A new version of the app is available!\nFrance\nGermany\nJapan\n";
        assert_eq!(parse_list(output), ["France", "Germany", "Japan"]);
    }

    #[test]
    fn list_keeps_names_with_spaces() {
        let output = "France\nUnited Kingdom\nJapan\n";
        assert_eq!(parse_list(output), ["France", "United Kingdom", "Japan"]);

        let output = "Bosnia and Herzegovina, St. Louis\tDedicated IP\n";
        assert_eq!(
            parse_list(output),
            ["Bosnia and Herzegovina", "St. Louis", "Dedicated IP"]
        );
    }

    #[test]
    fn list_drops_only_known_notices() {
        let output = "Please update the app.\nWashington D.C.\nNew feature: meshnet!\nGermany\n";
        assert_eq!(parse_list(output), ["Washington D.C.", "Germany"]);
    }

    #[test]
    fn empty_list() {
        assert!(parse_list("\r-\r  \r").is_empty());
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn connected_status() {
        let output = "\r-\r  \rStatus: Connected\n\
                      Hostname: de1234.example.com\n\
                      IP: 185.0.0.1\n\
                      Country: Germany\n\
                      City: Frankfurt\n\
                      Current technology: NORDLYNX\n\
                      Uptime: 5 minutes 2 seconds\n";
        assert_eq!(
            parse_status(output),
            ConnectionInfo {
                connected: true,
                hostname: Some("de1234.example.com".into()),
                ip: Some("185.0.0.1".into()),
                country: Some("Germany".into()),
                city: Some("Frankfurt".into()),
            }
        );
    }

    #[test]
    fn disconnected_status() {
        let info = parse_status("Status: Disconnected\n");
        assert!(!info.connected);
        assert_eq!(info.hostname, None);
    }

    #[test]
    fn ipv6_value_keeps_colons() {
        let info = parse_status("Status: Connected\nIP: 2001:db8::1\n");
        assert_eq!(info.ip.as_deref(), Some("2001:db8::1"));
    }

    #[test]
    fn summary_is_last_line() {
        let output = "\r-\r  \rConnecting to Germany #1234 (de1234.example.com)\nYou are connected to Germany #1234 (de1234.example.com)!\n";
        assert_eq!(
            summary_line(output),
            "You are connected to Germany #1234 (de1234.example.com)!"
        );
        assert_eq!(summary_line(""), "");
    }
}
