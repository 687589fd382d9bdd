//! vpntop configuration persistence (htoprc-style key=value format)
//!
//! Lives at `$XDG_CONFIG_HOME/vpntop/vpntoprc` (or `~/.config/vpntop/vpntoprc`).
//! Command-line flags override whatever the file says.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("vpntop").join("vpntoprc"))
}

fn default_lock_path() -> PathBuf {
    let dir = std::env::var_os("XDG_RUNTIME_DIR")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    dir.join("vpntop.lock")
}

/// Resolved settings, handed to the sampler and controller at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// VPN client binary (looked up on PATH)
    pub vpn_command: String,
    /// Fixed interface; `None` means discover the active one
    pub interface: Option<String>,
    pub sample_interval_ms: u64,
    pub refresh_interval_ms: u64,
    pub input_poll_ms: u64,
    /// Longest any single VPN client call may run before it is killed
    pub command_timeout_ms: u64,
    /// Where to mirror the latest rate sample, if anywhere
    pub rate_file: Option<PathBuf>,
    pub lock_file: PathBuf,
    pub monochrome: bool,
    pub max_prompt_attempts: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vpn_command: "nordvpn".to_string(),
            interface: None,
            sample_interval_ms: 1000,
            refresh_interval_ms: 500,
            input_poll_ms: 100,
            command_timeout_ms: 15_000,
            rate_file: None,
            lock_file: default_lock_path(),
            monochrome: false,
            max_prompt_attempts: 3,
        }
    }
}

impl Config {
    /// Load config from file, returning defaults if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Config(format!("failed to read {}: {}", path.display(), e))),
        }
    }

    /// Parse rc-file content on top of the defaults. Unknown keys and
    /// unparsable values are ignored; numbers are clamped to sane ranges.
    pub fn parse(content: &str) -> Self {
        let mut cfg = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "vpn_command" => {
                    if !value.is_empty() {
                        cfg.vpn_command = value.to_string();
                    }
                }
                "interface" => cfg.interface = non_empty(value),
                "sample_interval_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.sample_interval_ms = v.clamp(200, 60_000);
                    }
                }
                "refresh_interval_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.refresh_interval_ms = v.clamp(100, 10_000);
                    }
                }
                "input_poll_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.input_poll_ms = v.clamp(10, 1000);
                    }
                }
                "command_timeout_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.command_timeout_ms = v.clamp(1000, 120_000);
                    }
                }
                "rate_file" => cfg.rate_file = non_empty(value).map(PathBuf::from),
                "lock_file" => {
                    if !value.is_empty() {
                        cfg.lock_file = PathBuf::from(value);
                    }
                }
                "monochrome" => cfg.monochrome = value == "1",
                "max_prompt_attempts" => {
                    if let Ok(v) = value.parse::<u8>() {
                        cfg.max_prompt_attempts = v.clamp(1, 10);
                    }
                }
                _ => {} // Ignore unknown keys
            }
        }

        cfg
    }

    /// Serialize in the same format `parse` reads
    pub fn render(&self) -> String {
        let b = |v: bool| if v { "1" } else { "0" };
        let path = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };

        let lines = [
            "# vpntop configuration file".to_string(),
            String::new(),
            format!("vpn_command={}", self.vpn_command),
            format!("interface={}", self.interface.as_deref().unwrap_or("")),
            format!("sample_interval_ms={}", self.sample_interval_ms),
            format!("refresh_interval_ms={}", self.refresh_interval_ms),
            format!("input_poll_ms={}", self.input_poll_ms),
            format!("command_timeout_ms={}", self.command_timeout_ms),
            format!("rate_file={}", path(&self.rate_file)),
            format!("lock_file={}", self.lock_file.display()),
            format!("monochrome={}", b(self.monochrome)),
            format!("max_prompt_attempts={}", self.max_prompt_attempts),
        ];
        lines.join("\n") + "\n"
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("failed to create config dir: {}", e)))?;
        }
        fs::write(path, self.render())
            .map_err(|e| Error::Config(format!("failed to write {}: {}", path.display(), e)))
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_overrides_and_clamps() {
        let cfg = Config::parse(
            "# comment\n\
             vpn_command = /usr/bin/nordvpn\n\
             interface=wlan0\n\
             sample_interval_ms=5\n\
             refresh_interval_ms=750\n\
             command_timeout_ms=50\n\
             monochrome=1\n\
             max_prompt_attempts=99\n\
             color_scheme=3\n\
             not a setting\n",
        );
        assert_eq!(cfg.vpn_command, "/usr/bin/nordvpn");
        assert_eq!(cfg.interface.as_deref(), Some("wlan0"));
        assert_eq!(cfg.sample_interval_ms, 200);
        assert_eq!(cfg.refresh_interval(), Duration::from_millis(750));
        assert_eq!(cfg.input_poll_ms, 100);
        assert_eq!(cfg.command_timeout(), Duration::from_secs(1));
        assert!(cfg.monochrome);
        assert_eq!(cfg.max_prompt_attempts, 10);
    }

    #[test]
    fn blank_values_keep_defaults() {
        let cfg = Config::parse("vpn_command=\ninterface=\nrate_file=\nsample_interval_ms=fast\n");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = mktemp::Temp::new_dir().unwrap();
        let path = dir.to_path_buf().join("nested").join("vpntoprc");

        let cfg = Config {
            interface: Some("eth0".into()),
            rate_file: Some(PathBuf::from("/tmp/vpntop.rate")),
            sample_interval_ms: 2000,
            command_timeout_ms: 30_000,
            ..Config::default()
        };
        cfg.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = mktemp::Temp::new_dir().unwrap();
        let cfg = Config::load(&dir.to_path_buf().join("absent")).unwrap();
        assert_eq!(cfg, Config::default());
    }
}
