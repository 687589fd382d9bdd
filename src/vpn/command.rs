use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use tracing::{debug, warn};

use super::parse::{parse_list, parse_status, summary_line};
use super::{ConnectTarget, ConnectionInfo, VpnControl};
use crate::error::{Error, Result};

/// How often a running client is checked for exit
const WAIT_POLL: Duration = Duration::from_millis(20);

/// Drives the VPN client binary as a synchronous subprocess.
#[derive(Debug, Clone)]
pub struct VpnCommand {
    program: String,
    timeout: Duration,
}

impl VpnCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Kill any call still running after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run one subcommand and return its stdout. Spawn failures, timeouts,
    /// non-zero exits and empty output are all `ExternalCommand` errors.
    fn run(&self, args: &[&str]) -> Result<String> {
        let command = std::iter::once(self.program.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(%command, "running vpn command");

        let fail = |reason: String| {
            warn!(%command, %reason, "vpn command failed");
            Error::ExternalCommand {
                command: command.clone(),
                reason,
            }
        };

        // stdin is detached so the client can never steal dashboard keystrokes
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| fail(e.to_string()))?;
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(fail(format!(
                        "timed out after {} ms",
                        self.timeout.as_millis()
                    )));
                }
                Ok(None) => thread::sleep(WAIT_POLL),
                Err(e) => {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(fail(e.to_string()));
                }
            }
        };

        // A forked helper may keep the pipes open after the client exits
        let stdout = stdout_rx.recv_deadline(deadline).unwrap_or_default();
        if !status.success() {
            let stderr = stderr_rx.recv_deadline(deadline).unwrap_or_default();
            let detail = match summary_line(&stderr) {
                line if line.is_empty() => summary_line(&stdout),
                line => line,
            };
            return Err(fail(format!("{} {}", status, detail).trim_end().to_string()));
        }
        if stdout.trim().is_empty() {
            return Err(fail("empty output".to_string()));
        }

        Ok(stdout)
    }

    fn list(&self, args: &[&str], what: &'static str) -> Result<Vec<String>> {
        let names = parse_list(&self.run(args)?);
        if names.is_empty() {
            return Err(Error::EmptyCandidates(what));
        }
        Ok(names)
    }
}

/// Read a child pipe to the end on its own thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    if let Some(mut pipe) = pipe {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf).ok();
            tx.send(String::from_utf8_lossy(&buf).into_owned()).ok();
        });
    }
    rx
}

impl VpnControl for VpnCommand {
    fn status(&self) -> Result<ConnectionInfo> {
        Ok(parse_status(&self.run(&["status"])?))
    }

    fn countries(&self) -> Result<Vec<String>> {
        self.list(&["countries"], "countries")
    }

    fn cities(&self, country: &str) -> Result<Vec<String>> {
        self.list(&["cities", country], "cities")
    }

    fn groups(&self) -> Result<Vec<String>> {
        self.list(&["groups"], "groups")
    }

    fn connect(&self, target: &ConnectTarget) -> Result<String> {
        let mut args = vec!["connect"];
        args.extend(target.args());
        Ok(summary_line(&self.run(&args)?))
    }

    fn disconnect(&self) -> Result<String> {
        Ok(summary_line(&self.run(&["disconnect"])?))
    }
}
