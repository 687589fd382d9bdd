use std::path::PathBuf;

/// Errors raised by the sampler, the selection flow and the VPN command seam.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no active network interface (non-loopback with an IPv4/IPv6 address)")]
    NoActiveInterface,
    #[error("failed to enumerate network interfaces: {0}")]
    InterfaceList(#[source] std::io::Error),
    #[error("failed to read byte counters for {interface}")]
    CounterRead { interface: String },
    #[error("interface {interface} lost: {reason}")]
    InterfaceLost { interface: String, reason: String },
    #[error("selection {input} is out of range (1-{count})")]
    InvalidSelectionIndex { input: usize, count: usize },
    #[error("'{0}' is not a number")]
    InvalidSelectionInput(String),
    #[error("no {0} available")]
    EmptyCandidates(&'static str),
    #[error("`{command}` failed: {reason}")]
    ExternalCommand { command: String, reason: String },
    #[error("another instance is already running (lock held on {})", path.display())]
    AlreadyRunning { path: PathBuf },
    #[error("config: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
