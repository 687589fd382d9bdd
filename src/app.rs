use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::selection::{Outcome, SelectionFlow};
use crate::system::sampler::{RateState, SharedRate};
use crate::ui::theme::Theme;
use crate::vpn::{ConnectionInfo, VpnControl};

/// Which view the app is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Live status dashboard, refreshed every tick.
    Dashboard,
    /// Selection dialog open; automatic status refresh is suspended.
    Selecting,
}

/// Last action result shown under the dashboard
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
    pub at: DateTime<Local>,
}

/// Main application state
pub struct App {
    pub should_quit: bool,
    pub interface: String,

    // Sampler output, copied from SharedRate on each tick
    pub rate: RateState,

    // VPN client state
    pub connection: Option<ConnectionInfo>,
    pub roulette_enabled: bool,
    pub status: Option<StatusLine>,
    pub last_refresh: Option<DateTime<Local>>,

    // Selection dialog (Some while the menu is open)
    pub flow: Option<SelectionFlow>,
    pub max_prompt_attempts: u8,
    /// Set when the screen should be wiped before the next draw.
    pub clear_screen: bool,

    pub theme: Theme,
    pub vpn_command: String,
    pub tick: u64,
}

impl App {
    pub fn new(interface: String, vpn_command: String, theme: Theme, max_prompt_attempts: u8) -> Self {
        Self {
            should_quit: false,
            interface,
            rate: RateState::Pending,
            connection: None,
            roulette_enabled: false,
            status: None,
            last_refresh: None,
            flow: None,
            max_prompt_attempts,
            clear_screen: false,
            theme,
            vpn_command,
            tick: 0,
        }
    }

    pub fn mode(&self) -> AppMode {
        if self.flow.is_some() {
            AppMode::Selecting
        } else {
            AppMode::Dashboard
        }
    }

    pub fn rendering_enabled(&self) -> bool {
        self.mode() == AppMode::Dashboard
    }

    /// Periodic refresh: pull the latest rate and, unless the selection
    /// dialog is open, the VPN status. A lost interface is fatal.
    pub fn refresh(&mut self, vpn: &dyn VpnControl, shared: &SharedRate) -> Result<()> {
        if !self.rendering_enabled() {
            return Ok(());
        }
        self.tick += 1;

        self.rate = shared.latest();
        if let RateState::Lost(reason) = &self.rate {
            return Err(Error::InterfaceLost {
                interface: self.interface.clone(),
                reason: reason.clone(),
            });
        }

        match vpn.status() {
            Ok(info) => self.connection = Some(info),
            Err(e) => {
                // Don't keep showing a server we can no longer vouch for
                warn!(tick = self.tick, "status refresh failed: {}", e);
                self.connection = None;
                self.set_error(e.to_string());
            }
        }
        self.last_refresh = Some(Local::now());
        Ok(())
    }

    /// Quit request; safe to call repeatedly.
    pub fn request_quit(&mut self) {
        if !self.should_quit {
            info!("quit requested");
        }
        self.should_quit = true;
    }

    pub fn begin_selection(&mut self) {
        if self.flow.is_none() {
            self.flow = Some(SelectionFlow::new(self.max_prompt_attempts));
            self.clear_screen = true;
        }
    }

    /// Close the selection dialog and record how it went.
    pub fn finish_selection(&mut self, outcome: Outcome) {
        self.flow = None;
        self.clear_screen = true;

        match outcome {
            Outcome::Connected { selection, message } => {
                info!(?selection, "connected");
                self.roulette_enabled = selection.roulette_enabled;
                self.set_info(non_empty(message, "Connected"));
            }
            Outcome::Disconnected { message } => {
                info!("disconnected");
                self.roulette_enabled = false;
                self.set_info(non_empty(message, "Disconnected"));
            }
            Outcome::Failed(e) => {
                warn!("selection failed: {}", e);
                self.set_error(e.to_string());
            }
            Outcome::Aborted(reason) => self.set_error(reason),
            Outcome::Cancelled => {}
        }
    }

    pub fn set_info(&mut self, text: String) {
        self.status = Some(StatusLine {
            text,
            is_error: false,
            at: Local::now(),
        });
    }

    pub fn set_error(&mut self, text: String) {
        self.status = Some(StatusLine {
            text,
            is_error: true,
            at: Local::now(),
        });
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
