//! Connection selection flow.
//!
//! ```text
//! Idle -> Menu -> { Country | City | Group | Roulette | Disconnect | Best }
//!      -> Connected / Disconnected -> Idle
//! ```
//!
//! Every prompt accepts a 1-based index or a blank line for a uniformly
//! random pick. Anything else is rejected and re-prompted, up to
//! `max_attempts` times in a row, after which the flow gives up.

use crossterm::event::{KeyCode, KeyEvent};
use rand::{Rng, RngCore};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::vpn::{display_name, ConnectTarget, VpnControl};

/// What the user ended up choosing in one pass through the flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub country: Option<String>,
    pub city: Option<String>,
    pub group: Option<String>,
    pub roulette_enabled: bool,
}

/// Numbered entries of the top-level menu. A blank line means "best server".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Country,
    City,
    Group,
    Roulette,
    Disconnect,
}

impl MenuAction {
    pub fn all() -> &'static [MenuAction] {
        &[
            MenuAction::Country,
            MenuAction::City,
            MenuAction::Group,
            MenuAction::Roulette,
            MenuAction::Disconnect,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Country => "Connect to a country",
            MenuAction::City => "Connect to a city",
            MenuAction::Group => "Connect to a server group",
            MenuAction::Roulette => "Roulette (random country)",
            MenuAction::Disconnect => "Disconnect",
        }
    }
}

/// Resolve prompt input against `candidates`.
///
/// Blank input picks uniformly at random; otherwise the input must be an
/// index in `1..=candidates.len()`.
pub fn pick<'a, R: Rng + ?Sized>(
    candidates: &'a [String],
    input: &str,
    rng: &mut R,
) -> Result<&'a str> {
    let index = pick_index(candidates.len(), input, rng)?;
    Ok(&candidates[index])
}

/// Zero-based index for prompt input over `count` options.
pub fn pick_index<R: Rng + ?Sized>(count: usize, input: &str, rng: &mut R) -> Result<usize> {
    if count == 0 {
        return Err(Error::EmptyCandidates("choices"));
    }

    let input = input.trim();
    if input.is_empty() {
        return Ok(rng.gen_range(0..count));
    }

    let choice: usize = input
        .parse()
        .map_err(|_| Error::InvalidSelectionInput(input.to_string()))?;
    if choice == 0 || choice > count {
        return Err(Error::InvalidSelectionIndex { input: choice, count });
    }
    Ok(choice - 1)
}

/// Which prompt is on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Menu,
    /// `for_city` continues into the city list of the chosen country.
    Country { for_city: bool },
    City { country: String },
    Group,
}

/// How a pass through the flow ended
#[derive(Debug)]
pub enum Outcome {
    Connected {
        selection: SelectionState,
        message: String,
    },
    Disconnected {
        message: String,
    },
    /// The VPN command failed or returned nothing usable.
    Failed(Error),
    Cancelled,
    /// Too many invalid entries in a row.
    Aborted(String),
}

#[derive(Debug)]
pub enum FlowStep {
    Continue,
    Finished(Outcome),
}

/// Selection dialog state, built fresh each time the user presses `s`
#[derive(Debug)]
pub struct SelectionFlow {
    stage: Stage,
    candidates: Vec<String>,
    input: String,
    error: Option<String>,
    attempts: u8,
    max_attempts: u8,
    selection: SelectionState,
}

impl SelectionFlow {
    pub fn new(max_attempts: u8) -> Self {
        Self {
            stage: Stage::Menu,
            candidates: Vec::new(),
            input: String::new(),
            error: None,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            selection: SelectionState::default(),
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn title(&self) -> String {
        match &self.stage {
            Stage::Menu => "Connection".to_string(),
            Stage::Country { .. } => "Choose a country".to_string(),
            Stage::City { country } => format!("Choose a city in {}", display_name(country)),
            Stage::Group => "Choose a server group".to_string(),
        }
    }

    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        vpn: &dyn VpnControl,
        rng: &mut dyn RngCore,
    ) -> FlowStep {
        match key.code {
            KeyCode::Esc => FlowStep::Finished(Outcome::Cancelled),
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.input);
                self.submit(&line, vpn, rng)
            }
            KeyCode::Backspace => {
                self.input.pop();
                FlowStep::Continue
            }
            KeyCode::Char(c) if !c.is_control() => {
                self.input.push(c);
                FlowStep::Continue
            }
            _ => FlowStep::Continue,
        }
    }

    /// Feed one complete prompt line.
    pub fn submit(&mut self, line: &str, vpn: &dyn VpnControl, rng: &mut dyn RngCore) -> FlowStep {
        self.input.clear();
        match self.stage.clone() {
            Stage::Menu => {
                if line.trim().is_empty() {
                    return self.connect(ConnectTarget::Best, vpn);
                }
                match pick_index(MenuAction::all().len(), line, rng) {
                    Ok(i) => self.begin(MenuAction::all()[i], vpn, rng),
                    Err(e) => self.reject(e),
                }
            }
            Stage::Country { for_city } => {
                let country = match pick(&self.candidates, line, rng) {
                    Ok(name) => name.to_string(),
                    Err(e) => return self.reject(e),
                };
                self.selection.country = Some(country.clone());
                if for_city {
                    match vpn.cities(&country) {
                        Ok(cities) => {
                            self.enter(Stage::City { country }, cities);
                            FlowStep::Continue
                        }
                        Err(e) => FlowStep::Finished(Outcome::Failed(e)),
                    }
                } else {
                    self.connect(ConnectTarget::Country(country), vpn)
                }
            }
            Stage::City { country } => {
                let city = match pick(&self.candidates, line, rng) {
                    Ok(name) => name.to_string(),
                    Err(e) => return self.reject(e),
                };
                self.selection.city = Some(city.clone());
                self.connect(ConnectTarget::City { country, city }, vpn)
            }
            Stage::Group => {
                let group = match pick(&self.candidates, line, rng) {
                    Ok(name) => name.to_string(),
                    Err(e) => return self.reject(e),
                };
                self.selection.group = Some(group.clone());
                self.connect(ConnectTarget::Group(group), vpn)
            }
        }
    }

    fn begin(&mut self, action: MenuAction, vpn: &dyn VpnControl, rng: &mut dyn RngCore) -> FlowStep {
        debug!(?action, "menu action");
        let listed = match action {
            MenuAction::Country => vpn
                .countries()
                .map(|list| (Stage::Country { for_city: false }, list)),
            MenuAction::City => vpn
                .countries()
                .map(|list| (Stage::Country { for_city: true }, list)),
            MenuAction::Group => vpn.groups().map(|list| (Stage::Group, list)),
            MenuAction::Roulette => return self.roulette(vpn, rng),
            MenuAction::Disconnect => {
                return match vpn.disconnect() {
                    Ok(message) => FlowStep::Finished(Outcome::Disconnected { message }),
                    Err(e) => FlowStep::Finished(Outcome::Failed(e)),
                };
            }
        };

        match listed {
            Ok((stage, list)) => {
                self.enter(stage, list);
                FlowStep::Continue
            }
            Err(e) => FlowStep::Finished(Outcome::Failed(e)),
        }
    }

    fn roulette(&mut self, vpn: &dyn VpnControl, rng: &mut dyn RngCore) -> FlowStep {
        let countries = match vpn.countries() {
            Ok(list) => list,
            Err(e) => return FlowStep::Finished(Outcome::Failed(e)),
        };
        let country = match pick(&countries, "", rng) {
            Ok(name) => name.to_string(),
            Err(e) => return FlowStep::Finished(Outcome::Failed(e)),
        };
        self.selection.country = Some(country.clone());
        self.selection.roulette_enabled = true;
        self.connect(ConnectTarget::Country(country), vpn)
    }

    fn enter(&mut self, stage: Stage, candidates: Vec<String>) {
        self.stage = stage;
        self.candidates = candidates;
        self.attempts = 0;
        self.error = None;
    }

    fn connect(&mut self, target: ConnectTarget, vpn: &dyn VpnControl) -> FlowStep {
        info!(target = %target.describe(), "connecting");
        match vpn.connect(&target) {
            Ok(message) => FlowStep::Finished(Outcome::Connected {
                selection: std::mem::take(&mut self.selection),
                message,
            }),
            Err(e) => FlowStep::Finished(Outcome::Failed(e)),
        }
    }

    fn reject(&mut self, err: Error) -> FlowStep {
        self.attempts += 1;
        debug!(attempt = self.attempts, "invalid selection: {}", err);
        if self.attempts >= self.max_attempts {
            return FlowStep::Finished(Outcome::Aborted(format!(
                "{}; gave up after {} invalid selections",
                err, self.attempts
            )));
        }
        self.error = Some(err.to_string());
        FlowStep::Continue
    }
}
