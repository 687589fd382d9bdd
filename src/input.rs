use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::RngCore;

use crate::app::{App, AppMode};
use crate::selection::FlowStep;
use crate::vpn::VpnControl;

/// Handle a single key input event.
pub fn handle_input(app: &mut App, key: KeyEvent, vpn: &dyn VpnControl, rng: &mut dyn RngCore) {
    // Ctrl-C quits from anywhere; raw mode swallows SIGINT
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.request_quit();
        return;
    }

    match app.mode() {
        AppMode::Dashboard => handle_dashboard_mode(app, key),
        AppMode::Selecting => handle_selecting_mode(app, key, vpn, rng),
    }
}

// ── Dashboard ───────────────────────────────────────────────────────────

fn handle_dashboard_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::F(10) => app.request_quit(),
        KeyCode::Char('s') | KeyCode::Char('S') => app.begin_selection(),
        _ => {}
    }
}

// ── Selection dialog ────────────────────────────────────────────────────

fn handle_selecting_mode(app: &mut App, key: KeyEvent, vpn: &dyn VpnControl, rng: &mut dyn RngCore) {
    let Some(flow) = app.flow.as_mut() else {
        return;
    };
    match flow.handle_key(key, vpn, rng) {
        FlowStep::Continue => {}
        FlowStep::Finished(outcome) => app.finish_selection(outcome),
    }
}
