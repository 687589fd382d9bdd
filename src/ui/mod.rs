pub mod dashboard;
pub mod footer;
pub mod menu;
pub mod theme;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use crate::app::App;

/// Render the complete UI
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // status block
            Constraint::Length(1), // last action result
            Constraint::Length(1), // footer key bar
        ])
        .split(f.area());

    dashboard::draw_dashboard(f, app, chunks[0]);
    dashboard::draw_status_line(f, app, chunks[1]);
    footer::draw_footer(f, app, chunks[2]);

    if let Some(flow) = &app.flow {
        menu::draw_menu(f, app, flow);
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::app::tests::{app, StatusVpn};
    use crate::system::network::RateSample;
    use crate::system::sampler::{RateState, SharedRate};

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn dashboard_shows_rate_and_connection() {
        let mut app = app();
        let shared = SharedRate::new();
        shared.publish(RateState::Available(RateSample {
            download_mbps: 1.6,
            upload_mbps: 0.0,
            window_seconds: 5.0,
        }));
        app.refresh(&StatusVpn::default(), &shared).unwrap();
        app.roulette_enabled = true;

        let text = screen(&app);
        assert!(text.contains("eth0"));
        assert!(text.contains("1.60 Mbps"));
        assert!(text.contains("Connected"));
        assert!(text.contains("Japan"));
        assert!(text.contains("Roulette"));
        assert!(text.contains("Select server"));
    }

    #[test]
    fn menu_overlays_dashboard() {
        let mut app = app();
        app.begin_selection();

        let text = screen(&app);
        assert!(text.contains("Connect to a country"));
        assert!(text.contains("Disconnect"));
        assert!(text.contains("Esc"));
    }
}
