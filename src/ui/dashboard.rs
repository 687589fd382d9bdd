use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::system::sampler::RateState;
use crate::ui::theme::Theme;
use crate::vpn::display_name;

/// Width of the label column
const LABEL_WIDTH: usize = 11;

/// Draw the fixed-position status block:
///
///   Interface  wlan0
///   Download   12.48 Mbps
///   Upload      0.91 Mbps
///
///   Status     Connected
///   Server     de1234.example.com
///   IP         185.0.0.1
///   Location   Frankfurt, Germany
///   Mode       Roulette
pub fn draw_dashboard(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let (download, upload) = format_rates(&app.rate);
    let rate_style = |color: Color| match app.rate {
        RateState::Available(_) => Style::default().fg(color).add_modifier(Modifier::BOLD),
        _ => Style::default().fg(t.unavailable),
    };

    let mut lines = vec![
        field(t, "Interface", Span::styled(app.interface.clone(), Style::default().fg(t.value))),
        field(t, "Download", Span::styled(download, rate_style(t.download))),
        field(t, "Upload", Span::styled(upload, rate_style(t.upload))),
        Line::from(""),
    ];

    match &app.connection {
        Some(info) => {
            let (state, color) = if info.connected {
                ("Connected", t.connected)
            } else {
                ("Disconnected", t.disconnected)
            };
            lines.push(field(
                t,
                "Status",
                Span::styled(state, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            ));
            if info.connected {
                lines.push(value_field(t, "Server", info.hostname.as_deref()));
                lines.push(value_field(t, "IP", info.ip.as_deref()));
                let location = match (&info.city, &info.country) {
                    (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
                    (None, Some(country)) => Some(country.clone()),
                    (Some(city), None) => Some(city.clone()),
                    (None, None) => None,
                };
                lines.push(value_field(t, "Location", location.as_deref().map(display_name).as_deref()));
            }
        }
        None => lines.push(field(
            t,
            "Status",
            Span::styled("unknown", Style::default().fg(t.unavailable)),
        )),
    }

    let mode = if app.roulette_enabled {
        Span::styled("Roulette", Style::default().fg(t.roulette).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("Manual", Style::default().fg(t.value))
    };
    lines.push(field(t, "Mode", mode));

    if let Some(at) = app.last_refresh {
        lines.push(Line::from(""));
        lines.push(field(
            t,
            "Updated",
            Span::styled(at.format("%H:%M:%S").to_string(), Style::default().fg(t.unavailable)),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(t.border))
        .title(Span::styled(
            format!(" vpntop · {} ", app.vpn_command),
            Style::default().fg(t.title).add_modifier(Modifier::BOLD),
        ));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Draw the one-line result of the last action
pub fn draw_status_line(f: &mut Frame, app: &App, area: Rect) {
    let Some(status) = &app.status else {
        return;
    };
    let color = if status.is_error {
        app.theme.status_error
    } else {
        app.theme.status_info
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" [{}] ", status.at.format("%H:%M:%S")),
            Style::default().fg(app.theme.unavailable),
        ),
        Span::styled(status.text.clone(), Style::default().fg(color)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Download/upload text for the current sampler state
pub fn format_rates(rate: &RateState) -> (String, String) {
    match rate {
        RateState::Available(r) => (
            format!("{:>6.2} Mbps", r.download_mbps),
            format!("{:>6.2} Mbps", r.upload_mbps),
        ),
        RateState::Pending => ("measuring…".into(), "measuring…".into()),
        RateState::Unavailable | RateState::Lost(_) => ("unavailable".into(), "unavailable".into()),
    }
}

fn field<'a>(t: &Theme, label: &'a str, value: Span<'a>) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!(" {:<width$}", label, width = LABEL_WIDTH),
            Style::default().fg(t.label),
        ),
        value,
    ])
}

fn value_field<'a>(t: &Theme, label: &'a str, value: Option<&str>) -> Line<'a> {
    let span = match value {
        Some(v) => Span::styled(v.to_string(), Style::default().fg(t.value)),
        None => Span::styled("-", Style::default().fg(t.unavailable)),
    };
    field(t, label, span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::network::RateSample;

    #[test]
    fn rate_text() {
        let available = RateState::Available(RateSample {
            download_mbps: 1.6,
            upload_mbps: 0.0,
            window_seconds: 5.0,
        });
        assert_eq!(
            format_rates(&available),
            ("  1.60 Mbps".to_string(), "  0.00 Mbps".to_string())
        );
        assert_eq!(format_rates(&RateState::Unavailable).0, "unavailable");
        assert_eq!(format_rates(&RateState::Lost("gone".into())).1, "unavailable");
    }
}
