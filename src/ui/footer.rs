use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, AppMode};

/// Key definitions: (key_label, description)
const KEYS_DASHBOARD: &[(&str, &str)] = &[("s", "Select server "), ("q", "Quit ")];

const KEYS_SELECTING: &[(&str, &str)] = &[
    ("0-9", "Choose "),
    ("Enter", "Confirm/random "),
    ("Esc", "Cancel "),
    ("^C", "Quit "),
];

/// Draw the bottom key bar: key in black-on-cyan, description on dark background
pub fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;

    let bg_fill = " ".repeat(area.width as usize);
    f.render_widget(
        Paragraph::new(bg_fill).style(Style::default().bg(t.footer_label_bg)),
        area,
    );

    let keys = match app.mode() {
        AppMode::Dashboard => KEYS_DASHBOARD,
        AppMode::Selecting => KEYS_SELECTING,
    };

    let mut spans: Vec<Span> = Vec::new();
    for (key, desc) in keys {
        spans.push(Span::styled(
            *key,
            Style::default()
                .fg(t.footer_key_fg)
                .bg(t.footer_key_bg)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            *desc,
            Style::default().fg(t.footer_label_fg).bg(t.footer_label_bg),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
