use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::selection::{MenuAction, SelectionFlow, Stage};
use crate::vpn::display_name;

/// Gap between candidate columns
const COLUMN_GAP: usize = 2;

/// Draw the selection dialog over the dashboard
pub fn draw_menu(f: &mut Frame, app: &App, flow: &SelectionFlow) {
    let area = centered_rect(80, 80, f.area());
    f.render_widget(Clear, area);
    let t = &app.theme;

    let inner_width = area.width.saturating_sub(2) as usize;
    // borders + blank + input + error + hint
    let list_height = area.height.saturating_sub(6) as usize;

    let mut lines: Vec<Line> = Vec::new();
    match flow.stage() {
        Stage::Menu => {
            for (i, action) in MenuAction::all().iter().enumerate() {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {}) ", i + 1), Style::default().fg(t.popup_index)),
                    Span::styled(action.label(), Style::default().fg(t.popup_text)),
                ]));
            }
            lines.push(Line::from(Span::styled(
                "  (blank) Connect to the best available server",
                Style::default().fg(t.popup_hint),
            )));
        }
        _ => {
            let labels: Vec<String> = flow
                .candidates()
                .iter()
                .enumerate()
                .map(|(i, name)| format!("{:>3}) {}", i + 1, display_name(name)))
                .collect();
            for row in column_rows(&labels, inner_width, list_height) {
                lines.push(Line::from(Span::styled(row, Style::default().fg(t.popup_text))));
            }
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" > ", Style::default().fg(t.popup_index).add_modifier(Modifier::BOLD)),
        Span::styled(format!("{}_", flow.input()), Style::default().fg(t.popup_text)),
    ]));
    if let Some(err) = flow.error() {
        lines.push(Line::from(Span::styled(
            format!(" {}", err),
            Style::default().fg(t.popup_error),
        )));
    }
    lines.push(Line::from(Span::styled(
        " Number + Enter to choose · Enter alone picks at random · Esc to cancel ",
        Style::default().fg(t.popup_hint),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", flow.title()))
                .title_alignment(Alignment::Center)
                .title_style(Style::default().fg(t.popup_title).add_modifier(Modifier::BOLD))
                .border_style(Style::default().fg(t.popup_border)),
        )
        .style(Style::default().fg(t.popup_text).bg(t.popup_bg));

    f.render_widget(paragraph, area);
}

/// Lay `labels` out column-major in as many columns as fit `width`.
/// When everything can't fit in `max_rows`, the last row says how many are hidden.
pub fn column_rows(labels: &[String], width: usize, max_rows: usize) -> Vec<String> {
    if labels.is_empty() || max_rows == 0 {
        return Vec::new();
    }

    let col_width = labels.iter().map(|l| l.width()).max().unwrap_or(0) + COLUMN_GAP;
    let columns = (width / col_width.max(1)).max(1);
    let needed_rows = labels.len().div_ceil(columns);
    if needed_rows > max_rows && max_rows == 1 {
        // Only room for the count
        return vec![more_line(labels.len())];
    }
    let (rows, truncated) = if needed_rows > max_rows {
        (max_rows - 1, true)
    } else {
        (needed_rows, false)
    };

    let mut out: Vec<String> = (0..rows)
        .map(|row| {
            let mut line = String::new();
            for col in 0..columns {
                let Some(label) = labels.get(col * rows + row) else {
                    break;
                };
                line.push_str(label);
                line.push_str(&" ".repeat(col_width.saturating_sub(label.width())));
            }
            line.trim_end().to_string()
        })
        .collect();

    if truncated {
        let shown = (rows * columns).min(labels.len());
        out.push(more_line(labels.len() - shown));
    }
    out
}

fn more_line(hidden: usize) -> String {
    format!("  … {} more (type the number)", hidden)
}

/// Create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{:>3}) C{}", i, i)).collect()
    }

    #[test]
    fn fills_columns_top_to_bottom() {
        // each label is 7 wide + gap = 9; 20 columns of width fit 2 columns
        let rows = column_rows(&labels(5), 20, 10);
        assert_eq!(
            rows,
            ["  1) C1    4) C4", "  2) C2    5) C5", "  3) C3"]
        );
    }

    #[test]
    fn truncates_with_count() {
        let rows = column_rows(&labels(10), 9, 4);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], "  1) C1");
        assert_eq!(rows[3], "  … 7 more (type the number)");
    }

    #[test]
    fn never_exceeds_max_rows() {
        assert_eq!(column_rows(&labels(10), 9, 1), ["  … 10 more (type the number)"]);
        for max_rows in 1..=6 {
            assert!(column_rows(&labels(40), 20, max_rows).len() <= max_rows);
        }
    }

    #[test]
    fn nothing_to_show() {
        assert!(column_rows(&[], 80, 10).is_empty());
        assert!(column_rows(&labels(3), 80, 0).is_empty());
    }
}
