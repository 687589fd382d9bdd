use ratatui::style::Color;

/// All color slots used across the dashboard
#[derive(Debug, Clone)]
pub struct Theme {
    pub label: Color,
    pub value: Color,
    pub border: Color,
    pub title: Color,

    pub download: Color,
    pub upload: Color,
    pub unavailable: Color,

    pub connected: Color,
    pub disconnected: Color,
    pub roulette: Color,

    pub status_info: Color,
    pub status_error: Color,

    pub footer_key_fg: Color,
    pub footer_key_bg: Color,
    pub footer_label_fg: Color,
    pub footer_label_bg: Color,

    pub popup_border: Color,
    pub popup_bg: Color,
    pub popup_title: Color,
    pub popup_text: Color,
    pub popup_index: Color,
    pub popup_hint: Color,
    pub popup_error: Color,
}

impl Theme {
    pub fn new(monochrome: bool) -> Self {
        if monochrome {
            Self::monochrome()
        } else {
            Self::default_scheme()
        }
    }

    fn default_scheme() -> Self {
        Self {
            label: Color::White,
            value: Color::Cyan,
            border: Color::DarkGray,
            title: Color::Cyan,

            download: Color::Green,
            upload: Color::Magenta,
            unavailable: Color::DarkGray,

            connected: Color::Green,
            disconnected: Color::Red,
            roulette: Color::Yellow,

            status_info: Color::Green,
            status_error: Color::Red,

            footer_key_fg: Color::Black,
            footer_key_bg: Color::Cyan,
            footer_label_fg: Color::Indexed(252),
            footer_label_bg: Color::Indexed(234),

            popup_border: Color::Cyan,
            popup_bg: Color::Black,
            popup_title: Color::Yellow,
            popup_text: Color::White,
            popup_index: Color::Cyan,
            popup_hint: Color::DarkGray,
            popup_error: Color::Red,
        }
    }

    /// Monochrome (no colors)
    fn monochrome() -> Self {
        Self {
            label: Color::White,
            value: Color::White,
            border: Color::White,
            title: Color::White,

            download: Color::White,
            upload: Color::White,
            unavailable: Color::DarkGray,

            connected: Color::White,
            disconnected: Color::White,
            roulette: Color::White,

            status_info: Color::White,
            status_error: Color::White,

            footer_key_fg: Color::Black,
            footer_key_bg: Color::White,
            footer_label_fg: Color::White,
            footer_label_bg: Color::Reset,

            popup_border: Color::White,
            popup_bg: Color::Reset,
            popup_title: Color::White,
            popup_text: Color::White,
            popup_index: Color::White,
            popup_hint: Color::DarkGray,
            popup_error: Color::White,
        }
    }
}
