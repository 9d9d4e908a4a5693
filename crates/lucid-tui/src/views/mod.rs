pub mod chat;
pub mod login;
pub mod profile;
pub mod signup;

use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::theme::Theme;

/// One labelled single-line input. Passwords are masked.
pub fn render_field(
    f: &mut Frame,
    theme: &Theme,
    area: Rect,
    label: &str,
    value: &str,
    masked: bool,
    focused: bool,
) {
    let shown = if masked {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let border = if focused { theme.accent } else { theme.border };

    let mut spans = vec![Span::styled(shown, Style::default().fg(theme.fg))];
    if focused {
        spans.push(Span::styled("▏", Style::default().fg(theme.accent)));
    }

    let input = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Span::styled(format!(" {} ", label), Style::default().fg(theme.muted))),
    );
    f.render_widget(input, area);
}

/// Inline error or progress line under a form.
pub fn form_status(theme: &Theme, busy: bool, error: Option<&str>) -> Paragraph<'static> {
    if busy {
        Paragraph::new("Working…").style(Style::default().fg(theme.muted))
    } else if let Some(err) = error {
        Paragraph::new(err.to_string())
            .style(Style::default().fg(theme.error))
            .wrap(Wrap { trim: true })
    } else {
        Paragraph::new("")
    }
}
