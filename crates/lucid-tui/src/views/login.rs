use lucid_core::state::LoginField;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, LOGIN_FIELDS};
use crate::ui::centered;

use super::{form_status, render_field};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let form = app.state.login_form();

    let panel = centered(area, 56, 15);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(
            " Welcome back ",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(panel);
    f.render_widget(block, panel);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(inner);

    for (i, field) in LOGIN_FIELDS.iter().enumerate() {
        let (label, value, masked) = match field {
            LoginField::Email => ("Email", form.email.as_str(), false),
            LoginField::Password => ("Password", form.password.as_str(), true),
        };
        render_field(f, theme, rows[i], label, value, masked, app.login_field == i);
    }

    f.render_widget(
        form_status(theme, app.state.auth_busy(), app.state.auth_error()),
        rows[2],
    );

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("No account? ", Style::default().fg(theme.muted)),
        Span::styled("Ctrl+S", Style::default().fg(theme.warning).add_modifier(Modifier::BOLD)),
        Span::styled(" to sign up", Style::default().fg(theme.muted)),
    ]));
    f.render_widget(footer, rows[3]);
}
