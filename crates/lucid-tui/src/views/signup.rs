use lucid_core::state::SignupField;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, SIGNUP_FIELDS};
use crate::ui::{centered, truncate};

use super::{form_status, render_field};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let form = app.state.signup_form();

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let panel = centered(columns[0], 56, 21);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(
            " Create your account ",
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
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(inner);

    for (i, field) in SIGNUP_FIELDS.iter().enumerate() {
        let (label, value, masked) = match field {
            SignupField::FirstName => ("First name", form.first_name.as_str(), false),
            SignupField::LastName => ("Last name", form.last_name.as_str(), false),
            SignupField::Email => ("Email", form.email.as_str(), false),
            SignupField::Password => ("Password", form.password.as_str(), true),
        };
        render_field(f, theme, rows[i], label, value, masked, app.signup_field == i);
    }

    f.render_widget(
        form_status(theme, app.state.auth_busy(), app.state.auth_error()),
        rows[4],
    );

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("Have an account? ", Style::default().fg(theme.muted)),
        Span::styled("Ctrl+L", Style::default().fg(theme.warning).add_modifier(Modifier::BOLD)),
        Span::styled(" to log in", Style::default().fg(theme.muted)),
    ]));
    f.render_widget(footer, rows[5]);

    render_hero(f, app, columns[1]);
}

fn render_hero(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let width = area.width.saturating_sub(6) as usize;

    let mut lines = vec![
        Line::from(Span::styled(
            "Think out loud with Lucid.",
            Style::default().fg(theme.assistant).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if app.hero_images.iter().all(|u| u.starts_with('/')) {
        lines.push(Line::from(Span::styled(
            "No asset bucket configured",
            Style::default().fg(theme.muted),
        )));
    } else {
        for url in &app.hero_images {
            lines.push(Line::from(Span::styled(
                format!("▣ {}", truncate(url, width)),
                Style::default().fg(theme.muted),
            )));
        }
    }

    let hero = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .padding(Padding::horizontal(1)),
    );
    f.render_widget(hero, area);
}
