use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::App;
use crate::ui::centered;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let panel = centered(area, 64, 16);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(
            " Profile ",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ))
        .padding(Padding::uniform(1));

    let Some(user) = app.state.user() else {
        let waiting = Paragraph::new("Loading profile…")
            .style(Style::default().fg(theme.muted))
            .block(block);
        f.render_widget(waiting, panel);
        return;
    };

    let row = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:12}", label), Style::default().fg(theme.muted)),
            Span::styled(value, Style::default().fg(theme.fg)),
        ])
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", user.initials()),
                Style::default()
                    .fg(theme.bg)
                    .bg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                user.full_name(),
                Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        row("Email", user.email.clone()),
    ];
    if let Some(id) = &user.id {
        lines.push(row("User ID", id.clone()));
    }
    for (key, value) in &user.extra {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        lines.push(row(key, value));
    }
    lines.push(Line::from(""));
    lines.push(row("Server", app.api_url.clone()));
    lines.push(row("Chats", app.state.sessions().len().to_string()));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, panel);
}
