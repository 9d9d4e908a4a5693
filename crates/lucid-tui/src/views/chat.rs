use lucid_core::models::{ChatMessage, ChatRole};
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, Focus};
use crate::theme::Theme;
use crate::ui::truncate;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(20)])
        .split(area);

    render_sessions(f, app, columns[0]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(columns[1]);

    render_messages(f, app, rows[0]);
    render_composer(f, app, rows[1]);
}

fn render_sessions(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let focused = app.focus == Focus::Sessions;
    let active = app.state.active_session_id();
    let width = area.width.saturating_sub(6) as usize;

    let items: Vec<ListItem> = app
        .state
        .sessions()
        .iter()
        .enumerate()
        .map(|(i, session)| {
            let is_active = active == Some(session.id.as_str());
            let marker = if is_active { "● " } else { "  " };

            let title = match (&app.rename, i == app.session_cursor) {
                (Some(draft), true) => format!("{}▏", draft),
                _ => truncate(session.display_title(), width),
            };

            let mut style = Style::default().fg(if is_active { theme.accent } else { theme.fg });
            if focused && i == app.session_cursor {
                style = style.bg(theme.highlight);
            }
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(theme.accent)),
                Span::styled(title, style),
            ]))
        })
        .collect();

    let title = if app.state.loading_sessions() {
        " Chats (loading…) ".to_string()
    } else {
        format!(" Chats ({}) ", app.state.sessions().len())
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused { theme.accent } else { theme.border }))
            .title(Span::styled(title, Style::default().fg(theme.accent))),
    );
    f.render_widget(list, area);
}

fn render_messages(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();

    let title = app
        .state
        .active_session()
        .map(|s| format!(" {} ", s.display_title()))
        .unwrap_or_else(|| " New conversation ".to_string());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(title, Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
    let inner = block.inner(area);

    let mut lines: Vec<Line> = Vec::new();
    if app.state.loading_messages() && app.state.messages().is_empty() {
        lines.push(Line::from(Span::styled("Loading messages…", Style::default().fg(theme.muted))));
    } else if app.state.messages().is_empty() {
        lines.push(Line::from(Span::styled(
            "Start the conversation by typing below.",
            Style::default().fg(theme.muted),
        )));
    }
    for message in app.state.messages() {
        lines.extend(message_lines(theme, message));
        lines.push(Line::from(""));
    }
    if app.state.is_sending() {
        lines.push(Line::from(Span::styled(
            "Lucid is thinking…",
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        )));
    }
    if let Some(err) = app.state.chat_error() {
        lines.push(Line::from(Span::styled(
            format!("⚠ {}", err),
            Style::default().fg(theme.error),
        )));
    }

    let height = wrapped_height(&lines, inner.width);
    let scroll = height.saturating_sub(inner.height);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

fn message_lines<'a>(theme: &Theme, message: &'a ChatMessage) -> Vec<Line<'a>> {
    let (label, color) = match message.role {
        ChatRole::User => ("You", theme.accent),
        ChatRole::Assistant => ("Lucid", theme.assistant),
        ChatRole::System => ("System", theme.warning),
    };

    let mut header = vec![Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if let Some(ts) = message.created_at {
        header.push(Span::styled(
            format!("  {}", ts.with_timezone(&chrono::Local).format("%H:%M")),
            Style::default().fg(theme.muted),
        ));
    }
    if message.is_placeholder() {
        header.push(Span::styled("  sending", Style::default().fg(theme.muted)));
    }

    let mut lines = vec![Line::from(header)];
    lines.extend(
        message
            .content
            .lines()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(theme.fg)))),
    );
    lines
}

/// Rows `lines` occupy once wrapped to `width` columns.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let rows: usize = lines
        .iter()
        .map(|l| l.width().max(1).div_ceil(width))
        .sum();
    rows.min(u16::MAX as usize) as u16
}

fn render_composer(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let focused = app.focus == Focus::Composer && app.rename.is_none();

    let mut spans = vec![Span::styled(app.state.draft(), Style::default().fg(theme.fg))];
    if focused {
        spans.push(Span::styled("▏", Style::default().fg(theme.accent)));
    }
    let placeholder = if app.state.is_sending() {
        " Waiting for reply… "
    } else {
        " Message Lucid (Enter to send) "
    };

    let composer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused { theme.accent } else { theme.border }))
            .title(Span::styled(placeholder, Style::default().fg(theme.muted))),
    );
    f.render_widget(composer, area);
}
