use lucid_core::state::Route;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::App;
use crate::views;

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);

    if !app.state.auth_loaded() {
        let loading = Paragraph::new("Loading…")
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme().muted));
        f.render_widget(loading, chunks[1]);
    } else {
        match app.state.route() {
            Route::Login => views::login::render(f, app, chunks[1]),
            Route::Signup => views::signup::render(f, app, chunks[1]),
            Route::Chat => views::chat::render(f, app, chunks[1]),
            Route::Profile => views::profile::render(f, app, chunks[1]),
        }
    }

    render_status_bar(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();

    let visible: Vec<Route> = Route::all()
        .iter()
        .copied()
        .filter(|r| r.requires_auth() == app.state.is_authenticated())
        .collect();
    let titles: Vec<Line> = visible.iter().map(|r| Line::from(r.label())).collect();
    let selected = visible
        .iter()
        .position(|r| *r == app.state.route())
        .unwrap_or(0);

    let user = app
        .state
        .user()
        .map(|u| format!(" {} ", u.full_name()))
        .unwrap_or_default();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .title(Span::styled(
                    " Lucid Loop Studio ",
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
                ))
                .title_top(Line::from(Span::styled(user, Style::default().fg(theme.muted))).right_aligned()),
        )
        .select(selected)
        .style(Style::default().fg(theme.fg))
        .highlight_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();

    let route = Span::styled(
        format!(" {} ", app.state.fragment()),
        Style::default().fg(theme.accent),
    );

    let hints = match app.state.route() {
        Route::Login => "│ Tab:Next field Enter:Log in ^S:Sign up ^C:Quit",
        Route::Signup => "│ Tab:Next field Enter:Create account ^L:Log in ^C:Quit",
        Route::Chat if app.rename.is_some() => "│ Enter:Save title Esc:Cancel",
        Route::Chat => "│ Tab:Sidebar/Composer ^N:New chat ^P:Profile ^O:Log out ^T:Theme ^C:Quit",
        Route::Profile => "│ Esc:Back to chat o:Log out ^C:Quit",
    };
    let hints = Span::styled(hints, Style::default().fg(theme.muted));

    let status = if let Some(notice) = app.state.notice() {
        Span::styled(format!(" │ {}", truncate(notice, 60)), Style::default().fg(theme.warning))
    } else {
        Span::raw("")
    };

    let bar = Paragraph::new(Line::from(vec![route, hints, status])).style(Style::default().bg(theme.bg));
    f.render_widget(bar, area);
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

/// A centered box of at most `width` x `height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}
