use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lucid_core::config::{hero_image_urls, ClientConfig};
use lucid_core::state::{Action, AppState, Effect, LoginField, Route, SignupField};

use crate::theme::{Theme, THEMES};

pub const LOGIN_FIELDS: [LoginField; 2] = [LoginField::Email, LoginField::Password];

pub const SIGNUP_FIELDS: [SignupField; 4] = [
    SignupField::FirstName,
    SignupField::LastName,
    SignupField::Email,
    SignupField::Password,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sessions,
    Composer,
}

pub struct App {
    pub running: bool,
    pub state: AppState,
    pub theme_index: usize,
    pub login_field: usize,
    pub signup_field: usize,
    pub focus: Focus,
    pub session_cursor: usize,
    /// Title being edited for the session under the cursor.
    pub rename: Option<String>,
    pub hero_images: Vec<String>,
    pub api_url: String,
    last_active: Option<String>,
}

impl App {
    pub fn new(state: AppState, config: &ClientConfig) -> Self {
        Self {
            running: true,
            state,
            theme_index: 0,
            login_field: 0,
            signup_field: 0,
            focus: Focus::Composer,
            session_cursor: 0,
            rename: None,
            hero_images: hero_image_urls(&config.asset_bucket),
            api_url: config.api_url.clone(),
            last_active: None,
        }
    }

    pub fn theme(&self) -> &Theme {
        &THEMES[self.theme_index]
    }

    pub fn next_theme(&mut self) {
        self.theme_index = (self.theme_index + 1) % THEMES.len();
    }

    /// Feeds `action` to the state container and keeps view-local state in
    /// step with it.
    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        let effects = self.state.update(action);
        self.sync_cursor();
        effects
    }

    fn sync_cursor(&mut self) {
        let active = self.state.active_session_id().map(str::to_string);
        if active != self.last_active {
            if let Some(id) = &active {
                if let Some(pos) = self.state.sessions().iter().position(|s| &s.id == id) {
                    self.session_cursor = pos;
                }
            }
            self.last_active = active;
        }
        let len = self.state.sessions().len();
        if len == 0 {
            self.session_cursor = 0;
            self.rename = None;
        } else if self.session_cursor >= len {
            self.session_cursor = len - 1;
        }
    }

    fn cursor_session_id(&self) -> Option<String> {
        self.state
            .sessions()
            .get(self.session_cursor)
            .map(|s| s.id.clone())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.running = false;
                return Vec::new();
            }
            KeyCode::Char('t') if ctrl => {
                self.next_theme();
                return Vec::new();
            }
            _ => {}
        }

        match self.state.route() {
            Route::Login => self.login_key(key, ctrl),
            Route::Signup => self.signup_key(key, ctrl),
            Route::Chat => self.chat_key(key, ctrl),
            Route::Profile => self.profile_key(key, ctrl),
        }
    }

    fn login_key(&mut self, key: KeyEvent, ctrl: bool) -> Vec<Action> {
        if ctrl {
            return match key.code {
                KeyCode::Char('s') => vec![Action::Navigate(Route::Signup)],
                _ => Vec::new(),
            };
        }

        let field = LOGIN_FIELDS[self.login_field];
        let form = self.state.login_form();
        let mut value = match field {
            LoginField::Email => form.email.clone(),
            LoginField::Password => form.password.clone(),
        };

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.login_field = (self.login_field + 1) % LOGIN_FIELDS.len();
                Vec::new()
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.login_field = (self.login_field + LOGIN_FIELDS.len() - 1) % LOGIN_FIELDS.len();
                Vec::new()
            }
            KeyCode::Enter => {
                if self.login_field + 1 < LOGIN_FIELDS.len() {
                    self.login_field += 1;
                    Vec::new()
                } else {
                    vec![Action::SubmitLogin]
                }
            }
            KeyCode::Backspace => {
                value.pop();
                vec![Action::EditLogin(field, value)]
            }
            KeyCode::Char(c) => {
                value.push(c);
                vec![Action::EditLogin(field, value)]
            }
            _ => Vec::new(),
        }
    }

    fn signup_key(&mut self, key: KeyEvent, ctrl: bool) -> Vec<Action> {
        if ctrl {
            return match key.code {
                KeyCode::Char('l') => vec![Action::Navigate(Route::Login)],
                _ => Vec::new(),
            };
        }

        let field = SIGNUP_FIELDS[self.signup_field];
        let form = self.state.signup_form();
        let mut value = match field {
            SignupField::FirstName => form.first_name.clone(),
            SignupField::LastName => form.last_name.clone(),
            SignupField::Email => form.email.clone(),
            SignupField::Password => form.password.clone(),
        };

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.signup_field = (self.signup_field + 1) % SIGNUP_FIELDS.len();
                Vec::new()
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.signup_field =
                    (self.signup_field + SIGNUP_FIELDS.len() - 1) % SIGNUP_FIELDS.len();
                Vec::new()
            }
            KeyCode::Enter => {
                if self.signup_field + 1 < SIGNUP_FIELDS.len() {
                    self.signup_field += 1;
                    Vec::new()
                } else {
                    vec![Action::SubmitSignup]
                }
            }
            KeyCode::Backspace => {
                value.pop();
                vec![Action::EditSignup(field, value)]
            }
            KeyCode::Char(c) => {
                value.push(c);
                vec![Action::EditSignup(field, value)]
            }
            _ => Vec::new(),
        }
    }

    fn chat_key(&mut self, key: KeyEvent, ctrl: bool) -> Vec<Action> {
        if ctrl {
            return match key.code {
                KeyCode::Char('n') => vec![Action::NewChat],
                KeyCode::Char('p') => vec![Action::Navigate(Route::Profile)],
                KeyCode::Char('o') => vec![Action::Logout],
                _ => Vec::new(),
            };
        }

        if let Some(title) = self.rename.as_mut() {
            match key.code {
                KeyCode::Esc => self.rename = None,
                KeyCode::Backspace => {
                    title.pop();
                }
                KeyCode::Char(c) => title.push(c),
                KeyCode::Enter => {
                    let title = self.rename.take().unwrap_or_default();
                    if let Some(session_id) = self.cursor_session_id() {
                        return vec![Action::RenameSession { session_id, title }];
                    }
                }
                _ => {}
            }
            return Vec::new();
        }

        if key.code == KeyCode::Tab || key.code == KeyCode::BackTab {
            self.focus = match self.focus {
                Focus::Sessions => Focus::Composer,
                Focus::Composer => Focus::Sessions,
            };
            return Vec::new();
        }

        match self.focus {
            Focus::Composer => match key.code {
                KeyCode::Enter => vec![Action::SubmitMessage],
                KeyCode::Esc => vec![Action::DismissNotice],
                KeyCode::Backspace => {
                    let mut draft = self.state.draft().to_string();
                    draft.pop();
                    vec![Action::EditDraft(draft)]
                }
                KeyCode::Char(c) => {
                    let mut draft = self.state.draft().to_string();
                    draft.push(c);
                    vec![Action::EditDraft(draft)]
                }
                _ => Vec::new(),
            },
            Focus::Sessions => match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    let len = self.state.sessions().len();
                    if self.session_cursor + 1 < len {
                        self.session_cursor += 1;
                    }
                    Vec::new()
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.session_cursor = self.session_cursor.saturating_sub(1);
                    Vec::new()
                }
                KeyCode::Enter => match self.cursor_session_id() {
                    Some(id) => {
                        self.focus = Focus::Composer;
                        vec![Action::SelectSession(id)]
                    }
                    None => Vec::new(),
                },
                KeyCode::Char('n') => vec![Action::NewChat],
                KeyCode::Char('d') | KeyCode::Delete => match self.cursor_session_id() {
                    Some(id) => vec![Action::HideSession(id)],
                    None => Vec::new(),
                },
                KeyCode::Char('r') => {
                    if let Some(session) = self.state.sessions().get(self.session_cursor) {
                        self.rename = Some(session.title.clone().unwrap_or_default());
                    }
                    Vec::new()
                }
                KeyCode::Char('p') => vec![Action::Navigate(Route::Profile)],
                KeyCode::Esc => vec![Action::DismissNotice],
                _ => Vec::new(),
            },
        }
    }

    fn profile_key(&mut self, key: KeyEvent, ctrl: bool) -> Vec<Action> {
        match key.code {
            KeyCode::Char('o') => vec![Action::Logout],
            KeyCode::Char('p') if ctrl => vec![Action::Navigate(Route::Chat)],
            KeyCode::Esc | KeyCode::Char('c') => vec![Action::Navigate(Route::Chat)],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_core::models::{AuthToken, ChatSession};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn press(app: &mut App, event: KeyEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        for action in app.handle_key(event) {
            effects.extend(app.dispatch(action));
        }
        effects
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, key(KeyCode::Char(c)));
        }
    }

    fn logged_out() -> App {
        let config = ClientConfig::default();
        let (state, _) = AppState::boot(&config, None);
        let mut app = App::new(state, &config);
        app.dispatch(Action::AuthLoaded(None));
        app
    }

    fn in_chat(ids: &[&str]) -> App {
        let config = ClientConfig::default();
        let (state, _) = AppState::boot(&config, Some("chat"));
        let mut app = App::new(state, &config);
        let effects = app.dispatch(Action::AuthLoaded(Some(AuthToken::new("tok"))));
        let ticket = effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchSessions { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .unwrap();
        app.dispatch(Action::SessionsLoaded {
            ticket,
            result: Ok(ids
                .iter()
                .map(|id| ChatSession::new(*id, Some(id.to_uppercase())))
                .collect()),
        });
        app
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = logged_out();
        press(&mut app, ctrl('c'));
        assert!(!app.running);
    }

    #[test]
    fn test_login_form_typing_and_submit() {
        let mut app = logged_out();
        type_str(&mut app, "a@b.c");
        press(&mut app, key(KeyCode::Tab));
        type_str(&mut app, "pw");
        press(&mut app, key(KeyCode::Backspace));
        type_str(&mut app, "x");

        assert_eq!(app.state.login_form().email, "a@b.c");
        assert_eq!(app.state.login_form().password, "px");

        let effects = press(&mut app, key(KeyCode::Enter));
        assert!(matches!(effects.as_slice(), [Effect::Login { .. }]));
    }

    #[test]
    fn test_enter_advances_before_submit() {
        let mut app = logged_out();
        let effects = press(&mut app, key(KeyCode::Enter));
        assert!(effects.is_empty());
        assert_eq!(app.login_field, 1);
    }

    #[test]
    fn test_switch_between_login_and_signup() {
        let mut app = logged_out();
        press(&mut app, ctrl('s'));
        assert_eq!(app.state.route(), Route::Signup);
        type_str(&mut app, "Aidan");
        assert_eq!(app.state.signup_form().first_name, "Aidan");
        press(&mut app, ctrl('l'));
        assert_eq!(app.state.route(), Route::Login);
    }

    #[test]
    fn test_composer_edits_draft_and_sends() {
        let mut app = in_chat(&["s1"]);
        type_str(&mut app, "hello");
        assert_eq!(app.state.draft(), "hello");

        let effects = press(&mut app, key(KeyCode::Enter));
        assert!(matches!(
            effects.as_slice(),
            [Effect::SendMessage { session_id, content, .. }] if session_id == "s1" && content == "hello"
        ));
        assert_eq!(app.state.messages().len(), 1);
    }

    #[test]
    fn test_sidebar_navigation_and_select() {
        let mut app = in_chat(&["s1", "s2", "s3"]);
        assert_eq!(app.session_cursor, 0);
        press(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Sessions);

        press(&mut app, key(KeyCode::Char('j')));
        press(&mut app, key(KeyCode::Char('j')));
        press(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.session_cursor, 2);

        let effects = press(&mut app, key(KeyCode::Enter));
        assert_eq!(app.state.active_session_id(), Some("s3"));
        assert_eq!(app.focus, Focus::Composer);
        assert!(matches!(effects.as_slice(), [Effect::FetchMessages { .. }]));
    }

    #[test]
    fn test_hide_from_sidebar() {
        let mut app = in_chat(&["s1", "s2"]);
        press(&mut app, key(KeyCode::Tab));
        press(&mut app, key(KeyCode::Char('d')));
        assert_eq!(app.state.sessions().len(), 1);
        assert_eq!(app.state.active_session_id(), Some("s2"));
        assert_eq!(app.session_cursor, 0);
    }

    #[test]
    fn test_rename_prompt() {
        let mut app = in_chat(&["s1"]);
        press(&mut app, key(KeyCode::Tab));
        press(&mut app, key(KeyCode::Char('r')));
        assert_eq!(app.rename.as_deref(), Some("S1"));

        press(&mut app, key(KeyCode::Backspace));
        press(&mut app, key(KeyCode::Backspace));
        type_str(&mut app, "Roadmap");
        let effects = press(&mut app, key(KeyCode::Enter));
        assert!(app.rename.is_none());
        assert!(matches!(
            effects.as_slice(),
            [Effect::RenameSession { title, .. }] if title == "Roadmap"
        ));
    }

    #[test]
    fn test_profile_and_logout() {
        let mut app = in_chat(&["s1"]);
        press(&mut app, ctrl('p'));
        assert_eq!(app.state.route(), Route::Profile);
        press(&mut app, key(KeyCode::Esc));
        assert_eq!(app.state.route(), Route::Chat);

        let effects = press(&mut app, ctrl('o'));
        assert!(matches!(effects.as_slice(), [Effect::ClearAuth]));
        assert_eq!(app.state.route(), Route::Login);
    }

    #[test]
    fn test_hero_images_follow_bucket() {
        let config = ClientConfig {
            asset_bucket: "lucid-assets".to_string(),
            ..ClientConfig::default()
        };
        let (state, _) = AppState::boot(&config, None);
        let app = App::new(state, &config);
        assert_eq!(app.hero_images.len(), 3);
        assert!(app.hero_images[0].ends_with("/lucid-assets/images/signup-hero-1.jpg"));
    }
}
