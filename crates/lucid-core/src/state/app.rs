use tracing::{debug, info, warn};

use crate::config::{ClientConfig, ProfileFailurePolicy};
use crate::error::LucidError;
use crate::models::{
    AuthToken, ChatMessage, ChatRole, ChatSession, LoginRequest, RegisterRequest, SendMessageReply, User,
};

use super::action::{Action, AuthFlow, CreatePurpose, Effect, LoginField, SignupField, Ticket};
use super::route::Route;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// The one optimistic send in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSend {
    pub ticket: Ticket,
    pub placeholder_id: String,
    pub session_id: Option<String>,
    pub content: String,
}

impl PendingSend {
    /// The optimistic entry for this send, rebuilt when a reload dropped it.
    fn placeholder(&self) -> ChatMessage {
        ChatMessage {
            id: self.placeholder_id.clone(),
            session_id: self.session_id.clone(),
            role: ChatRole::User,
            content: self.content.clone(),
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Latest {
    auth: Option<Ticket>,
    profile: Option<Ticket>,
    sessions: Option<Ticket>,
    messages: Option<Ticket>,
    new_chat: Option<Ticket>,
    rename: Option<Ticket>,
}

/// Client state container. Owned by the host loop and mutated only through
/// [`AppState::update`].
#[derive(Debug)]
pub struct AppState {
    route: Route,
    requested: Route,
    auth: Option<AuthToken>,
    auth_loaded: bool,

    login: LoginForm,
    signup: SignupForm,
    auth_busy: bool,
    auth_error: Option<String>,

    sessions: Vec<ChatSession>,
    active_session: Option<String>,
    messages: Vec<ChatMessage>,
    draft: String,
    pending: Option<PendingSend>,
    loading_sessions: bool,
    loading_messages: bool,
    chat_error: Option<String>,
    notice: Option<String>,

    page_size: u32,
    profile_policy: ProfileFailurePolicy,
    next_ticket: Ticket,
    latest: Latest,
}

impl AppState {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            route: Route::Login,
            requested: Route::Login,
            auth: None,
            auth_loaded: false,
            login: LoginForm::default(),
            signup: SignupForm::default(),
            auth_busy: false,
            auth_error: None,
            sessions: Vec::new(),
            active_session: None,
            messages: Vec::new(),
            draft: String::new(),
            pending: None,
            loading_sessions: false,
            loading_messages: false,
            chat_error: None,
            notice: None,
            page_size: config.page_size,
            profile_policy: config.profile_failure,
            next_ticket: 0,
            latest: Latest::default(),
        }
    }

    /// Starts the client at `fragment`; the returned effects load the stored
    /// token, after which the auth gate is applied to the requested route.
    pub fn boot(config: &ClientConfig, fragment: Option<&str>) -> (Self, Vec<Effect>) {
        let mut state = Self::new(config);
        state.requested = fragment.map(Route::from_fragment).unwrap_or_default();
        state.route = state.requested.resolve(false);
        (state, vec![Effect::LoadAuth])
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn fragment(&self) -> String {
        self.route.to_string()
    }

    pub fn auth(&self) -> Option<&AuthToken> {
        self.auth.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.auth.as_ref().and_then(|a| a.user.as_ref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    pub fn auth_loaded(&self) -> bool {
        self.auth_loaded
    }

    pub fn login_form(&self) -> &LoginForm {
        &self.login
    }

    pub fn signup_form(&self) -> &SignupForm {
        &self.signup
    }

    pub fn auth_busy(&self) -> bool {
        self.auth_busy
    }

    pub fn auth_error(&self) -> Option<&str> {
        self.auth_error.as_deref()
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active_session.as_deref()
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        let id = self.active_session.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn pending(&self) -> Option<&PendingSend> {
        self.pending.as_ref()
    }

    pub fn is_sending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn loading_sessions(&self) -> bool {
        self.loading_sessions
    }

    pub fn loading_messages(&self) -> bool {
        self.loading_messages
    }

    pub fn chat_error(&self) -> Option<&str> {
        self.chat_error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn update(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Navigate(route) => {
                self.navigate(route);
                Vec::new()
            }
            Action::FragmentChanged(fragment) => {
                self.navigate(Route::from_fragment(&fragment));
                Vec::new()
            }
            Action::EditLogin(field, value) => {
                match field {
                    LoginField::Email => self.login.email = value,
                    LoginField::Password => self.login.password = value,
                }
                Vec::new()
            }
            Action::EditSignup(field, value) => {
                match field {
                    SignupField::FirstName => self.signup.first_name = value,
                    SignupField::LastName => self.signup.last_name = value,
                    SignupField::Email => self.signup.email = value,
                    SignupField::Password => self.signup.password = value,
                }
                Vec::new()
            }
            Action::SubmitLogin => self.submit_login(),
            Action::SubmitSignup => self.submit_signup(),
            Action::Logout => {
                info!("Logging out");
                self.end_auth(None)
            }
            Action::EditDraft(text) => {
                self.draft = text;
                Vec::new()
            }
            Action::SubmitMessage => self.submit_message(),
            Action::NewChat => self.new_chat(),
            Action::SelectSession(id) => {
                if self.sessions.iter().any(|s| s.id == id) {
                    self.select_session(Some(id))
                } else {
                    Vec::new()
                }
            }
            Action::HideSession(id) => self.hide_session(&id),
            Action::RenameSession { session_id, title } => self.rename_session(session_id, title),
            Action::DismissNotice => {
                self.notice = None;
                self.chat_error = None;
                Vec::new()
            }

            Action::AuthLoaded(token) => {
                self.auth_loaded = true;
                let effects = match token {
                    Some(token) => self.begin_auth(token),
                    None => Vec::new(),
                };
                self.route = self.requested.resolve(self.is_authenticated());
                effects
            }
            Action::AuthFinished {
                ticket,
                flow,
                result,
            } => self.on_auth_finished(ticket, flow, result),
            Action::ProfileLoaded { ticket, result } => self.on_profile_loaded(ticket, result),
            Action::SessionsLoaded { ticket, result } => self.on_sessions_loaded(ticket, result),
            Action::MessagesLoaded {
                ticket,
                session_id,
                result,
            } => self.on_messages_loaded(ticket, session_id, result),
            Action::SessionCreated {
                ticket,
                purpose,
                result,
            } => self.on_session_created(ticket, purpose, result),
            Action::MessageSent {
                ticket,
                session_id,
                result,
            } => self.on_message_sent(ticket, session_id, result),
            Action::SessionRenamed {
                ticket,
                session_id,
                result,
            } => self.on_session_renamed(ticket, session_id, result),
            Action::StorageFailed(err) => {
                warn!("Token store failure: {}", err);
                self.notice = Some("Could not save your sign-in on this device".to_string());
                Vec::new()
            }
        }
    }

    fn issue(&mut self) -> Ticket {
        self.next_ticket += 1;
        self.next_ticket
    }

    fn token(&self) -> Option<String> {
        self.auth.as_ref().map(|a| a.access_token.clone())
    }

    fn navigate(&mut self, route: Route) {
        self.requested = route;
        let resolved = route.resolve(self.is_authenticated());
        if resolved != route {
            debug!("Auth gate redirected {} to {}", route, resolved);
        }
        if resolved != self.route {
            self.auth_error = None;
        }
        self.route = resolved;
    }

    fn submit_login(&mut self) -> Vec<Effect> {
        if self.auth_busy {
            return Vec::new();
        }
        let email = self.login.email.trim().to_string();
        if email.is_empty() || self.login.password.is_empty() {
            self.auth_error = Some("Email and password are required".to_string());
            return Vec::new();
        }

        let ticket = self.issue();
        self.latest.auth = Some(ticket);
        self.auth_busy = true;
        self.auth_error = None;
        vec![Effect::Login {
            ticket,
            request: LoginRequest {
                email,
                password: self.login.password.clone(),
            },
        }]
    }

    fn submit_signup(&mut self) -> Vec<Effect> {
        if self.auth_busy {
            return Vec::new();
        }
        let form = &self.signup;
        if [&form.first_name, &form.last_name, &form.email]
            .iter()
            .any(|f| f.trim().is_empty())
            || form.password.is_empty()
        {
            self.auth_error = Some("All fields are required".to_string());
            return Vec::new();
        }

        let request = RegisterRequest {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        };
        let ticket = self.issue();
        self.latest.auth = Some(ticket);
        self.auth_busy = true;
        self.auth_error = None;
        vec![Effect::Register { ticket, request }]
    }

    fn on_auth_finished(
        &mut self,
        ticket: Ticket,
        flow: AuthFlow,
        result: Result<AuthToken, LucidError>,
    ) -> Vec<Effect> {
        if self.latest.auth != Some(ticket) {
            debug!("Dropping stale {:?} response", flow);
            return Vec::new();
        }
        self.latest.auth = None;
        self.auth_busy = false;

        match result {
            Ok(token) => {
                info!("{:?} succeeded", flow);
                self.login.password.clear();
                self.signup.password.clear();
                let mut effects = vec![Effect::PersistAuth(token.clone())];
                effects.extend(self.begin_auth(token));
                self.navigate(Route::Chat);
                effects
            }
            Err(err) => {
                self.auth_error = Some(err.user_message());
                Vec::new()
            }
        }
    }

    /// Installs a token and starts the fetches keyed on auth identity.
    fn begin_auth(&mut self, token: AuthToken) -> Vec<Effect> {
        self.reset_chat();
        let access = token.access_token.clone();
        self.auth = Some(token);

        let profile = self.issue();
        self.latest.profile = Some(profile);
        let sessions = self.issue();
        self.latest.sessions = Some(sessions);
        self.loading_sessions = true;

        vec![
            Effect::FetchProfile {
                ticket: profile,
                token: access.clone(),
            },
            Effect::FetchSessions {
                ticket: sessions,
                token: access,
                size: self.page_size,
            },
        ]
    }

    /// Clears the token and every cache tied to it.
    fn end_auth(&mut self, notice: Option<String>) -> Vec<Effect> {
        self.auth = None;
        self.reset_chat();
        self.latest = Latest::default();
        self.auth_busy = false;
        self.notice = notice;
        self.navigate(Route::Login);
        vec![Effect::ClearAuth]
    }

    fn reset_chat(&mut self) {
        self.sessions.clear();
        self.active_session = None;
        self.messages.clear();
        self.draft.clear();
        self.pending = None;
        self.loading_sessions = false;
        self.loading_messages = false;
        self.chat_error = None;
        self.latest.sessions = None;
        self.latest.messages = None;
        self.latest.new_chat = None;
        self.latest.rename = None;
        self.latest.profile = None;
    }

    fn on_profile_loaded(&mut self, ticket: Ticket, result: Result<User, LucidError>) -> Vec<Effect> {
        if self.latest.profile != Some(ticket) {
            return Vec::new();
        }
        self.latest.profile = None;

        match result {
            Ok(user) => match self.auth.take() {
                Some(auth) => {
                    let auth = auth.with_user(user);
                    self.auth = Some(auth.clone());
                    vec![Effect::PersistAuth(auth)]
                }
                None => Vec::new(),
            },
            Err(err) => {
                let logout = match self.profile_policy {
                    ProfileFailurePolicy::AnyFailure => true,
                    ProfileFailurePolicy::UnauthorizedOnly => err.is_unauthorized(),
                };
                if logout {
                    warn!("Profile refresh failed, signing out: {}", err);
                    self.end_auth(Some("Your session has ended. Please log in again.".to_string()))
                } else {
                    warn!("Profile refresh failed, keeping session: {}", err);
                    self.notice = Some(format!("Could not refresh profile: {}", err.user_message()));
                    Vec::new()
                }
            }
        }
    }

    fn on_sessions_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<ChatSession>, LucidError>,
    ) -> Vec<Effect> {
        if self.latest.sessions != Some(ticket) {
            return Vec::new();
        }
        self.latest.sessions = None;
        self.loading_sessions = false;

        match result {
            Ok(mut sessions) => {
                // A session created while the list was in flight stays visible.
                if let Some(active) = self.active_session() {
                    if !sessions.iter().any(|s| s.id == active.id) {
                        sessions.insert(0, active.clone());
                    }
                }
                debug!("Loaded {} sessions", sessions.len());
                self.sessions = sessions;
                if self.active_session.is_none() {
                    if let Some(first) = self.sessions.first().map(|s| s.id.clone()) {
                        return self.select_session(Some(first));
                    }
                }
                Vec::new()
            }
            Err(err) => {
                self.chat_error = Some(err.user_message());
                Vec::new()
            }
        }
    }

    /// Switches the active session; a new selection refetches its messages.
    fn select_session(&mut self, id: Option<String>) -> Vec<Effect> {
        if self.active_session == id {
            return Vec::new();
        }
        self.active_session = id.clone();
        self.messages.clear();
        self.chat_error = None;

        let Some(session_id) = id else {
            self.latest.messages = None;
            self.loading_messages = false;
            return Vec::new();
        };
        let Some(token) = self.token() else {
            return Vec::new();
        };

        let ticket = self.issue();
        self.latest.messages = Some(ticket);
        self.loading_messages = true;
        vec![Effect::FetchMessages {
            ticket,
            token,
            session_id,
            size: self.page_size,
        }]
    }

    fn on_messages_loaded(
        &mut self,
        ticket: Ticket,
        session_id: String,
        result: Result<Vec<ChatMessage>, LucidError>,
    ) -> Vec<Effect> {
        if self.latest.messages != Some(ticket)
            || self.active_session.as_deref() != Some(session_id.as_str())
        {
            debug!("Dropping stale messages for session {}", session_id);
            return Vec::new();
        }
        self.latest.messages = None;
        self.loading_messages = false;

        match result {
            Ok(mut messages) => {
                // Keep the optimistic entry visible while its send is in flight.
                if let Some(pending) = &self.pending {
                    if pending.session_id.as_deref() == Some(session_id.as_str()) {
                        let placeholder = self
                            .messages
                            .iter()
                            .find(|m| m.id == pending.placeholder_id)
                            .cloned()
                            .unwrap_or_else(|| pending.placeholder());
                        messages.push(placeholder);
                    }
                }
                self.messages = messages;
            }
            Err(err) => self.chat_error = Some(err.user_message()),
        }
        Vec::new()
    }

    fn submit_message(&mut self) -> Vec<Effect> {
        let content = self.draft.trim().to_string();
        if content.is_empty() || self.pending.is_some() {
            return Vec::new();
        }
        let Some(token) = self.token() else {
            return Vec::new();
        };

        let placeholder = ChatMessage::placeholder(self.active_session.clone(), content.clone());
        let ticket = self.issue();
        self.pending = Some(PendingSend {
            ticket,
            placeholder_id: placeholder.id.clone(),
            session_id: self.active_session.clone(),
            content: content.clone(),
        });
        self.messages.push(placeholder);
        self.draft.clear();
        self.chat_error = None;

        match self.active_session.clone() {
            Some(session_id) => vec![Effect::SendMessage {
                ticket,
                token,
                session_id,
                content,
            }],
            None => vec![Effect::CreateSession {
                ticket,
                token,
                purpose: CreatePurpose::ForSend,
            }],
        }
    }

    fn new_chat(&mut self) -> Vec<Effect> {
        let Some(token) = self.token() else {
            return Vec::new();
        };
        let ticket = self.issue();
        self.latest.new_chat = Some(ticket);
        vec![Effect::CreateSession {
            ticket,
            token,
            purpose: CreatePurpose::NewChat,
        }]
    }

    fn on_session_created(
        &mut self,
        ticket: Ticket,
        purpose: CreatePurpose,
        result: Result<ChatSession, LucidError>,
    ) -> Vec<Effect> {
        match purpose {
            CreatePurpose::NewChat => {
                if self.latest.new_chat != Some(ticket) {
                    return Vec::new();
                }
                self.latest.new_chat = None;
                match result {
                    Ok(session) => {
                        info!("Created session {}", session.id);
                        let id = session.id.clone();
                        self.sessions.retain(|s| s.id != id);
                        self.sessions.insert(0, session);
                        self.active_session = Some(id);
                        self.messages.clear();
                        self.latest.messages = None;
                        self.loading_messages = false;
                        self.chat_error = None;
                    }
                    Err(err) => self.chat_error = Some(err.user_message()),
                }
                Vec::new()
            }
            CreatePurpose::ForSend => {
                if self.pending.as_ref().map(|p| p.ticket) != Some(ticket) {
                    return Vec::new();
                }
                match result {
                    Ok(session) => {
                        let id = session.id.clone();
                        self.sessions.retain(|s| s.id != id);
                        self.sessions.insert(0, session);
                        self.active_session = Some(id.clone());
                        self.latest.messages = None;
                        self.loading_messages = false;

                        let Some(token) = self.token() else {
                            return Vec::new();
                        };
                        let Some(pending) = self.pending.as_mut() else {
                            return Vec::new();
                        };
                        pending.session_id = Some(id.clone());
                        let placeholder_id = pending.placeholder_id.clone();
                        let content = pending.content.clone();
                        if let Some(msg) = self.messages.iter_mut().find(|m| m.id == placeholder_id)
                        {
                            msg.session_id = Some(id.clone());
                        }
                        vec![Effect::SendMessage {
                            ticket,
                            token,
                            session_id: id,
                            content,
                        }]
                    }
                    Err(err) => {
                        self.roll_back_send(err);
                        Vec::new()
                    }
                }
            }
        }
    }

    fn on_message_sent(
        &mut self,
        ticket: Ticket,
        session_id: String,
        result: Result<SendMessageReply, LucidError>,
    ) -> Vec<Effect> {
        if self.pending.as_ref().map(|p| p.ticket) != Some(ticket) {
            return Vec::new();
        }

        match result {
            Ok(reply) => {
                let Some(pending) = self.pending.take() else {
                    return Vec::new();
                };
                if let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) {
                    if session.is_untitled() {
                        session.title = Some(ChatSession::auto_title(&pending.content));
                    }
                }
                if self.active_session.as_deref() == Some(session_id.as_str()) {
                    // A reload during the send may already hold the stored user message.
                    self.messages.retain(|m| {
                        m.id != pending.placeholder_id
                            && m.id != reply.user_message.id
                            && m.id != reply.assistant_message.id
                    });
                    self.messages.push(reply.user_message);
                    self.messages.push(reply.assistant_message);
                }
                Vec::new()
            }
            Err(err) => {
                self.roll_back_send(err);
                Vec::new()
            }
        }
    }

    /// Removes the placeholder and gives the text back to the composer.
    fn roll_back_send(&mut self, err: LucidError) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        warn!("Send failed, rolling back {}: {}", pending.placeholder_id, err);
        self.messages.retain(|m| m.id != pending.placeholder_id);
        if self.draft.is_empty() {
            self.draft = pending.content;
        }
        self.chat_error = Some(err.user_message());
    }

    fn hide_session(&mut self, id: &str) -> Vec<Effect> {
        let Some(index) = self.sessions.iter().position(|s| s.id == id) else {
            return Vec::new();
        };
        self.sessions.remove(index);
        if self.active_session.as_deref() != Some(id) {
            return Vec::new();
        }

        let fallback = self
            .sessions
            .get(index)
            .or_else(|| index.checked_sub(1).and_then(|i| self.sessions.get(i)))
            .map(|s| s.id.clone());
        self.select_session(fallback)
    }

    fn rename_session(&mut self, session_id: String, title: String) -> Vec<Effect> {
        let title = title.trim().to_string();
        if title.is_empty() {
            self.chat_error = Some("Title cannot be empty".to_string());
            return Vec::new();
        }
        if !self.sessions.iter().any(|s| s.id == session_id) {
            return Vec::new();
        }
        let Some(token) = self.token() else {
            return Vec::new();
        };
        let ticket = self.issue();
        self.latest.rename = Some(ticket);
        vec![Effect::RenameSession {
            ticket,
            token,
            session_id,
            title,
        }]
    }

    fn on_session_renamed(
        &mut self,
        ticket: Ticket,
        session_id: String,
        result: Result<ChatSession, LucidError>,
    ) -> Vec<Effect> {
        if self.latest.rename != Some(ticket) {
            return Vec::new();
        }
        self.latest.rename = None;
        match result {
            Ok(updated) => {
                if let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) {
                    *session = updated;
                }
            }
            Err(err) => self.chat_error = Some(err.user_message()),
        }
        Vec::new()
    }
}
