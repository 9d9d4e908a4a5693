use crate::error::{LucidError, LucidResult};
use crate::models::{
    AuthToken, ChatMessage, ChatSession, LoginRequest, RegisterRequest, SendMessageReply, User,
};

use super::route::Route;

/// Identity of an in-flight request. Completions whose ticket is no longer the
/// latest for their channel are dropped.
pub type Ticket = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    FirstName,
    LastName,
    Email,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    Login,
    Signup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePurpose {
    /// Explicit "new chat".
    NewChat,
    /// First message typed with no active session.
    ForSend,
}

/// Everything that can change `AppState`: user intents and effect completions.
#[derive(Debug)]
pub enum Action {
    Navigate(Route),
    FragmentChanged(String),
    EditLogin(LoginField, String),
    EditSignup(SignupField, String),
    SubmitLogin,
    SubmitSignup,
    Logout,
    EditDraft(String),
    SubmitMessage,
    NewChat,
    SelectSession(String),
    HideSession(String),
    RenameSession { session_id: String, title: String },
    DismissNotice,

    AuthLoaded(Option<AuthToken>),
    AuthFinished {
        ticket: Ticket,
        flow: AuthFlow,
        result: LucidResult<AuthToken>,
    },
    ProfileLoaded {
        ticket: Ticket,
        result: LucidResult<User>,
    },
    SessionsLoaded {
        ticket: Ticket,
        result: LucidResult<Vec<ChatSession>>,
    },
    MessagesLoaded {
        ticket: Ticket,
        session_id: String,
        result: LucidResult<Vec<ChatMessage>>,
    },
    SessionCreated {
        ticket: Ticket,
        purpose: CreatePurpose,
        result: LucidResult<ChatSession>,
    },
    MessageSent {
        ticket: Ticket,
        session_id: String,
        result: LucidResult<SendMessageReply>,
    },
    SessionRenamed {
        ticket: Ticket,
        session_id: String,
        result: LucidResult<ChatSession>,
    },
    StorageFailed(LucidError),
}

/// I/O requested by `AppState::update`, performed by the `Executor`.
#[derive(Debug, Clone)]
pub enum Effect {
    LoadAuth,
    PersistAuth(AuthToken),
    ClearAuth,
    Login {
        ticket: Ticket,
        request: LoginRequest,
    },
    Register {
        ticket: Ticket,
        request: RegisterRequest,
    },
    FetchProfile {
        ticket: Ticket,
        token: String,
    },
    FetchSessions {
        ticket: Ticket,
        token: String,
        size: u32,
    },
    FetchMessages {
        ticket: Ticket,
        token: String,
        session_id: String,
        size: u32,
    },
    CreateSession {
        ticket: Ticket,
        token: String,
        purpose: CreatePurpose,
    },
    SendMessage {
        ticket: Ticket,
        token: String,
        session_id: String,
        content: String,
    },
    RenameSession {
        ticket: Ticket,
        token: String,
        session_id: String,
        title: String,
    },
}

impl Effect {
    /// True for effects that reach the chat API.
    pub fn is_api_call(&self) -> bool {
        !matches!(self, Effect::LoadAuth | Effect::PersistAuth(_) | Effect::ClearAuth)
    }
}
