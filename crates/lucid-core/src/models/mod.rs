mod auth;
mod envelope;
mod message;
mod session;

pub use auth::{AuthToken, LoginRequest, RegisterRequest, User};
pub use envelope::{Envelope, Page};
pub use message::{ChatMessage, ChatRole, NewMessage, SendMessageReply};
pub use session::{ChatSession, NewSession, SessionUpdate, UNTITLED_SESSION};
