pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;

pub use api::{ApiClient, ChatApi};
pub use config::LucidConfig;
pub use error::{LucidError, LucidResult};
pub use state::{Action, AppState, Effect, Executor, Route};
pub use storage::TokenStore;
