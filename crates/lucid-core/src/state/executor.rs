use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::ChatApi;
use crate::storage::TokenStore;

use super::action::{Action, AuthFlow, Effect};
use super::app::AppState;

/// Performs the I/O `AppState` asks for and turns each outcome back into an
/// `Action`.
#[derive(Clone)]
pub struct Executor {
    api: Arc<dyn ChatApi>,
    store: Arc<TokenStore>,
    /// Last spawned token store effect; the next one waits for it.
    storage_tail: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Executor {
    pub fn new(api: Arc<dyn ChatApi>, store: Arc<TokenStore>) -> Self {
        Self {
            api,
            store,
            storage_tail: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn run(&self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::LoadAuth => match self.store.load_auth().await {
                Ok(token) => Some(Action::AuthLoaded(token)),
                Err(e) => {
                    warn!("Failed to read stored auth: {}", e);
                    Some(Action::AuthLoaded(None))
                }
            },
            Effect::PersistAuth(token) => match self.store.save_auth(&token).await {
                Ok(()) => None,
                Err(e) => Some(Action::StorageFailed(e)),
            },
            Effect::ClearAuth => match self.store.clear_auth().await {
                Ok(()) => None,
                Err(e) => Some(Action::StorageFailed(e)),
            },
            Effect::Login { ticket, request } => Some(Action::AuthFinished {
                ticket,
                flow: AuthFlow::Login,
                result: self.api.login(&request).await,
            }),
            Effect::Register { ticket, request } => Some(Action::AuthFinished {
                ticket,
                flow: AuthFlow::Signup,
                result: self.api.register(&request).await,
            }),
            Effect::FetchProfile { ticket, token } => Some(Action::ProfileLoaded {
                ticket,
                result: self.api.current_user(&token).await,
            }),
            Effect::FetchSessions {
                ticket,
                token,
                size,
            } => Some(Action::SessionsLoaded {
                ticket,
                result: self.api.list_sessions(&token, size, 1).await,
            }),
            Effect::FetchMessages {
                ticket,
                token,
                session_id,
                size,
            } => {
                let result = self.api.list_messages(&token, &session_id, size, 1).await;
                Some(Action::MessagesLoaded {
                    ticket,
                    session_id,
                    result,
                })
            }
            Effect::CreateSession {
                ticket,
                token,
                purpose,
            } => Some(Action::SessionCreated {
                ticket,
                purpose,
                result: self.api.create_session(&token, None).await,
            }),
            Effect::SendMessage {
                ticket,
                token,
                session_id,
                content,
            } => {
                let result = self.api.send_message(&token, &session_id, &content).await;
                Some(Action::MessageSent {
                    ticket,
                    session_id,
                    result,
                })
            }
            Effect::RenameSession {
                ticket,
                token,
                session_id,
                title,
            } => {
                let result = self.api.rename_session(&token, &session_id, &title).await;
                Some(Action::SessionRenamed {
                    ticket,
                    session_id,
                    result,
                })
            }
        }
    }

    /// Runs `effect` on the runtime and posts its completion to `tx`. API
    /// calls run concurrently; token store effects run one after another in
    /// the order they were spawned, so a logout's clear always lands after
    /// any earlier persist.
    pub fn spawn(&self, effect: Effect, tx: UnboundedSender<Action>) {
        let executor = self.clone();
        if effect.is_api_call() {
            tokio::spawn(async move { executor.complete(effect, tx).await });
            return;
        }

        let mut tail = match self.storage_tail.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous = tail.take();
        *tail = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    warn!("Previous storage task failed: {}", e);
                }
            }
            executor.complete(effect, tx).await;
        }));
    }

    async fn complete(&self, effect: Effect, tx: UnboundedSender<Action>) {
        if let Some(action) = self.run(effect).await {
            if tx.send(action).is_err() {
                debug!("Action channel closed, dropping completion");
            }
        }
    }

    /// Applies `effects` one at a time until nothing is left to do. Used by
    /// tests and headless callers that don't need concurrency.
    pub async fn drain(&self, state: &mut AppState, effects: Vec<Effect>) {
        let mut queue: std::collections::VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            if let Some(action) = self.run(effect).await {
                queue.extend(state.update(action));
            }
        }
    }

    /// `update` followed by `drain`.
    pub async fn dispatch(&self, state: &mut AppState, action: Action) {
        let effects = state.update(action);
        self.drain(state, effects).await;
    }
}
