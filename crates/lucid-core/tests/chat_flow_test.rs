use std::sync::Arc;

use lucid_core::config::ClientConfig;
use lucid_core::models::AuthToken;
use lucid_core::state::{Action, AppState, Effect, Executor, LoginField, Route};
use lucid_core::{ApiClient, TokenStore};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    executor: Executor,
    store: Arc<TokenStore>,
    config: ClientConfig,
}

impl Harness {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let config = ClientConfig {
            api_url: format!("{}/api/v1", server.uri()),
            ..ClientConfig::default()
        };
        let api = Arc::new(ApiClient::from_config(&config).unwrap());
        let store = Arc::new(TokenStore::in_memory());
        let executor = Executor::new(api, Arc::clone(&store));
        Self {
            server,
            executor,
            store,
            config,
        }
    }

    async fn boot(&self, fragment: &str) -> AppState {
        let (mut state, effects) = AppState::boot(&self.config, Some(fragment));
        self.executor.drain(&mut state, effects).await;
        state
    }

    async fn mount_profile(&self, token: &str) {
        Mock::given(method("GET"))
            .and(path("/api/v1/user"))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "u1", "email": "a@b.c", "first_name": "Aidan", "last_name": "Loop"}
            })))
            .mount(&self.server)
            .await;
    }

    async fn mount_sessions(&self, items: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/v1/chat/sessions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"items": items}})),
            )
            .mount(&self.server)
            .await;
    }

    async fn mount_messages(&self, session_id: &str, items: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/chat/sessions/{}/messages", session_id).as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"items": items}})),
            )
            .mount(&self.server)
            .await;
    }
}

mod login_flow {
    use super::*;

    #[tokio::test]
    async fn test_login_loads_profile_sessions_and_messages() {
        let h = Harness::new().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"access_token": "tok", "token_type": "bearer"}
            })))
            .mount(&h.server)
            .await;
        h.mount_profile("tok").await;
        h.mount_sessions(json!([
            {"id": "s1", "title": "Roadmap"},
            {"id": "s2", "title": null}
        ]))
        .await;
        h.mount_messages(
            "s1",
            json!([
                {"id": "m1", "role": "user", "content": "hi"},
                {"id": "m2", "role": "assistant", "content": "hello"}
            ]),
        )
        .await;

        let mut state = h.boot("chat").await;
        assert_eq!(state.route(), Route::Login);
        assert!(state.auth_loaded());

        h.executor
            .dispatch(&mut state, Action::EditLogin(LoginField::Email, "a@b.c".into()))
            .await;
        h.executor
            .dispatch(&mut state, Action::EditLogin(LoginField::Password, "pw".into()))
            .await;
        h.executor.dispatch(&mut state, Action::SubmitLogin).await;

        assert_eq!(state.route(), Route::Chat);
        assert_eq!(state.user().map(|u| u.full_name()), Some("Aidan Loop".to_string()));
        assert_eq!(state.sessions().len(), 2);
        assert_eq!(state.active_session_id(), Some("s1"));
        assert_eq!(state.messages().len(), 2);

        let stored = h.store.load_auth().await.unwrap().unwrap();
        assert_eq!(stored.access_token, "tok");
        assert_eq!(stored.user.map(|u| u.email), Some("a@b.c".to_string()));
    }

    #[tokio::test]
    async fn test_stored_token_restores_session_on_boot() {
        let h = Harness::new().await;
        h.store.save_auth(&AuthToken::new("saved")).await.unwrap();
        h.mount_profile("saved").await;
        h.mount_sessions(json!([])).await;

        let state = h.boot("#profile").await;
        assert!(state.is_authenticated());
        assert_eq!(state.route(), Route::Profile);
        assert!(state.sessions().is_empty());
        assert!(state.active_session_id().is_none());
    }

    #[tokio::test]
    async fn test_rejected_token_logs_out_and_clears_store() {
        let h = Harness::new().await;
        h.store.save_auth(&AuthToken::new("expired")).await.unwrap();

        Mock::given(method("GET"))
            .and(path("/api/v1/user"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"detail": "Could not validate credentials"})),
            )
            .mount(&h.server)
            .await;
        h.mount_sessions(json!([{"id": "s1"}])).await;

        let state = h.boot("chat").await;
        assert!(!state.is_authenticated());
        assert_eq!(state.route(), Route::Login);
        assert!(state.sessions().is_empty());
        assert!(h.store.load_auth().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_store() {
        let h = Harness::new().await;
        h.store.save_auth(&AuthToken::new("tok")).await.unwrap();
        h.mount_profile("tok").await;
        h.mount_sessions(json!([])).await;

        let mut state = h.boot("chat").await;
        assert!(state.is_authenticated());

        h.executor.dispatch(&mut state, Action::Logout).await;
        assert_eq!(state.route(), Route::Login);
        assert!(h.store.load_auth().await.unwrap().is_none());
    }
}

mod send_flow {
    use super::*;

    async fn signed_in(h: &Harness) -> AppState {
        h.store.save_auth(&AuthToken::new("tok")).await.unwrap();
        h.mount_profile("tok").await;
        h.mount_sessions(json!([{"id": "s1", "title": "Roadmap"}])).await;
        h.mount_messages("s1", json!([])).await;
        h.boot("chat").await
    }

    #[tokio::test]
    async fn test_send_appends_server_pair() {
        let h = Harness::new().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/sessions/s1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "session_id": "s1",
                    "user_message": {"id": "m1", "role": "user", "content": "What's next?"},
                    "assistant_message": {"id": "m2", "role": "assistant", "content": "Ship it."}
                }
            })))
            .expect(1)
            .mount(&h.server)
            .await;

        let mut state = signed_in(&h).await;
        h.executor
            .dispatch(&mut state, Action::EditDraft("What's next?".into()))
            .await;
        h.executor.dispatch(&mut state, Action::SubmitMessage).await;

        let ids: Vec<&str> = state.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert!(!state.is_sending());
        assert!(state.draft().is_empty());
    }

    #[tokio::test]
    async fn test_failed_send_restores_draft() {
        let h = Harness::new().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/sessions/s1/messages"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"detail": "LLM provider error"})),
            )
            .mount(&h.server)
            .await;

        let mut state = signed_in(&h).await;
        h.executor
            .dispatch(&mut state, Action::EditDraft("hello".into()))
            .await;
        h.executor.dispatch(&mut state, Action::SubmitMessage).await;

        assert!(state.messages().is_empty());
        assert_eq!(state.draft(), "hello");
        assert_eq!(state.chat_error(), Some("LLM provider error"));
    }

    #[tokio::test]
    async fn test_first_message_creates_session() {
        let h = Harness::new().await;
        h.store.save_auth(&AuthToken::new("tok")).await.unwrap();
        h.mount_profile("tok").await;
        h.mount_sessions(json!([])).await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/sessions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"id": "s-new", "title": null}
            })))
            .expect(1)
            .mount(&h.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/sessions/s-new/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "session_id": "s-new",
                    "user_message": {"id": "m1", "role": "user", "content": "Draft the launch email"},
                    "assistant_message": {"id": "m2", "role": "assistant", "content": "Here it is"}
                }
            })))
            .expect(1)
            .mount(&h.server)
            .await;

        let mut state = h.boot("chat").await;
        h.executor
            .dispatch(&mut state, Action::EditDraft("Draft the launch email".into()))
            .await;
        h.executor.dispatch(&mut state, Action::SubmitMessage).await;

        assert_eq!(state.active_session_id(), Some("s-new"));
        assert_eq!(
            state.active_session().map(|s| s.display_title()),
            Some("Draft the launch email")
        );
        assert_eq!(state.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_draft_makes_no_request() {
        let h = Harness::new().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/sessions/s1/messages"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&h.server)
            .await;

        let mut state = signed_in(&h).await;
        h.executor
            .dispatch(&mut state, Action::EditDraft("   ".into()))
            .await;
        let effects = state.update(Action::SubmitMessage);
        assert!(!effects.iter().any(Effect::is_api_call));
        h.executor.drain(&mut state, effects).await;
        assert!(state.messages().is_empty());
    }
}
