use lucid_core::api::{ApiClient, ChatApi};
use lucid_core::models::{ChatRole, LoginRequest, RegisterRequest};
use lucid_core::LucidError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(format!("{}/api/v1/", server.uri())).unwrap();
    (server, client)
}

fn session_json(id: &str, title: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": "u1",
        "title": title,
        "created_at": "2024-05-01T10:00:00.000000",
        "updated_at": "2024-05-01T10:00:00.000000"
    })
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn test_login_posts_credentials_and_unwraps_token() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .and(body_json(json!({"email": "a@b.c", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"access_token": "tok-1", "token_type": "bearer"},
                "message": "Login successful"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = client
            .login(&LoginRequest {
                email: "a@b.c".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(token.access_token, "tok-1");
        assert_eq!(token.token_type, "bearer");
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_detail() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"detail": "Email or Password incorrect"})),
            )
            .mount(&server)
            .await;

        let err = client
            .login(&LoginRequest {
                email: "a@b.c".to_string(),
                password: "bad".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.user_message(), "Email or Password incorrect");
    }

    #[tokio::test]
    async fn test_register_posts_all_fields() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/login/register"))
            .and(body_json(json!({
                "first_name": "Aidan",
                "last_name": "Loop",
                "email": "a@b.c",
                "password": "pw"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"access_token": "tok-new"}
            })))
            .mount(&server)
            .await;

        let token = client
            .register(&RegisterRequest {
                first_name: "Aidan".to_string(),
                last_name: "Loop".to_string(),
                email: "a@b.c".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(token.access_token, "tok-new");
    }

    #[tokio::test]
    async fn test_current_user_sends_bearer() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/user"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "id": "u1",
                    "email": "a@b.c",
                    "first_name": "Aidan",
                    "last_name": "Loop",
                    "is_active": true
                }
            })))
            .mount(&server)
            .await;

        let user = client.current_user("tok-1").await.unwrap();
        assert_eq!(user.email, "a@b.c");
        assert_eq!(user.full_name(), "Aidan Loop");
        assert_eq!(user.extra.get("is_active"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_unauthorized_is_flagged() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/user"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"detail": "Could not validate credentials"})),
            )
            .mount(&server)
            .await;

        let err = client.current_user("expired").await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}

mod sessions {
    use super::*;

    #[tokio::test]
    async fn test_list_sessions_unwraps_page() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/chat/sessions"))
            .and(query_param("size", "50"))
            .and(query_param("page", "1"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "items": [session_json("s2", Some("Later")), session_json("s1", None)],
                    "total": 2,
                    "page": 1,
                    "size": 50,
                    "pages": 1
                }
            })))
            .mount(&server)
            .await;

        let sessions = client.list_sessions("tok", 50, 1).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].display_title(), "Later");
        assert_eq!(sessions[1].display_title(), "New chat");
    }

    #[tokio::test]
    async fn test_create_session_without_title_sends_empty_object() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/sessions"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": session_json("s9", None)
            })))
            .mount(&server)
            .await;

        let session = client.create_session("tok", None).await.unwrap();
        assert_eq!(session.id, "s9");
        assert!(session.is_untitled());
    }

    #[tokio::test]
    async fn test_rename_session_puts_title() {
        let (server, client) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/chat/sessions/s1"))
            .and(body_json(json!({"title": "Launch plan"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": session_json("s1", Some("Launch plan"))
            })))
            .mount(&server)
            .await;

        let session = client.rename_session("tok", "s1", "Launch plan").await.unwrap();
        assert_eq!(session.title.as_deref(), Some("Launch plan"));
    }
}

mod messages {
    use super::*;

    #[tokio::test]
    async fn test_list_messages_for_session() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/chat/sessions/s1/messages"))
            .and(query_param("size", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "items": [
                        {"id": "m1", "session_id": "s1", "role": "user", "content": "hi"},
                        {"id": "m2", "session_id": "s1", "role": "assistant", "content": "hello"}
                    ]
                }
            })))
            .mount(&server)
            .await;

        let messages = client.list_messages("tok", "s1", 20, 1).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[1].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_send_message_returns_pair() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/sessions/s1/messages"))
            .and(body_json(json!({"content": "hi", "role": "user"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "session_id": "s1",
                    "user_message": {"id": "m1", "role": "user", "content": "hi"},
                    "assistant_message": {"id": "m2", "role": "assistant", "content": "hello"}
                }
            })))
            .mount(&server)
            .await;

        let reply = client.send_message("tok", "s1", "hi").await.unwrap();
        assert_eq!(reply.user_message.id, "m1");
        assert_eq!(reply.assistant_message.content, "hello");
    }

    #[tokio::test]
    async fn test_non_json_error_is_generic() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/sessions/s1/messages"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = client.send_message("tok", "s1", "hi").await.unwrap_err();
        assert!(matches!(err, LucidError::Api { status: 502, .. }));
        assert_eq!(err.user_message(), "Request failed");
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_error() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/chat/sessions/s1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client.list_messages("tok", "s1", 50, 1).await.unwrap_err();
        assert!(matches!(err, LucidError::Decode(_)));
    }
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let client = ApiClient::new("http://127.0.0.1:9/api/v1").unwrap();
    let err = client.current_user("tok").await.unwrap_err();
    assert!(matches!(err, LucidError::Transport(_)));
    assert_eq!(err.user_message(), "Unable to reach the server");
}
