mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{spawn_backend, test_client, test_client_with_timeout, EXPIRED_TOKEN, SUSPENDED_TENANT};
use crmdesk_client::helpers::session::{SessionKey, SessionStore};
use crmdesk_client::{ClientError, ErrorKind};
use shared_types::{ContactStats, ImportSessionsResponse, LogStats};

#[tokio::test]
async fn test_session_headers_are_attached() {
    let (state, base_url) = spawn_backend();
    let client = test_client(&base_url, "t-1");

    let stats: ContactStats = client.api.get("/contacts/stats").await.unwrap();
    assert_eq!(stats.total_contacts, 3);

    assert_eq!(state.last_header("authorization").as_deref(), Some("Bearer t-1"));
    assert_eq!(state.last_header("x-tenant-id").as_deref(), Some("tenant-1"));
    assert_eq!(state.last_header("x-environment").as_deref(), Some("staging"));
    assert!(state.last_header("x-request-id").is_some());
}

#[tokio::test]
async fn test_missing_token_sends_no_authorization() {
    let (state, base_url) = spawn_backend();
    let client = test_client(&base_url, "t-1");
    client.session.remove(SessionKey::Token);

    let _: ContactStats = client.api.get("/contacts/stats").await.unwrap();
    assert!(state.last_header("authorization").is_none());
    assert_eq!(state.last_header("x-tenant-id").as_deref(), Some("tenant-1"));
}

#[tokio::test]
async fn test_unauthorized_clears_session_and_redirects_once() {
    let (state, base_url) = spawn_backend();
    let client = test_client(&base_url, EXPIRED_TOKEN);

    let result: Result<LogStats, _> = client.api.get("/logs/stats").await;

    match result {
        Err(ClientError::Unauthorized(message)) => assert_eq!(message, "Token expired"),
        other => panic!("expected unauthorized, got {:?}", other.map(|_| ())),
    }
    assert_eq!(state.hits("logs.stats"), 1);
    assert_eq!(client.redirect.count.load(Ordering::SeqCst), 1);
    assert_eq!(
        client.redirect.last_path.lock().unwrap().as_deref(),
        Some("/login")
    );
    for key in [SessionKey::Token, SessionKey::TenantId, SessionKey::User] {
        assert!(client.session.get(key).is_none(), "{:?} survived logout", key);
    }
}

#[tokio::test]
async fn test_unauthorized_query_is_not_retried() {
    let (state, base_url) = spawn_backend();
    let client = test_client(&base_url, EXPIRED_TOKEN);

    let result = client.hooks.logs.use_log_stats().await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::AuthenticationRequired);
    assert_eq!(state.hits("logs.stats"), 1);
    assert_eq!(client.redirect.count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_not_found_uses_body_message_and_is_not_retried() {
    let (state, base_url) = spawn_backend();
    let client = test_client(&base_url, "t-1");

    let result = client.hooks.contacts.use_contact(404).await;

    match result {
        Err(ClientError::NotFound(message)) => assert_eq!(message, "Contact not found"),
        other => panic!("expected not found, got {:?}", other.map(|_| ())),
    }
    assert_eq!(state.hits("contacts.detail"), 1);
    assert_eq!(client.redirect.count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_server_errors_are_retried_then_succeed() {
    let (state, base_url) = spawn_backend();
    let client = test_client(&base_url, "t-1");
    state.summary_failures.store(2, Ordering::SeqCst);

    let summary = client.hooks.transactions.use_transaction_summary().await.unwrap();

    assert_eq!(summary.total_transactions, 2);
    assert_eq!(state.hits("transactions.summary"), 3);
}

#[tokio::test]
async fn test_server_errors_give_up_after_two_retries() {
    let (state, base_url) = spawn_backend();
    let client = test_client(&base_url, "t-1");
    state.summary_failures.store(10, Ordering::SeqCst);

    let result = client.hooks.transactions.use_transaction_summary().await;

    assert!(matches!(result, Err(ClientError::Server { status: 503, .. })));
    assert_eq!(state.hits("transactions.summary"), 3);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let (state, base_url) = spawn_backend();
    state.slow_log_stats.store(true, Ordering::SeqCst);
    let client = test_client_with_timeout(&base_url, "t-1", Duration::from_millis(100));

    let result: Result<LogStats, _> = client.api.get("/logs/stats").await;

    let error = result.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Timeout, "unexpected {:?}", error);
    assert!(error.is_transient());
    assert_eq!(state.hits("logs.stats"), 1);
}

#[tokio::test]
async fn test_timed_out_query_is_retried_twice() {
    let (state, base_url) = spawn_backend();
    state.slow_log_stats.store(true, Ordering::SeqCst);
    let client = test_client_with_timeout(&base_url, "t-1", Duration::from_millis(100));

    let result = client.hooks.logs.use_log_stats().await;

    assert!(matches!(result, Err(ClientError::Timeout(_))));
    assert_eq!(state.hits("logs.stats"), 3);
    assert_eq!(client.redirect.count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_an_error() {
    let (_state, base_url) = spawn_backend();
    let client = test_client(&base_url, "t-1");
    client
        .session
        .set(SessionKey::TenantId, SUSPENDED_TENANT.to_string());

    let result: Result<ImportSessionsResponse, _> = client.api.get("/import/sessions").await;
    assert!(matches!(result, Err(ClientError::Api(message)) if message == "Tenant suspended"));
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    let client = test_client("http://127.0.0.1:9/api", "t-1");

    let result: Result<ContactStats, _> = client.api.get("/contacts/stats").await;
    let error = result.unwrap_err();
    assert!(error.is_transient(), "unexpected {:?}", error);
    assert_eq!(client.redirect.count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_clones_share_session() {
    let (_state, base_url) = spawn_backend();
    let client = test_client(&base_url, EXPIRED_TOKEN);
    let clone = client.api.clone();

    let _ = clone.get::<LogStats>("/logs/stats").await;
    assert!(client.session.get(SessionKey::Token).is_none());
    assert!(client.api.session().get(SessionKey::TenantId).is_none());
}
