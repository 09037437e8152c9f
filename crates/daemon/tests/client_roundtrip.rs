//! Sender and reader talking to a live relay over a real socket

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use common::crypto::{decrypt, encrypt, EncryptionMaterial};
use common::share_link::{build_share_url, parse_share_url};
use common::store::MemoryStore;
use secure_share_daemon::http_server::api::client::{ApiClient, ApiError, RetryPolicy};
use secure_share_daemon::http_server::api::secret::{CreateRequest, FetchRequest};
use secure_share_daemon::http_server::{self, Config};
use secure_share_daemon::service_state::TtlPolicy;
use secure_share_daemon::ServiceState;

async fn spawn_relay() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = ServiceState::new(Arc::new(MemoryStore::new()), TtlPolicy::default());
    let router = http_server::router(&Config::default(), state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Url::parse(&format!("http://{}", addr)).unwrap()
}

#[tokio::test]
async fn test_send_and_open_through_relay() {
    let remote = spawn_relay().await;
    let client = ApiClient::new(&remote).unwrap();

    // sender
    let material = EncryptionMaterial::generate();
    let created = client
        .call(CreateRequest {
            cipher_text: encrypt("launch codes: 0000", &material),
            iv: material.iv_b64(),
            expires_in: Some(120),
        })
        .await
        .unwrap();
    let link = build_share_url(
        remote.as_str(),
        created.id.as_str(),
        &material.key_b64(),
        &material.iv_b64(),
    );

    // reader
    let parsed = parse_share_url(&link).unwrap();
    let reader_material = EncryptionMaterial::from_base64(&parsed.key, &parsed.iv).unwrap();
    let payload = client
        .call(FetchRequest {
            id: parsed.id.parse().unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(
        decrypt(&payload.cipher_text, &reader_material).unwrap(),
        "launch codes: 0000"
    );

    // a second reader only learns that it is gone
    let err = client
        .call(FetchRequest {
            id: parsed.id.parse().unwrap(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn test_validation_errors_are_not_retried() {
    let remote = spawn_relay().await;
    let client = ApiClient::new(&remote).unwrap();

    let err = client
        .call(CreateRequest {
            cipher_text: "Y2lwaGVy".to_string(),
            iv: "aXY=".to_string(),
            expires_in: Some(9999999),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus(..)));
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn test_fetch_gives_up_after_retries() {
    // bind then drop to get a port nothing listens on
    let addr: SocketAddr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let remote = Url::parse(&format!("http://{}", addr)).unwrap();
    let client = ApiClient::new(&remote).unwrap().with_retry_policy(RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(5),
    });

    let started = std::time::Instant::now();
    let err = client
        .call(FetchRequest {
            id: "abc123".parse().unwrap(),
        })
        .await
        .unwrap_err();

    match err {
        ApiError::Reqwest(e) => assert!(e.is_connect(), "{}", e),
        other => panic!("unexpected error: {}", other),
    }
    // 10ms + 20ms + 40ms of backoff
    assert!(started.elapsed() >= Duration::from_millis(70));
}

#[tokio::test]
async fn test_timed_out_fetch_is_not_retried() {
    // accepts connections and never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(stream);
        }
    });

    let remote = Url::parse(&format!("http://{}", addr)).unwrap();
    let client = ApiClient::new(&remote)
        .unwrap()
        .with_timeout(Duration::from_millis(200))
        .unwrap()
        .with_retry_policy(RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(5),
        });

    let err = client
        .call(FetchRequest {
            id: "abc123".parse().unwrap(),
        })
        .await
        .unwrap_err();

    match err {
        ApiError::Reqwest(e) => assert!(e.is_timeout(), "{}", e),
        other => panic!("unexpected error: {}", other),
    }
    // the relay may have served and deleted the secret, so one attempt only
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}
