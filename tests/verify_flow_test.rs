use ed25519_dalek::SigningKey;
use pretty_assertions::assert_eq;
use serde_json::json;
use wallet_verification::config::ApiConfig;
use wallet_verification::flow::{VerificationFlow, SUCCESS_MESSAGE};
use wallet_verification::models::{UiState, VerificationRequest};
use wallet_verification::service::HttpVerificationService;
use wallet_verification::wallet::{KeypairWallet, WalletProvider};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn wallet() -> KeypairWallet {
    KeypairWallet::from_signing_key(SigningKey::from_bytes(&[21u8; 32]))
}

fn service_for(base: &str) -> HttpVerificationService {
    let config = ApiConfig {
        url: base.to_string(),
        ..ApiConfig::default()
    };
    HttpVerificationService::new(&config).expect("http client")
}

fn flow_for(server: &MockServer) -> VerificationFlow<KeypairWallet, HttpVerificationService> {
    let link = format!("{}/?userId=42", server.uri());
    VerificationFlow::from_page_url(&link, wallet(), service_for(&server.uri())).expect("link")
}

#[tokio::test]
async fn test_verified_address() {
    let server = MockServer::start().await;
    let address = wallet().public_key().unwrap();
    let message = format!(
        "Verify ownership of Solana address {} for Telegram user 42",
        address
    );

    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "user_id": 42,
            "message": message,
            "publicKey": address,
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "message": "Signature verified successfully"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut flow = flow_for(&server);
    assert_eq!(
        flow.sign_and_verify().await,
        &UiState::Success(SUCCESS_MESSAGE.to_string())
    );

    // The submitted signature must verify against the submitted key
    let received = server.received_requests().await.unwrap();
    let body: VerificationRequest = serde_json::from_slice(&received[0].body).unwrap();
    let pubkey = wallet_auth::decode_pubkey_b58(&body.public_key).unwrap();
    let sig = wallet_auth::decode_sig_b64(&body.signature).unwrap();
    assert!(wallet_auth::verify_ed25519(&pubkey, body.message.as_bytes(), &sig).unwrap());
}

#[tokio::test]
async fn test_success_false_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "x"})))
        .mount(&server)
        .await;

    let mut flow = flow_for(&server);
    assert_eq!(flow.sign_and_verify().await, &UiState::Error("x".to_string()));
}

#[tokio::test]
async fn test_bad_request_uses_body_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Signature verification failed: Signature was forged or corrupt"
        })))
        .mount(&server)
        .await;

    let mut flow = flow_for(&server);
    assert_eq!(
        flow.sign_and_verify().await,
        &UiState::Error("Signature verification failed: Signature was forged or corrupt".to_string())
    );
}

#[tokio::test]
async fn test_server_error_without_message_mentions_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut flow = flow_for(&server);
    assert_eq!(
        flow.sign_and_verify().await,
        &UiState::Error("Server error: 503".to_string())
    );
    assert!(flow.render().ends_with("Error: Server error: 503\n[Try Again]"));
}

#[tokio::test]
async fn test_malformed_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ngrok</html>"))
        .mount(&server)
        .await;

    let mut flow = flow_for(&server);
    match flow.sign_and_verify().await {
        UiState::Error(text) => assert!(text.starts_with("Malformed response:")),
        other => panic!("unexpected state {:?}", other),
    }
}

#[tokio::test]
async fn test_disconnected_wallet_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;

    let link = format!("{}/?userId=42", server.uri());
    let mut flow =
        VerificationFlow::from_page_url(&link, KeypairWallet::disconnected(), service_for(&server.uri()))
            .unwrap();
    assert_eq!(
        flow.sign_and_verify().await,
        &UiState::Error("Please connect your wallet first".to_string())
    );
}

#[tokio::test]
async fn test_unreachable_backend_then_retry() {
    let server = MockServer::start().await;
    let dead_base = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let link = format!("{}/?userId=42", server.uri());
    let mut flow = VerificationFlow::from_page_url(&link, wallet(), service_for(&dead_base)).unwrap();
    match flow.sign_and_verify().await {
        UiState::Error(text) => assert!(text.starts_with("Network error:")),
        other => panic!("unexpected state {:?}", other),
    }

    flow.try_again();
    assert_eq!(flow.state(), &UiState::Idle);
    assert!(flow.render().contains("Connected with wallet: "));
}
