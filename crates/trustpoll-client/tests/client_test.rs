//! HTTP contract tests against a local mock server

use serde_json::json;
use std::time::Duration;
use trustpoll_client::*;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> TrustPollClient {
    TrustPollClient::new(ClientConfig {
        base_url: server.uri(),
        ..Default::default()
    })
    .expect("client builds")
}

#[tokio::test]
async fn test_stats_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": 120,
            "vote_attempts": 340,
            "ai_flags": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stats = client_for(&server).stats().await.unwrap();
    assert_eq!(stats.users, 120);
    assert_eq!(stats.ai_flags, 3);
    assert_eq!(stats.governance_status, None);
}

#[tokio::test]
async fn test_candidates_wrapped_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/candidates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": 1, "name": "Aria Shah", "votes": 12}]
        })))
        .mount(&server)
        .await;

    let candidates = client_for(&server).candidates().await.unwrap();
    assert_eq!(
        candidates,
        vec![Candidate {
            id: 1,
            name: "Aria Shah".into(),
            votes: 12
        }]
    );
}

#[tokio::test]
async fn test_audit_events_sends_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/audit-events"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "event_type": "RESULTS_PUBLISHED",
            "severity": "HIGH",
            "payload": {"published": true},
            "entry_hash": "9f2c4e0a7b1d3c5e9f2c4e0a7b1d3c5e",
            "anchored_tx_id": "TXABC",
            "anchored_round": 41234,
            "created_at": "2024-01-01T10:00:00Z"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let events = client_for(&server).audit_events(100).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].anchored_round, Some(41234));
}

#[tokio::test]
async fn test_governance_audit_encodes_election_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/governance-audit"))
        .and(query_param("election_id", "demo 1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"audit": null})))
        .expect(1)
        .mount(&server)
        .await;

    let audit = client_for(&server).governance_audit("demo 1").await.unwrap();
    assert_eq!(audit, None);
}

#[tokio::test]
async fn test_block_sends_subject_and_minutes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/block-email"))
        .and(body_json(json!({"email": "student@vit.edu", "minutes": 30})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"blocked_until": "2024-01-01T10:30:00Z"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client_for(&server)
        .block_subject(&Subject::email("student@vit.edu"), 30)
        .await
        .unwrap();
    assert_eq!(receipt.blocked_until, "2024-01-01T10:30:00Z");
}

#[tokio::test]
async fn test_add_candidate_body_and_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/add-candidate"))
        .and(body_json(json!({"name": "Aria Shah", "admin_id": "admin@vit.edu"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Candidate added",
            "id": 7,
            "name": "Aria Shah"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let candidate = client_for(&server)
        .add_candidate(&AddCandidateRequest {
            name: "Aria Shah".into(),
            admin_id: Some("admin@vit.edu".into()),
        })
        .await
        .unwrap();
    assert_eq!(candidate.id, 7);
    assert_eq!(candidate.votes, 0);
}

#[tokio::test]
async fn test_server_error_message_is_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/acknowledge-flag"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Wallet is required"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .acknowledge_flag(&Subject::email("student@vit.edu"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Server);
    assert_eq!(err.server_message(), Some("Wallet is required"));
    assert!(matches!(err, ApiError::Server { status: 400, .. }));
}

#[tokio::test]
async fn test_server_error_without_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/publish-results"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .publish_results(&PublishResultsRequest {
            published: true,
            admin_id: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Server);
    assert_eq!(err.server_message(), None);
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/ai-flags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"flags": []})))
        .mount(&server)
        .await;

    let err = client_for(&server).ai_flags().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn test_generate_fairness_posts_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fairness-index"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fairness_score": 97.0,
            "metrics": {},
            "fairness_hash": "abc",
            "governance_risk_flag": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = client_for(&server).generate_fairness_report().await.unwrap();
    assert_eq!(report.fairness_score, 97.0);
    assert_eq!(report.algorand_tx_id, None);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let client = TrustPollClient::new(ClientConfig {
        base_url: "http://127.0.0.1:1".into(),
        timeout_secs: 2,
        ..Default::default()
    })
    .unwrap();

    let err = client.stats().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"users": 1, "vote_attempts": 1, "ai_flags": 0}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = TrustPollClient::new(ClientConfig {
        base_url: server.uri(),
        timeout_secs: 1,
        ..Default::default()
    })
    .unwrap();

    let err = client.stats().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Backend running"))
        .mount(&server)
        .await;

    assert!(client_for(&server).health().await.unwrap());
}
