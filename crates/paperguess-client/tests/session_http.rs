//! GameSession driven against a mock HTTP server.

use std::sync::Arc;

use paperguess_client::{create_source, PaperguessConfig};
use paperguess_core::loader::{LoadOutcome, LoaderState, NoopObserver};
use paperguess_core::model::{CitationInput, GuessInput, ScoreMode};
use paperguess_core::feedback::{CitationBand, YearBand};
use paperguess_core::session::GameSession;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn paper_json() -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "year": 2015,
        "id": 42,
        "title": "Lattice Things",
        "cites": 200,
        "image": "data:image/png;base64,AAAA"
    })
}

fn config(server: &MockServer) -> PaperguessConfig {
    PaperguessConfig {
        server_url: server.uri(),
        request_timeout_secs: 5,
        retry_delay_ms: 10,
        ..Default::default()
    }
}

#[tokio::test]
async fn loader_recovers_after_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/random-paper"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "success": false,
            "error": "cache empty"
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/random-paper"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paper_json()))
        .mount(&server)
        .await;

    let config = config(&server);
    let session = GameSession::new(create_source(&config).unwrap(), config.session_config());

    let outcome = session.next_round(&NoopObserver).await;
    let LoadOutcome::Ready(round) = outcome else {
        panic!("expected a round, got {outcome:?}");
    };
    assert_eq!(round.actual.map(|a| a.year), Some(2015));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn loader_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/random-paper"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let config = config(&server);
    let session = GameSession::new(create_source(&config).unwrap(), config.session_config());

    let outcome = session.next_round(&NoopObserver).await;
    assert!(matches!(outcome, LoadOutcome::Failed { attempts: 3, .. }));
    assert!(matches!(
        session.loader().state(),
        LoaderState::Failed { attempts: 3, .. }
    ));
}

#[tokio::test]
async fn remote_scoring_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/random-paper"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paper_json()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/submit-guess"))
        .and(body_partial_json(serde_json::json!({
            "year_guess": 2015,
            "cite_guess": 220,
            "actual_year": 2015,
            "actual_cites": 200
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "year_score": 5000,
            "cite_score": 4811,
            "total_score": 9811
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = PaperguessConfig {
        score_mode: ScoreMode::Remote,
        ..config(&server)
    };
    let source = create_source(&config).unwrap();
    let session = GameSession::new(Arc::clone(&source), config.session_config());
    session.next_round(&NoopObserver).await;

    let outcome = session
        .submit(GuessInput {
            year: 2015,
            citations: CitationInput::Exact(220),
        })
        .await
        .unwrap();
    assert_eq!(outcome.score.total_score, 9811);
    assert_eq!(session.tally().cumulative_score, 9811);
}

#[tokio::test]
async fn remote_failure_leaves_round_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/random-paper"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paper_json()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/submit-guess"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let config = PaperguessConfig {
        score_mode: ScoreMode::Remote,
        ..config(&server)
    };
    let session = GameSession::new(create_source(&config).unwrap(), config.session_config());
    session.next_round(&NoopObserver).await;

    let err = session
        .submit(GuessInput {
            year: 2015,
            citations: CitationInput::Exact(220),
        })
        .await
        .unwrap_err();
    assert!(err.round_still_open());
    assert_eq!(session.tally().rounds_played, 0);
}

#[tokio::test]
async fn hidden_round_is_scored_and_revealed_by_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/random-paper"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "id": "0042",
            "image": "data:image/png;base64,AAAA"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/submit-guess"))
        .and(body_partial_json(serde_json::json!({
            "year_guess": 2014,
            "cite_guess": 220,
            "paper_id": "0042"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "year_score": 4900,
            "cite_score": 4811,
            "actual_year": 2015,
            "actual_cites": 200,
            "title": "Lattice Things"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = PaperguessConfig {
        score_mode: ScoreMode::Remote,
        ..config(&server)
    };
    let session = GameSession::new(create_source(&config).unwrap(), config.session_config());
    let outcome = session.next_round(&NoopObserver).await;
    assert!(matches!(outcome, LoadOutcome::Ready(ref r) if r.actual.is_none()));

    let outcome = session
        .submit(GuessInput {
            year: 2014,
            citations: CitationInput::Exact(220),
        })
        .await
        .unwrap();
    assert_eq!(outcome.score.total_score, 9711);
    assert_eq!(outcome.year_feedback.band, YearBand::OffByOne);
    assert_eq!(outcome.citation_feedback.band, CitationBand::PercentSlight);
    assert_eq!(outcome.round.title, "Lattice Things");
    assert_eq!(
        outcome.round.eprint_url(true).as_deref(),
        Some("https://eprint.iacr.org/2015/0042")
    );

    let history = session.history();
    assert_eq!(history.rounds[0].year_actual, 2015);
    assert_eq!(history.rounds[0].citation_actual, 200);

    let requests = server.received_requests().await.unwrap();
    let submitted: serde_json::Value = requests
        .iter()
        .find(|r| r.url.path() == "/api/submit-guess")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .unwrap();
    assert!(submitted.get("actual_year").is_none());
    assert!(submitted.get("actual_cites").is_none());
}
