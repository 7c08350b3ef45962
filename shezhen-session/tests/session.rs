//! Session lifecycle and entry points, end to end over a scripted transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use shezhen_core::{ImageBlob, InvalidInput};
use shezhen_llm::types::{GenerateContentRequest, GenerateContentResponse};
use shezhen_llm::{AnalysisClient, AnalysisFailure, InferenceTransport, StaticCredential, TransportError};
use shezhen_session::messages::{GENERIC_FAILURE, INVALID_IMAGE};
use shezhen_session::{AnalysisSession, AnalysisStatus, SessionError, request_analysis, select_image};

const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

fn analysis_text() -> String {
    json!({
        "visualFeatures": { "color": "淡红", "shape": "适中", "coating": "薄白", "moisture": "润泽" },
        "diagnosis": { "mainSyndrome": "平和质", "explanation": "舌象正常。" },
        "recommendations": { "dietary": ["饮食均衡"], "lifestyle": ["适度运动"], "herbalIngredients": [] }
    })
    .to_string()
}

/// Replays a fixed sequence of outcomes, one per call.
struct Scripted {
    calls: AtomicUsize,
    script: Vec<fn() -> Result<GenerateContentResponse, TransportError>>,
}

#[async_trait]
impl InferenceTransport for Scripted {
    async fn generate_content(
        &self,
        _model: &str,
        _api_key: &str,
        _request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.script[n.min(self.script.len() - 1)])()
    }
}

fn ok() -> Result<GenerateContentResponse, TransportError> {
    Ok(GenerateContentResponse::from_text(analysis_text()))
}

fn unavailable() -> Result<GenerateContentResponse, TransportError> {
    Err(TransportError::Status { status: 503, body: "unavailable".into() })
}

fn empty() -> Result<GenerateContentResponse, TransportError> {
    Ok(GenerateContentResponse::from_text(""))
}

fn session_with(script: Vec<fn() -> Result<GenerateContentResponse, TransportError>>) -> (AnalysisSession, Arc<Scripted>) {
    let transport = Arc::new(Scripted { calls: AtomicUsize::new(0), script });
    let client = AnalysisClient::new(transport.clone(), Arc::new(StaticCredential::new("k")), "m");
    (AnalysisSession::new(client), transport)
}

// ---------------------------------------------------------------------------
// Stateless entry points
// ---------------------------------------------------------------------------

#[tokio::test]
async fn entry_points_cover_the_happy_path() {
    let transport = Arc::new(Scripted { calls: AtomicUsize::new(0), script: vec![ok] });
    let client = AnalysisClient::new(transport.clone(), Arc::new(StaticCredential::new("k")), "m");

    let image = select_image(&ImageBlob::new(PNG, "image/png")).expect("png");
    let analysis = request_analysis(&client, &image).await.expect("analysis");
    assert_eq!(analysis.diagnosis.main_syndrome, "平和质");
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn select_image_rejects_documents() {
    let err = select_image(&ImageBlob::new(b"%PDF-1.7".to_vec(), "application/pdf")).unwrap_err();
    assert!(matches!(err, InvalidInput::NotAnImage(_)));
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn success_moves_to_success_with_result() {
    let (session, _) = session_with(vec![ok]);
    assert_eq!(session.status(), AnalysisStatus::Idle);

    session.select_image(&ImageBlob::new(PNG, "image/png")).expect("png");
    let analysis = session.request_analysis().await.expect("analysis");

    assert_eq!(session.status(), AnalysisStatus::Success);
    assert_eq!(session.result(), Some(analysis));
    assert_eq!(session.error_message(), None);
}

#[tokio::test]
async fn request_without_image_is_refused() {
    let (session, transport) = session_with(vec![ok]);
    assert!(matches!(session.request_analysis().await, Err(SessionError::NoImage)));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failure_shows_generic_message_and_allows_manual_retry() {
    let (session, transport) = session_with(vec![unavailable, ok]);
    session.select_image(&ImageBlob::new(PNG, "image/png")).expect("png");

    let err = session.request_analysis().await.unwrap_err();
    assert!(matches!(err, SessionError::Analysis(AnalysisFailure::ServiceFailure(_))));
    assert_eq!(session.status(), AnalysisStatus::Error);
    assert_eq!(session.error_message(), Some(GENERIC_FAILURE));
    assert!(session.current_image().is_some());

    session.request_analysis().await.expect("retry succeeds");
    assert_eq!(session.status(), AnalysisStatus::Success);
    assert_eq!(session.error_message(), None);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_response_is_reported_generically() {
    let (session, _) = session_with(vec![empty]);
    session.select_image(&ImageBlob::new(PNG, "image/png")).expect("png");
    let err = session.request_analysis().await.unwrap_err();
    assert!(matches!(err, SessionError::Analysis(AnalysisFailure::EmptyResponse)));
    assert_eq!(session.error_message(), Some(GENERIC_FAILURE));
}

#[tokio::test]
async fn selecting_new_image_resets_result() {
    let (session, _) = session_with(vec![ok]);
    session.select_image(&ImageBlob::new(PNG, "image/png")).expect("png");
    session.request_analysis().await.expect("analysis");

    session.select_image(&ImageBlob::new(PNG, "image/webp")).expect("webp");
    assert_eq!(session.status(), AnalysisStatus::Idle);
    assert_eq!(session.result(), None);
    assert_eq!(session.current_image().map(|i| i.media_type().to_string()).as_deref(), Some("image/webp"));
}

#[tokio::test]
async fn rejected_selection_keeps_previous_state() {
    let (session, _) = session_with(vec![ok]);
    session.select_image(&ImageBlob::new(PNG, "image/png")).expect("png");
    session.request_analysis().await.expect("analysis");

    let err = session.select_image(&ImageBlob::new(b"hi".to_vec(), "text/plain")).unwrap_err();
    assert!(matches!(err, SessionError::InvalidInput(InvalidInput::NotAnImage(_))));
    assert_eq!(session.status(), AnalysisStatus::Success);
    assert!(session.result().is_some());
    assert_eq!(
        shezhen_session::messages::user_message(shezhen_llm::FailureKind::InvalidInput),
        INVALID_IMAGE
    );
}

#[tokio::test]
async fn rejected_selection_never_reaches_the_transport() {
    let (session, transport) = session_with(vec![ok]);

    let err = session
        .select_image(&ImageBlob::new(b"plain notes".to_vec(), "text/plain"))
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidInput(InvalidInput::NotAnImage(_))));
    assert!(session.current_image().is_none());

    assert!(matches!(session.request_analysis().await, Err(SessionError::NoImage)));
    assert_eq!(session.status(), AnalysisStatus::Idle);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Re-submission while a call is outstanding
// ---------------------------------------------------------------------------

struct Gated {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    calls: AtomicUsize,
}

#[async_trait]
impl InferenceTransport for Gated {
    async fn generate_content(
        &self,
        _model: &str,
        _api_key: &str,
        _request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(GenerateContentResponse::from_text(analysis_text()))
    }
}

#[tokio::test]
async fn second_request_while_analyzing_is_busy() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let transport = Arc::new(Gated {
        entered: entered.clone(),
        release: release.clone(),
        calls: AtomicUsize::new(0),
    });
    let client = AnalysisClient::new(transport.clone(), Arc::new(StaticCredential::new("k")), "m");
    let session = AnalysisSession::new(client);
    session.select_image(&ImageBlob::new(PNG, "image/png")).expect("png");

    let running = {
        let session = session.clone();
        tokio::spawn(async move { session.request_analysis().await })
    };
    entered.notified().await;

    assert_eq!(session.status(), AnalysisStatus::Analyzing);
    assert!(matches!(session.request_analysis().await, Err(SessionError::Busy)));
    assert!(matches!(
        session.select_image(&ImageBlob::new(PNG, "image/png")),
        Err(SessionError::Busy)
    ));

    release.notify_one();
    running.await.expect("task").expect("analysis");
    assert_eq!(session.status(), AnalysisStatus::Success);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Never answers the first call; answers every later call normally.
struct HangsOnce {
    calls: AtomicUsize,
}

#[async_trait]
impl InferenceTransport for HangsOnce {
    async fn generate_content(
        &self,
        _model: &str,
        _api_key: &str,
        _request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, TransportError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        Ok(GenerateContentResponse::from_text(analysis_text()))
    }
}

#[tokio::test]
async fn timed_out_request_leaves_session_usable() {
    let transport = Arc::new(HangsOnce { calls: AtomicUsize::new(0) });
    let client = AnalysisClient::new(transport.clone(), Arc::new(StaticCredential::new("k")), "m");
    let session = AnalysisSession::new(client);
    session.select_image(&ImageBlob::new(PNG, "image/png")).expect("png");

    let timed_out = tokio::time::timeout(Duration::from_millis(50), session.request_analysis()).await;
    assert!(timed_out.is_err());

    assert_eq!(session.status(), AnalysisStatus::Error);
    assert_eq!(session.error_message(), Some(GENERIC_FAILURE));
    assert!(session.current_image().is_some());

    session.request_analysis().await.expect("retry succeeds");
    assert_eq!(session.status(), AnalysisStatus::Success);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);

    session.select_image(&ImageBlob::new(PNG, "image/jpeg")).expect("reselect");
    assert_eq!(session.status(), AnalysisStatus::Idle);
}

#[tokio::test]
async fn aborted_task_leaves_session_usable() {
    let transport = Arc::new(HangsOnce { calls: AtomicUsize::new(0) });
    let client = AnalysisClient::new(transport.clone(), Arc::new(StaticCredential::new("k")), "m");
    let session = AnalysisSession::new(client);
    session.select_image(&ImageBlob::new(PNG, "image/png")).expect("png");

    let running = {
        let session = session.clone();
        tokio::spawn(async move { session.request_analysis().await })
    };
    while transport.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(session.status(), AnalysisStatus::Analyzing);

    running.abort();
    assert!(running.await.unwrap_err().is_cancelled());

    assert_eq!(session.status(), AnalysisStatus::Error);
    session.request_analysis().await.expect("retry succeeds");
    assert_eq!(session.status(), AnalysisStatus::Success);
}
