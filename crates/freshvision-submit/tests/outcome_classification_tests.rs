//! Integration tests for submission outcome classification.

mod common;

use std::sync::Arc;

use common::{ScriptedTransport, variant_d_inputs};
use freshvision_submit::{
    NETWORK_ERROR_MESSAGE, ServerErrorCause, SubmissionClient, SubmissionOutcome, TransportError,
};
use serde_json::json;

const ENDPOINT: &str = "http://127.0.0.1:5000/";

fn client(transport: Arc<ScriptedTransport>) -> SubmissionClient {
    SubmissionClient::new(ENDPOINT, transport).expect("client should build")
}

#[test]
fn outcome_classification_transport_failure_is_network_error_without_retry() {
    let transport = Arc::new(ScriptedTransport::failing(TransportError::Connect(
        "connection refused".to_string(),
    )));
    let (slots, fields) = variant_d_inputs("4");

    let outcome = client(transport.clone()).submit(&slots, &fields);
    assert_eq!(outcome, SubmissionOutcome::NetworkError);
    assert_eq!(transport.request_count(), 1);
    assert!(!NETWORK_ERROR_MESSAGE.contains("refused"));
}

#[test]
fn outcome_classification_rejection_carries_service_message() {
    let transport = Arc::new(ScriptedTransport::replying(400, r#"{"error":"bad image"}"#));
    let (slots, fields) = variant_d_inputs("4");

    match client(transport).submit(&slots, &fields) {
        SubmissionOutcome::ServerError(error) => {
            assert_eq!(error.message, "bad image");
            assert_eq!(error.cause, ServerErrorCause::Rejected { status: 400 });
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[test]
fn outcome_classification_success_decodes_payload() {
    let body = json!({"freshness": "Fresh", "base_shelf_life": 5}).to_string();
    let transport = Arc::new(ScriptedTransport::replying(200, &body));
    let (slots, fields) = variant_d_inputs("4");

    match client(transport.clone()).submit(&slots, &fields) {
        SubmissionOutcome::Success(payload) => {
            assert_eq!(payload.text("freshness"), Some("Fresh"));
        }
        other => panic!("expected success, got {other:?}"),
    }

    let requests = transport.requests.lock().expect("request log lock should work");
    assert_eq!(
        requests[0].part_names(),
        vec!["product_image", "expiry_image", "temperature"]
    );
}
