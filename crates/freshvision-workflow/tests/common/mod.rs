//! Shared fixtures for workflow integration tests.

use std::sync::{Arc, Mutex};

use freshvision_capture::InMemoryPreviewStore;
use freshvision_catalog::{ReferenceCatalog, ReferenceRecord, ShelfLifeDays};
use freshvision_core::{MediaFile, VariantConfig, VariantId};
use freshvision_submit::{
    SubmissionClient, SubmissionRequest, SubmissionTransport, TransportError, TransportResponse,
};
use freshvision_workflow::{ResultCorrelator, WorkflowStateMachine};

/// Transport replaying one canned result and recording every request.
#[allow(dead_code)]
pub struct ScriptedTransport {
    reply: Result<TransportResponse, TransportError>,
    pub requests: Mutex<Vec<SubmissionRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn replying(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(TransportResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: TransportError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request log lock should work").len()
    }
}

impl SubmissionTransport for ScriptedTransport {
    fn send(&self, request: &SubmissionRequest) -> Result<TransportResponse, TransportError> {
        self.requests
            .lock()
            .expect("request log lock should work")
            .push(request.clone());
        self.reply.clone()
    }
}

#[allow(dead_code)]
pub fn client(transport: Arc<ScriptedTransport>) -> SubmissionClient {
    SubmissionClient::new("http://127.0.0.1:5000/", transport).expect("endpoint should be valid")
}

#[allow(dead_code)]
pub fn catalog() -> ReferenceCatalog {
    ReferenceCatalog::from_records(vec![
        ReferenceRecord::new("Fresh Apple", ShelfLifeDays::Days(30), "Crisp apple."),
        ReferenceRecord::new("Fresh", ShelfLifeDays::Days(5), "Generic fresh produce."),
        ReferenceRecord::new("Rotten Apple", ShelfLifeDays::Days(0), "Discard."),
    ])
}

/// Workflow over the shared test catalog with the variant's default strategy.
#[allow(dead_code)]
pub fn workflow(id: VariantId, previews: Arc<InMemoryPreviewStore>) -> WorkflowStateMachine {
    workflow_with(VariantConfig::builtin(id), catalog(), previews)
}

#[allow(dead_code)]
pub fn workflow_with(
    variant: VariantConfig,
    catalog: ReferenceCatalog,
    previews: Arc<InMemoryPreviewStore>,
) -> WorkflowStateMachine {
    let correlator = ResultCorrelator::new(
        Arc::new(catalog),
        variant.match_strategy(),
        variant.response().clone(),
    );
    WorkflowStateMachine::new(&variant, correlator, previews)
}

#[allow(dead_code)]
pub fn image(name: &str) -> MediaFile {
    MediaFile::new(name, Some("image/jpeg".to_string()), vec![0xFF, 0xD8, 0xFF, 0xE0])
}

/// Fills every slot of `workflow` with a synthetic image.
#[allow(dead_code)]
pub fn select_all(workflow: &mut WorkflowStateMachine) {
    let names: Vec<String> = workflow
        .slots()
        .iter()
        .map(|slot| slot.name().to_string())
        .collect();
    for name in names {
        workflow
            .select_file(&name, image(&format!("{name}.jpg")))
            .expect("slot should accept media");
    }
}
