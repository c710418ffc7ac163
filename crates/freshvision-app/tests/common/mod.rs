//! Shared fixtures for app integration tests.

use std::sync::{Arc, Mutex};

use freshvision_submit::{
    SubmissionRequest, SubmissionTransport, TransportError, TransportResponse,
};

/// Transport answering every request with one canned response.
#[allow(dead_code)]
pub struct CannedTransport {
    status: u16,
    body: String,
    pub requests: Mutex<Vec<SubmissionRequest>>,
}

#[allow(dead_code)]
impl CannedTransport {
    pub fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request log lock should work").len()
    }
}

impl SubmissionTransport for CannedTransport {
    fn send(&self, request: &SubmissionRequest) -> Result<TransportResponse, TransportError> {
        self.requests
            .lock()
            .expect("request log lock should work")
            .push(request.clone());
        Ok(TransportResponse {
            status: self.status,
            body: self.body.as_bytes().to_vec(),
        })
    }
}

/// Catalog document in the on-disk `{ "products": [...] }` shape.
#[allow(dead_code)]
pub const CATALOG_JSON: &str = r#"{
  "products": [
    {"name": "Fresh Apple", "shelf_life_days": 30, "description": "Crisp apple."},
    {"name": "Fresh", "shelf_life_days": 5, "description": "Generic fresh produce."},
    {"name": "Rotten Banana", "shelf_life_days": "N/A", "description": "Discard."}
  ]
}"#;
