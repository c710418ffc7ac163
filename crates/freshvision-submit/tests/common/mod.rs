//! Shared fixtures for submission integration tests.

use std::sync::Mutex;

use freshvision_core::{AuxiliaryField, MediaFile, MediaSlot, PreviewRef, VariantConfig, VariantId};
use freshvision_submit::{
    SubmissionRequest, SubmissionTransport, TransportError, TransportResponse,
};

/// Transport replaying one canned result and recording every request.
#[allow(dead_code)]
pub struct ScriptedTransport {
    reply: Result<TransportResponse, TransportError>,
    pub requests: Mutex<Vec<SubmissionRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn replying(status: u16, body: &str) -> Self {
        Self {
            reply: Ok(TransportResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        }
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

/// Variant D inputs with both images selected and `temperature` set.
#[allow(dead_code)]
pub fn variant_d_inputs(temperature: &str) -> (Vec<MediaSlot>, Vec<AuxiliaryField>) {
    let (mut slots, mut fields) = VariantConfig::builtin(VariantId::D).instantiate();
    for (index, slot) in slots.iter_mut().enumerate() {
        let name = format!("{}.jpg", slot.name());
        slot.replace(
            MediaFile::new(name, Some("image/jpeg".to_string()), vec![index as u8; 16]),
            PreviewRef {
                id: index as u64,
                locator: format!("preview://{index}"),
            },
        );
    }
    fields[0].set_raw_value(temperature);
    (slots, fields)
}
