#![warn(missing_docs)]
//! # freshvision-submit
//!
//! ## Purpose
//! Sends one multipart prediction request and classifies what came back.
//!
//! ## Responsibilities
//! - Build a [`SubmissionRequest`] whose part names are exactly the slot and
//!   field names of the active variant.
//! - Execute the request through an injectable [`SubmissionTransport`].
//! - Classify the outcome into success, server error, or network error.
//!
//! ## Data flow
//! Frozen slots/fields -> [`SubmissionRequest::from_inputs`] ->
//! [`SubmissionTransport::send`] -> [`SubmissionClient::classify`] ->
//! [`SubmissionOutcome`] consumed by the workflow state machine.
//!
//! ## Ownership and lifetimes
//! Requests own copies of the media bytes, so edits made while a request is
//! in flight cannot alter what is sent.
//!
//! ## Error model
//! Only construction can fail ([`SubmitError`]). A submission itself never
//! returns `Err`: every failure becomes a [`SubmissionOutcome`] variant. The
//! client issues exactly one request per call and never retries.
//!
//! ## Security and privacy notes
//! Media bytes and field values are never logged. Submissions are identified
//! in logs by [`request_fingerprint`].

use std::sync::Arc;
use std::time::Duration;

use freshvision_core::{AuxiliaryField, MediaSlot};
use freshvision_prediction_contract::{
    PredictionPayload, parse_error_message, parse_prediction_payload,
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Message shown when the service cannot be reached.
pub const NETWORK_ERROR_MESSAGE: &str = "Failed to connect to the server. Please try again later.";
/// Message shown when a rejection carries no readable error message.
pub const SERVER_ERROR_MESSAGE: &str = "An error occurred while processing the image.";
/// Message shown when a success response cannot be decoded.
pub const MALFORMED_RESPONSE_MESSAGE: &str =
    "The prediction service returned a malformed response.";

/// Content of one multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    /// File upload part.
    File {
        /// File name reported in the part header.
        file_name: String,
        /// MIME type, when known.
        content_type: Option<String>,
        /// File content.
        bytes: Vec<u8>,
    },
    /// Plain text part.
    Text(String),
}

/// One named multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPart {
    /// Part name, the wire contract with the service.
    pub name: String,
    /// Part content.
    pub body: PartBody,
}

/// Fully built multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    /// Target URL.
    pub endpoint: Url,
    /// Parts in declaration order: slots first, then fields.
    pub parts: Vec<RequestPart>,
}

impl SubmissionRequest {
    /// Builds a request from slot and field values.
    ///
    /// Slots without a file are omitted; fields are always sent with their
    /// raw value.
    pub fn from_inputs(endpoint: Url, slots: &[MediaSlot], fields: &[AuxiliaryField]) -> Self {
        let file_parts = slots.iter().filter_map(|slot| {
            slot.file().map(|file| RequestPart {
                name: slot.name().to_string(),
                body: PartBody::File {
                    file_name: file.file_name.clone(),
                    content_type: file.content_type.clone(),
                    bytes: file.bytes.clone(),
                },
            })
        });
        let text_parts = fields.iter().map(|field| RequestPart {
            name: field.name().to_string(),
            body: PartBody::Text(field.raw_value().to_string()),
        });

        Self {
            endpoint,
            parts: file_parts.chain(text_parts).collect(),
        }
    }

    /// Part names in wire order.
    pub fn part_names(&self) -> Vec<&str> {
        self.parts.iter().map(|part| part.name.as_str()).collect()
    }
}

/// Computes a deterministic SHA-256 fingerprint over part names and contents.
pub fn request_fingerprint(request: &SubmissionRequest) -> String {
    let mut hasher = Sha256::new();
    for part in &request.parts {
        hasher.update(part.name.as_bytes());
        hasher.update([0]);
        match &part.body {
            PartBody::File {
                file_name, bytes, ..
            } => {
                hasher.update(b"file");
                hasher.update(file_name.as_bytes());
                hasher.update((bytes.len() as u64).to_be_bytes());
                hasher.update(bytes);
            }
            PartBody::Text(text) => {
                hasher.update(b"text");
                hasher.update(text.as_bytes());
            }
        }
    }
    hex::encode(hasher.finalize())
}

/// Raw response as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure; no response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection refused, reset, or host resolution failed.
    #[error("connection failure: {0}")]
    Connect(String),
    /// Opt-in request timeout elapsed.
    #[error("request timed out")]
    Timeout,
    /// Any other transport failure.
    #[error("transport failure: {0}")]
    Other(String),
}

/// Abstract transport used by [`SubmissionClient`].
pub trait SubmissionTransport: Send + Sync {
    /// Sends one request and returns the raw response.
    ///
    /// # Errors
    /// Returns [`TransportError`] when no response was received.
    fn send(&self, request: &SubmissionRequest) -> Result<TransportResponse, TransportError>;
}

/// Blocking HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates a transport.
    ///
    /// `timeout` is opt-in: `None` disables the client's timeout entirely,
    /// so a request runs until it completes or the connection fails.
    ///
    /// # Errors
    /// Returns [`SubmitError::ClientBuild`] when the HTTP client cannot be
    /// initialized.
    pub fn new(timeout: Option<Duration>) -> Result<Self, SubmitError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| SubmitError::ClientBuild(error.to_string()))?;
        Ok(Self { client })
    }

    fn build_form(request: &SubmissionRequest) -> reqwest::blocking::multipart::Form {
        use reqwest::blocking::multipart::{Form, Part};

        request
            .parts
            .iter()
            .fold(Form::new(), |form, part| match &part.body {
                PartBody::Text(text) => form.text(part.name.clone(), text.clone()),
                PartBody::File {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let file_part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                    let file_part = match content_type {
                        Some(mime) => match file_part.mime_str(mime) {
                            Ok(typed) => typed,
                            Err(_) => Part::bytes(bytes.clone()).file_name(file_name.clone()),
                        },
                        None => file_part,
                    };
                    form.part(part.name.clone(), file_part)
                }
            })
    }
}

impl SubmissionTransport for HttpTransport {
    fn send(&self, request: &SubmissionRequest) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(request.endpoint.clone())
            .multipart(Self::build_form(request))
            .send()
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().map_err(map_reqwest_error)?.to_vec();
        Ok(TransportResponse { status, body })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

/// Why the service side failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrorCause {
    /// Non-success HTTP status.
    Rejected {
        /// HTTP status code.
        status: u16,
    },
    /// Success status but the body did not decode.
    MalformedResponse,
}

/// Service-side failure with its user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// Human-readable message.
    pub message: String,
    /// Diagnostic cause.
    pub cause: ServerErrorCause,
}

/// Result of exactly one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Decoded success body.
    Success(PredictionPayload),
    /// Service rejected the request or answered with garbage.
    ServerError(ServerError),
    /// No response received; the cause is logged, not surfaced.
    NetworkError,
}

/// Client that validates the endpoint and performs submissions.
#[derive(Clone)]
pub struct SubmissionClient {
    endpoint: Url,
    transport: Arc<dyn SubmissionTransport>,
}

impl SubmissionClient {
    /// Creates a client for `endpoint`.
    ///
    /// # Errors
    /// Returns [`SubmitError::InvalidEndpoint`] when the URL does not parse or
    /// does not use `http`/`https`.
    pub fn new(
        endpoint: &str,
        transport: Arc<dyn SubmissionTransport>,
    ) -> Result<Self, SubmitError> {
        let endpoint = validate_endpoint(endpoint)?;
        Ok(Self {
            endpoint,
            transport,
        })
    }

    /// Configured endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Submits slot and field values as one multipart request.
    pub fn submit(&self, slots: &[MediaSlot], fields: &[AuxiliaryField]) -> SubmissionOutcome {
        let request = SubmissionRequest::from_inputs(self.endpoint.clone(), slots, fields);
        self.submit_request(&request)
    }

    /// Sends a prebuilt request and classifies the outcome.
    pub fn submit_request(&self, request: &SubmissionRequest) -> SubmissionOutcome {
        let fingerprint = request_fingerprint(request);
        tracing::info!(
            stage = "submit",
            action = "send",
            fingerprint = %fingerprint,
            parts = ?request.part_names(),
            "submitting prediction request"
        );

        let outcome = match self.transport.send(request) {
            Ok(response) => Self::classify(&response),
            Err(error) => {
                tracing::warn!(
                    stage = "submit",
                    action = "transport_failure",
                    fingerprint = %fingerprint,
                    error = %error,
                    "prediction service unreachable"
                );
                SubmissionOutcome::NetworkError
            }
        };

        if let SubmissionOutcome::ServerError(server_error) = &outcome {
            tracing::warn!(
                stage = "submit",
                action = "server_error",
                fingerprint = %fingerprint,
                cause = ?server_error.cause,
                "prediction service reported failure"
            );
        }
        outcome
    }

    /// Classifies a received response.
    pub fn classify(response: &TransportResponse) -> SubmissionOutcome {
        if !response.is_success() {
            let message = parse_error_message(&response.body)
                .unwrap_or_else(|| SERVER_ERROR_MESSAGE.to_string());
            return SubmissionOutcome::ServerError(ServerError {
                message,
                cause: ServerErrorCause::Rejected {
                    status: response.status,
                },
            });
        }

        match parse_prediction_payload(&response.body) {
            Ok(payload) => SubmissionOutcome::Success(payload),
            Err(error) => {
                tracing::debug!(
                    stage = "submit",
                    action = "decode_failure",
                    error = %error,
                    "success body did not decode"
                );
                SubmissionOutcome::ServerError(ServerError {
                    message: MALFORMED_RESPONSE_MESSAGE.to_string(),
                    cause: ServerErrorCause::MalformedResponse,
                })
            }
        }
    }
}

/// Validates the prediction endpoint URL.
///
/// # Errors
/// Returns [`SubmitError::InvalidEndpoint`] for unparsable URLs and schemes
/// other than `http`/`https`.
pub fn validate_endpoint(endpoint: &str) -> Result<Url, SubmitError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| SubmitError::InvalidEndpoint(format!("invalid url: {error}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(SubmitError::InvalidEndpoint(format!(
            "unsupported scheme: {other}"
        ))),
    }
}

/// Submission client construction errors.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Endpoint violates URL requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// HTTP client could not be initialized.
    #[error("http client initialization failed: {0}")]
    ClientBuild(String),
}
