//! Integration tests for the configured workflow facade.

mod common;

use std::io::Write;
use std::sync::Arc;

use common::{CATALOG_JSON, CannedTransport};
use freshvision_app::{AppConfig, AppError, FreshnessWorkflow};
use freshvision_capture::{CaptureError, SyntheticMediaSource};
use freshvision_core::VariantId;
use freshvision_workflow::{SubmitRejected, WorkflowState};

const VARIANT_D_RESPONSE: &str = r#"{
    "freshness": "Fresh",
    "base_shelf_life": 5,
    "adjusted_shelf_life": 3,
    "ocr_data": {
        "expiry_date": "2OMAY2015",
        "mfg_date": "2024-12-01",
        "best_before": null
    }
}"#;

fn media() -> Arc<SyntheticMediaSource> {
    Arc::new(
        SyntheticMediaSource::new()
            .with_image("product.jpg")
            .with_image("expiry.jpg"),
    )
}

fn catalog_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
    file.write_all(CATALOG_JSON.as_bytes())
        .expect("catalog should be writable");
    file
}

#[test]
fn workflow_facade_variant_d_renders_result_with_catalog_match() {
    let catalog = catalog_file();
    let config = AppConfig {
        variant: VariantId::D,
        catalog: Some(catalog.path().to_path_buf()),
        ..AppConfig::default()
    };
    let transport = CannedTransport::new(200, VARIANT_D_RESPONSE);
    let mut workflow = FreshnessWorkflow::with_parts(&config, transport.clone(), media())
        .expect("workflow should build");

    workflow
        .select_media("product_image", "product.jpg")
        .expect("media should load");
    workflow
        .select_media("expiry_image", "expiry.jpg")
        .expect("media should load");
    workflow.set_field("temperature", "4").expect("known field");

    assert_eq!(workflow.submit().expect("submit accepted"), WorkflowState::Success);
    assert_eq!(transport.request_count(), 1);

    let rendered = workflow.render();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(
        lines,
        vec![
            "freshness: Fresh",
            "status: Fresh (green)",
            "base_shelf_life: 5",
            "adjusted_shelf_life: 3",
            "ocr_data.expiry_date: 2OMAY2015 (2015-05-20)",
            "ocr_data.mfg_date: 2024-12-01",
            "ocr_data.best_before: N/A",
            "product: Fresh",
            "shelf_life_days: 5",
            "description: Generic fresh produce.",
        ]
    );
}

#[test]
fn workflow_facade_match_strategy_override_changes_join() {
    let config = AppConfig {
        variant: VariantId::D,
        match_strategy: Some(freshvision_core::MatchStrategy::Substring),
        ..AppConfig::default()
    };
    let catalog = freshvision_catalog::ReferenceCatalog::from_json_str(CATALOG_JSON)
        .expect("catalog should decode");
    let mut workflow = FreshnessWorkflow::with_catalog(
        &config,
        catalog,
        CannedTransport::new(200, VARIANT_D_RESPONSE),
        media(),
    )
    .expect("workflow should build");
    workflow
        .select_media("product_image", "product.jpg")
        .expect("media should load");
    workflow
        .select_media("expiry_image", "expiry.jpg")
        .expect("media should load");
    workflow.set_field("temperature", "-2.5").expect("known field");

    workflow.submit().expect("submit accepted");

    assert!(workflow.render().contains("product: Fresh Apple"));
}

#[test]
fn workflow_facade_server_error_is_rendered_not_returned() {
    let config = AppConfig::default();
    let mut workflow = FreshnessWorkflow::with_parts(
        &config,
        CannedTransport::new(422, r#"{"error":"bad image"}"#),
        media(),
    )
    .expect("workflow should build");
    workflow
        .select_media("product_image", "product.jpg")
        .expect("media should load");

    assert_eq!(workflow.submit().expect("submit accepted"), WorkflowState::Error);
    assert_eq!(workflow.render(), "error: bad image");
}

#[test]
fn workflow_facade_incomplete_inputs_are_rejected_without_request() {
    let config = AppConfig {
        variant: VariantId::B,
        ..AppConfig::default()
    };
    let transport = CannedTransport::new(200, "{}");
    let mut workflow = FreshnessWorkflow::with_parts(&config, transport.clone(), media())
        .expect("workflow should build");
    workflow
        .select_media("freshness_image", "product.jpg")
        .expect("media should load");

    assert!(matches!(
        workflow.submit(),
        Err(AppError::Rejected(SubmitRejected::Incomplete(_)))
    ));
    assert_eq!(transport.request_count(), 0);
    assert_eq!(workflow.render(), "no result");
}

#[test]
fn workflow_facade_unknown_media_and_slot_are_errors() {
    let mut workflow = FreshnessWorkflow::with_parts(
        &AppConfig::default(),
        CannedTransport::new(200, "{}"),
        media(),
    )
    .expect("workflow should build");

    assert!(matches!(
        workflow.select_media("product_image", "missing.jpg"),
        Err(AppError::Capture(CaptureError::NotFound(_)))
    ));
    assert!(matches!(
        workflow.select_media("label_image", "product.jpg"),
        Err(AppError::Input(_))
    ));
    assert_eq!(workflow.machine().state(), WorkflowState::Idle);
}

#[test]
fn workflow_facade_invalid_endpoint_fails_construction() {
    let config = AppConfig {
        endpoint: "not a url".to_string(),
        ..AppConfig::default()
    };
    assert!(matches!(
        FreshnessWorkflow::with_parts(&config, CannedTransport::new(200, "{}"), media()),
        Err(AppError::Submit(_))
    ));
}
