//! Integration tests for full submit cycles against a scripted service.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use common::{ScriptedTransport, client, image, workflow};
use freshvision_capture::InMemoryPreviewStore;
use freshvision_catalog::ShelfLifeDays;
use freshvision_core::VariantId;
use freshvision_prediction_contract::ProductStatus;
use freshvision_submit::PartBody;
use freshvision_workflow::{Outcome, WorkflowState};
use serde_json::json;

const VARIANT_D_RESPONSE: &str = r#"{
    "freshness": "Fresh",
    "base_shelf_life": 5,
    "adjusted_shelf_life": 3,
    "ocr_data": {
        "expiry_date": "2025-01-01",
        "mfg_date": "2024-12-01",
        "best_before": "2024-12-31"
    }
}"#;

#[test]
fn end_to_end_variant_d_exposes_all_fields_and_catalog_match() {
    let transport = ScriptedTransport::replying(200, VARIANT_D_RESPONSE);
    let client = client(transport.clone());
    let mut workflow = workflow(VariantId::D, Arc::new(InMemoryPreviewStore::new()));

    workflow
        .select_file("product_image", image("product.jpg"))
        .expect("known slot");
    workflow
        .select_file("expiry_image", image("expiry.jpg"))
        .expect("known slot");
    workflow.set_field("temperature", "4").expect("known field");
    assert_eq!(workflow.state(), WorkflowState::Ready);

    let state = workflow.run_submission(&client).expect("submission starts");
    assert_eq!(state, WorkflowState::Success);

    let result = match workflow.outcome() {
        Outcome::Result(result) => result.clone(),
        other => panic!("expected result, got {other:?}"),
    };

    let expected = [
        ("freshness", json!("Fresh")),
        ("base_shelf_life", json!(5)),
        ("adjusted_shelf_life", json!(3)),
        ("ocr_data.expiry_date", json!("2025-01-01")),
        ("ocr_data.mfg_date", json!("2024-12-01")),
        ("ocr_data.best_before", json!("2024-12-31")),
    ];
    let fields = result.fields();
    assert_eq!(fields.len(), expected.len());
    for ((path, value), (expected_path, expected_value)) in fields.iter().zip(expected.iter()) {
        assert_eq!(path, expected_path);
        assert_eq!(value.as_value(), Some(expected_value));
    }

    assert!(result.reference_matched);
    assert_eq!(result.reference.name, "Fresh");
    assert_eq!(result.reference.shelf_life_days, ShelfLifeDays::Days(5));
    assert_eq!(result.status, Some(ProductStatus::Fresh));
    assert_eq!(
        result.label_dates[0].normalized,
        NaiveDate::from_ymd_opt(2025, 1, 1)
    );

    let requests = transport.requests.lock().expect("request log lock should work");
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].part_names(),
        vec!["product_image", "expiry_image", "temperature"]
    );
    assert!(matches!(
        &requests[0].parts[2].body,
        PartBody::Text(value) if value == "4"
    ));
}

#[test]
fn end_to_end_variant_b_marks_missing_fields_not_available() {
    let transport = ScriptedTransport::replying(200, r#"{"freshness":"Mango","status":"Wasted"}"#);
    let client = client(transport);
    let mut workflow = workflow(VariantId::B, Arc::new(InMemoryPreviewStore::new()));
    common::select_all(&mut workflow);

    workflow.run_submission(&client).expect("submission starts");

    let Outcome::Result(result) = workflow.outcome() else {
        panic!("expected result outcome");
    };
    assert_eq!(result.field("shelf_life").map(ToString::to_string), Some("N/A".into()));
    assert_eq!(
        result.field("ocr_info.expiry_date").map(ToString::to_string),
        Some("N/A".into())
    );
    assert!(!result.reference_matched);
    assert_eq!(result.reference.name, "Unknown");
    assert_eq!(result.reference.shelf_life_days.to_string(), "N/A");
    assert_eq!(result.status, Some(ProductStatus::Wasted));
}
