//! Tests the built-in variants against the wire contract table.

use freshvision_core::{FieldConstraint, MatchStrategy, VariantConfig, VariantId};

fn part_names(variant: &VariantConfig) -> Vec<String> {
    variant
        .slots()
        .iter()
        .map(|slot| slot.name.clone())
        .chain(variant.fields().iter().map(|field| field.name.clone()))
        .collect()
}

#[test]
fn variant_wire_names_match_request_parts() {
    let expected = [
        (VariantId::A, vec!["product_image"]),
        (VariantId::B, vec!["freshness_image", "label_image"]),
        (VariantId::C, vec!["file"]),
        (VariantId::D, vec!["product_image", "expiry_image", "temperature"]),
    ];

    for (id, parts) in expected {
        assert_eq!(part_names(&VariantConfig::builtin(id)), parts, "variant {id}");
    }
}

#[test]
fn variant_wire_names_match_response_fields() {
    let variant = VariantConfig::builtin(VariantId::D);
    assert_eq!(
        variant.response().all_paths(),
        vec![
            "freshness",
            "base_shelf_life",
            "adjusted_shelf_life",
            "ocr_data.expiry_date",
            "ocr_data.mfg_date",
            "ocr_data.best_before",
        ]
    );
    assert_eq!(
        variant.fields()[0].constraint,
        FieldConstraint::RequiredNumeric
    );

    let variant_b = VariantConfig::builtin(VariantId::B);
    assert_eq!(
        variant_b.response().all_paths(),
        vec!["freshness", "shelf_life", "ocr_info.expiry_date"]
    );
}

#[test]
fn variant_wire_names_strategy_override_keeps_layout() {
    let variant = VariantConfig::builtin(VariantId::A).with_match_strategy(MatchStrategy::Exact);
    assert_eq!(variant.match_strategy(), MatchStrategy::Exact);
    assert_eq!(part_names(&variant), vec!["product_image"]);
}
