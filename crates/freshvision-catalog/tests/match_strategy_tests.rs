//! Integration tests for the two coexisting catalog matching heuristics.

use freshvision_catalog::{ReferenceCatalog, ReferenceRecord, ShelfLifeDays};
use freshvision_core::MatchStrategy;

#[test]
fn match_strategy_fresh_label_differs_by_mode() {
    let catalog = ReferenceCatalog::from_records(vec![ReferenceRecord::new(
        "Fresh Apple",
        ShelfLifeDays::Days(30),
        "Crisp apple.",
    )]);

    let substring = catalog.lookup_or_unknown("Fresh", MatchStrategy::Substring);
    assert_eq!(substring.name, "Fresh Apple");

    let exact = catalog.lookup_or_unknown("Fresh", MatchStrategy::Exact);
    assert_eq!(exact, ReferenceRecord::unknown());
    assert_eq!(exact.shelf_life_days.to_string(), "N/A");
}
