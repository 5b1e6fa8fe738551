//! Unit tests for the liquid-handling engine through its public API
//!
//! Reservoir height tracking, volume splitting and recipe scaling, each
//! exercised the way a station script would call them.

use assert_matches::assert_matches;
use shared::ProtocolMode;
use station::core::{divide_volume, LabwareLayout, ReagentKey, ReagentSpec, RecipeTable};
use station::{compute_recipe, Reagent, StationError};

mod common;
use common::TestFixtures;

/// Three 1000 ul wells drained 100 ul at a time switch wells twice and
/// then run dry
#[test]
fn test_three_well_exhaustion_scenario() {
    // Arrange
    let mut reagent = TestFixtures::three_well_reagent();
    let mut changes = Vec::new();

    // Act
    for draw in 1..=27 {
        let pickup = reagent
            .pickup_height(TestFixtures::AREA, TestFixtures::DRAW, 0.5, TestFixtures::MARGIN)
            .unwrap();
        if pickup.well_changed {
            changes.push(draw);
        }
    }
    let exhausted =
        reagent.pickup_height(TestFixtures::AREA, TestFixtures::DRAW, 0.5, TestFixtures::MARGIN);

    // Assert
    assert_eq!(changes, vec![10, 19]);
    assert_matches!(
        exhausted,
        Err(StationError::ReservoirExhausted {
            well_index: 2,
            well_count: 3,
            ..
        })
    );
    assert_eq!(reagent.current_well_index(), 2);
    assert_eq!(reagent.current_well_volume(), 100.0);
    assert_eq!(reagent.abandoned_volumes(), &[100.0, 100.0]);
}

/// Heights fall with every draw inside a well and jump back after a switch
#[test]
fn test_height_decreases_until_switch() {
    let mut reagent = TestFixtures::three_well_reagent();
    let heights: Vec<f64> = (0..10)
        .map(|_| {
            reagent
                .pickup_height(TestFixtures::AREA, TestFixtures::DRAW, 0.5, TestFixtures::MARGIN)
                .unwrap()
                .height
        })
        .collect();

    // (1000 - 100 - 50) / 10
    assert_eq!(heights[0], 85.0);
    assert!(heights[..9].windows(2).all(|w| w[1] < w[0]));
    assert!(heights[9] > heights[8]);
}

/// The margin boundary counts as enough liquid
#[test]
fn test_switch_boundary_is_inclusive() {
    let spec = ReagentSpec::new("Wash Buffer 1", 300.0, 2).height_policy(0.5, 50.0);

    let mut exact = Reagent::new(spec.clone()).unwrap();
    exact.pickup_height(10.0, 50.0, 0.5, 50.0).unwrap();
    // 100 left, asking for 50 + 50
    assert!(!exact.pickup_height(10.0, 50.0, 0.5, 50.0).unwrap().well_changed);

    let mut short = Reagent::new(spec).unwrap();
    short.pickup_height(10.0, 51.0, 0.5, 50.0).unwrap();
    // 99 left
    assert!(short.pickup_height(10.0, 50.0, 0.5, 50.0).unwrap().well_changed);
}

/// A single-well reagent never wraps back to its first well
#[test]
fn test_single_well_exhaustion_does_not_wrap() {
    let mut reagent = Reagent::new(ReagentSpec::new("Elution Buffer", 200.0, 1)).unwrap();
    reagent.pickup_height(10.0, 100.0, 0.5, 50.0).unwrap();

    for _ in 0..3 {
        assert_matches!(
            reagent.pickup_height(10.0, 100.0, 0.5, 50.0),
            Err(StationError::ReservoirExhausted { well_index: 0, .. })
        );
    }
    assert_eq!(reagent.current_well_volume(), 100.0);
}

/// Split pieces add back up and respect the tip capacity
#[test]
fn test_divide_volume_properties() {
    for (volume, capacity) in [(450.0, 170.0), (260.0, 170.0), (1000.0, 180.0), (17.5, 20.0)] {
        let pieces = divide_volume(volume, capacity);
        let total: f64 = pieces.iter().sum();
        assert!((total - volume).abs() < 1e-9, "{volume}/{capacity}");
        assert!(pieces.iter().all(|p| *p <= capacity && *p > 0.0));
        assert_eq!(pieces.len(), (volume / capacity).ceil() as usize);
    }
}

/// Wash buffer for a full viral plate lands in a single well
#[test]
fn test_standard_recipe_rounding() {
    let mode = ProtocolMode::Viral;
    let recipe =
        compute_recipe(mode, 96, 94, &RecipeTable::builtin(), &LabwareLayout::for_mode(mode))
            .unwrap();

    let wash = &recipe[&ReagentKey::Wone];
    assert_eq!(wash.well_count, 1);
    assert_eq!(wash.volume_per_well, 10200.0);
}

/// Master mix is sized from the raw headcount plus controls
#[test]
fn test_master_mix_headcount() {
    let mut table = RecipeTable::empty();
    table.insert(ProtocolMode::Viral, ReagentKey::Mmix, 20.0, 30.0);
    let layout = LabwareLayout::new(12_400.0).with_wells(ReagentKey::Mmix, 1);

    let recipe = compute_recipe(ProtocolMode::Viral, 24, 24, &table, &layout).unwrap();
    assert_eq!(recipe[&ReagentKey::Mmix].volume_per_well, 610.0);
    assert_eq!(recipe[&ReagentKey::Mmix].well_count, 1);
}

/// Layouts too small for the recipe are configuration errors
#[test]
fn test_recipe_rejects_undersized_layout() {
    let layout = LabwareLayout::for_mode(ProtocolMode::Pathogen).with_wells(ReagentKey::Wtwo, 3);
    let result = compute_recipe(
        ProtocolMode::Pathogen,
        96,
        94,
        &RecipeTable::builtin(),
        &layout,
    );
    assert_matches!(result, Err(StationError::Configuration { .. }));
}
