use super::common::*;
use crate::allocation::domain::FlatType;
use crate::allocation::inventory::{FlatInventory, FlatTypeInfo, InventoryError};

#[test]
fn reserve_takes_units_until_exhausted() {
    let mut cell = FlatTypeInfo::new(FlatType::TwoRoom, 2, 300_000);

    assert!(cell.reserve());
    assert!(cell.reserve());
    assert!(!cell.reserve(), "no third unit to reserve");
    assert_eq!(cell.remaining_units(), 0);
    assert!(!cell.has_available());
}

#[test]
fn release_never_exceeds_total() {
    let mut cell = FlatTypeInfo::new(FlatType::ThreeRoom, 2, 450_000);

    cell.release();
    assert_eq!(cell.remaining_units(), 2);

    assert!(cell.reserve());
    cell.release();
    cell.release();
    assert_eq!(cell.remaining_units(), cell.total_units());
}

#[test]
fn reserve_then_release_restores_remaining_units() {
    let mut inventory = inventory(&[(FlatType::TwoRoom, 3)]);

    inventory.reserve(FlatType::TwoRoom).expect("unit available");
    assert_eq!(inventory.remaining_units(FlatType::TwoRoom), Some(2));
    inventory.release(FlatType::TwoRoom).expect("flat type offered");
    assert_eq!(inventory.remaining_units(FlatType::TwoRoom), Some(3));
}

#[test]
fn remaining_units_stay_within_bounds_across_mixed_operations() {
    let mut inventory = inventory(&[(FlatType::TwoRoom, 2), (FlatType::ThreeRoom, 1)]);

    for step in 0..24 {
        let flat_type = if step % 3 == 0 {
            FlatType::ThreeRoom
        } else {
            FlatType::TwoRoom
        };
        if step % 4 == 1 {
            inventory.release(flat_type).expect("offered");
        } else {
            let _ = inventory.reserve(flat_type);
        }

        for cell in inventory.cells() {
            assert!(cell.remaining_units() <= cell.total_units());
        }
    }
}

#[test]
fn exhausted_cells_reject_reservations_without_changing_state() {
    let mut inventory = inventory(&[(FlatType::TwoRoom, 1)]);
    inventory.reserve(FlatType::TwoRoom).expect("first unit");

    assert_eq!(
        inventory.reserve(FlatType::TwoRoom),
        Err(InventoryError::Exhausted(FlatType::TwoRoom))
    );
    assert_eq!(inventory.remaining_units(FlatType::TwoRoom), Some(0));
}

#[test]
fn unoffered_flat_types_are_reported() {
    let mut inventory = inventory(&[(FlatType::TwoRoom, 1)]);

    assert!(!inventory.offers(FlatType::ThreeRoom));
    assert_eq!(inventory.remaining_units(FlatType::ThreeRoom), None);
    assert_eq!(
        inventory.reserve(FlatType::ThreeRoom),
        Err(InventoryError::NotOffered(FlatType::ThreeRoom))
    );
    assert_eq!(
        inventory.release(FlatType::ThreeRoom),
        Err(InventoryError::NotOffered(FlatType::ThreeRoom))
    );
}

#[test]
fn duplicate_flat_types_are_rejected() {
    let cells = vec![
        FlatTypeInfo::new(FlatType::TwoRoom, 1, 1),
        FlatTypeInfo::new(FlatType::TwoRoom, 2, 2),
    ];

    match FlatInventory::new(cells) {
        Err(InventoryError::DuplicateFlatType { flat_type }) => {
            assert_eq!(flat_type, FlatType::TwoRoom)
        }
        other => panic!("expected duplicate rejection, got {other:?}"),
    }
}

#[test]
fn restore_rejects_remaining_above_total() {
    match FlatTypeInfo::restore(FlatType::ThreeRoom, 2, 3, 400_000) {
        Err(InventoryError::RemainingExceedsTotal {
            remaining: 3,
            total: 2,
            ..
        }) => {}
        other => panic!("expected bounds rejection, got {other:?}"),
    }

    let restored =
        FlatTypeInfo::restore(FlatType::ThreeRoom, 2, 1, 400_000).expect("within bounds");
    assert_eq!(restored.remaining_units(), 1);
}

#[test]
fn availability_lists_every_offered_cell() {
    let inventory = inventory(&[(FlatType::ThreeRoom, 4), (FlatType::TwoRoom, 2)]);

    let availability = inventory.availability();
    let types: Vec<FlatType> = availability.iter().map(|flat| flat.flat_type).collect();
    assert_eq!(types, vec![FlatType::TwoRoom, FlatType::ThreeRoom]);
    assert_eq!(availability[1].remaining_units, 4);
}

#[test]
fn stored_cells_with_remaining_above_total_are_rejected_on_load() {
    let stored = r#"{"flat_type":"two_room","total_units":1,"remaining_units":5,"price":0}"#;

    let err = serde_json::from_str::<FlatTypeInfo>(stored).expect_err("bounds enforced");
    assert!(err.to_string().contains("5 remaining units"));

    let cell: FlatTypeInfo = serde_json::from_str(
        r#"{"flat_type":"two_room","total_units":3,"remaining_units":1,"price":350000}"#,
    )
    .expect("cell within bounds loads");
    assert_eq!(cell.remaining_units(), 1);
    assert_eq!(cell.total_units(), 3);
}

#[test]
fn stored_inventories_with_duplicate_flat_types_are_rejected_on_load() {
    let stored = r#"[
        {"flat_type":"two_room","total_units":1,"remaining_units":1,"price":1},
        {"flat_type":"two_room","total_units":2,"remaining_units":2,"price":2}
    ]"#;

    let err = serde_json::from_str::<FlatInventory>(stored).expect_err("duplicates rejected");
    assert!(err.to_string().contains("more than once"));
}

#[test]
fn inventory_survives_a_storage_round_trip() {
    let mut original = inventory(&[(FlatType::ThreeRoom, 2), (FlatType::TwoRoom, 1)]);
    original.reserve(FlatType::ThreeRoom).expect("unit available");

    let stored = serde_json::to_string(&original).expect("serializes");
    let loaded: FlatInventory = serde_json::from_str(&stored).expect("loads");

    assert_eq!(loaded, original);
    assert_eq!(loaded.remaining_units(FlatType::ThreeRoom), Some(1));
}
