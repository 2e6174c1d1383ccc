//! Property-Based Test Generators
//!
//! Proptest strategies that only produce values the domain accepts.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{days_in_month, ActivityDate, ClaimId, UserId};
use domain_claims::ItemLine;

/// Strategy for valid unit prices: 0.01 up to 99 999.99
pub fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for valid quantities
pub fn quantity_strategy() -> impl Strategy<Value = u32> {
    1u32..1000u32
}

/// Strategy for item names
pub fn item_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Flowers".to_string()),
        Just("Banner".to_string()),
        Just("Bus tickets".to_string()),
        Just("Printing".to_string()),
        Just("Water".to_string()),
        "[A-Za-z][A-Za-z ]{0,30}".prop_map(|s| s.trim().to_string()),
    ]
}

/// Strategy for valid item lines, with or without a unit
pub fn item_line_strategy() -> impl Strategy<Value = ItemLine> {
    (
        item_name_strategy(),
        quantity_strategy(),
        proptest::option::of("[a-z]{1,8}"),
        price_strategy(),
    )
        .prop_map(|(name, quantity, unit, price)| ItemLine {
            name,
            quantity,
            unit,
            price,
        })
}

/// Strategy for one to `max` item lines
pub fn item_lines_strategy(max: usize) -> impl Strategy<Value = Vec<ItemLine>> {
    proptest::collection::vec(item_line_strategy(), 1..=max)
}

/// Strategy for real calendar dates, leap days included
pub fn activity_date_strategy() -> impl Strategy<Value = ActivityDate> {
    (2000i32..2100i32, 1u32..=12u32)
        .prop_flat_map(|(year, month)| {
            let days = days_in_month(year, month).unwrap_or(28);
            (Just(year), Just(month), 1u32..=days)
        })
        .prop_map(|(year, month, day)| {
            ActivityDate::new(year, month, day).expect("generated date is valid")
        })
}

/// Strategy for department names
pub fn department_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Arts".to_string()),
        Just("Science".to_string()),
        Just("Student Union".to_string()),
        Just("体育部".to_string()),
    ]
}

pub fn claim_id_strategy() -> impl Strategy<Value = ClaimId> {
    any::<[u8; 16]>().prop_map(|bytes| ClaimId::from(uuid::Uuid::from_bytes(bytes)))
}

pub fn user_id_strategy() -> impl Strategy<Value = UserId> {
    any::<[u8; 16]>().prop_map(|bytes| UserId::from(uuid::Uuid::from_bytes(bytes)))
}
