//! Custom Test Assertions
//!
//! Assertion helpers that print the claim state on failure.

use core_kernel::Money;
use domain_claims::{Claim, ClaimError, ClaimStatus};

/// Asserts that the claim total equals the sum of its item amounts
pub fn assert_total_is_item_sum(claim: &Claim) {
    let sum: Money = claim.items().iter().map(|i| i.amount()).sum();
    assert_eq!(
        claim.total_amount(),
        sum,
        "Claim {} total {} does not match item sum {}",
        claim.id(),
        claim.total_amount(),
        sum
    );
}

/// Asserts that every item amount is quantity times price
pub fn assert_item_amounts(claim: &Claim) {
    for item in claim.items() {
        assert_eq!(
            item.amount(),
            item.price() * item.quantity(),
            "Item {} amount {} is not {} x {}",
            item.name(),
            item.amount(),
            item.quantity(),
            item.price()
        );
    }
}

pub fn assert_status(claim: &Claim, expected: ClaimStatus) {
    assert_eq!(
        claim.status(),
        expected,
        "Claim {} is {}, expected {}",
        claim.id(),
        claim.status(),
        expected
    );
}

/// Asserts that a result failed with a validation error on `field`
pub fn assert_validation_error<T: std::fmt::Debug>(result: Result<T, ClaimError>, field: &str) {
    match result {
        Err(ClaimError::Validation { field: actual, .. }) => assert_eq!(
            actual, field,
            "Validation failed on {}, expected {}",
            actual, field
        ),
        other => panic!("Expected validation error on {}, got {:?}", field, other),
    }
}

pub fn assert_permission_denied<T: std::fmt::Debug>(result: Result<T, ClaimError>) {
    assert!(
        matches!(result, Err(ClaimError::PermissionDenied(_))),
        "Expected permission denied, got {:?}",
        result
    );
}

/// Asserts that a result failed because the claim status forbids the action
pub fn assert_invalid_state<T: std::fmt::Debug>(result: Result<T, ClaimError>) {
    assert!(
        matches!(result, Err(ClaimError::InvalidState { .. })),
        "Expected invalid state, got {:?}",
        result
    );
}
