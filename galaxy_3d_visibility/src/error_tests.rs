//! Unit tests for error.rs
//!
//! Tests Error variants and their Display / std::error::Error implementations.

use crate::error::{Error, Result};
use crate::color::ColorCode;
use crate::decode::PassKind;
use crate::fragment::FragmentId;

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("readback failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("readback failed"));
}

#[test]
fn test_capacity_exceeded_display() {
    let err = Error::CapacityExceeded { capacity: 16_777_215 };
    assert_eq!(format!("{}", err), "Color capacity exceeded: 16777215 codes available");
}

#[test]
fn test_color_collision_display() {
    let err = Error::ColorCollision {
        code: ColorCode::new(0, 0, 7),
        existing: Some(FragmentId::from("F1")),
    };
    let display = format!("{}", err);
    assert!(display.contains("0-0-7"));
    assert!(display.contains("F1"));

    let background = Error::ColorCollision { code: ColorCode::BACKGROUND, existing: None };
    assert!(format!("{}", background).contains("background"));
}

#[test]
fn test_out_of_order_display() {
    let err = Error::OutOfOrderDecode {
        expected: PassKind::Opaque,
        received: PassKind::Transparent,
    };
    let display = format!("{}", err);
    assert!(display.contains("Opaque"));
    assert!(display.contains("Transparent"));
}

#[test]
fn test_unmapped_instance_display() {
    assert_eq!(format!("{}", Error::UnmappedInstance(42)), "Instance 42 has no fragment mapping");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::WorkerDisconnected;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::InvalidResource("zero target".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::WorkerDisconnected);
}

#[test]
fn test_result_question_mark() {
    fn inner() -> Result<u32> {
        Err(Error::WorkerDisconnected)
    }
    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }
    assert_eq!(outer(), Err(Error::WorkerDisconnected));
}
