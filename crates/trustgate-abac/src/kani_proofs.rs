//! Kani proofs for the rule trees and the trust clamp
//!
//! These proofs check the fixed properties of evaluation and adjustment
//! using bounded model checking.
//!
//! **Proof Count**: 4 proofs
//!
//! Run with: `cargo kani --tests --harness verify_*`

#[cfg(kani)]
use crate::evaluator;
#[cfg(kani)]
use crate::policy::{EvaluationOptions, Rule};
#[cfg(kani)]
use crate::trust::{self, Feedback};
#[cfg(kani)]
use trustgate_types::{ActionType, Device, DeviceType, Permission, TrustLevel, User, UserLevel};

/// Proof: trust adjustment stays in bounds
///
/// **Property**: For every level in `0..=100` and either feedback polarity,
/// the adjusted level is in `0..=100` and differs by at most one.
#[cfg(kani)]
#[kani::proof]
fn verify_trust_adjustment_bounded() {
    let raw: u8 = kani::any();
    kani::assume(raw <= 100);
    let Ok(level) = TrustLevel::new(raw) else {
        return;
    };
    let feedback = if kani::any::<bool>() {
        Feedback::Satisfactory
    } else {
        Feedback::from("Unsatisfactory")
    };

    let next = trust::adjust(level, &feedback);

    assert!(next.value() <= 100);
    assert!(next.value().abs_diff(raw) <= 1);
}

/// Proof: saturation at both bounds
///
/// **Property**: Satisfactory at MAX stays MAX; negative feedback at MIN stays MIN.
#[cfg(kani)]
#[kani::proof]
fn verify_trust_saturation() {
    assert_eq!(
        trust::adjust(TrustLevel::MAX, &Feedback::Satisfactory),
        TrustLevel::MAX
    );
    assert_eq!(
        trust::adjust(TrustLevel::MIN, &Feedback::from("Unsatisfactory")),
        TrustLevel::MIN
    );
}

/// Proof: administrator on the device's network
///
/// **Property**: For any request time, an admin on the device's network
/// is allowed to read a sensor.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(8)]
fn verify_admin_same_network_allows() {
    let time: i64 = kani::any();
    let admin = User::new("User0", "127.2.2.0", UserLevel::Admin).with_zone("A");
    let sensor = Device::new("Device1", "127.2.2.0", DeviceType::Sensor).with_zone("B");

    let decision = evaluator::evaluate_u2d(
        &ActionType::Read,
        time,
        Some(&admin),
        Some(&sensor),
        EvaluationOptions::default(),
    );

    assert_eq!(decision.permission, Permission::Allow);
    assert_eq!(decision.rule, Rule::AdminSameNetwork);
}

/// Proof: D2D network isolation
///
/// **Property**: For any request time, devices on different networks are denied.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(8)]
fn verify_d2d_network_mismatch_denies() {
    let time: i64 = kani::any();
    let requester = Device::new("Device2", "127.1.1.0", DeviceType::Both).with_zone("A");
    let target = Device::new("Device1", "127.2.2.0", DeviceType::Both).with_zone("A");

    let decision = evaluator::evaluate_d2d(
        &ActionType::Read,
        time,
        Some(&requester),
        Some(&target),
        EvaluationOptions::default(),
    );

    assert_eq!(decision.permission, Permission::Deny);
}
