//! # trustgate-abac: Access decisions and trust feedback
//!
//! Decides whether a user or device may read a sensor or invoke an actuator,
//! records the verdict, and later moves trust scores according to feedback on
//! how the granted access was used.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Access Request                              │
//! │  (type, action, requester, device, time)     │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Access Engine                               │
//! │  ├─ Load requester and target attributes     │
//! │  ├─ Walk the U2D or D2D rule tree            │
//! │  └─ Persist the Request with its verdict     │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Decision                                    │
//! │  - Permission (ALLOW/DENY)                   │
//! │  - Rule that fired                           │
//! │  - Human-readable reason                     │
//! └─────────────────┬───────────────────────────┘
//!                   │  (feedback)
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Trust Adjuster                              │
//! │  ├─ Re-read requester and device             │
//! │  └─ ±1 per entity, saturating at 0 and 100   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Examples
//!
//! ```
//! use trustgate_abac::{AccessEngine, AccessRequest, Feedback, TrustedCallers};
//! use trustgate_ledger::MemoryLedger;
//! use trustgate_types::{ActionType, Device, DeviceType, RequestKey, User, UserLevel};
//!
//! let engine = AccessEngine::new(MemoryLedger::new()).with_authorizer(TrustedCallers);
//! engine.register_user("ops", User::new("User0", "127.2.2.0", UserLevel::Admin)).unwrap();
//! engine.register_device("ops", Device::new("Device1", "127.2.2.0", DeviceType::Sensor)).unwrap();
//!
//! let key = RequestKey::new("R1");
//! let decision = engine
//!     .evaluate(&key, AccessRequest::u2d(ActionType::Read, "User0", "Device1", 0))
//!     .unwrap();
//! assert!(decision.is_allowed());
//!
//! let outcome = engine
//!     .adjust_trust(&key, &Feedback::Satisfactory, &Feedback::from("Unsatisfactory"))
//!     .unwrap();
//! assert_eq!(outcome.requester_change.delta(), 1);
//! assert_eq!(outcome.device_change.delta(), -1);
//! ```

pub mod attributes;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod policy;
pub mod registry;
mod store;
pub mod trust;

// Kani proofs for bounded model checking
#[cfg(any(test, kani))]
mod kani_proofs;

pub use attributes::{AccessRequest, Subject};
pub use engine::{AccessEngine, EngineOptions, TrustOutcome};
pub use error::{AbacError, RecordKind, Result};
pub use evaluator::{Decision, evaluate};
pub use policy::{EvaluationOptions, Rule};
pub use registry::{
    AdminOperation, Authorizer, DeviceUpdate, LedgerAdmins, TrustedCallers, UserUpdate,
    demo_admins,
};
pub use trust::{Feedback, TrustChange, TrustPolicy};
