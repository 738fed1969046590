//! Trust score adjustment.
//!
//! Feedback about how a granted access was used moves an entity's trust level
//! by one step. The level saturates at both bounds.

use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use trustgate_types::{Device, Status, TrustLevel, User};

// ============================================================================
// Feedback
// ============================================================================

/// Outcome label reported after an access was exercised.
///
/// Only the exact label `Satisfactory` counts as positive; any other label
/// is negative and is kept for logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Feedback {
    Satisfactory,
    Unsatisfactory(String),
}

impl Feedback {
    pub const SATISFACTORY: &'static str = "Satisfactory";

    pub fn is_satisfactory(&self) -> bool {
        matches!(self, Self::Satisfactory)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Satisfactory => Self::SATISFACTORY,
            Self::Unsatisfactory(label) => label,
        }
    }
}

impl FromStr for Feedback {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for Feedback {
    fn from(label: &str) -> Self {
        if label == Self::SATISFACTORY {
            Self::Satisfactory
        } else {
            Self::Unsatisfactory(label.to_string())
        }
    }
}

impl Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Adjustment
// ============================================================================

/// Moves `level` one step according to `feedback`.
///
/// Satisfactory feedback at `MAX` leaves the level at `MAX`; any other
/// feedback at `MIN` leaves it at `MIN`.
pub fn adjust(level: TrustLevel, feedback: &Feedback) -> TrustLevel {
    if feedback.is_satisfactory() {
        level.increment()
    } else {
        level.decrement()
    }
}

/// A record whose trust level the adjuster can move.
pub trait Scored {
    fn trust_level(&self) -> TrustLevel;
    fn set_trust_level(&mut self, level: TrustLevel);
    fn status(&self) -> Status;
    fn set_status(&mut self, status: Status);
}

impl Scored for User {
    fn trust_level(&self) -> TrustLevel {
        self.trust_level
    }

    fn set_trust_level(&mut self, level: TrustLevel) {
        self.trust_level = level;
    }

    fn status(&self) -> Status {
        self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

impl Scored for Device {
    fn trust_level(&self) -> TrustLevel {
        self.trust_level
    }

    fn set_trust_level(&mut self, level: TrustLevel) {
        self.trust_level = level;
    }

    fn status(&self) -> Status {
        self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

/// Before and after of one entity's adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustChange {
    pub before: TrustLevel,
    pub after: TrustLevel,
    /// True if this adjustment deactivated the entity.
    pub deactivated: bool,
}

impl TrustChange {
    pub fn delta(&self) -> i16 {
        i16::from(self.after.value()) - i16::from(self.before.value())
    }
}

/// How feedback is applied to records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustPolicy {
    /// Deactivate an entity whose level reaches `MIN`.
    pub auto_deactivate_at_zero: bool,
}

impl TrustPolicy {
    pub fn with_auto_deactivate(mut self, enabled: bool) -> Self {
        self.auto_deactivate_at_zero = enabled;
        self
    }

    /// Applies one feedback label to `record` in place.
    pub fn apply<T: Scored>(&self, record: &mut T, feedback: &Feedback) -> TrustChange {
        let before = record.trust_level();
        let after = adjust(before, feedback);
        record.set_trust_level(after);

        let deactivated = self.auto_deactivate_at_zero
            && after.is_exhausted()
            && record.status().is_active();
        if deactivated {
            record.set_status(Status::Deactivated);
        }

        TrustChange {
            before,
            after,
            deactivated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use trustgate_types::{DeviceType, UserLevel};

    fn level(v: u8) -> TrustLevel {
        TrustLevel::new(v).unwrap()
    }

    #[test]
    fn only_exact_label_is_satisfactory() {
        assert!(Feedback::from("Satisfactory").is_satisfactory());
        assert!(!Feedback::from("satisfactory").is_satisfactory());
        assert!(!Feedback::from("").is_satisfactory());
        assert_eq!(Feedback::from("Spoofed").to_string(), "Spoofed");
    }

    #[test]
    fn satisfactory_saturates_at_max() {
        let fb = Feedback::Satisfactory;
        assert_eq!(adjust(level(99), &fb), level(100));
        assert_eq!(adjust(level(100), &fb), level(100));
    }

    #[test]
    fn unsatisfactory_saturates_at_min() {
        let fb = Feedback::from("Unsatisfactory");
        assert_eq!(adjust(level(1), &fb), level(0));
        assert_eq!(adjust(level(0), &fb), level(0));
    }

    #[test]
    fn apply_reports_before_and_after() {
        let mut user = User::new("User0", "127.2.2.0", UserLevel::Admin).with_trust_level(level(99));
        let change = TrustPolicy::default().apply(&mut user, &Feedback::Satisfactory);
        assert_eq!(change.before, level(99));
        assert_eq!(change.after, level(100));
        assert_eq!(change.delta(), 1);
        assert_eq!(user.trust_level, level(100));
    }

    #[test]
    fn exhaustion_keeps_status_by_default() {
        let mut device = Device::new("Device1", "127.2.2.0", DeviceType::Sensor)
            .with_trust_level(level(1));
        let change = TrustPolicy::default().apply(&mut device, &Feedback::from("Bad"));
        assert!(!change.deactivated);
        assert_eq!(device.status, Status::Active);
    }

    #[test]
    fn exhaustion_deactivates_when_enabled() {
        let policy = TrustPolicy::default().with_auto_deactivate(true);
        let mut device = Device::new("Device1", "127.2.2.0", DeviceType::Sensor)
            .with_trust_level(level(1));

        let change = policy.apply(&mut device, &Feedback::from("Bad"));
        assert!(change.deactivated);
        assert_eq!(device.status, Status::Deactivated);

        // Already deactivated: not reported again.
        let again = policy.apply(&mut device, &Feedback::from("Bad"));
        assert!(!again.deactivated);
    }

    proptest! {
        /// Property: any feedback sequence keeps the level in bounds and
        /// moves it by at most one per step.
        #[test]
        fn prop_adjust_stays_bounded(start in 0u8..=100, steps in proptest::collection::vec(any::<bool>(), 0..300)) {
            let mut current = level(start);
            for good in steps {
                let fb = if good { Feedback::Satisfactory } else { Feedback::from("Unsatisfactory") };
                let next = adjust(current, &fb);
                prop_assert!(next <= TrustLevel::MAX);
                prop_assert!(i16::from(next.value()).abs_diff(i16::from(current.value())) <= 1);
                current = next;
            }
        }
    }
}
