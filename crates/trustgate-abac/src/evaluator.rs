//! Access decision evaluation.
//!
//! Walks the U2D or D2D rule tree against an attribute snapshot. The first
//! branch that applies wins. Evaluation is pure: the same request and
//! snapshot always yield the same [`Decision`].

use trustgate_types::{ActionType, Device, Permission, User, UserLevel};

use crate::attributes::{AccessRequest, Subject};
use crate::policy::{EvaluationOptions, Rule};

// ============================================================================
// Decision
// ============================================================================

/// The result of evaluating an access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether access is allowed or denied.
    pub permission: Permission,
    /// The rule that produced the verdict.
    pub rule: Rule,
    /// Human-readable explanation of the verdict.
    pub reason: String,
}

impl Decision {
    fn fired(rule: Rule, reason: impl Into<String>) -> Self {
        Self {
            permission: rule.effect(),
            rule,
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.permission.is_allowed()
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Evaluates `request` against the requester `subject` and the target device.
///
/// The rule tree is selected by the subject: a user subject walks the U2D
/// tree, a device subject the D2D tree.
///
/// # Postcondition
///
/// Always returns a `Decision`. Never panics.
pub fn evaluate(
    request: &AccessRequest,
    subject: Subject<'_>,
    target: Option<&Device>,
    options: EvaluationOptions,
) -> Decision {
    match subject {
        Subject::User(user) => {
            evaluate_u2d(&request.action, request.time, user, target, options)
        }
        Subject::Device(requester) => {
            evaluate_d2d(&request.action, request.time, requester, target, options)
        }
    }
}

/// User-to-device rule tree.
pub fn evaluate_u2d(
    action: &ActionType,
    time: i64,
    user: Option<&User>,
    device: Option<&Device>,
    options: EvaluationOptions,
) -> Decision {
    let Some(device) = device else {
        return Decision::fired(Rule::UnknownDevice, "target device is not registered");
    };
    let Some(user) = user else {
        return Decision::fired(Rule::UnknownRequester, "requesting user is not registered");
    };

    if options.deny_deactivated {
        if !user.status.is_active() {
            return Decision::fired(Rule::Deactivated, format!("user {} is deactivated", user.id));
        }
        if !device.status.is_active() {
            return Decision::fired(
                Rule::Deactivated,
                format!("device {} is deactivated", device.id),
            );
        }
    }

    if let Some(denied) = gate(action, device) {
        return denied;
    }

    if user.is_admin() && user.network_id == device.network_id {
        return Decision::fired(
            Rule::AdminSameNetwork,
            format!("administrator on network {}", device.network_id),
        );
    }

    if user.level == UserLevel::Guest && user.validity.is_not_valid() {
        return Decision::fired(Rule::GuestNotValid, "guest credential is not valid");
    }

    if user.zone == device.zone {
        return Decision::fired(Rule::SameZone, format!("both in zone '{}'", device.zone));
    }

    if device.window.contains(time) {
        if *action == ActionType::Read {
            return Decision::fired(
                Rule::WindowRead,
                format!("read at {time} inside window {}", device.window),
            );
        }
        if device.security_level == user.clearance {
            return Decision::fired(
                Rule::WindowActionCleared,
                format!("clearance '{}' matches device level", user.clearance),
            );
        }
        return Decision::fired(
            Rule::WindowActionUncleared,
            format!(
                "clearance '{}' does not match device level '{}'",
                user.clearance, device.security_level
            ),
        );
    }

    Decision::fired(
        Rule::OutsideWindow,
        format!("different zone and {time} outside window {}", device.window),
    )
}

/// Device-to-device rule tree.
pub fn evaluate_d2d(
    action: &ActionType,
    time: i64,
    requester: Option<&Device>,
    target: Option<&Device>,
    options: EvaluationOptions,
) -> Decision {
    let Some(target) = target else {
        return Decision::fired(Rule::UnknownDevice, "target device is not registered");
    };
    let Some(requester) = requester else {
        return Decision::fired(Rule::UnknownRequester, "requesting device is not registered");
    };

    if options.deny_deactivated {
        for device in [requester, target] {
            if !device.status.is_active() {
                return Decision::fired(
                    Rule::Deactivated,
                    format!("device {} is deactivated", device.id),
                );
            }
        }
    }

    if let Some(denied) = gate(action, target) {
        return denied;
    }

    if requester.network_id != target.network_id {
        return Decision::fired(
            Rule::NetworkMismatch,
            format!(
                "network {} differs from {}",
                requester.network_id, target.network_id
            ),
        );
    }

    if requester.zone == target.zone {
        return Decision::fired(Rule::PeerSameZone, format!("both in zone '{}'", target.zone));
    }

    if target.window.contains(time) && requester.security_level == target.security_level {
        return Decision::fired(
            Rule::PeerWindowSecurity,
            format!(
                "inside window {} at level '{}'",
                target.window, target.security_level
            ),
        );
    }

    Decision::fired(
        Rule::PeerNoMatch,
        "same network but no zone, window, or security level match",
    )
}

// ============================================================================
// Helpers
// ============================================================================

/// Capability gate: `Some` holds the denial when the device type cannot
/// serve the action.
fn gate(action: &ActionType, device: &Device) -> Option<Decision> {
    if device.device_type.supports(action) {
        return None;
    }
    Some(Decision::fired(
        Rule::UnsupportedAction,
        format!("{} device does not accept '{action}'", device.device_type),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;
    use trustgate_types::{DeviceType, Status, TimeWindow, Validity};

    /// Helper: a user on network `net` in zone `zone`.
    fn user(level: UserLevel, net: &str, zone: &str) -> User {
        User::new("User0", net, level)
            .with_zone(zone)
            .with_clearance("High")
    }

    /// Helper: a device on network `net` in zone `zone`, window [10, 100].
    fn device(kind: DeviceType, net: &str, zone: &str) -> Device {
        Device::new("Device1", net, kind)
            .with_zone(zone)
            .with_security_level("High")
            .with_window(TimeWindow::new(10, 100))
    }

    fn u2d(action: ActionType, time: i64, user: &User, device: &Device) -> Decision {
        evaluate_u2d(
            &action,
            time,
            Some(user),
            Some(device),
            EvaluationOptions::default(),
        )
    }

    fn d2d(action: ActionType, time: i64, requester: &Device, target: &Device) -> Decision {
        evaluate_d2d(
            &action,
            time,
            Some(requester),
            Some(target),
            EvaluationOptions::default(),
        )
    }

    // ------------------------------------------------------------------------
    // U2D
    // ------------------------------------------------------------------------

    #[test]
    fn admin_on_same_network_reads_sensor() {
        let admin = user(UserLevel::Admin, "127.2.2.0", "A");
        let sensor = device(DeviceType::Sensor, "127.2.2.0", "B");
        let decision = u2d(ActionType::Read, 0, &admin, &sensor);
        assert_eq!(decision.permission, Permission::Allow);
        assert_eq!(decision.rule, Rule::AdminSameNetwork);
    }

    #[test]
    fn invalid_guest_is_denied_despite_shared_zone() {
        let guest = user(UserLevel::Guest, "127.2.2.0", "A").with_validity(Validity::not_valid());
        let sensor = device(DeviceType::Sensor, "127.9.9.0", "A");
        let decision = u2d(ActionType::Read, 50, &guest, &sensor);
        assert_eq!(decision.permission, Permission::Deny);
        assert_eq!(decision.rule, Rule::GuestNotValid);
    }

    #[test]
    fn member_in_same_zone_invokes_actuator() {
        let member = user(UserLevel::from("Member"), "127.1.1.0", "A");
        let actuator = device(DeviceType::Actuator, "127.9.9.0", "A");
        let decision = u2d(ActionType::Action, 500, &member, &actuator);
        assert_eq!(decision.rule, Rule::SameZone);
        assert!(decision.is_allowed());
    }

    #[test_case(50, Permission::Allow, Rule::WindowActionCleared ; "inside window")]
    #[test_case(10, Permission::Allow, Rule::WindowActionCleared ; "window start is inclusive")]
    #[test_case(100, Permission::Allow, Rule::WindowActionCleared ; "window end is inclusive")]
    #[test_case(200, Permission::Deny, Rule::OutsideWindow ; "after window")]
    #[test_case(9, Permission::Deny, Rule::OutsideWindow ; "before window")]
    fn actuator_window_with_matching_clearance(time: i64, permission: Permission, rule: Rule) {
        let member = user(UserLevel::from("Member"), "127.1.1.0", "A");
        let actuator = device(DeviceType::Actuator, "127.9.9.0", "B");
        let decision = u2d(ActionType::Action, time, &member, &actuator);
        assert_eq!(decision.permission, permission);
        assert_eq!(decision.rule, rule);
    }

    #[test]
    fn window_action_without_clearance_is_denied() {
        let member = user(UserLevel::from("Member"), "127.1.1.0", "A").with_clearance("Low");
        let actuator = device(DeviceType::Actuator, "127.9.9.0", "B");
        let decision = u2d(ActionType::Action, 50, &member, &actuator);
        assert_eq!(decision.rule, Rule::WindowActionUncleared);
        assert_eq!(decision.permission, Permission::Deny);
    }

    #[test]
    fn window_read_ignores_clearance() {
        let member = user(UserLevel::from("Member"), "127.1.1.0", "A").with_clearance("Low");
        let sensor = device(DeviceType::Sensor, "127.9.9.0", "B");
        let decision = u2d(ActionType::Read, 50, &member, &sensor);
        assert_eq!(decision.rule, Rule::WindowRead);
    }

    #[test_case(DeviceType::Sensor, ActionType::Action ; "sensor cannot act")]
    #[test_case(DeviceType::Actuator, ActionType::Read ; "actuator cannot be read")]
    #[test_case(DeviceType::Both, ActionType::Other("Write".into()) ; "unknown action")]
    fn gate_denies_before_admin_rule(kind: DeviceType, action: ActionType) {
        let admin = user(UserLevel::Admin, "127.2.2.0", "A");
        let target = device(kind, "127.2.2.0", "A");
        let decision = u2d(action, 50, &admin, &target);
        assert_eq!(decision.rule, Rule::UnsupportedAction);
        assert_eq!(decision.permission, Permission::Deny);
    }

    #[test]
    fn admin_on_other_network_falls_through() {
        let admin = user(UserLevel::Admin, "127.2.2.0", "A");
        let sensor = device(DeviceType::Sensor, "127.8.8.0", "B");
        let decision = u2d(ActionType::Read, 500, &admin, &sensor);
        assert_eq!(decision.rule, Rule::OutsideWindow);
    }

    #[test]
    fn unknown_device_is_checked_first() {
        let decision = evaluate_u2d(
            &ActionType::Read,
            0,
            None,
            None,
            EvaluationOptions::default(),
        );
        assert_eq!(decision.rule, Rule::UnknownDevice);
    }

    #[test]
    fn unknown_user_is_denied() {
        let sensor = device(DeviceType::Sensor, "127.2.2.0", "A");
        let decision = evaluate_u2d(
            &ActionType::Read,
            0,
            None,
            Some(&sensor),
            EvaluationOptions::default(),
        );
        assert_eq!(decision.rule, Rule::UnknownRequester);
        assert_eq!(decision.permission, Permission::Deny);
    }

    #[test]
    fn status_is_ignored_unless_enabled() {
        let mut admin = user(UserLevel::Admin, "127.2.2.0", "A");
        admin.status = Status::Deactivated;
        let sensor = device(DeviceType::Sensor, "127.2.2.0", "A");

        assert!(u2d(ActionType::Read, 0, &admin, &sensor).is_allowed());

        let strict = EvaluationOptions::default().with_deny_deactivated(true);
        let decision = evaluate_u2d(&ActionType::Read, 0, Some(&admin), Some(&sensor), strict);
        assert_eq!(decision.rule, Rule::Deactivated);
    }

    // ------------------------------------------------------------------------
    // D2D
    // ------------------------------------------------------------------------

    #[test]
    fn peers_on_different_networks_are_denied() {
        let requester = device(DeviceType::Sensor, "127.1.1.0", "A");
        let target = device(DeviceType::Sensor, "127.2.2.0", "A");
        let decision = d2d(ActionType::Read, 50, &requester, &target);
        assert_eq!(decision.rule, Rule::NetworkMismatch);
    }

    #[test]
    fn peers_in_same_zone_are_allowed() {
        let requester = device(DeviceType::Sensor, "127.1.1.0", "A").with_security_level("Low");
        let target = device(DeviceType::Actuator, "127.1.1.0", "A");
        let decision = d2d(ActionType::Action, 500, &requester, &target);
        assert_eq!(decision.rule, Rule::PeerSameZone);
    }

    #[test_case(50, "High", Rule::PeerWindowSecurity ; "window and level match")]
    #[test_case(50, "Low", Rule::PeerNoMatch ; "level mismatch")]
    #[test_case(500, "High", Rule::PeerNoMatch ; "outside window")]
    fn peers_across_zones(time: i64, level: &str, rule: Rule) {
        let requester = device(DeviceType::Sensor, "127.1.1.0", "A").with_security_level(level);
        let target = device(DeviceType::Both, "127.1.1.0", "B");
        assert_eq!(d2d(ActionType::Read, time, &requester, &target).rule, rule);
    }

    #[test]
    fn d2d_gate_uses_target_type() {
        let requester = device(DeviceType::Actuator, "127.1.1.0", "A");
        let target = device(DeviceType::Sensor, "127.1.1.0", "A");
        let decision = d2d(ActionType::Read, 50, &requester, &target);
        assert!(decision.is_allowed());
    }

    #[test]
    fn subject_selects_the_tree() {
        let sensor = device(DeviceType::Sensor, "127.1.1.0", "A");
        let peer = device(DeviceType::Sensor, "127.9.9.0", "A");
        let request = AccessRequest::d2d(ActionType::Read, "Device9", "Device1", 50);

        let decision = evaluate(
            &request,
            Subject::Device(Some(&peer)),
            Some(&sensor),
            EvaluationOptions::default(),
        );
        assert_eq!(decision.rule, Rule::NetworkMismatch);
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    fn arb_device_type() -> impl Strategy<Value = DeviceType> {
        prop_oneof![
            Just(DeviceType::Sensor),
            Just(DeviceType::Actuator),
            Just(DeviceType::Both),
        ]
    }

    fn arb_action() -> impl Strategy<Value = ActionType> {
        prop_oneof![Just(ActionType::Read), Just(ActionType::Action)]
    }

    proptest! {
        /// Property: an administrator on the device's network is allowed
        /// whenever the gate passes, whatever the zone, time, or level.
        #[test]
        fn prop_admin_same_network_allows(
            kind in arb_device_type(),
            action in arb_action(),
            user_zone in "[A-C]",
            device_zone in "[A-C]",
            time in any::<i64>(),
            level in "(High|Low)",
        ) {
            let admin = user(UserLevel::Admin, "127.2.2.0", &user_zone).with_clearance(level);
            let target = device(kind, "127.2.2.0", &device_zone);
            let decision = u2d(action.clone(), time, &admin, &target);
            prop_assert_eq!(decision.permission.is_allowed(), kind.supports(&action));
        }

        /// Property: D2D across networks is always denied.
        #[test]
        fn prop_d2d_network_mismatch_denies(
            kind in arb_device_type(),
            action in arb_action(),
            zone in "[A-C]",
            time in any::<i64>(),
        ) {
            let requester = device(kind, "127.1.1.0", &zone);
            let target = device(kind, "127.2.2.0", &zone);
            prop_assert_eq!(d2d(action, time, &requester, &target).permission, Permission::Deny);
        }

        /// Property: the verdict always equals the fired rule's effect.
        #[test]
        fn prop_permission_matches_rule_effect(
            kind in arb_device_type(),
            action in arb_action(),
            guest in any::<bool>(),
            zone in "[A-B]",
            time in -10i64..200,
        ) {
            let level = if guest { UserLevel::Guest } else { UserLevel::from("Member") };
            let requester = user(level, "127.1.1.0", &zone).with_validity(Validity::not_valid());
            let target = device(kind, "127.9.9.0", "A");
            let decision = u2d(action, time, &requester, &target);
            prop_assert_eq!(decision.permission, decision.rule.effect());
        }
    }
}
