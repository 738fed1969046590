//! The fixed rule catalogue.
//!
//! Every verdict the evaluator produces is attributed to exactly one of these
//! rules. A rule's effect is fixed: the evaluator chooses *which* rule fires,
//! never what that rule decides.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use trustgate_types::Permission;

// ============================================================================
// Rule
// ============================================================================

/// Named branch of the U2D or D2D rule tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    // -- Shared --
    /// The target device has no record.
    UnknownDevice,
    /// The requesting user or device has no record.
    UnknownRequester,
    /// The requester or target is deactivated (opt-in).
    Deactivated,
    /// The target device type does not support the requested action.
    UnsupportedAction,

    // -- U2D --
    /// Administrator on the device's network.
    AdminSameNetwork,
    /// Guest whose credential is marked "Not valid".
    GuestNotValid,
    /// User and device share a zone.
    SameZone,
    /// Read inside the device's time window.
    WindowRead,
    /// Action inside the window with matching clearance.
    WindowActionCleared,
    /// Action inside the window without matching clearance.
    WindowActionUncleared,
    /// No branch granted access.
    OutsideWindow,

    // -- D2D --
    /// Devices on one network sharing a zone.
    PeerSameZone,
    /// Devices on one network, inside the target window, at equal security levels.
    PeerWindowSecurity,
    /// Devices on one network with no zone, window, or level match.
    PeerNoMatch,
    /// Devices on different networks.
    NetworkMismatch,
}

impl Rule {
    /// Stable identifier used in logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            Self::UnknownDevice => "unknown-device",
            Self::UnknownRequester => "unknown-requester",
            Self::Deactivated => "deactivated",
            Self::UnsupportedAction => "unsupported-action",
            Self::AdminSameNetwork => "admin-same-network",
            Self::GuestNotValid => "guest-not-valid",
            Self::SameZone => "same-zone",
            Self::WindowRead => "window-read",
            Self::WindowActionCleared => "window-action-cleared",
            Self::WindowActionUncleared => "window-action-uncleared",
            Self::OutsideWindow => "outside-window",
            Self::PeerSameZone => "peer-same-zone",
            Self::PeerWindowSecurity => "peer-window-security",
            Self::PeerNoMatch => "peer-no-match",
            Self::NetworkMismatch => "network-mismatch",
        }
    }

    /// The verdict this rule always produces.
    pub fn effect(self) -> Permission {
        match self {
            Self::AdminSameNetwork
            | Self::SameZone
            | Self::WindowRead
            | Self::WindowActionCleared
            | Self::PeerSameZone
            | Self::PeerWindowSecurity => Permission::Allow,
            Self::UnknownDevice
            | Self::UnknownRequester
            | Self::Deactivated
            | Self::UnsupportedAction
            | Self::GuestNotValid
            | Self::WindowActionUncleared
            | Self::OutsideWindow
            | Self::PeerNoMatch
            | Self::NetworkMismatch => Permission::Deny,
        }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Options
// ============================================================================

/// Evaluation switches. The default evaluates the rule trees unmodified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOptions {
    /// Deny before the gate when either party is deactivated.
    pub deny_deactivated: bool,
}

impl EvaluationOptions {
    pub fn with_deny_deactivated(mut self, enabled: bool) -> Self {
        self.deny_deactivated = enabled;
        self
    }
}
