//! Inputs to an access decision.
//!
//! An [`AccessRequest`] is what the caller submits. A [`Subject`] is the
//! requester's attribute record as found in the store, or its absence.

use std::str::FromStr;

use trustgate_types::{
    ActionType, Device, DeviceId, Permission, Request, RequestType, Requester, User, UserId,
};

use crate::error::Result;

// ============================================================================
// Access Request
// ============================================================================

/// A pending request, before evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pub request_type: RequestType,
    pub action: ActionType,
    /// A user id for `U2D`, a device id for `D2D`.
    pub requester_id: String,
    pub device_id: DeviceId,
    pub time: i64,
}

impl AccessRequest {
    /// A user asking to act on a device.
    pub fn u2d(
        action: impl Into<ActionType>,
        user: impl Into<UserId>,
        device: impl Into<DeviceId>,
        time: i64,
    ) -> Self {
        let user: UserId = user.into();
        Self {
            request_type: RequestType::U2D,
            action: action.into(),
            requester_id: user.into(),
            device_id: device.into(),
            time,
        }
    }

    /// A device asking to act on another device.
    pub fn d2d(
        action: impl Into<ActionType>,
        requester: impl Into<DeviceId>,
        device: impl Into<DeviceId>,
        time: i64,
    ) -> Self {
        let requester: DeviceId = requester.into();
        Self {
            request_type: RequestType::D2D,
            action: action.into(),
            requester_id: requester.into(),
            device_id: device.into(),
            time,
        }
    }

    /// Builds a request from untyped labels.
    ///
    /// Fails with `InvalidRequestType` unless `request_type` is `U2D` or `D2D`.
    /// Any action label is accepted; unknown actions are denied at the gate.
    pub fn parse(
        request_type: &str,
        action: &str,
        requester_id: impl Into<String>,
        device_id: impl Into<DeviceId>,
        time: i64,
    ) -> Result<Self> {
        Ok(Self {
            request_type: RequestType::from_str(request_type)?,
            action: ActionType::from(action),
            requester_id: requester_id.into(),
            device_id: device_id.into(),
            time,
        })
    }

    pub fn requester(&self) -> Requester {
        match self.request_type {
            RequestType::U2D => Requester::User(UserId::new(self.requester_id.clone())),
            RequestType::D2D => Requester::Device(DeviceId::new(self.requester_id.clone())),
        }
    }

    /// The stored form of this request once a verdict is known.
    pub fn into_record(self, permission: Permission) -> Request {
        Request {
            request_type: self.request_type,
            action: self.action,
            requester_id: self.requester_id,
            device_id: self.device_id,
            time: self.time,
            permission,
        }
    }
}

// ============================================================================
// Subject
// ============================================================================

/// The requester's attributes, `None` when the id has no record.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    User(Option<&'a User>),
    Device(Option<&'a Device>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_unknown_request_type() {
        let err = AccessRequest::parse("X2Y", "Read", "User0", "Device1", 0).unwrap_err();
        assert!(matches!(err, crate::AbacError::InvalidRequestType(t) if t == "X2Y"));
    }

    #[test]
    fn parse_keeps_unknown_action_verbatim() {
        let request = AccessRequest::parse("U2D", "Write", "User0", "Device1", 5).unwrap();
        assert_eq!(request.action, ActionType::Other("Write".to_string()));
    }

    #[test]
    fn requester_follows_request_type() {
        let u2d = AccessRequest::u2d(ActionType::Read, "User0", "Device1", 0);
        let d2d = AccessRequest::d2d(ActionType::Read, "Device2", "Device1", 0);
        assert_eq!(u2d.requester(), Requester::User(UserId::new("User0")));
        assert_eq!(d2d.requester(), Requester::Device(DeviceId::new("Device2")));
    }

    #[test]
    fn record_carries_every_field() {
        let record = AccessRequest::u2d(ActionType::Action, "User1", "Device4", 77)
            .into_record(Permission::Deny);
        assert_eq!(record.request_type, RequestType::U2D);
        assert_eq!(record.action, ActionType::Action);
        assert_eq!(record.requester_id, "User1");
        assert_eq!(record.device_id, DeviceId::new("Device4"));
        assert_eq!(record.time, 77);
        assert_eq!(record.permission, Permission::Deny);
    }
}
