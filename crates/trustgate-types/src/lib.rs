//! # trustgate-types: Core types for `trustgate`
//!
//! This crate contains the shared data model used across the `trustgate` system:
//! - Identifiers ([`UserId`], [`DeviceId`], [`RequestKey`])
//! - Attribute values ([`NetworkId`], [`Zone`], [`SecurityLevel`], [`Validity`])
//! - Enumerations ([`UserLevel`], [`DeviceType`], [`RequestType`], [`ActionType`],
//!   [`Permission`], [`Status`])
//! - Bounded trust scores ([`TrustLevel`])
//! - Access windows ([`TimeWindow`])
//! - Stored records ([`User`], [`Device`], [`Request`])
//!
//! Every record serializes to a flat field-to-value mapping. Field names are
//! part of the stored format and must not change.

use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

// ============================================================================
// String-backed newtypes
// ============================================================================

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_newtype!(
    /// Unique identifier of a registered user.
    UserId
);

string_newtype!(
    /// Unique identifier of a registered device.
    DeviceId
);

string_newtype!(
    /// Caller-chosen key under which a [`Request`] is stored.
    ///
    /// Request keys are independent of the identifiers a request references;
    /// two requests from the same user to the same device use distinct keys.
    RequestKey
);

string_newtype!(
    /// Network segment an entity belongs to (for example `127.2.2.0`).
    NetworkId
);

string_newtype!(
    /// Coarse location attribute shared by users and devices.
    Zone
);

string_newtype!(
    /// Security level of a device, or the actuator clearance of a user.
    ///
    /// Levels are opaque labels ("High", "Low", ...) compared for equality only.
    SecurityLevel
);

// ============================================================================
// Validity
// ============================================================================

/// Credential validity flag carried by every user.
///
/// The flag is free-form; only the literal [`Validity::NOT_VALID`] has meaning
/// to the access rules, where it marks a guest whose credential is revoked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Validity(String);

impl Validity {
    /// Marks an invalid guest credential.
    pub const NOT_VALID: &'static str = "Not valid";

    /// Used when validity does not apply (administrators, members).
    pub const NOT_APPLICABLE: &'static str = "N/A";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn not_valid() -> Self {
        Self(Self::NOT_VALID.to_string())
    }

    pub fn is_not_valid(&self) -> bool {
        self.0 == Self::NOT_VALID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Validity {
    fn default() -> Self {
        Self(Self::NOT_APPLICABLE.to_string())
    }
}

impl Display for Validity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Validity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ============================================================================
// Parse errors
// ============================================================================

/// Error returned when a string does not name a known enumeration value,
/// or a numeric attribute is out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Request type is neither `U2D` nor `D2D`.
    RequestType(String),
    /// Device type is not one of `Sensor`, `Actuator`, `Both`.
    DeviceType(String),
    /// Status is not one of `Active`, `Deactivated`.
    Status(String),
    /// Permission is neither `ALLOW` nor `DENY`.
    Permission(String),
    /// Trust level outside `0..=100`.
    TrustLevel(i64),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestType(v) => write!(f, "unsupported request type '{v}' (expected U2D or D2D)"),
            Self::DeviceType(v) => {
                write!(f, "unknown device type '{v}' (expected Sensor, Actuator or Both)")
            }
            Self::Status(v) => write!(f, "unknown status '{v}' (expected Active or Deactivated)"),
            Self::Permission(v) => write!(f, "unknown permission '{v}' (expected ALLOW or DENY)"),
            Self::TrustLevel(v) => write!(
                f,
                "trust level {v} out of range ({}..={})",
                TrustLevel::MIN.0,
                TrustLevel::MAX.0
            ),
        }
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// UserLevel - Clone (Other contains String)
// ============================================================================

/// Privilege level of a user.
///
/// Only `Admin` and `Guest` are interpreted by the access rules; any other
/// label is kept verbatim so records round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserLevel {
    Admin,
    Guest,
    Other(String),
}

impl UserLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "Admin",
            Self::Guest => "Guest",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for UserLevel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Admin" => Self::Admin,
            "Guest" => Self::Guest,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for UserLevel {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<UserLevel> for String {
    fn from(level: UserLevel) -> Self {
        match level {
            UserLevel::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl Display for UserLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DeviceType - Copy
// ============================================================================

/// Capability class of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    /// Produces readings; accepts `Read`.
    Sensor,
    /// Performs actions; accepts `Action`.
    Actuator,
    /// Accepts both `Read` and `Action`.
    Both,
}

impl DeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sensor => "Sensor",
            Self::Actuator => "Actuator",
            Self::Both => "Both",
        }
    }

    /// Returns true if this device type supports the given action.
    pub fn supports(self, action: &ActionType) -> bool {
        match action {
            ActionType::Read => matches!(self, Self::Sensor | Self::Both),
            ActionType::Action => matches!(self, Self::Actuator | Self::Both),
            ActionType::Other(_) => false,
        }
    }
}

impl FromStr for DeviceType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sensor" => Ok(Self::Sensor),
            "Actuator" => Ok(Self::Actuator),
            "Both" => Ok(Self::Both),
            other => Err(ParseError::DeviceType(other.to_string())),
        }
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RequestType - Copy
// ============================================================================

/// Category of an access request, selecting which rule tree applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// User-to-device: the requester is a [`User`].
    U2D,
    /// Device-to-device: the requester is a [`Device`].
    D2D,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::U2D => "U2D",
            Self::D2D => "D2D",
        }
    }
}

impl FromStr for RequestType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "U2D" => Ok(Self::U2D),
            "D2D" => Ok(Self::D2D),
            other => Err(ParseError::RequestType(other.to_string())),
        }
    }
}

impl Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ActionType - Clone (Other contains String)
// ============================================================================

/// Operation the requester wants to perform on the target device.
///
/// Unrecognized actions are carried through as `Other` so that the request is
/// still evaluated (and denied) and recorded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    /// Read a sensor value.
    Read,
    /// Invoke an actuator.
    Action,
    Other(String),
}

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Read => "Read",
            Self::Action => "Action",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ActionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Read" => Self::Read,
            "Action" => Self::Action,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ActionType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ActionType> for String {
    fn from(action: ActionType) -> Self {
        match action {
            ActionType::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Permission - Copy
// ============================================================================

/// Verdict stored with every evaluated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "ALLOW")]
    Allow,
    #[serde(rename = "DENY")]
    Deny,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Deny => "DENY",
        }
    }

    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }
}

impl FromStr for Permission {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALLOW" => Ok(Self::Allow),
            "DENY" => Ok(Self::Deny),
            other => Err(ParseError::Permission(other.to_string())),
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Status - Copy
// ============================================================================

/// Lifecycle status of a user or device. Records are never removed;
/// deletion flips the status to `Deactivated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Active,
    Deactivated,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Deactivated => "Deactivated",
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

impl FromStr for Status {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Deactivated" => Ok(Self::Deactivated),
            other => Err(ParseError::Status(other.to_string())),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TrustLevel - Copy (1-byte bounded counter)
// ============================================================================

/// Bounded reputation score in `0..=100`.
///
/// Adjustments saturate at both bounds: incrementing at [`TrustLevel::MAX`]
/// and decrementing at [`TrustLevel::MIN`] are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct TrustLevel(u8);

impl TrustLevel {
    pub const MIN: TrustLevel = TrustLevel(0);
    pub const MAX: TrustLevel = TrustLevel(100);

    /// Creates a trust level, rejecting values above [`TrustLevel::MAX`].
    pub fn new(value: u8) -> Result<Self, ParseError> {
        if value > Self::MAX.0 {
            return Err(ParseError::TrustLevel(i64::from(value)));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// One step up, saturating at `MAX`.
    pub fn increment(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX.0))
    }

    /// One step down, saturating at `MIN`.
    pub fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// True once the score has reached the lower bound.
    pub fn is_exhausted(self) -> bool {
        self == Self::MIN
    }
}

impl Default for TrustLevel {
    fn default() -> Self {
        Self(50)
    }
}

impl TryFrom<i64> for TrustLevel {
    type Error = ParseError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| ParseError::TrustLevel(value))
            .and_then(|v| Self::new(v).map_err(|_| ParseError::TrustLevel(value)))
    }
}

impl From<TrustLevel> for u8 {
    fn from(level: TrustLevel) -> Self {
        level.0
    }
}

impl Display for TrustLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// TimeWindow - Copy
// ============================================================================

/// Interval during which a device accepts requests from outside its zone.
///
/// Both bounds are inclusive. A window with `start > end` contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(rename = "tatimestart")]
    pub start: i64,
    #[serde(rename = "tatimeend")]
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: i64) -> bool {
        self.start <= time && time <= self.end
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

// ============================================================================
// Records
// ============================================================================

/// A registered user and its access attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "uid")]
    pub id: UserId,
    #[serde(rename = "unid")]
    pub network_id: NetworkId,
    #[serde(rename = "upubkey")]
    pub public_key: String,
    #[serde(rename = "userlevel")]
    pub level: UserLevel,
    /// Clearance compared against an actuator's security level.
    #[serde(rename = "aslevel")]
    pub clearance: SecurityLevel,
    #[serde(rename = "userzone")]
    pub zone: Zone,
    pub validity: Validity,
    #[serde(rename = "utrustlevel")]
    pub trust_level: TrustLevel,
    pub status: Status,
}

impl User {
    /// Creates an active user with empty optional attributes and the default
    /// trust level.
    pub fn new(id: impl Into<UserId>, network_id: impl Into<NetworkId>, level: UserLevel) -> Self {
        Self {
            id: id.into(),
            network_id: network_id.into(),
            public_key: String::new(),
            level,
            clearance: SecurityLevel::default(),
            zone: Zone::default(),
            validity: Validity::default(),
            trust_level: TrustLevel::default(),
            status: Status::Active,
        }
    }

    pub fn with_public_key(mut self, key: impl Into<String>) -> Self {
        self.public_key = key.into();
        self
    }

    pub fn with_clearance(mut self, clearance: impl Into<SecurityLevel>) -> Self {
        self.clearance = clearance.into();
        self
    }

    pub fn with_zone(mut self, zone: impl Into<Zone>) -> Self {
        self.zone = zone.into();
        self
    }

    pub fn with_validity(mut self, validity: Validity) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_trust_level(mut self, trust_level: TrustLevel) -> Self {
        self.trust_level = trust_level;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.level == UserLevel::Admin
    }
}

/// A registered device and its access attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "did")]
    pub id: DeviceId,
    #[serde(rename = "dnid")]
    pub network_id: NetworkId,
    #[serde(rename = "dpubkey")]
    pub public_key: String,
    #[serde(rename = "dtype")]
    pub device_type: DeviceType,
    #[serde(rename = "slevel")]
    pub security_level: SecurityLevel,
    #[serde(rename = "dzone")]
    pub zone: Zone,
    #[serde(flatten)]
    pub window: TimeWindow,
    #[serde(rename = "dtrustlevel")]
    pub trust_level: TrustLevel,
    #[serde(rename = "dstatus")]
    pub status: Status,
}

impl Device {
    /// Creates an active device with an empty window and the default trust level.
    pub fn new(
        id: impl Into<DeviceId>,
        network_id: impl Into<NetworkId>,
        device_type: DeviceType,
    ) -> Self {
        Self {
            id: id.into(),
            network_id: network_id.into(),
            public_key: String::new(),
            device_type,
            security_level: SecurityLevel::default(),
            zone: Zone::default(),
            window: TimeWindow::default(),
            trust_level: TrustLevel::default(),
            status: Status::Active,
        }
    }

    pub fn with_public_key(mut self, key: impl Into<String>) -> Self {
        self.public_key = key.into();
        self
    }

    pub fn with_security_level(mut self, level: impl Into<SecurityLevel>) -> Self {
        self.security_level = level.into();
        self
    }

    pub fn with_zone(mut self, zone: impl Into<Zone>) -> Self {
        self.zone = zone.into();
        self
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_trust_level(mut self, trust_level: TrustLevel) -> Self {
        self.trust_level = trust_level;
        self
    }
}

/// Identity of the party that issued a request, resolved from its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requester {
    User(UserId),
    Device(DeviceId),
}

impl Display for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Device(id) => write!(f, "device {id}"),
        }
    }
}

/// An evaluated access request. Written once by the decision engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type")]
    pub request_type: RequestType,
    #[serde(rename = "actiontype")]
    pub action: ActionType,
    /// A user id for `U2D`, a device id for `D2D`.
    #[serde(rename = "rid")]
    pub requester_id: String,
    #[serde(rename = "did")]
    pub device_id: DeviceId,
    pub time: i64,
    pub permission: Permission,
}

impl Request {
    /// Resolves the requester id against the request type.
    pub fn requester(&self) -> Requester {
        match self.request_type {
            RequestType::U2D => Requester::User(UserId::new(self.requester_id.clone())),
            RequestType::D2D => Requester::Device(DeviceId::new(self.requester_id.clone())),
        }
    }
}
