//! Attribute registry: administrator-gated management of user and device
//! records.
//!
//! Records are never removed. Deactivation flips the status and keeps the
//! record readable.

use std::fmt::{Debug, Display};

use tracing::{info, warn};
use trustgate_ledger::{Ledger, Transaction};
use trustgate_types::{
    Device, DeviceId, SecurityLevel, Status, TimeWindow, TrustLevel, User, UserId, UserLevel,
    Validity, Zone,
};

use crate::engine::AccessEngine;
use crate::error::{AbacError, RecordKind, Result};
use crate::store;

// ============================================================================
// Authorization
// ============================================================================

/// An attribute-management operation subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminOperation {
    RegisterUser,
    UpdateUser,
    DeactivateUser,
    RegisterDevice,
    UpdateDevice,
    DeactivateDevice,
}

impl Display for AdminOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::RegisterUser => "register users",
            Self::UpdateUser => "update users",
            Self::DeactivateUser => "deactivate users",
            Self::RegisterDevice => "register devices",
            Self::UpdateDevice => "update devices",
            Self::DeactivateDevice => "deactivate devices",
        })
    }
}

/// Decides whether a caller may perform an attribute-management operation.
///
/// `caller_record` is the caller's user record when the caller identity
/// names a registered user.
pub trait Authorizer: Send + Sync + Debug {
    fn authorize(
        &self,
        caller: &str,
        caller_record: Option<&User>,
        operation: AdminOperation,
    ) -> bool;
}

/// Allows callers registered in the ledger as active administrators.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerAdmins;

impl Authorizer for LedgerAdmins {
    fn authorize(&self, _caller: &str, caller_record: Option<&User>, _: AdminOperation) -> bool {
        caller_record.is_some_and(|user| user.is_admin() && user.status.is_active())
    }
}

/// Allows every caller. For deployments where the transport has already
/// restricted who can reach the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedCallers;

impl Authorizer for TrustedCallers {
    fn authorize(&self, _: &str, _: Option<&User>, _: AdminOperation) -> bool {
        true
    }
}

// ============================================================================
// Updates
// ============================================================================

/// Attributes an administrator may change on a user. `None` keeps the
/// current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub level: Option<UserLevel>,
    pub clearance: Option<SecurityLevel>,
    pub zone: Option<Zone>,
    pub validity: Option<Validity>,
}

impl UserUpdate {
    pub fn level(mut self, level: UserLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn clearance(mut self, clearance: impl Into<SecurityLevel>) -> Self {
        self.clearance = Some(clearance.into());
        self
    }

    pub fn zone(mut self, zone: impl Into<Zone>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn validity(mut self, validity: Validity) -> Self {
        self.validity = Some(validity);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.clearance.is_none()
            && self.zone.is_none()
            && self.validity.is_none()
    }

    fn apply_to(self, user: &mut User) {
        if let Some(level) = self.level {
            user.level = level;
        }
        if let Some(clearance) = self.clearance {
            user.clearance = clearance;
        }
        if let Some(zone) = self.zone {
            user.zone = zone;
        }
        if let Some(validity) = self.validity {
            user.validity = validity;
        }
    }
}

/// Attributes an administrator may change on a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub security_level: Option<SecurityLevel>,
    pub zone: Option<Zone>,
    pub window: Option<TimeWindow>,
}

impl DeviceUpdate {
    pub fn security_level(mut self, level: impl Into<SecurityLevel>) -> Self {
        self.security_level = Some(level.into());
        self
    }

    pub fn zone(mut self, zone: impl Into<Zone>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.security_level.is_none() && self.zone.is_none() && self.window.is_none()
    }

    fn apply_to(self, device: &mut Device) {
        if let Some(level) = self.security_level {
            device.security_level = level;
        }
        if let Some(zone) = self.zone {
            device.zone = zone;
        }
        if let Some(window) = self.window {
            device.window = window;
        }
    }
}

// ============================================================================
// Seed data
// ============================================================================

/// The two administrators a fresh demo ledger starts with.
pub fn demo_admins() -> Vec<User> {
    vec![
        User::new("User0", "127.2.2.0", UserLevel::Admin)
            .with_public_key("sjhohsov23hjv23")
            .with_clearance("High")
            .with_zone("A")
            .with_trust_level(TrustLevel::MAX),
        User::new("User1", "127.8.8.0", UserLevel::Admin)
            .with_public_key("00fnjmso3hiol2p")
            .with_clearance("High")
            .with_zone("B")
            .with_trust_level(TrustLevel::MAX),
    ]
}

// ============================================================================
// Registry operations
// ============================================================================

impl<L: Ledger> AccessEngine<L> {
    /// Writes the first users of an empty ledger without authorization.
    ///
    /// Fails with `AlreadyInitialized` once any user exists.
    pub fn bootstrap(&self, users: Vec<User>) -> Result<()> {
        let existing = store::list::<User, _>(self.ledger())?.len();
        if existing > 0 {
            return Err(AbacError::AlreadyInitialized { users: existing });
        }

        let mut tx = Transaction::begin(self.ledger());
        for user in &users {
            // Reading each id puts it in the read set, so a concurrent
            // registration of the same id fails the commit.
            if store::load::<User, _>(&mut tx, user.id.as_str())?.is_some() {
                return Err(already_exists(RecordKind::User, &user.id));
            }
            store::stage(&mut tx, user.id.as_str(), user)?;
        }
        tx.commit()?;

        info!(users = users.len(), "ledger bootstrapped");
        Ok(())
    }

    pub fn register_user(&self, caller: &str, user: User) -> Result<()> {
        let mut tx = Transaction::begin(self.ledger());
        self.authorize(&mut tx, caller, AdminOperation::RegisterUser)?;

        if store::load::<User, _>(&mut tx, user.id.as_str())?.is_some() {
            return Err(already_exists(RecordKind::User, &user.id));
        }
        store::stage(&mut tx, user.id.as_str(), &user)?;
        tx.commit()?;

        info!(caller, user = %user.id, level = %user.level, "user registered");
        Ok(())
    }

    /// Applies `update` and returns the stored record.
    pub fn update_user(&self, caller: &str, id: &UserId, update: UserUpdate) -> Result<User> {
        let mut tx = Transaction::begin(self.ledger());
        self.authorize(&mut tx, caller, AdminOperation::UpdateUser)?;

        let mut user: User = store::load_existing(&mut tx, id.as_str())?;
        update.apply_to(&mut user);
        store::stage(&mut tx, id.as_str(), &user)?;
        tx.commit()?;

        info!(caller, user = %id, "user updated");
        Ok(user)
    }

    pub fn deactivate_user(&self, caller: &str, id: &UserId) -> Result<User> {
        let mut tx = Transaction::begin(self.ledger());
        self.authorize(&mut tx, caller, AdminOperation::DeactivateUser)?;

        let mut user: User = store::load_existing(&mut tx, id.as_str())?;
        user.status = Status::Deactivated;
        store::stage(&mut tx, id.as_str(), &user)?;
        tx.commit()?;

        info!(caller, user = %id, "user deactivated");
        Ok(user)
    }

    pub fn register_device(&self, caller: &str, device: Device) -> Result<()> {
        let mut tx = Transaction::begin(self.ledger());
        self.authorize(&mut tx, caller, AdminOperation::RegisterDevice)?;

        if store::load::<Device, _>(&mut tx, device.id.as_str())?.is_some() {
            return Err(already_exists(RecordKind::Device, &device.id));
        }
        store::stage(&mut tx, device.id.as_str(), &device)?;
        tx.commit()?;

        info!(caller, device = %device.id, device_type = %device.device_type, "device registered");
        Ok(())
    }

    pub fn update_device(
        &self,
        caller: &str,
        id: &DeviceId,
        update: DeviceUpdate,
    ) -> Result<Device> {
        let mut tx = Transaction::begin(self.ledger());
        self.authorize(&mut tx, caller, AdminOperation::UpdateDevice)?;

        let mut device: Device = store::load_existing(&mut tx, id.as_str())?;
        update.apply_to(&mut device);
        store::stage(&mut tx, id.as_str(), &device)?;
        tx.commit()?;

        info!(caller, device = %id, "device updated");
        Ok(device)
    }

    pub fn deactivate_device(&self, caller: &str, id: &DeviceId) -> Result<Device> {
        let mut tx = Transaction::begin(self.ledger());
        self.authorize(&mut tx, caller, AdminOperation::DeactivateDevice)?;

        let mut device: Device = store::load_existing(&mut tx, id.as_str())?;
        device.status = Status::Deactivated;
        store::stage(&mut tx, id.as_str(), &device)?;
        tx.commit()?;

        info!(caller, device = %id, "device deactivated");
        Ok(device)
    }

    /// Reads the caller's record inside `tx` so a concurrent demotion of the
    /// caller invalidates the commit.
    fn authorize(
        &self,
        tx: &mut Transaction<'_, L>,
        caller: &str,
        operation: AdminOperation,
    ) -> Result<()> {
        let record: Option<User> = store::load(tx, caller)?;
        if self.authorizer().authorize(caller, record.as_ref(), operation) {
            return Ok(());
        }

        warn!(caller, %operation, "attribute operation rejected");
        Err(AbacError::AuthorizationDenied {
            caller: caller.to_string(),
            operation,
        })
    }
}

fn already_exists(kind: RecordKind, id: &impl Display) -> AbacError {
    AbacError::AlreadyExists {
        kind,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustgate_ledger::MemoryLedger;
    use trustgate_types::DeviceType;

    fn seeded() -> AccessEngine<MemoryLedger> {
        let engine = AccessEngine::new(MemoryLedger::new()).without_audit();
        engine.bootstrap(demo_admins()).unwrap();
        engine
    }

    fn sensor(id: &str) -> Device {
        Device::new(id, "127.2.2.0", DeviceType::Sensor).with_zone("A")
    }

    #[test]
    fn bootstrap_only_on_empty_ledger() {
        let engine = seeded();
        let err = engine.bootstrap(demo_admins()).unwrap_err();
        assert!(matches!(err, AbacError::AlreadyInitialized { users: 2 }));
    }

    #[test]
    fn demo_admins_match_seed_ledger() {
        let engine = seeded();
        let user0 = engine.user(&UserId::new("User0")).unwrap();
        assert_eq!(user0.network_id.as_str(), "127.2.2.0");
        assert_eq!(user0.trust_level, TrustLevel::MAX);
        assert_eq!(user0.validity.as_str(), "N/A");
        let user1 = engine.user(&UserId::new("User1")).unwrap();
        assert_eq!(user1.public_key, "00fnjmso3hiol2p");
        assert_eq!(user1.zone.as_str(), "B");
    }

    #[test]
    fn admin_registers_device() {
        let engine = seeded();
        engine.register_device("User0", sensor("Device1")).unwrap();
        assert_eq!(engine.devices().unwrap().len(), 1);
    }

    #[test]
    fn unknown_caller_is_rejected() {
        let engine = seeded();
        let err = engine.register_device("Mallory", sensor("Device1")).unwrap_err();
        assert!(matches!(
            err,
            AbacError::AuthorizationDenied { operation: AdminOperation::RegisterDevice, .. }
        ));
        assert!(engine.devices().unwrap().is_empty());
    }

    #[test]
    fn guest_caller_is_rejected() {
        let engine = seeded();
        engine
            .register_user("User0", User::new("User2", "127.2.2.0", UserLevel::Guest))
            .unwrap();
        let err = engine.deactivate_user("User2", &UserId::new("User0")).unwrap_err();
        assert!(matches!(err, AbacError::AuthorizationDenied { .. }));
    }

    #[test]
    fn deactivated_admin_loses_rights() {
        let engine = seeded();
        engine.deactivate_user("User1", &UserId::new("User0")).unwrap();
        let err = engine.register_device("User0", sensor("Device1")).unwrap_err();
        assert!(matches!(err, AbacError::AuthorizationDenied { .. }));
    }

    #[test]
    fn trusted_callers_skip_the_admin_check() {
        let engine = AccessEngine::new(MemoryLedger::new())
            .without_audit()
            .with_authorizer(TrustedCallers);
        engine.register_device("anyone", sensor("Device1")).unwrap();
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let engine = seeded();
        engine.register_device("User0", sensor("Device1")).unwrap();
        let err = engine.register_device("User0", sensor("Device1")).unwrap_err();
        assert!(matches!(err, AbacError::AlreadyExists { kind: RecordKind::Device, .. }));
    }

    #[test]
    fn update_changes_only_named_attributes() {
        let engine = seeded();
        let updated = engine
            .update_user(
                "User0",
                &UserId::new("User1"),
                UserUpdate::default().zone("C").validity(Validity::not_valid()),
            )
            .unwrap();
        assert_eq!(updated.zone.as_str(), "C");
        assert!(updated.validity.is_not_valid());
        assert_eq!(updated.clearance.as_str(), "High");
        assert_eq!(engine.user(&UserId::new("User1")).unwrap(), updated);
    }

    #[test]
    fn update_device_window() {
        let engine = seeded();
        engine.register_device("User0", sensor("Device1")).unwrap();
        let device = engine
            .update_device(
                "User0",
                &DeviceId::new("Device1"),
                DeviceUpdate::default().window(TimeWindow::new(5, 15)).security_level("Low"),
            )
            .unwrap();
        assert_eq!(device.window, TimeWindow::new(5, 15));
        assert_eq!(device.security_level.as_str(), "Low");
        assert_eq!(device.zone.as_str(), "A");
    }

    #[test]
    fn updating_missing_record_is_not_found() {
        let engine = seeded();
        let err = engine
            .update_device("User0", &DeviceId::new("Ghost"), DeviceUpdate::default().zone("A"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn deactivation_keeps_the_record() {
        let engine = seeded();
        engine.register_device("User0", sensor("Device1")).unwrap();
        engine.deactivate_device("User0", &DeviceId::new("Device1")).unwrap();
        let device = engine.device(&DeviceId::new("Device1")).unwrap();
        assert_eq!(device.status, Status::Deactivated);
    }
}
