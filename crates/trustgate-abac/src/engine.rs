//! The access engine: evaluation, trust adjustment, and lookups over a ledger.
//!
//! Each mutating call runs as one ledger transaction. It either commits all
//! of its writes or none of them. The engine keeps no state between calls
//! beyond its configuration.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use trustgate_ledger::{Ledger, Transaction};
use trustgate_types::{
    Device, DeviceId, Permission, Request, RequestKey, RequestType, Requester, User, UserId,
};

use crate::attributes::{AccessRequest, Subject};
use crate::error::{AbacError, RecordKind, Result};
use crate::evaluator::{self, Decision};
use crate::policy::EvaluationOptions;
use crate::registry::{Authorizer, LedgerAdmins};
use crate::store;
use crate::trust::{Feedback, TrustChange, TrustPolicy};

// ============================================================================
// Options
// ============================================================================

/// Engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub evaluation: EvaluationOptions,
    pub trust: TrustPolicy,
}

// ============================================================================
// Trust Outcome
// ============================================================================

/// Result of applying feedback for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustOutcome {
    pub request_key: RequestKey,
    /// `user/<id>` or `device/<id>` of the requester.
    pub requester: String,
    pub device: DeviceId,
    pub requester_change: TrustChange,
    pub device_change: TrustChange,
}

// ============================================================================
// Access Engine
// ============================================================================

/// Decision engine and trust adjuster over a [`Ledger`].
///
/// Evaluation and adjustment are open to any caller. Attribute management
/// (see the registry operations) is gated by an [`Authorizer`], by default
/// [`LedgerAdmins`].
#[derive(Debug)]
pub struct AccessEngine<L: Ledger> {
    ledger: L,
    options: EngineOptions,
    authorizer: Box<dyn Authorizer>,

    /// Whether to log decisions and adjustments.
    audit_enabled: bool,
}

impl<L: Ledger> AccessEngine<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            options: EngineOptions::default(),
            authorizer: Box::new(LedgerAdmins),
            audit_enabled: true,
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Box::new(authorizer);
        self
    }

    /// Disables audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub(crate) fn authorizer(&self) -> &dyn Authorizer {
        self.authorizer.as_ref()
    }

    // ------------------------------------------------------------------------
    // Decision
    // ------------------------------------------------------------------------

    /// Evaluates `request` and stores it under `key` with its verdict.
    ///
    /// A missing requester or target record is denied, never an error.
    /// Re-evaluating under an existing key replaces the stored request.
    ///
    /// **Audit:** Logs every verdict with the rule that produced it.
    pub fn evaluate(&self, key: &RequestKey, request: AccessRequest) -> Result<Decision> {
        let mut tx = Transaction::begin(&self.ledger);

        let target: Option<Device> = store::load(&mut tx, request.device_id.as_str())?;
        let decision = match request.request_type {
            RequestType::U2D => {
                let user: Option<User> = store::load(&mut tx, &request.requester_id)?;
                evaluator::evaluate(
                    &request,
                    Subject::User(user.as_ref()),
                    target.as_ref(),
                    self.options.evaluation,
                )
            }
            RequestType::D2D => {
                let requester: Option<Device> = store::load(&mut tx, &request.requester_id)?;
                evaluator::evaluate(
                    &request,
                    Subject::Device(requester.as_ref()),
                    target.as_ref(),
                    self.options.evaluation,
                )
            }
        };

        let record = request.into_record(decision.permission);
        store::stage(&mut tx, key.as_str(), &record)?;
        tx.commit()?;

        if self.audit_enabled {
            if decision.is_allowed() {
                info!(
                    request_key = %key,
                    request_type = %record.request_type,
                    requester = %record.requester_id,
                    device = %record.device_id,
                    action = %record.action,
                    rule = %decision.rule,
                    "Access allowed"
                );
            } else {
                warn!(
                    request_key = %key,
                    request_type = %record.request_type,
                    requester = %record.requester_id,
                    device = %record.device_id,
                    action = %record.action,
                    rule = %decision.rule,
                    reason = %decision.reason,
                    "Access denied"
                );
            }
        }

        Ok(decision)
    }

    // ------------------------------------------------------------------------
    // Trust
    // ------------------------------------------------------------------------

    /// Applies feedback for the request stored under `key`.
    ///
    /// The request is left unchanged. Each adjusted record is written under
    /// its own id. When a device requested access to itself, both labels
    /// apply to that one record in order.
    ///
    /// # Errors
    ///
    /// `NotFound` if the request, the requester, or the device is missing.
    pub fn adjust_trust(
        &self,
        key: &RequestKey,
        requester_feedback: &Feedback,
        device_feedback: &Feedback,
    ) -> Result<TrustOutcome> {
        let policy = self.options.trust;
        let mut tx = Transaction::begin(&self.ledger);
        let request: Request = store::load_existing(&mut tx, key.as_str())?;
        let device_id = request.device_id.as_str();

        let requester = request.requester();
        let (requester_change, device_change) = match &requester {
            Requester::User(user_id) => {
                let mut user: User = store::load_existing(&mut tx, user_id.as_str())?;
                let mut device: Device = store::load_existing(&mut tx, device_id)?;
                let requester_change = policy.apply(&mut user, requester_feedback);
                let device_change = policy.apply(&mut device, device_feedback);
                store::stage(&mut tx, user_id.as_str(), &user)?;
                store::stage(&mut tx, device_id, &device)?;
                (requester_change, device_change)
            }
            Requester::Device(requester_id) if *requester_id == request.device_id => {
                let mut device: Device = store::load_existing(&mut tx, device_id)?;
                let requester_change = policy.apply(&mut device, requester_feedback);
                let device_change = policy.apply(&mut device, device_feedback);
                store::stage(&mut tx, device_id, &device)?;
                (requester_change, device_change)
            }
            Requester::Device(requester_id) => {
                let mut peer: Device = store::load_existing(&mut tx, requester_id.as_str())?;
                let mut device: Device = store::load_existing(&mut tx, device_id)?;
                let requester_change = policy.apply(&mut peer, requester_feedback);
                let device_change = policy.apply(&mut device, device_feedback);
                store::stage(&mut tx, requester_id.as_str(), &peer)?;
                store::stage(&mut tx, device_id, &device)?;
                (requester_change, device_change)
            }
        };
        tx.commit()?;

        let outcome = TrustOutcome {
            request_key: key.clone(),
            requester: match requester {
                Requester::User(id) => format!("user/{id}"),
                Requester::Device(id) => format!("device/{id}"),
            },
            device: request.device_id,
            requester_change,
            device_change,
        };

        if self.audit_enabled {
            info!(
                request_key = %key,
                requester = %outcome.requester,
                requester_feedback = %requester_feedback,
                requester_trust = %outcome.requester_change.after,
                device = %outcome.device,
                device_feedback = %device_feedback,
                device_trust = %outcome.device_change.after,
                "Trust adjusted"
            );
            if outcome.requester_change.deactivated {
                warn!(entity = %outcome.requester, "Trust exhausted, entity deactivated");
            }
            if outcome.device_change.deactivated {
                warn!(entity = %format!("device/{}", outcome.device), "Trust exhausted, entity deactivated");
            }
        }

        Ok(outcome)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// The stored verdict of the request under `key`.
    pub fn permission(&self, key: &RequestKey) -> Result<Permission> {
        self.request(key).map(|request| request.permission)
    }

    pub fn request(&self, key: &RequestKey) -> Result<Request> {
        store::get(&self.ledger, key.as_str())?
            .ok_or_else(|| AbacError::not_found(RecordKind::Request, key))
    }

    pub fn user(&self, id: &UserId) -> Result<User> {
        store::get(&self.ledger, id.as_str())?
            .ok_or_else(|| AbacError::not_found(RecordKind::User, id))
    }

    pub fn device(&self, id: &DeviceId) -> Result<Device> {
        store::get(&self.ledger, id.as_str())?
            .ok_or_else(|| AbacError::not_found(RecordKind::Device, id))
    }

    pub fn users(&self) -> Result<Vec<User>> {
        Ok(store::list::<User, _>(&self.ledger)?
            .into_iter()
            .map(|(_, user)| user)
            .collect())
    }

    pub fn devices(&self) -> Result<Vec<Device>> {
        Ok(store::list::<Device, _>(&self.ledger)?
            .into_iter()
            .map(|(_, device)| device)
            .collect())
    }

    /// Every stored request with its key, ordered by key.
    pub fn requests(&self) -> Result<Vec<(RequestKey, Request)>> {
        Ok(store::list::<Request, _>(&self.ledger)?
            .into_iter()
            .map(|(key, request)| (RequestKey::new(key), request))
            .collect())
    }
}
