#![warn(missing_docs)]
//! # geo-snap-permissions
//!
//! ## Purpose
//! Models the platform permission service that gates camera and location access.
//!
//! ## Responsibilities
//! - Name the permissions the capture workflow depends on.
//! - Expose a synchronous permission check trait mirroring the platform's
//!   self-check call.
//! - Provide static and scriptable implementations for hosts and tests.
//!
//! ## Data flow
//! The coordinator checks [`PermissionService::status`] before launching capture
//! and before starting location resolution. Prompt outcomes arrive as
//! [`PermissionDecision`] values through the host event loop.
//!
//! ## Ownership and lifetimes
//! Implementations use interior mutability behind `&self` so a shared handle can
//! be checked by the coordinator and updated by the host prompt path.
//!
//! ## Error model
//! Permission checks cannot fail; absence of a grant is a regular `Denied`
//! answer, never an error.
//!
//! ## Security and privacy notes
//! A denied permission is terminal for the affected record or request. Nothing
//! in this crate retries or escalates on the user's behalf.

use std::sync::Mutex;
use std::sync::PoisonError;

/// Permissions the capture workflow asks the platform for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Permission to launch the camera capture intent.
    Camera,
    /// Permission to read fine-grained device location.
    FineLocation,
}

impl Permission {
    /// Returns the platform-facing permission name.
    pub fn name(&self) -> &'static str {
        match self {
            Permission::Camera => "camera",
            Permission::FineLocation => "fine-location",
        }
    }
}

/// Grant status reported by the permission service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// The user granted the permission.
    Granted,
    /// The permission is absent or was declined.
    Denied,
}

impl PermissionStatus {
    /// Returns `true` for [`PermissionStatus::Granted`].
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// One prompt outcome delivered by the host event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionDecision {
    /// Permission the user decided on.
    pub permission: Permission,
    /// The user's answer.
    pub status: PermissionStatus,
}

/// Returns the decision for one permission from a prompt result set.
///
/// # Semantics
/// A permission missing from the result set counts as denied, matching platform
/// prompt responses that omit unanswered entries.
pub fn decision_for(decisions: &[PermissionDecision], permission: Permission) -> PermissionStatus {
    decisions
        .iter()
        .find(|decision| decision.permission == permission)
        .map(|decision| decision.status)
        .unwrap_or(PermissionStatus::Denied)
}

/// Synchronous permission check, mirroring the platform's self-check call.
pub trait PermissionService: Send + Sync {
    /// Returns the current grant status of one permission.
    fn status(&self, permission: Permission) -> PermissionStatus;
}

/// Fixed permission set for hosts whose grants never change mid-session.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissions {
    camera: PermissionStatus,
    fine_location: PermissionStatus,
}

impl StaticPermissions {
    /// Creates a service with fixed grant statuses.
    pub fn new(camera: PermissionStatus, fine_location: PermissionStatus) -> Self {
        Self {
            camera,
            fine_location,
        }
    }

    /// Creates a service with every permission granted.
    pub fn all_granted() -> Self {
        Self::new(PermissionStatus::Granted, PermissionStatus::Granted)
    }

    /// Creates a service with every permission denied.
    pub fn all_denied() -> Self {
        Self::new(PermissionStatus::Denied, PermissionStatus::Denied)
    }
}

impl PermissionService for StaticPermissions {
    fn status(&self, permission: Permission) -> PermissionStatus {
        match permission {
            Permission::Camera => self.camera,
            Permission::FineLocation => self.fine_location,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GrantTable {
    camera: PermissionStatus,
    fine_location: PermissionStatus,
}

/// Mutable permission set for hosts where prompt grants become visible to later
/// checks within the same session.
#[derive(Debug)]
pub struct ScriptedPermissions {
    grants: Mutex<GrantTable>,
}

impl ScriptedPermissions {
    /// Creates a service with every permission initially denied.
    pub fn denied() -> Self {
        Self {
            grants: Mutex::new(GrantTable {
                camera: PermissionStatus::Denied,
                fine_location: PermissionStatus::Denied,
            }),
        }
    }

    /// Creates a service with explicit initial statuses.
    pub fn new(camera: PermissionStatus, fine_location: PermissionStatus) -> Self {
        Self {
            grants: Mutex::new(GrantTable {
                camera,
                fine_location,
            }),
        }
    }

    /// Records a prompt outcome so later checks observe it.
    pub fn set_status(&self, permission: Permission, status: PermissionStatus) {
        let mut grants = self
            .grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match permission {
            Permission::Camera => grants.camera = status,
            Permission::FineLocation => grants.fine_location = status,
        }
    }
}

impl PermissionService for ScriptedPermissions {
    fn status(&self, permission: Permission) -> PermissionStatus {
        let grants = self
            .grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match permission {
            Permission::Camera => grants.camera,
            Permission::FineLocation => grants.fine_location,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for permission checks and prompt decisions.

    use super::*;

    #[test]
    fn static_permissions_answer_fixed_statuses() {
        let service = StaticPermissions::new(PermissionStatus::Granted, PermissionStatus::Denied);
        assert!(service.status(Permission::Camera).is_granted());
        assert!(!service.status(Permission::FineLocation).is_granted());
    }

    #[test]
    fn scripted_permissions_observe_prompt_grants() {
        let service = ScriptedPermissions::denied();
        assert!(!service.status(Permission::Camera).is_granted());

        service.set_status(Permission::Camera, PermissionStatus::Granted);
        assert!(service.status(Permission::Camera).is_granted());
    }

    #[test]
    fn missing_prompt_decisions_count_as_denied() {
        let decisions = [PermissionDecision {
            permission: Permission::Camera,
            status: PermissionStatus::Granted,
        }];

        assert!(decision_for(&decisions, Permission::Camera).is_granted());
        assert!(!decision_for(&decisions, Permission::FineLocation).is_granted());
    }
}
