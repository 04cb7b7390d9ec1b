//! Resolved caller identity passed explicitly into every workflow call.
//!
//! The session cookie stores only a user id; the identity resolver turns it
//! into this value once per request. Nothing in the domain reads ambient
//! authentication state.

use crate::domain::area::AreaId;
use crate::domain::permissions::{Capability, CapabilitySet};
use crate::domain::user::UserId;

/// Authenticated caller: who they are, where they act from, and what their
/// role lets them do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    user_id: UserId,
    home_area_id: AreaId,
    capabilities: CapabilitySet,
}

impl CallerIdentity {
    /// Bundle a resolved identity.
    pub fn new(user_id: UserId, home_area_id: AreaId, capabilities: CapabilitySet) -> Self {
        Self {
            user_id,
            home_area_id,
            capabilities,
        }
    }

    /// Authenticated user id.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Area the caller acts for.
    pub fn home_area_id(&self) -> AreaId {
        self.home_area_id
    }

    /// Capabilities granted by the caller's role.
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// True iff the caller's role grants `capability`.
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// True iff the caller's home area is `area`.
    #[must_use]
    pub fn acts_for(&self, area: AreaId) -> bool {
        self.home_area_id == area
    }
}
