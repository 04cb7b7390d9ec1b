//! Capability model backing role-based permission checks.
//!
//! Roles persist their grants as a single integer bitmask. Inside the domain
//! the mask is wrapped in a [`CapabilitySet`] and queried through named
//! [`Capability`] values; raw bits only appear at the persistence and wire
//! boundaries, where [`CapabilitySet::bits`] and [`CapabilitySet::from_bits`]
//! convert without losing unrecognised bits.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single named capability a role may grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Register new documents at an intake area.
    CreateDocuments,
    /// Review, close, and reject documents held by the caller's area.
    EditDocuments,
    /// Route documents to another area.
    DeriveDocuments,
    /// Read a document's append-only audit trail.
    ReadAuditTrail,
    /// Administer users, roles, and areas.
    ManageDirectory,
}

impl Capability {
    /// Every named capability in ascending bit order.
    pub const ALL: [Capability; 5] = [
        Capability::CreateDocuments,
        Capability::EditDocuments,
        Capability::DeriveDocuments,
        Capability::ReadAuditTrail,
        Capability::ManageDirectory,
    ];

    /// The disjoint power-of-two bit representing this capability in the
    /// packed form.
    #[must_use]
    pub const fn bit(self) -> i64 {
        match self {
            Self::CreateDocuments => 1 << 0,
            Self::EditDocuments => 1 << 1,
            Self::DeriveDocuments => 1 << 2,
            Self::ReadAuditTrail => 1 << 3,
            Self::ManageDirectory => 1 << 4,
        }
    }

    /// Stable machine-readable name used in API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateDocuments => "create_documents",
            Self::EditDocuments => "edit_documents",
            Self::DeriveDocuments => "derive_documents",
            Self::ReadAuditTrail => "read_audit_trail",
            Self::ManageDirectory => "manage_directory",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of capabilities packed as an integer bitmask.
///
/// Membership follows the mask rule: a capability is present iff all of its
/// bits are set. Bits with no named counterpart are carried through
/// untouched, so a stored mask round-trips byte for byte.
///
/// # Examples
/// ```
/// use backend::domain::{Capability, CapabilitySet};
///
/// let set = CapabilitySet::from_iter([Capability::CreateDocuments]);
/// assert!(set.contains(Capability::CreateDocuments));
/// assert!(!set.contains(Capability::EditDocuments));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(i64);

impl CapabilitySet {
    /// The set granting nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wrap a raw persisted bitmask.
    #[must_use]
    pub const fn from_bits(bits: i64) -> Self {
        Self(bits)
    }

    /// Wrap a nullable persisted bitmask; an absent mask grants nothing.
    #[must_use]
    pub const fn from_stored(bits: Option<i64>) -> Self {
        match bits {
            Some(bits) => Self(bits),
            None => Self(0),
        }
    }

    /// The packed representation for storage or transport.
    #[must_use]
    pub const fn bits(self) -> i64 {
        self.0
    }

    /// True when the set grants nothing.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True iff every bit of `capability` is present.
    #[must_use]
    pub const fn contains(self, capability: Capability) -> bool {
        let bit = capability.bit();
        (self.0 & bit) == bit
    }

    /// True iff at least one of `capabilities` is present.
    #[must_use]
    pub fn contains_any(self, capabilities: &[Capability]) -> bool {
        capabilities.iter().any(|&capability| self.contains(capability))
    }

    /// True iff every one of `capabilities` is present.
    #[must_use]
    pub fn contains_all(self, capabilities: &[Capability]) -> bool {
        capabilities.iter().all(|&capability| self.contains(capability))
    }

    /// Copy of the set with `capability` granted.
    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    /// Copy of the set with `capability` withdrawn.
    #[must_use]
    pub const fn without(self, capability: Capability) -> Self {
        Self(self.0 & !capability.bit())
    }

    /// Named capabilities present in the set, in bit order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |&capability| self.contains(capability))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl From<Capability> for CapabilitySet {
    fn from(capability: Capability) -> Self {
        Self::empty().with(capability)
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for capability in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(capability.as_str())?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}
