//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{areas, audit_trail, derivations, documents, roles, users};

// ---------------------------------------------------------------------------
// Directory models
// ---------------------------------------------------------------------------

/// Row struct for reading from the roles table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RoleRow {
    pub id: Uuid,
    pub name: String,
    pub access_level: i16,
    pub capabilities: i64,
}

/// Row struct for reading from the areas table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = areas)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AreaRow {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub grade: Option<String>,
    pub role_id: Uuid,
    pub home_area_id: Uuid,
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for provisioning new user accounts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub full_name: &'a str,
    pub grade: Option<&'a str>,
    pub role_id: Uuid,
    pub home_area_id: Uuid,
    pub password_hash: &'a str,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for replacing a user's stored profile.
///
/// The password column is deliberately absent so profile updates can never
/// clobber stored credentials. `treat_none_as_null` makes a cleared grade
/// overwrite the stored one instead of being skipped.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserProfileUpdate<'a> {
    pub full_name: &'a str,
    pub grade: Option<&'a str>,
    pub role_id: Uuid,
    pub home_area_id: Uuid,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Document models
// ---------------------------------------------------------------------------

/// Row struct for reading from the documents table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DocumentRow {
    pub id: Uuid,
    pub code: String,
    pub kind: String,
    pub subject: String,
    pub status: String,
    pub origin_area_id: Uuid,
    pub current_area_id: Uuid,
    pub registered_by: Uuid,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// Insertable struct for registering new documents.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = documents)]
pub(crate) struct NewDocumentRow<'a> {
    pub id: Uuid,
    pub code: &'a str,
    pub kind: &'a str,
    pub subject: &'a str,
    pub status: &'a str,
    pub origin_area_id: Uuid,
    pub current_area_id: Uuid,
    pub registered_by: Uuid,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// Changeset struct applying one committed transition to a document.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = documents)]
pub(crate) struct DocumentTransitionUpdate<'a> {
    pub status: &'a str,
    pub current_area_id: Uuid,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

// ---------------------------------------------------------------------------
// Derivation models
// ---------------------------------------------------------------------------

/// Row struct for reading from the derivations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = derivations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DerivationRow {
    pub id: Uuid,
    pub document_id: Uuid,
    pub source_area_id: Uuid,
    pub destination_area_id: Uuid,
    pub requested_by: Uuid,
    pub requested_at: DateTime<Utc>,
    pub status: String,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_reason: Option<String>,
}

/// Insertable struct for opening new derivations.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = derivations)]
pub(crate) struct NewDerivationRow<'a> {
    pub id: Uuid,
    pub document_id: Uuid,
    pub source_area_id: Uuid,
    pub destination_area_id: Uuid,
    pub requested_by: Uuid,
    pub requested_at: DateTime<Utc>,
    pub status: &'a str,
}

/// Changeset struct recording a derivation decision.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = derivations)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct DerivationDecisionUpdate<'a> {
    pub status: &'a str,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_reason: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Audit trail models
// ---------------------------------------------------------------------------

/// Row struct for reading from the audit_trail table.
///
/// The surrogate `id` column is deliberately not selected; it only backs
/// the commit ordering of the trail.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = audit_trail)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AuditEntryRow {
    pub document_id: Uuid,
    pub actor: Uuid,
    pub action: String,
    pub from_status: Option<String>,
    pub to_status: String,
    pub source_area_id: Option<Uuid>,
    pub destination_area_id: Option<Uuid>,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Insertable struct for appending audit entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_trail)]
pub(crate) struct NewAuditEntryRow<'a> {
    pub document_id: Uuid,
    pub actor: Uuid,
    pub action: &'a str,
    pub from_status: Option<&'a str>,
    pub to_status: &'a str,
    pub source_area_id: Option<Uuid>,
    pub destination_area_id: Option<Uuid>,
    pub note: Option<&'a str>,
    pub recorded_at: DateTime<Utc>,
}
