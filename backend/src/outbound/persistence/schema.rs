//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation. When a migration changes the schema, update this file to
//! match; `diesel print-schema` can regenerate it from a live database.

diesel::table! {
    /// Role catalogue.
    ///
    /// Roles bundle a capability bitmask at an ordinal access level. The
    /// catalogue is seeded by migrations, not mutated at runtime.
    roles (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique display name.
        name -> Varchar,
        /// Ordinal used to sort roles from least to most privileged.
        access_level -> Int2,
        /// Packed capability bitmask.
        capabilities -> Int8,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Organisational areas able to hold and route documents.
    areas (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Display name.
        name -> Varchar,
        /// Unique short routing code, uppercase.
        code -> Varchar,
        /// Whether the area currently accepts documents.
        active -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// User accounts with their stored password digests.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique lowercase login name.
        username -> Varchar,
        /// Display name.
        full_name -> Varchar,
        /// Optional professional grade shown alongside the name.
        grade -> Nullable<Varchar>,
        /// Role granting the account its capabilities.
        role_id -> Uuid,
        /// Area the account acts for.
        home_area_id -> Uuid,
        /// Salted password digest in its stored encoding.
        password_hash -> Varchar,
        /// Accounts are deactivated, never deleted.
        active -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Documents tracked by the derivation workflow.
    documents (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique institutional code, uppercase.
        code -> Varchar,
        /// Document kind name.
        kind -> Varchar,
        /// Subject line.
        subject -> Varchar,
        /// Lifecycle status name.
        status -> Varchar,
        /// Area the document was registered at.
        origin_area_id -> Uuid,
        /// Area currently holding the document.
        current_area_id -> Uuid,
        /// Account that registered the document.
        registered_by -> Uuid,
        /// Registration timestamp.
        registered_at -> Timestamptz,
        /// Timestamp of the latest committed transition.
        updated_at -> Timestamptz,
        /// Optimistic concurrency version, incremented per commit.
        version -> Int8,
    }
}

diesel::table! {
    /// Routing requests moving documents between areas.
    ///
    /// A partial unique index allows at most one `pending` row per
    /// document.
    derivations (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Document the derivation belongs to.
        document_id -> Uuid,
        /// Area holding the document when the derivation was requested.
        source_area_id -> Uuid,
        /// Area the derivation targets.
        destination_area_id -> Uuid,
        /// Account that requested the derivation.
        requested_by -> Uuid,
        /// Request timestamp.
        requested_at -> Timestamptz,
        /// Decision status name.
        status -> Varchar,
        /// Account that decided the derivation, once decided.
        decided_by -> Nullable<Uuid>,
        /// Decision timestamp, once decided.
        decided_at -> Nullable<Timestamptz>,
        /// Reason attached to a rejection.
        decision_reason -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Append-only record of committed workflow transitions.
    audit_trail (id) {
        /// Surrogate key preserving commit order.
        id -> Int8,
        /// Document the entry belongs to.
        document_id -> Uuid,
        /// Account that performed the transition.
        actor -> Uuid,
        /// Workflow action name.
        action -> Varchar,
        /// Status before the transition, absent for registration.
        from_status -> Nullable<Varchar>,
        /// Status after the transition.
        to_status -> Varchar,
        /// Source area recorded for routing actions.
        source_area_id -> Nullable<Uuid>,
        /// Destination area recorded for routing actions.
        destination_area_id -> Nullable<Uuid>,
        /// Free-text note, present on rejections.
        note -> Nullable<Varchar>,
        /// Commit timestamp.
        recorded_at -> Timestamptz,
    }
}

diesel::joinable!(derivations -> documents (document_id));
diesel::joinable!(audit_trail -> documents (document_id));
diesel::joinable!(users -> roles (role_id));
diesel::joinable!(users -> areas (home_area_id));

diesel::allow_tables_to_appear_in_same_query!(
    areas,
    audit_trail,
    derivations,
    documents,
    roles,
    users,
);
