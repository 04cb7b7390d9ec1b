//! Static contract checks for the directory and workflow migration SQL.

use backend::domain::PasswordHash;
use rstest::rstest;

const WORKFLOW_UP: &str =
    include_str!("../migrations/2026-07-28-000000_create_directory_and_workflow/up.sql");
const WORKFLOW_DOWN: &str =
    include_str!("../migrations/2026-07-28-000000_create_directory_and_workflow/down.sql");
const CATALOGUE_UP: &str =
    include_str!("../migrations/2026-08-04-000000_seed_directory_catalogue/up.sql");
const CATALOGUE_DOWN: &str =
    include_str!("../migrations/2026-08-04-000000_seed_directory_catalogue/down.sql");

#[rstest]
#[case("CREATE TABLE IF NOT EXISTS roles")]
#[case("CREATE TABLE IF NOT EXISTS areas")]
#[case("CREATE TABLE IF NOT EXISTS users")]
#[case("CREATE TABLE IF NOT EXISTS documents")]
#[case("CREATE TABLE IF NOT EXISTS derivations")]
#[case("CREATE TABLE IF NOT EXISTS audit_trail")]
fn creates_expected_tables(#[case] table_ddl: &str) {
    assert!(
        WORKFLOW_UP.contains(table_ddl),
        "expected migration to contain: {table_ddl}"
    );
}

#[rstest]
fn enforces_the_single_pending_derivation_rule() {
    // The partial unique index is the backstop for racing derive commits;
    // these literals must track the DDL exactly.
    assert!(WORKFLOW_UP.contains("CREATE UNIQUE INDEX IF NOT EXISTS idx_derivations_single_pending"));
    assert!(WORKFLOW_UP.contains("ON derivations (document_id) WHERE status = 'pending'"));
}

#[rstest]
#[case("CONSTRAINT users_username_unique UNIQUE (username)")]
#[case("CONSTRAINT users_username_lowercase CHECK (username = lower(username))")]
#[case("CONSTRAINT documents_code_unique UNIQUE (code)")]
#[case("CONSTRAINT documents_version_positive CHECK (version >= 1)")]
#[case("CONSTRAINT derivations_routes_between_distinct_areas")]
#[case("CONSTRAINT derivations_decision_complete")]
fn enforces_expected_constraints(#[case] constraint_ddl: &str) {
    assert!(
        WORKFLOW_UP.contains(constraint_ddl),
        "expected migration to contain: {constraint_ddl}"
    );
}

#[rstest]
fn versions_documents_for_optimistic_concurrency() {
    assert!(WORKFLOW_UP.contains("version BIGINT NOT NULL DEFAULT 1"));
}

#[rstest]
fn orders_the_audit_trail_by_surrogate_key() {
    assert!(WORKFLOW_UP.contains("id BIGSERIAL PRIMARY KEY"));
    assert!(WORKFLOW_UP.contains("ON audit_trail (document_id, id)"));
}

#[rstest]
#[case("DROP TABLE IF EXISTS audit_trail")]
#[case("DROP TABLE IF EXISTS derivations")]
#[case("DROP TABLE IF EXISTS documents")]
#[case("DROP TABLE IF EXISTS users")]
#[case("DROP TABLE IF EXISTS areas")]
#[case("DROP TABLE IF EXISTS roles")]
fn down_migration_drops_every_table(#[case] drop_statement: &str) {
    assert!(
        WORKFLOW_DOWN.contains(drop_statement),
        "expected down migration to contain: {drop_statement}"
    );
}

#[rstest]
fn down_migration_drops_children_before_parents() {
    let derivations = WORKFLOW_DOWN
        .find("DROP TABLE IF EXISTS derivations")
        .expect("derivations drop present");
    let documents = WORKFLOW_DOWN
        .find("DROP TABLE IF EXISTS documents")
        .expect("documents drop present");
    let users = WORKFLOW_DOWN
        .find("DROP TABLE IF EXISTS users")
        .expect("users drop present");
    let roles = WORKFLOW_DOWN
        .find("DROP TABLE IF EXISTS roles")
        .expect("roles drop present");

    assert!(derivations < documents);
    assert!(documents < users);
    assert!(users < roles);
}

#[rstest]
#[case("'Administrador', 90, 31")]
#[case("'Mesa de Partes', 10, 7")]
#[case("'Perito', 20, 14")]
#[case("'Auditor', 30, 8")]
fn seeds_the_role_catalogue_with_expected_bitmasks(#[case] role_row: &str) {
    assert!(
        CATALOGUE_UP.contains(role_row),
        "expected catalogue seed to contain: {role_row}"
    );
}

#[rstest]
#[case("'Mesa de Partes', 'MP', TRUE")]
#[case("'Toxicologia Forense', 'TOX', TRUE")]
#[case("'Quimica Legal', 'QUIM', TRUE")]
fn seeds_the_area_catalogue(#[case] area_row: &str) {
    assert!(
        CATALOGUE_UP.contains(area_row),
        "expected catalogue seed to contain: {area_row}"
    );
}

#[rstest]
fn catalogue_seed_is_idempotent() {
    assert!(CATALOGUE_UP.contains("ON CONFLICT (name) DO NOTHING"));
    assert!(CATALOGUE_UP.contains("ON CONFLICT (code) DO NOTHING"));
    assert!(CATALOGUE_UP.contains("ON CONFLICT (username) DO NOTHING"));
}

#[rstest]
fn seeded_administrator_credentials_use_the_stored_encoding() {
    let hash_line = CATALOGUE_UP
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("'v1$"))
        .expect("seed contains a stored password hash");
    let encoded = hash_line.trim_matches(|c| c == '\'' || c == ',');

    let hash = PasswordHash::from_encoded(encoded).expect("seeded hash parses");
    assert!(hash.verify("cambiar.al.ingresar"));
}

#[rstest]
fn catalogue_down_migration_removes_the_seeds() {
    assert!(CATALOGUE_DOWN.contains("DELETE FROM users WHERE username = 'administrador'"));
    assert!(CATALOGUE_DOWN.contains("DELETE FROM areas"));
    assert!(CATALOGUE_DOWN.contains("DELETE FROM roles"));
}
