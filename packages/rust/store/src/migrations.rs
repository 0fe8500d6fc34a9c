//! SQL migration definitions for the pathscout cache database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as a batch.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: cache_entries",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Category-scoped key→record cache. Entries are written once per distinct
-- key and never deleted by pathscout itself.
CREATE TABLE IF NOT EXISTS cache_entries (
    category    TEXT NOT NULL,
    key_hash    TEXT NOT NULL,
    record_json TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    PRIMARY KEY (category, key_hash)
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_category ON cache_entries(category);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
