//! SQL migration definitions for the local archive database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: session, tests cache, FTS5",
            sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Login state; at most one row
CREATE TABLE IF NOT EXISTS session (
    id        INTEGER PRIMARY KEY CHECK (id = 1),
    base_url  TEXT NOT NULL,
    token     TEXT NOT NULL,
    user_json TEXT,
    saved_at  TEXT NOT NULL
);

-- Offline copy of archived tests
CREATE TABLE IF NOT EXISTS tests (
    id             TEXT PRIMARY KEY,
    subject_code   TEXT NOT NULL,
    exam_period    TEXT NOT NULL,
    academic_year  TEXT NOT NULL,
    test_type      TEXT NOT NULL,
    full_text      TEXT NOT NULL,
    file_extension TEXT,
    cached_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tests_subject ON tests(subject_code);

CREATE VIRTUAL TABLE IF NOT EXISTS tests_fts USING fts5(
    full_text,
    exam_period,
    subject_code,
    content=tests,
    content_rowid=rowid
);

CREATE TRIGGER IF NOT EXISTS tests_fts_insert AFTER INSERT ON tests BEGIN
    INSERT INTO tests_fts(rowid, full_text, exam_period, subject_code)
    VALUES (new.rowid, new.full_text, new.exam_period, new.subject_code);
END;

CREATE TRIGGER IF NOT EXISTS tests_fts_delete AFTER DELETE ON tests BEGIN
    INSERT INTO tests_fts(tests_fts, rowid, full_text, exam_period, subject_code)
    VALUES ('delete', old.rowid, old.full_text, old.exam_period, old.subject_code);
END;

CREATE TRIGGER IF NOT EXISTS tests_fts_update AFTER UPDATE ON tests BEGIN
    INSERT INTO tests_fts(tests_fts, rowid, full_text, exam_period, subject_code)
    VALUES ('delete', old.rowid, old.full_text, old.exam_period, old.subject_code);
    INSERT INTO tests_fts(rowid, full_text, exam_period, subject_code)
    VALUES (new.rowid, new.full_text, new.exam_period, new.subject_code);
END;

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Segmented question count per cached test",
            sql: r#"
ALTER TABLE tests ADD COLUMN question_count INTEGER NOT NULL DEFAULT 0;

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
