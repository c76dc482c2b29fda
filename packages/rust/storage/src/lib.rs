//! Turso Embedded / libSQL storage layer (offline mode).
//!
//! The [`Storage`] struct wraps a libSQL database holding the login session
//! and an offline cache of archived tests with full-text search.
//!
//! **Access rules:**
//! - CLI commands that log in or sync: read-write via [`Storage::open`]
//! - TUI and read-only lookups: [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use examarchive_shared::{ExamArchiveError, Result, Test, User};
use libsql::{Connection, Database, Row, params};
use tracing::{debug, info};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// Login state persisted between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    /// API the token was issued by.
    pub base_url: String,
    pub token: String,
    pub user: Option<User>,
    pub saved_at: DateTime<Utc>,
}

/// A test as held in the offline cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTest {
    pub test: Test,
    /// Questions found by the segmenter when the test was cached.
    pub question_count: u32,
    pub cached_at: DateTime<Utc>,
}

/// A search result from FTS5.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub test_id: String,
    pub subject_code: String,
    pub exam_period: String,
    pub academic_year: String,
    /// Matching excerpt with hits wrapped in `[` `]`.
    pub snippet: String,
    /// FTS5 rank score (lower is better).
    pub score: f64,
}

const TEST_COLUMNS: &str = "id, subject_code, exam_period, academic_year, test_type, full_text, \
     file_extension, question_count, cached_at";

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ExamArchiveError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ExamArchiveError::Storage(format!(
                "no database at {}; run `examarchive cache sync` or `examarchive login` first",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ExamArchiveError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(ExamArchiveError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Persist the login session, replacing any previous one.
    pub async fn save_session(
        &self,
        base_url: &str,
        token: &str,
        user: Option<&User>,
    ) -> Result<()> {
        self.check_writable()?;
        let user_json = user
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ExamArchiveError::parse(format!("failed to encode user: {e}")))?;
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO session (id, base_url, token, user_json, saved_at)
                 VALUES (1, ?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                   base_url = excluded.base_url,
                   token = excluded.token,
                   user_json = excluded.user_json,
                   saved_at = excluded.saved_at",
                params![base_url, token, user_json.as_deref(), now.as_str()],
            )
            .await
            .map_err(storage_err)?;
        debug!(base_url, "session saved");
        Ok(())
    }

    /// The stored session, if someone is logged in.
    pub async fn load_session(&self) -> Result<Option<StoredSession>> {
        let mut rows = self
            .conn
            .query(
                "SELECT base_url, token, user_json, saved_at FROM session WHERE id = 1",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let Some(row) = rows.next().await.map_err(storage_err)? else {
            return Ok(None);
        };

        let user = match row.get::<Option<String>>(2).map_err(storage_err)? {
            Some(json) => Some(serde_json::from_str(&json).map_err(|e| {
                ExamArchiveError::parse(format!("stored user is corrupt: {e}"))
            })?),
            None => None,
        };

        Ok(Some(StoredSession {
            base_url: row.get::<String>(0).map_err(storage_err)?,
            token: row.get::<String>(1).map_err(storage_err)?,
            user,
            saved_at: parse_timestamp(&row.get::<String>(3).map_err(storage_err)?)?,
        }))
    }

    /// Forget the login session. Returns whether one existed.
    pub async fn clear_session(&self) -> Result<bool> {
        self.check_writable()?;
        let removed = self
            .conn
            .execute("DELETE FROM session", params![])
            .await
            .map_err(storage_err)?;
        Ok(removed > 0)
    }

    // -----------------------------------------------------------------------
    // Test cache
    // -----------------------------------------------------------------------

    /// Insert or refresh a cached test. Tests without an id cannot be cached.
    pub async fn upsert_test(&self, test: &Test, question_count: u32) -> Result<()> {
        self.check_writable()?;
        let Some(id) = test.id.as_deref().filter(|id| !id.is_empty()) else {
            return Err(ExamArchiveError::validation(
                "cannot cache a test without an id",
            ));
        };
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO tests (id, subject_code, exam_period, academic_year, test_type,
                                    full_text, file_extension, question_count, cached_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                   subject_code = excluded.subject_code,
                   exam_period = excluded.exam_period,
                   academic_year = excluded.academic_year,
                   test_type = excluded.test_type,
                   full_text = excluded.full_text,
                   file_extension = excluded.file_extension,
                   question_count = excluded.question_count,
                   cached_at = excluded.cached_at",
                params![
                    id,
                    test.subject_code.as_str(),
                    test.exam_period.as_str(),
                    test.academic_year.as_str(),
                    test.test_type.as_str(),
                    test.full_text.as_str(),
                    test.file_extension.as_deref(),
                    i64::from(question_count),
                    now.as_str(),
                ],
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    pub async fn get_test(&self, id: &str) -> Result<Option<CachedTest>> {
        let sql = format!("SELECT {TEST_COLUMNS} FROM tests WHERE id = ?1");
        let mut rows = self
            .conn
            .query(&sql, params![id])
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_cached_test(&row)?)),
            None => Ok(None),
        }
    }

    /// Cached tests, newest academic year first, optionally for one subject.
    pub async fn list_cached_tests(&self, subject_code: Option<&str>) -> Result<Vec<CachedTest>> {
        let sql = format!(
            "SELECT {TEST_COLUMNS} FROM tests
             WHERE ?1 IS NULL OR subject_code = ?1
             ORDER BY academic_year DESC, exam_period, id"
        );
        let mut rows = self
            .conn
            .query(&sql, params![subject_code])
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_cached_test(&row)?);
        }
        Ok(results)
    }

    /// Remove one cached test. Returns whether it was present.
    pub async fn delete_cached_test(&self, id: &str) -> Result<bool> {
        self.check_writable()?;
        let removed = self
            .conn
            .execute("DELETE FROM tests WHERE id = ?1", params![id])
            .await
            .map_err(storage_err)?;
        Ok(removed > 0)
    }

    /// Drop cached tests (all, or one subject's). Returns how many were removed.
    pub async fn clear_cache(&self, subject_code: Option<&str>) -> Result<u64> {
        self.check_writable()?;
        let removed = self
            .conn
            .execute(
                "DELETE FROM tests WHERE ?1 IS NULL OR subject_code = ?1",
                params![subject_code],
            )
            .await
            .map_err(storage_err)?;
        info!(removed, subject = subject_code.unwrap_or("*"), "cache cleared");
        Ok(removed)
    }

    pub async fn count_cached(&self, subject_code: Option<&str>) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM tests WHERE ?1 IS NULL OR subject_code = ?1",
                params![subject_code],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(non_negative(row.get::<i64>(0).map_err(storage_err)?)),
            None => Ok(0),
        }
    }

    /// Subject codes present in the cache with their test counts.
    pub async fn cached_subjects(&self) -> Result<Vec<(String, u64)>> {
        let mut rows = self
            .conn
            .query(
                "SELECT subject_code, COUNT(*) FROM tests
                 GROUP BY subject_code ORDER BY subject_code",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push((
                row.get::<String>(0).map_err(storage_err)?,
                non_negative(row.get::<i64>(1).map_err(storage_err)?),
            ));
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // FTS search
    // -----------------------------------------------------------------------

    /// Full-text search over cached test text, exam period, and subject code.
    ///
    /// Every whitespace-separated word of `query` must match; FTS5 operators
    /// in the input are treated as plain text.
    pub async fn search_cached(
        &self,
        query: &str,
        subject_code: Option<&str>,
        limit: u32,
    ) -> Result<Vec<SearchHit>> {
        let Some(fts) = fts_query(query) else {
            return Err(ExamArchiveError::validation("search query must not be empty"));
        };

        let mut rows = self
            .conn
            .query(
                "SELECT t.id, t.subject_code, t.exam_period, t.academic_year,
                        snippet(tests_fts, 0, '[', ']', '...', 12), rank
                 FROM tests_fts fts
                 JOIN tests t ON t.rowid = fts.rowid
                 WHERE tests_fts MATCH ?1 AND (?2 IS NULL OR t.subject_code = ?2)
                 ORDER BY rank
                 LIMIT ?3",
                params![fts.as_str(), subject_code, limit],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(SearchHit {
                test_id: row.get::<String>(0).map_err(storage_err)?,
                subject_code: row.get::<String>(1).map_err(storage_err)?,
                exam_period: row.get::<String>(2).map_err(storage_err)?,
                academic_year: row.get::<String>(3).map_err(storage_err)?,
                snippet: row.get::<String>(4).unwrap_or_default(),
                score: row.get::<f64>(5).unwrap_or(0.0),
            });
        }
        debug!(query, hits = results.len(), "cache search");
        Ok(results)
    }
}

fn storage_err(e: libsql::Error) -> ExamArchiveError {
    ExamArchiveError::Storage(e.to_string())
}

fn non_negative(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ExamArchiveError::Storage(format!("invalid date '{s}': {e}")))
}

/// Quote each word so user input never reaches the FTS5 query syntax.
fn fts_query(input: &str) -> Option<String> {
    let terms: Vec<String> = input
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" "))
}

/// Convert a database row (selected with [`TEST_COLUMNS`]) to a [`CachedTest`].
fn row_to_cached_test(row: &Row) -> Result<CachedTest> {
    Ok(CachedTest {
        test: Test {
            id: Some(row.get::<String>(0).map_err(storage_err)?),
            subject_code: row.get::<String>(1).map_err(storage_err)?,
            exam_period: row.get::<String>(2).map_err(storage_err)?,
            academic_year: row.get::<String>(3).map_err(storage_err)?,
            test_type: row.get::<String>(4).map_err(storage_err)?,
            full_text: row.get::<String>(5).map_err(storage_err)?,
            file_extension: row.get::<Option<String>>(6).map_err(storage_err)?,
        },
        question_count: row.get::<u32>(7).unwrap_or(0),
        cached_at: parse_timestamp(&row.get::<String>(8).map_err(storage_err)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("ea_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn sample_test(id: &str, subject: &str, period: &str, text: &str) -> Test {
        Test {
            id: Some(id.into()),
            subject_code: subject.into(),
            exam_period: period.into(),
            academic_year: "2023/2024".into(),
            test_type: "regular".into(),
            full_text: text.into(),
            file_extension: Some("pdf".into()),
        }
    }

    fn sample_user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "ana@uns.ac.rs",
            "is_admin": false,
            "is_active": true,
            "created_at": "2024-10-01T09:00:00Z"
        }))
        .expect("user json")
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("ea_test_{}.db", Uuid::now_v7()));
        let first = Storage::open(&tmp).await.expect("first open");
        drop(first);
        let second = Storage::open(&tmp).await.expect("second open");
        assert_eq!(second.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn session_roundtrip_and_replace() {
        let storage = test_storage().await;
        assert!(storage.load_session().await.unwrap().is_none());

        storage
            .save_session("http://127.0.0.1:1739", "tok-1", None)
            .await
            .expect("save");
        let user = sample_user();
        storage
            .save_session("http://127.0.0.1:1739", "tok-2", Some(&user))
            .await
            .expect("replace");

        let session = storage.load_session().await.unwrap().expect("session");
        assert_eq!(session.token, "tok-2");
        assert_eq!(session.user.as_ref().map(|u| u.email.as_str()), Some("ana@uns.ac.rs"));

        assert!(storage.clear_session().await.unwrap());
        assert!(storage.load_session().await.unwrap().is_none());
        assert!(!storage.clear_session().await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_and_query() {
        let storage = test_storage().await;
        let test = sample_test("t1", "OS", "Januarski 2024", "1. (5p) Explain paging.");
        storage.upsert_test(&test, 1).await.expect("insert");

        let cached = storage.get_test("t1").await.unwrap().expect("cached");
        assert_eq!(cached.test, test);
        assert_eq!(cached.question_count, 1);

        let updated = Test {
            full_text: "1. (5p) Explain segmentation.\n2. (5p) Explain TLB.".into(),
            ..test
        };
        storage.upsert_test(&updated, 2).await.expect("update");
        let cached = storage.get_test("t1").await.unwrap().expect("cached");
        assert!(cached.test.full_text.contains("segmentation"));
        assert_eq!(cached.question_count, 2);
        assert_eq!(storage.count_cached(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_without_id_is_rejected() {
        let storage = test_storage().await;
        let mut test = sample_test("x", "OS", "Jun", "text");
        test.id = None;
        let err = storage.upsert_test(&test, 0).await.unwrap_err();
        assert!(matches!(err, ExamArchiveError::Validation { .. }));
    }

    #[tokio::test]
    async fn list_count_and_clear_by_subject() {
        let storage = test_storage().await;
        storage.upsert_test(&sample_test("a", "OS", "Jan", "x"), 0).await.unwrap();
        storage.upsert_test(&sample_test("b", "OS", "Jun", "y"), 0).await.unwrap();
        storage.upsert_test(&sample_test("c", "BP", "Jan", "z"), 0).await.unwrap();

        assert_eq!(storage.list_cached_tests(Some("OS")).await.unwrap().len(), 2);
        assert_eq!(storage.list_cached_tests(None).await.unwrap().len(), 3);
        assert_eq!(storage.count_cached(Some("BP")).await.unwrap(), 1);
        assert_eq!(
            storage.cached_subjects().await.unwrap(),
            vec![("BP".to_string(), 1), ("OS".to_string(), 2)]
        );

        assert!(storage.delete_cached_test("c").await.unwrap());
        assert!(!storage.delete_cached_test("c").await.unwrap());
        assert_eq!(storage.clear_cache(Some("OS")).await.unwrap(), 2);
        assert_eq!(storage.count_cached(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fts_search() {
        let storage = test_storage().await;
        for (id, subject, text) in [
            ("t1", "OS", "1. (5p) Explain virtual memory and paging."),
            ("t2", "OS", "1. (5p) Describe the process scheduler."),
            ("t3", "BP", "1. (4p) Normalize the relation to 3NF."),
        ] {
            storage
                .upsert_test(&sample_test(id, subject, "Januarski 2024", text), 1)
                .await
                .unwrap();
        }

        let hits = storage.search_cached("paging", None, 10).await.expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].test_id, "t1");
        assert!(hits[0].snippet.contains("[paging]"));

        let hits = storage.search_cached("Januarski", Some("BP"), 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].subject_code, "BP");

        // FTS syntax in user input is quoted, not interpreted.
        let hits = storage.search_cached("scheduler\" OR \"x", None, 10).await.unwrap();
        assert!(hits.is_empty());

        assert!(storage.search_cached("   ", None, 10).await.is_err());
    }

    #[tokio::test]
    async fn fts_follows_updates_and_deletes() {
        let storage = test_storage().await;
        storage
            .upsert_test(&sample_test("t1", "OS", "Jan", "deadlock detection"), 1)
            .await
            .unwrap();
        storage
            .upsert_test(&sample_test("t1", "OS", "Jan", "semaphores"), 1)
            .await
            .unwrap();

        assert!(storage.search_cached("deadlock", None, 10).await.unwrap().is_empty());
        assert_eq!(storage.search_cached("semaphores", None, 10).await.unwrap().len(), 1);

        storage.delete_cached_test("t1").await.unwrap();
        assert!(storage.search_cached("semaphores", None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("ea_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.upsert_test(&sample_test("t1", "OS", "Jan", "x"), 0)
            .await
            .unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert_eq!(ro.count_cached(None).await.unwrap(), 1);
        let result = ro.save_session("http://x", "t", None).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn readonly_requires_existing_file() {
        let tmp = std::env::temp_dir().join(format!("ea_missing_{}.db", Uuid::now_v7()));
        assert!(Storage::open_readonly(&tmp).await.is_err());
    }

    #[test]
    fn fts_query_quotes_terms() {
        assert_eq!(fts_query("virtual memory").as_deref(), Some("\"virtual\" \"memory\""));
        assert_eq!(fts_query("a\"b").as_deref(), Some("\"a\"\"b\""));
        assert_eq!(fts_query(" \t "), None);
    }
}
