//! Offline sync: subject tests → segmenter → local cache.

use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use examarchive_client::ArchiveClient;
use examarchive_shared::{Result, Test, TestQuery};
use examarchive_storage::Storage;

/// Page size used when walking `/tests/find`.
pub const PAGE_SIZE: u32 = TestQuery::MAX_LIMIT;

/// Outcome of one subject sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncResult {
    pub subject_code: String,
    /// Tests written to the cache.
    pub cached: usize,
    /// Questions found across the cached tests.
    pub questions: usize,
    /// Cached tests in which no numbered question was found.
    pub unsegmented: usize,
    /// Tests the server returned without an id.
    pub skipped: usize,
    pub elapsed: Duration,
}

/// Progress callback for reporting sync status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each test is written to the cache.
    fn test_cached(&self, test: &Test, questions: usize, current: usize, total: usize);
    /// Called when the sync completes.
    fn done(&self, result: &SyncResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn test_cached(&self, _test: &Test, _questions: usize, _current: usize, _total: usize) {}
    fn done(&self, _result: &SyncResult) {}
}

/// Fetch every test of a subject, page by page.
#[instrument(skip(client))]
pub async fn fetch_subject_tests(client: &ArchiveClient, subject_code: &str) -> Result<Vec<Test>> {
    let mut query = TestQuery {
        limit: PAGE_SIZE,
        ..TestQuery::for_subject(subject_code)
    };
    let mut tests = Vec::new();

    loop {
        let page = client.find_tests(&query).await?;
        let len = page.len();
        tests.extend(page);
        if len < PAGE_SIZE as usize {
            break;
        }
        query.skip += PAGE_SIZE;
    }

    info!(count = tests.len(), "subject tests fetched");
    Ok(tests)
}

/// Download a subject's tests and store them, with question counts, in the
/// offline cache.
#[instrument(skip_all, fields(subject = %subject_code))]
pub async fn sync_subject(
    client: &ArchiveClient,
    storage: &Storage,
    subject_code: &str,
    progress: &dyn ProgressReporter,
) -> Result<SyncResult> {
    let start = Instant::now();

    progress.phase("Fetching tests");
    let tests = fetch_subject_tests(client, subject_code).await?;

    progress.phase("Segmenting and caching");
    let total = tests.len();
    let mut result = SyncResult {
        subject_code: subject_code.to_string(),
        cached: 0,
        questions: 0,
        unsegmented: 0,
        skipped: 0,
        elapsed: Duration::ZERO,
    };

    for test in &tests {
        if test.id.as_deref().is_none_or(str::is_empty) {
            warn!(exam_period = %test.exam_period, "test without id, skipping");
            result.skipped += 1;
            continue;
        }

        let questions = examarchive_segmenter::segment(&test.full_text).len();
        let count = u32::try_from(questions).unwrap_or(u32::MAX);
        storage.upsert_test(test, count).await?;

        result.cached += 1;
        result.questions += questions;
        if questions == 0 {
            result.unsegmented += 1;
        }
        progress.test_cached(test, questions, result.cached, total);
    }

    result.elapsed = start.elapsed();
    progress.done(&result);

    info!(
        cached = result.cached,
        questions = result.questions,
        unsegmented = result.unsegmented,
        skipped = result.skipped,
        elapsed_ms = result.elapsed.as_millis(),
        "sync complete"
    );
    Ok(result)
}
