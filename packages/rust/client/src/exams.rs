//! Archived test endpoints: search, upload, file download, and the server's
//! question frequency analysis.

use reqwest::Method;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::{debug, info, instrument};

use examarchive_shared::{ExamArchiveError, QuestionAnalysis, Result, Test, TestQuery, TestType};

use crate::{ArchiveClient, send};

/// Server-side cap for `GET /tests/all`.
pub const MAX_ALL_LIMIT: u32 = 500;

/// A scanned paper ready to be posted to `POST /tests/`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub subject_code: String,
    pub exam_period: String,
    pub academic_year: String,
    pub test_type: TestType,
    /// File name sent with the multipart part; the server keys the allowed
    /// formats off its extension.
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Original upload as served by `GET /tests/{id}/file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// From `Content-Disposition`, when the server sent one.
    pub file_name: Option<String>,
}

#[derive(Serialize)]
struct Page {
    skip: u32,
    limit: u32,
}

#[derive(Serialize)]
struct AnalyzeParams {
    similarity_threshold: f64,
}

impl ArchiveClient {
    /// Search tests by metadata and content.
    #[instrument(skip(self))]
    pub async fn find_tests(&self, query: &TestQuery) -> Result<Vec<Test>> {
        query.validate()?;
        let tests: Vec<Test> = self
            .send_json(self.request(Method::GET, &["tests", "find"]).query(query))
            .await?;
        debug!(count = tests.len(), "tests found");
        Ok(tests)
    }

    /// Every test, newest first.
    pub async fn all_tests(&self, skip: u32, limit: u32) -> Result<Vec<Test>> {
        if !(1..=MAX_ALL_LIMIT).contains(&limit) {
            return Err(ExamArchiveError::validation(format!(
                "limit must be between 1 and {MAX_ALL_LIMIT}, got {limit}"
            )));
        }
        self.send_json(
            self.request(Method::GET, &["tests", "all"])
                .query(&Page { skip, limit }),
        )
        .await
    }

    /// Upload a scanned paper. The server extracts the text and returns the
    /// stored test.
    #[instrument(skip_all, fields(subject = %upload.subject_code, file = %upload.file_name))]
    pub async fn upload_test(&self, upload: UploadRequest) -> Result<Test> {
        let size = upload.bytes.len();
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|e| {
                ExamArchiveError::validation(format!(
                    "invalid content type '{}': {e}",
                    upload.content_type
                ))
            })?;

        let form = Form::new()
            .text("subject_code", upload.subject_code)
            .text("exam_period", upload.exam_period)
            .text("academic_year", upload.academic_year)
            .text("test_type", upload.test_type.as_str())
            .part("file", part);

        let test: Test = self
            .send_json(self.request(Method::POST, &["tests", ""]).multipart(form))
            .await?;
        info!(id = test.id_str(), bytes = size, "test uploaded");
        Ok(test)
    }

    #[instrument(skip(self))]
    pub async fn delete_test(&self, id: &str) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, &["tests", id]))
            .await?;
        info!("test deleted");
        Ok(())
    }

    /// Download the originally uploaded file.
    #[instrument(skip(self))]
    pub async fn download_test_file(&self, id: &str) -> Result<TestFile> {
        let response = send(self.request(Method::GET, &["tests", id, "file"])).await?;
        let headers = response.headers();

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExamArchiveError::Network(format!("failed to read test file: {e}")))?
            .to_vec();

        debug!(bytes = bytes.len(), %content_type, "test file downloaded");
        Ok(TestFile {
            bytes,
            content_type,
            file_name,
        })
    }

    /// Ask the server to group a subject's questions by similarity.
    #[instrument(skip(self))]
    pub async fn analyze_subject(
        &self,
        subject_code: &str,
        similarity_threshold: f64,
    ) -> Result<QuestionAnalysis> {
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(ExamArchiveError::validation(format!(
                "similarity threshold must be between 0 and 1, got {similarity_threshold}"
            )));
        }
        self.send_json(
            self.request(Method::GET, &["tests", "analyze", subject_code])
                .query(&AnalyzeParams {
                    similarity_threshold,
                }),
        )
        .await
    }
}

/// Extract `filename` from a `Content-Disposition` value such as
/// `inline; filename="test_42.pdf"`.
fn disposition_file_name(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|param| {
        let (key, raw) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let name = raw.trim().trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}
