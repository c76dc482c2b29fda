//! Domain types exchanged with the exam archive API.
//!
//! Field names follow the server's JSON. Documents stored by the server expose
//! their identifier as `_id`; response-model types (tests, users) use `id`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExamArchiveError, Result};

// ---------------------------------------------------------------------------
// Faculty / Module / Address
// ---------------------------------------------------------------------------

/// A faculty with its embedded study modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faculty {
    /// Server-assigned identifier (absent on create).
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name (unique).
    pub name: String,
    /// Short code (unique), e.g. `FTN`.
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// Postal address of a faculty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street_name: String,
    pub street_number: u32,
    pub city: String,
    pub postal_code: String,
}

/// A study module (programme) embedded in a faculty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
}

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// A course taught within a module in a given study year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Subject code (unique), e.g. `CS302`.
    pub code: String,
    pub module_code: String,
    pub faculty_code: String,
    /// Study year, 1-4.
    pub year: u8,
    pub semester: u8,
    /// ECTS credits.
    pub espb: u32,
    pub mandatory: bool,
    #[serde(default)]
    pub description: String,
}

// ---------------------------------------------------------------------------
// Test
// ---------------------------------------------------------------------------

/// An archived exam paper with its transcribed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    #[serde(alias = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub subject_code: String,
    /// Exam period, e.g. `Januarski 2024`.
    pub exam_period: String,
    /// Academic year, e.g. `2023/2024`.
    pub academic_year: String,
    pub test_type: String,
    /// Transcribed text of the whole paper.
    #[serde(default)]
    pub full_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
}

impl Test {
    /// Identifier for display and grouping; empty when the server sent none.
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }
}

/// Kind of exam a test belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    #[default]
    Regular,
    Makeup,
    Midterm,
    Final,
    Practical,
}

impl TestType {
    /// All accepted values, in display order.
    pub const ALL: [TestType; 5] = [
        TestType::Regular,
        TestType::Makeup,
        TestType::Midterm,
        TestType::Final,
        TestType::Practical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Makeup => "makeup",
            Self::Midterm => "midterm",
            Self::Final => "final",
            Self::Practical => "practical",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = ExamArchiveError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                ExamArchiveError::validation(format!(
                    "unknown test type '{s}', expected one of: {}",
                    allowed.join(", ")
                ))
            })
    }
}

/// Filters for `GET /tests/find`.
///
/// Metadata fields are exact matches on the server; `text_search` is a
/// server-side full-text query over the test content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_search: Option<String>,
    pub limit: u32,
    pub skip: u32,
}

impl Default for TestQuery {
    fn default() -> Self {
        Self {
            subject_code: None,
            academic_year: None,
            exam_period: None,
            test_type: None,
            text_search: None,
            limit: 20,
            skip: 0,
        }
    }
}

impl TestQuery {
    /// Server-side cap for `limit`.
    pub const MAX_LIMIT: u32 = 100;

    /// Query all tests of one subject.
    pub fn for_subject(code: impl Into<String>) -> Self {
        Self {
            subject_code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Reject values the server would refuse with a 422.
    pub fn validate(&self) -> Result<()> {
        if !(1..=Self::MAX_LIMIT).contains(&self.limit) {
            return Err(ExamArchiveError::validation(format!(
                "limit must be between 1 and {}, got {}",
                Self::MAX_LIMIT,
                self.limit
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Users and auth
// ---------------------------------------------------------------------------

/// An account as returned by `/users/me` and the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Bearer token issued by `/users/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

// ---------------------------------------------------------------------------
// Question frequency analysis
// ---------------------------------------------------------------------------

/// One group of near-identical questions across a subject's tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionFrequency {
    /// Text of the first question seen in the group.
    pub question: String,
    /// How many questions fell into the group.
    pub count: usize,
    pub test_ids: Vec<String>,
    /// Distinct exam periods the question appeared in.
    pub exam_periods: Vec<String>,
}

/// Frequency report for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    pub subject_code: String,
    pub total_tests: usize,
    pub total_questions: usize,
    pub unique_questions: usize,
    pub questions: Vec<QuestionFrequency>,
}

/// Timestamps arrive either as RFC 3339 or as naive UTC (`2024-01-05T10:00:00.123`).
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
