//! Question segmentation for transcribed exam papers.
//!
//! Splits the raw text of one archived test into its numbered questions:
//! 1. Detects the numbering style from the first `1.` line
//!    (`1. (2p) ...` parenthesized, or plain `1. ...`)
//! 2. Drops everything before that line (headers, instructions)
//! 3. Cuts the rest at every line that starts a new question of the same style
//! 4. Strips the number, collapses each question onto one line
//!
//! Text without a recognizable first question yields no questions; this is
//! never an error.

mod clean;
mod markers;

use serde::Serialize;
use tracing::debug;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// How questions are numbered in a document. Only the style detected for the
/// first question is used for the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingStyle {
    /// `1. (2p) Question`: number followed by a parenthesized annotation.
    Parenthesized,
    /// `1. Question`
    Plain,
}

/// One cleaned question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// The number written in front of the question, as printed.
    pub number: Option<u32>,
    /// Question text on a single line.
    pub text: String,
    /// Parenthesized group after the number (usually points), parenthesis style only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// Result of segmenting one document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Segmentation {
    /// Detected style, `None` when no first question was found.
    pub style: Option<NumberingStyle>,
    pub questions: Vec<Question>,
}

impl Segmentation {
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Question texts in document order.
    pub fn texts(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.text.clone()).collect()
    }

    /// Consume into question texts in document order.
    pub fn into_texts(self) -> Vec<String> {
        self.questions.into_iter().map(|q| q.text).collect()
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Segment raw test text into its ordered list of question strings.
pub fn segment_questions(raw: &str) -> Vec<String> {
    segment(raw).into_texts()
}

/// Segment raw test text, keeping numbers, annotations, and the detected style.
pub fn segment(raw: &str) -> Segmentation {
    let Some((style, offset)) = markers::find_first_question(raw) else {
        debug!(len = raw.len(), "no numbered questions found");
        return Segmentation::default();
    };

    let body = &raw[offset..];
    let questions: Vec<Question> = markers::split_chunks(body, style)
        .into_iter()
        .filter_map(|chunk| clean::clean_chunk(chunk, style))
        .collect();

    debug!(
        ?style,
        offset,
        questions = questions.len(),
        "segmented test text"
    );

    Segmentation {
        style: Some(style),
        questions,
    }
}

/// Detect the numbering style without segmenting.
pub fn detect_style(raw: &str) -> Option<NumberingStyle> {
    markers::find_first_question(raw).map(|(style, _)| style)
}
