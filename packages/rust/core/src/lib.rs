//! Domain logic for the exam archive toolkit.
//!
//! This crate sits between the API client, the segmenter, and the local
//! cache: the browse state machine shared by the CLI and TUI, client-side
//! filters, upload validation, question frequency analysis, and the offline
//! sync pipeline.

pub mod analysis;
pub mod browse;
pub mod filter;
pub mod sync;
pub mod upload;

pub use analysis::{DEFAULT_THRESHOLD, analyze_tests, similarity_ratio};
pub use browse::{BrowseSession, Load, Step};
pub use filter::{Preview, Searchable, filter_items, preview};
pub use sync::{ProgressReporter, SilentProgress, SyncResult, fetch_subject_tests, sync_subject};
pub use upload::{UploadForm, prepare_upload};
