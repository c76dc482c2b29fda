//! Local checks before posting a scanned paper, and file type helpers.

use std::path::Path;

use examarchive_client::UploadRequest;
use examarchive_shared::{ExamArchiveError, Result, TestType};
use tracing::debug;

/// File extensions the archive accepts for uploads.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "pdf", "tiff", "bmp"];

/// Form fields of an upload, as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub subject_code: String,
    pub exam_period: String,
    pub academic_year: String,
    /// Empty means `regular`.
    pub test_type: String,
}

impl UploadForm {
    /// Check every field and build the request for `file_name` / `bytes`.
    pub fn into_request(self, file_name: &str, bytes: Vec<u8>) -> Result<UploadRequest> {
        let subject_code = required("subject code", &self.subject_code)?;
        let exam_period = required("exam period", &self.exam_period)?;
        let academic_year = required("academic year", &self.academic_year)?;
        let test_type = parse_test_type(&self.test_type)?;
        let extension = validate_extension(file_name)?;

        if bytes.is_empty() {
            return Err(ExamArchiveError::validation(format!(
                "'{file_name}' is empty"
            )));
        }

        Ok(UploadRequest {
            subject_code,
            exam_period,
            academic_year,
            test_type,
            file_name: file_name.to_string(),
            content_type: mime_for_extension(&extension).to_string(),
            bytes,
        })
    }
}

/// Read `path` and build a validated upload request from it.
pub async fn prepare_upload(form: UploadForm, path: &Path) -> Result<UploadRequest> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            ExamArchiveError::validation(format!("'{}' has no usable file name", path.display()))
        })?
        .to_string();

    // Fail on the extension before reading a possibly large file.
    validate_extension(&file_name)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ExamArchiveError::io(path, e))?;
    debug!(file = %file_name, bytes = bytes.len(), "upload file read");

    form.into_request(&file_name, bytes)
}

fn required(label: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ExamArchiveError::validation(format!("{label} is required")));
    }
    Ok(value.to_string())
}

/// Parse a test type, defaulting blank input to `regular`.
pub fn parse_test_type(raw: &str) -> Result<TestType> {
    if raw.trim().is_empty() {
        return Ok(TestType::default());
    }
    raw.parse()
}

/// Lower-cased extension of `file_name`, if it has one.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .filter(|ext| !ext.is_empty())
}

/// Return the lower-cased extension, or a validation error listing the
/// accepted ones.
pub fn validate_extension(file_name: &str) -> Result<String> {
    match file_extension(file_name) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(ExamArchiveError::validation(format!(
            "file type of '{file_name}' not allowed, expected one of: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))),
    }
}

/// MIME type served for a stored file extension.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// File name the archive uses for a test's original upload.
pub fn download_file_name(test_id: &str, extension: Option<&str>) -> String {
    format!("test_{test_id}.{}", extension.unwrap_or("bin"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> UploadForm {
        UploadForm {
            subject_code: " OS ".into(),
            exam_period: "Januarski 2024".into(),
            academic_year: "2023/2024".into(),
            test_type: String::new(),
        }
    }

    #[test]
    fn builds_request_with_defaults() {
        let req = form().into_request("scan.JPG", vec![1, 2, 3]).unwrap();
        assert_eq!(req.subject_code, "OS");
        assert_eq!(req.test_type, TestType::Regular);
        assert_eq!(req.content_type, "image/jpeg");
        assert_eq!(req.file_name, "scan.JPG");
    }

    #[test]
    fn rejects_missing_fields() {
        let mut f = form();
        f.exam_period = "  ".into();
        let err = f.into_request("a.pdf", vec![1]).unwrap_err();
        assert!(err.to_string().contains("exam period is required"));
    }

    #[test]
    fn rejects_bad_test_type() {
        let mut f = form();
        f.test_type = "oral".into();
        let err = f.into_request("a.pdf", vec![1]).unwrap_err();
        assert!(err.to_string().contains("regular, makeup, midterm, final, practical"));

        assert_eq!(parse_test_type("MIDTERM").unwrap(), TestType::Midterm);
    }

    #[test]
    fn extension_checks() {
        assert_eq!(validate_extension("exam.Pdf").unwrap(), "pdf");
        assert_eq!(validate_extension("scan.tiff").unwrap(), "tiff");
        assert!(validate_extension("notes.docx").is_err());
        assert!(validate_extension("noext").is_err());
        assert!(validate_extension(".pdf").is_err());
        assert_eq!(file_extension("archive.tar.GZ").as_deref(), Some("gz"));
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(form().into_request("a.png", Vec::new()).is_err());
    }

    #[test]
    fn mime_mapping() {
        assert_eq!(mime_for_extension("pdf"), "application/pdf");
        assert_eq!(mime_for_extension("JPEG"), "image/jpeg");
        assert_eq!(mime_for_extension("bmp"), "image/bmp");
        assert_eq!(mime_for_extension("gif"), "application/octet-stream");
        assert_eq!(download_file_name("t1", Some("png")), "test_t1.png");
        assert_eq!(download_file_name("t1", None), "test_t1.bin");
    }

    #[tokio::test]
    async fn prepare_reads_file() {
        let path = std::env::temp_dir().join(format!("ea_upload_{}.png", std::process::id()));
        std::fs::write(&path, b"\x89PNG").unwrap();
        let req = prepare_upload(form(), &path).await.unwrap();
        assert_eq!(req.bytes, b"\x89PNG");
        assert_eq!(req.content_type, "image/png");
        std::fs::remove_file(&path).ok();

        let missing = std::env::temp_dir().join("ea_upload_missing.pdf");
        let err = prepare_upload(form(), &missing).await.unwrap_err();
        assert!(matches!(err, ExamArchiveError::Io { .. }));
    }
}
