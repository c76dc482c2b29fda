//! Subject endpoints.

use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};

use examarchive_shared::{Result, Subject};

use crate::ArchiveClient;

/// Exact-match filters for `GET /subjects/`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<bool>,
}

impl SubjectFilter {
    /// Subjects of one module in one study year, as the browse flow needs them.
    pub fn module_year(module_code: &str, year: u8) -> Self {
        Self {
            module_code: Some(module_code.to_string()),
            year: Some(year),
            ..Self::default()
        }
    }
}

impl ArchiveClient {
    #[instrument(skip(self))]
    pub async fn list_subjects(&self, filter: &SubjectFilter) -> Result<Vec<Subject>> {
        self.send_json(self.request(Method::GET, &["subjects", ""]).query(filter))
            .await
    }

    pub async fn get_subject(&self, id: &str) -> Result<Subject> {
        self.send_json(self.request(Method::GET, &["subjects", id]))
            .await
    }

    pub async fn get_subject_by_code(&self, code: &str) -> Result<Subject> {
        self.send_json(self.request(Method::GET, &["subjects", "code", code]))
            .await
    }

    #[instrument(skip_all, fields(code = %subject.code))]
    pub async fn create_subject(&self, subject: &Subject) -> Result<Subject> {
        let created: Subject = self
            .send_json(self.request(Method::POST, &["subjects", ""]).json(subject))
            .await?;
        info!("subject created");
        Ok(created)
    }

    #[instrument(skip(self, subject))]
    pub async fn update_subject(&self, id: &str, subject: &Subject) -> Result<Subject> {
        self.send_json(self.request(Method::PUT, &["subjects", id]).json(subject))
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_subject(&self, id: &str) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, &["subjects", id]))
            .await?;
        info!("subject deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::test_support::client_for;
    use examarchive_shared::ExamArchiveError;

    fn os_subject() -> serde_json::Value {
        json!({
            "_id": "66b000000000000000000001",
            "name": "Operativni sistemi",
            "code": "OS",
            "module_code": "SIIT",
            "faculty_code": "FTN",
            "year": 2,
            "semester": 4,
            "espb": 8,
            "mandatory": true,
            "description": ""
        })
    }

    #[tokio::test]
    async fn list_sends_only_set_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subjects/"))
            .and(query_param("module_code", "SIIT"))
            .and(query_param("year", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([os_subject()])))
            .expect(1)
            .mount(&server)
            .await;

        let filter = SubjectFilter::module_year("SIIT", 2);
        let subjects = client_for(&server).list_subjects(&filter).await.unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].espb, 8);

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap_or("");
        assert!(!query.contains("faculty_code"));
        assert!(!query.contains("semester"));
        assert!(!query.contains("mandatory"));
    }

    #[tokio::test]
    async fn get_by_code_uses_code_route() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subjects/code/OS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(os_subject()))
            .mount(&server)
            .await;

        let subject = client_for(&server).get_subject_by_code("OS").await.unwrap();
        assert_eq!(subject.name, "Operativni sistemi");
        assert_eq!(subject.id.as_deref(), Some("66b000000000000000000001"));
    }

    #[tokio::test]
    async fn duplicate_code_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/subjects/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                json!({"detail": "Subject with code OS already exists"}),
            ))
            .mount(&server)
            .await;

        let subject: Subject = serde_json::from_value(os_subject()).unwrap();
        let err = client_for(&server).create_subject(&subject).await.unwrap_err();
        assert!(matches!(err, ExamArchiveError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/subjects/66b000000000000000000009"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Subject not found"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .delete_subject("66b000000000000000000009")
            .await
            .unwrap_err();
        assert!(matches!(err, ExamArchiveError::NotFound(_)));
    }
}
