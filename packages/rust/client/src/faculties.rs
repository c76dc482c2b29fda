//! Faculty endpoints, including the embedded module list.

use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};

use examarchive_shared::{ExamArchiveError, Faculty, Module, Result};

use crate::ArchiveClient;

/// Query for `GET /faculties/`. `name` and `code` are case-insensitive
/// substring matches on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacultyFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for FacultyFilter {
    fn default() -> Self {
        Self {
            name: None,
            code: None,
            skip: 0,
            limit: 100,
        }
    }
}

#[derive(Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    skip: u32,
    limit: u32,
}

impl ArchiveClient {
    pub async fn list_faculties(&self, filter: &FacultyFilter) -> Result<Vec<Faculty>> {
        self.send_json(self.request(Method::GET, &["faculties", ""]).query(filter))
            .await
    }

    /// Free-text search over faculty name, code, and description.
    #[instrument(skip(self))]
    pub async fn search_faculties(&self, q: &str) -> Result<Vec<Faculty>> {
        let q = q.trim();
        if q.is_empty() {
            return Err(ExamArchiveError::validation("search query must not be empty"));
        }
        let params = SearchParams {
            q,
            skip: 0,
            limit: 100,
        };
        self.send_json(self.request(Method::GET, &["faculties", "search"]).query(&params))
            .await
    }

    pub async fn get_faculty(&self, id: &str) -> Result<Faculty> {
        self.send_json(self.request(Method::GET, &["faculties", id]))
            .await
    }

    #[instrument(skip_all, fields(code = %faculty.code))]
    pub async fn create_faculty(&self, faculty: &Faculty) -> Result<Faculty> {
        let created: Faculty = self
            .send_json(self.request(Method::POST, &["faculties", ""]).json(faculty))
            .await?;
        info!(id = created.id.as_deref().unwrap_or(""), "faculty created");
        Ok(created)
    }

    /// Replace a faculty's fields (modules included).
    #[instrument(skip(self, faculty))]
    pub async fn update_faculty(&self, id: &str, faculty: &Faculty) -> Result<Faculty> {
        self.send_json(self.request(Method::PUT, &["faculties", id]).json(faculty))
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_faculty(&self, id: &str) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, &["faculties", id]))
            .await?;
        info!("faculty deleted");
        Ok(())
    }

    /// Append a module; returns the updated faculty.
    #[instrument(skip(self, module), fields(module = %module.code))]
    pub async fn add_module(&self, faculty_id: &str, module: &Module) -> Result<Faculty> {
        self.send_json(
            self.request(Method::POST, &["faculties", faculty_id, "modules"])
                .json(module),
        )
        .await
    }

    /// Remove a module by code; returns the updated faculty. Removing a code
    /// that is not present is not an error.
    #[instrument(skip(self))]
    pub async fn remove_module(&self, faculty_id: &str, module_code: &str) -> Result<Faculty> {
        self.send_json(self.request(
            Method::DELETE,
            &["faculties", faculty_id, "modules", module_code],
        ))
        .await
    }
}
