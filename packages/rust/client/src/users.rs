//! Admin-only account management.

use reqwest::Method;
use serde_json::json;
use tracing::{info, instrument};

use examarchive_shared::{Result, User};

use crate::ArchiveClient;

impl ArchiveClient {
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.send_json(self.request(Method::GET, &["users", ""]))
            .await
    }

    /// Grant or revoke admin rights. The server refuses changes to the
    /// caller's own account.
    #[instrument(skip(self))]
    pub async fn set_admin(&self, user_id: &str, is_admin: bool) -> Result<User> {
        let user: User = self
            .send_json(
                self.request(Method::PATCH, &["users", user_id, "admin"])
                    .json(&json!({ "is_admin": is_admin })),
            )
            .await?;
        info!(email = %user.email, is_admin, "admin flag changed");
        Ok(user)
    }

    /// Enable or disable an account.
    #[instrument(skip(self))]
    pub async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        let user: User = self
            .send_json(
                self.request(Method::PATCH, &["users", user_id, "active"])
                    .json(&json!({ "is_active": is_active })),
            )
            .await?;
        info!(email = %user.email, is_active, "active flag changed");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, &["users", user_id]))
            .await?;
        info!("user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::test_support::client_for;
    use examarchive_shared::ExamArchiveError;

    fn user(id: &str, admin: bool, active: bool) -> serde_json::Value {
        json!({
            "id": id,
            "email": format!("{id}@uns.ac.rs"),
            "is_admin": admin,
            "is_active": active,
            "created_at": "2024-09-30T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn list_requires_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/"))
            .and(header("authorization", "Bearer admin"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([user("a", true, true), user("b", false, false)])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Could not validate credentials"})),
            )
            .mount(&server)
            .await;

        let anonymous = client_for(&server);
        assert!(anonymous.list_users().await.unwrap_err().is_unauthorized());

        let users = anonymous.with_token("admin").list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(!users[1].is_active);
    }

    #[tokio::test]
    async fn toggles_send_embedded_flag() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/users/b/admin"))
            .and(body_json(json!({"is_admin": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(user("b", true, true)))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/users/b/active"))
            .and(body_json(json!({"is_active": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(user("b", true, false)))
            .mount(&server)
            .await;

        let client = client_for(&server).with_token("admin");
        assert!(client.set_admin("b", true).await.unwrap().is_admin);
        assert!(!client.set_active("b", false).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/users/b"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"detail": "Not enough permissions"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .with_token("student")
            .delete_user("b")
            .await
            .unwrap_err();
        assert!(matches!(err, ExamArchiveError::Api { status: 403, ref detail } if detail == "Not enough permissions"));
    }
}
