//! Registration, login, and the current-user endpoint.

use reqwest::Method;
use serde_json::json;
use tracing::{info, instrument};

use examarchive_shared::{ExamArchiveError, Result, Token, User};

use crate::ArchiveClient;

impl ArchiveClient {
    /// Create a new (non-admin, active) account.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<User> {
        validate_credentials(email, password)?;
        let body = json!({ "email": email, "password": password });
        let user: User = self
            .send_json(self.request(Method::POST, &["users", "register"]).json(&body))
            .await?;
        info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Exchange credentials for a bearer token and keep it on the client.
    ///
    /// The endpoint is an OAuth2 password form, so the e-mail travels in the
    /// `username` field as `application/x-www-form-urlencoded`.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Token> {
        validate_credentials(email, password)?;
        let form = [("username", email), ("password", password)];
        let token: Token = self
            .send_json(self.request(Method::POST, &["users", "login"]).form(&form))
            .await?;

        if token.access_token.is_empty() {
            return Err(ExamArchiveError::parse("login response carried an empty token"));
        }

        self.set_token(token.access_token.clone());
        info!("logged in");
        Ok(token)
    }

    /// Fetch the account behind the current token.
    pub async fn me(&self) -> Result<User> {
        if !self.is_authenticated() {
            return Err(ExamArchiveError::Unauthorized("not logged in".into()));
        }
        self.send_json(self.request(Method::GET, &["users", "me"]))
            .await
    }

    /// Forget the token. The server keeps no session, so this is local only.
    pub fn logout(&mut self) {
        self.clear_token();
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ExamArchiveError::validation(format!(
            "'{email}' is not an e-mail address"
        )));
    };
    if local.is_empty() || domain.is_empty() {
        return Err(ExamArchiveError::validation(format!(
            "'{email}' is not an e-mail address"
        )));
    }
    if password.is_empty() {
        return Err(ExamArchiveError::validation("password must not be empty"));
    }
    Ok(())
}
