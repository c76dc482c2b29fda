//! Per-invocation state: resolved config, API client, and the stored session.

use color_eyre::eyre::{Result, eyre};
use examarchive_client::{ArchiveClient, ClientOptions};
use examarchive_shared::{AppConfig, ExamArchiveError, User, load_config};
use examarchive_storage::Storage;
use tracing::{debug, warn};
use url::Url;

pub(crate) struct Context {
    pub config: AppConfig,
    pub client: ArchiveClient,
    /// Account saved at login, if the session matches the configured API.
    pub user: Option<User>,
}

impl Context {
    /// Load config (with `--api-url` applied) and attach a stored token that
    /// was issued by the same API.
    pub async fn load(api_url: Option<&str>) -> Result<Self> {
        let mut config = load_config()?;
        if let Some(url) = api_url {
            config.api.base_url = url.to_string();
            config.validate()?;
        }

        let mut client = ArchiveClient::new(&ClientOptions::from(&config.api))?;
        let mut user = None;

        let db_path = config.db_path()?;
        if db_path.exists() {
            let storage = Storage::open(&db_path).await?;
            if let Some(session) = storage.load_session().await? {
                if same_api(&session.base_url, client.base_url()) {
                    debug!(base_url = %session.base_url, "using stored session");
                    client = client.with_token(session.token);
                    user = session.user;
                } else {
                    debug!(
                        stored = %session.base_url,
                        configured = %client.base_url(),
                        "stored session belongs to another API, ignoring"
                    );
                }
            }
        }

        Ok(Self {
            config,
            client,
            user,
        })
    }

    /// Open the local database read-write.
    pub async fn storage(&self) -> Result<Storage> {
        Ok(Storage::open(&self.config.db_path()?).await?)
    }

    /// Fail early for commands that need a login.
    pub fn require_login(&self) -> Result<()> {
        if self.client.is_authenticated() {
            Ok(())
        } else {
            Err(eyre!("not logged in; run `examarchive login` first"))
        }
    }

    /// Fail early for admin-only commands when the saved account is known
    /// not to be an admin. The server has the final word either way.
    pub fn require_admin(&self) -> Result<()> {
        self.require_login()?;
        match &self.user {
            Some(user) if !user.is_admin => Err(eyre!(
                "{} is not an administrator",
                user.email
            )),
            _ => Ok(()),
        }
    }

    /// Drop the stored session after the API rejected its token.
    pub async fn forget_session(&self) {
        let result = async {
            let storage = self.storage().await?;
            storage.clear_session().await?;
            Ok::<_, color_eyre::Report>(())
        }
        .await;
        if let Err(e) = result {
            warn!(error = %e, "failed to clear stored session");
        }
    }
}

/// Whether an error chain contains an API rejection of our token.
pub(crate) fn is_unauthorized(err: &color_eyre::Report) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<ExamArchiveError>()
            .is_some_and(ExamArchiveError::is_unauthorized)
    })
}

fn same_api(stored: &str, configured: &Url) -> bool {
    Url::parse(stored).is_ok_and(|stored| {
        stored.as_str().trim_end_matches('/') == configured.as_str().trim_end_matches('/')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_matches_equivalent_urls() {
        let configured = Url::parse("http://127.0.0.1:1739").unwrap();
        assert!(same_api("http://127.0.0.1:1739/", &configured));
        assert!(same_api("http://127.0.0.1:1739", &configured));
        assert!(!same_api("http://127.0.0.1:8000", &configured));
        assert!(!same_api("garbage", &configured));
    }

    #[test]
    fn detects_unauthorized_in_report() {
        let report: color_eyre::Report = ExamArchiveError::Unauthorized("expired".into()).into();
        assert!(is_unauthorized(&report));

        let report: color_eyre::Report = ExamArchiveError::NotFound("x".into()).into();
        assert!(!is_unauthorized(&report));

        let report = eyre!("plain");
        assert!(!is_unauthorized(&report));
    }
}
