//! Remote user service.

use std::collections::BTreeSet;

use async_trait::async_trait;
use precinct_access::AccessError;
use precinct_access::collaborators::IdentityDirectory;
use precinct_identity_models::{User, UserId};

use crate::{ClientError, RetryPolicy, build_client, decode, join, retry};

const SERVICE: &str = "user-service";

/// [`IdentityDirectory`] backed by another server's `/api/users` endpoints.
pub struct HttpIdentityDirectory {
    client: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl HttpIdentityDirectory {
    /// Creates a client for the user service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, policy: RetryPolicy) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_client(&policy)?,
            base_url: base_url.into(),
            policy,
        })
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, ClientError> {
        let url = join(&self.base_url, &format!("api/users/{id}"));
        match retry::send(&self.policy, || self.client.get(&url)).await {
            Ok(response) => Ok(Some(decode(response).await?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_officers(&self, station: UserId) -> Result<BTreeSet<UserId>, ClientError> {
        let url = join(
            &self.base_url,
            &format!("api/users/station/{station}/officers"),
        );
        let response = retry::send(&self.policy, || self.client.get(&url)).await?;
        decode(response).await
    }
}

#[async_trait]
impl IdentityDirectory for HttpIdentityDirectory {
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, AccessError> {
        self.fetch_user(id)
            .await
            .map_err(|e| e.into_access(SERVICE))
    }

    async fn officer_ids_by_station(
        &self,
        station: UserId,
    ) -> Result<BTreeSet<UserId>, AccessError> {
        self.fetch_officers(station)
            .await
            .map_err(|e| e.into_access(SERVICE))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use precinct_identity_models::Role;

    use super::*;
    use crate::test_server::serve;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(2),
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn decodes_user_and_treats_404_as_absent() {
        let (base, _) = serve(vec![(
            200,
            r#"{"id":3,"role":"OFFICER","createdBy":2,"active":true,"username":"officer_001"}"#,
        )])
        .await;
        let directory = HttpIdentityDirectory::new(base, fast()).unwrap();
        let user = directory.user_by_id(3).await.unwrap().unwrap();
        assert_eq!(user.role, Role::Officer);
        assert_eq!(user.created_by, Some(2));

        let (base, hits) = serve(vec![(404, r#"{"error":"USER_NOT_FOUND"}"#)]).await;
        let directory = HttpIdentityDirectory::new(base, fast()).unwrap();
        assert!(directory.user_by_id(9).await.unwrap().is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let (base, hits) = serve(vec![(503, "{}"), (502, "{}"), (200, "[4,5]")]).await;
        let directory = HttpIdentityDirectory::new(base, fast()).unwrap();
        assert_eq!(
            directory.officer_ids_by_station(2).await.unwrap(),
            BTreeSet::from([4, 5])
        );
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_upstream_unavailable() {
        let (base, hits) = serve(vec![(500, "{}")]).await;
        let directory = HttpIdentityDirectory::new(base, fast()).unwrap();
        let err = directory.officer_ids_by_station(2).await.unwrap_err();
        assert!(matches!(err, AccessError::UpstreamUnavailable { .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn malformed_body_is_upstream_unavailable() {
        let (base, _) = serve(vec![(200, "not json")]).await;
        let directory = HttpIdentityDirectory::new(base, fast()).unwrap();
        assert!(matches!(
            directory.user_by_id(1).await,
            Err(AccessError::UpstreamUnavailable { .. })
        ));
    }
}
