//! Remote geography service.

use async_trait::async_trait;
use precinct_access::AccessError;
use precinct_access::collaborators::LocationValidator;
use precinct_geography_models::GeoPoint;
use precinct_identity_models::{Role, UserId};
use precinct_server_models::PointValidationRequest;

use crate::{ClientError, RetryPolicy, build_client, decode, join, retry};

const SERVICE: &str = "geo-service";

/// [`LocationValidator`] backed by another server's
/// `/api/geo/validate-point` endpoint.
pub struct HttpLocationValidator {
    client: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl HttpLocationValidator {
    /// Creates a client for the geography service at `base_url`.
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

    async fn validate(&self, request: &PointValidationRequest) -> Result<bool, ClientError> {
        let url = join(&self.base_url, "api/geo/validate-point");
        let response = retry::send(&self.policy, || self.client.post(&url).json(request)).await?;
        decode(response).await
    }
}

#[async_trait]
impl LocationValidator for HttpLocationValidator {
    async fn validate_point_in_boundary(
        &self,
        user: UserId,
        role: Option<Role>,
        point: GeoPoint,
    ) -> Result<bool, AccessError> {
        let request = PointValidationRequest {
            user_id: user,
            latitude: point.latitude,
            longitude: point.longitude,
            user_role: role.map(|r| r.to_string()),
        };
        self.validate(&request)
            .await
            .map_err(|e| e.into_access(SERVICE))
    }
}
