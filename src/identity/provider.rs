use async_trait::async_trait;

use super::principal::ProfileResponse;
use crate::api::{ApiClient, LoginForm};
use crate::error::AppResult;
use crate::license::LicenseInfo;

/// Server calls the session flows depend on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Returns the issued token.
    async fn login(&self, form: &LoginForm) -> AppResult<String>;
    async fn get_info(&self, token: &str) -> AppResult<ProfileResponse>;
    async fn license_check(&self, token: &str) -> AppResult<Vec<LicenseInfo>>;
    async fn logout(&self, token: &str) -> AppResult<()>;
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, form: &LoginForm) -> AppResult<String> {
        Ok(ApiClient::login(self, form).await?.token)
    }

    async fn get_info(&self, token: &str) -> AppResult<ProfileResponse> {
        ApiClient::get_info(self, token).await
    }

    async fn license_check(&self, token: &str) -> AppResult<Vec<LicenseInfo>> {
        ApiClient::license_check(self, token).await
    }

    async fn logout(&self, token: &str) -> AppResult<()> {
        ApiClient::logout(self, token).await
    }
}
