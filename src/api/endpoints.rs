use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::ApiClient;
use crate::error::{AppError, AppResult};
use crate::identity::ProfileResponse;
use crate::license::{LicenseInfo, OneOrMany};

pub const LOGIN_PATH: &str = "/login";
pub const PROFILE_PATH: &str = "/getInfo";
pub const LOGOUT_PATH: &str = "/logout";
pub const LICENSE_CHECK_PATH: &str = "/finance/pieChart/GetLicenseCheck/";
pub const CAPTCHA_PATH: &str = "/captchaImage";
pub const ROUTERS_PATH: &str = "/getRouters";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Captcha answer typed by the user.
    pub code: String,
    /// Captcha id handed out by `/captchaImage`.
    pub uuid: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>, code: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into(), code: code.into(), uuid: uuid.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaImage {
    #[serde(default = "default_true")]
    pub captcha_enabled: bool,
    #[serde(default)]
    pub uuid: Option<String>,
    /// Base64-encoded JPEG, without a data-URL prefix.
    #[serde(default)]
    pub img: Option<String>,
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouterMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouterNode {
    #[serde(default)]
    pub name: Option<String>,
    pub path: String,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub meta: Option<RouterMeta>,
    #[serde(default)]
    pub children: Vec<RouterNode>,
}

impl RouterNode {
    pub fn title(&self) -> &str {
        self.meta.as_ref().map(|m| m.title.as_str()).filter(|t| !t.is_empty()).unwrap_or(self.path.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct RoutersEnvelope {
    #[serde(default)]
    data: Vec<RouterNode>,
}

impl ApiClient {
    pub async fn login(&self, form: &LoginForm) -> AppResult<LoginResponse> {
        let body = serde_json::to_value(form)?;
        let resp: LoginResponse = self.post_json(LOGIN_PATH, None, &body).await?;
        if resp.token.is_empty() {
            return Err(AppError::decode("missing_token", "login response carried an empty token"));
        }
        Ok(resp)
    }

    pub async fn get_info(&self, token: &str) -> AppResult<ProfileResponse> {
        self.get_json(PROFILE_PATH, Some(token)).await
    }

    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.request(reqwest::Method::POST, LOGOUT_PATH, Some(token), Some(&json!({}))).await?;
        Ok(())
    }

    /// Fetch license records; a bare object and an array are both accepted.
    pub async fn license_check(&self, token: &str) -> AppResult<Vec<LicenseInfo>> {
        let records: OneOrMany<LicenseInfo> = self.get_json(LICENSE_CHECK_PATH, Some(token)).await?;
        let list = records.into_vec();
        debug!(target: "money::api", "license check returned {} record(s)", list.len());
        Ok(list)
    }

    pub async fn captcha_image(&self) -> AppResult<CaptchaImage> {
        self.get_json(CAPTCHA_PATH, None).await
    }

    pub async fn get_routers(&self, token: &str) -> AppResult<Vec<RouterNode>> {
        let env: RoutersEnvelope = self.get_json(ROUTERS_PATH, Some(token)).await?;
        Ok(env.data)
    }
}
