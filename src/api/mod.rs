//! HTTP client for the dashboard REST API.
//! Prefixes the base URL, injects the bearer token and folds the server's
//! `{code, msg, ...}` envelope into `AppError`s.

pub mod endpoints;

use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};

pub use endpoints::{CaptchaImage, LoginForm, LoginResponse, RouterMeta, RouterNode};

const SESSION_EXPIRED_MSG: &str = "login state has expired, please log in again";

#[derive(Clone)]
pub struct ApiClient {
    base: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig) -> AppResult<Self> {
        Url::parse(&cfg.base_api).map_err(|e| {
            AppError::config("invalid_base_url".to_string(), format!("invalid base URL '{}': {}", cfg.base_api, e))
        })?;
        let mut builder = reqwest::Client::builder();
        if let Some(t) = cfg.timeout { builder = builder.timeout(t); }
        let client = builder.build()?;
        Ok(Self { base: cfg.base_api.trim_end_matches('/').to_string(), client })
    }

    pub fn base(&self) -> &str { &self.base }

    /// Paths are appended verbatim so a base with a path prefix (e.g. `/dev-api`) is kept.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') { format!("{}{}", self.base, path) } else { format!("{}/{}", self.base, path) }
    }

    pub async fn request(&self, method: Method, path: &str, token: Option<&str>, body: Option<&Value>) -> AppResult<Value> {
        let url = self.endpoint(path);
        debug!(target: "money::api", "{} {}", method, url);
        let mut req = self.client.request(method, url.as_str());
        if let Some(t) = token.filter(|t| !t.is_empty()) { req = req.bearer_auth(t); }
        if let Some(b) = body { req = req.json(b); }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let val: Value = if text.trim().is_empty() { Value::Null } else {
            match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) if status.is_success() => return Err(e.into()),
                // Error pages are often not JSON; keep the raw text for the message
                Err(_) => Value::String(text),
            }
        };
        if !status.is_success() {
            return Err(status_error(status, &val));
        }
        check_envelope(val)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> AppResult<T> {
        let val = self.request(Method::GET, path, token, None).await?;
        Ok(serde_json::from_value(val)?)
    }

    pub async fn post_json<T: DeserializeOwned>(&self, path: &str, token: Option<&str>, body: &Value) -> AppResult<T> {
        let val = self.request(Method::POST, path, token, Some(body)).await?;
        Ok(serde_json::from_value(val)?)
    }
}

fn envelope_msg(val: &Value) -> Option<String> {
    val.get("msg").and_then(|m| m.as_str()).filter(|m| !m.is_empty()).map(|m| m.to_string())
}

fn status_error(status: StatusCode, val: &Value) -> AppError {
    if status == StatusCode::UNAUTHORIZED {
        return AppError::auth("session_expired".to_string(), envelope_msg(val).unwrap_or_else(|| SESSION_EXPIRED_MSG.to_string()));
    }
    let msg = envelope_msg(val)
        .or_else(|| val.as_str().map(|s| s.chars().take(200).collect()))
        .unwrap_or_else(|| status.to_string());
    AppError::server(format!("http_{}", status.as_u16()), msg)
}

/// Apply the dashboard's response convention: a numeric `code` other than 200 is a failure.
/// Bodies without a `code` (plain lists, bare objects) pass through untouched.
pub fn check_envelope(val: Value) -> AppResult<Value> {
    let Some(code) = val.get("code").and_then(|c| c.as_i64()) else { return Ok(val); };
    let msg = envelope_msg(&val);
    match code {
        200 => Ok(val),
        401 => Err(AppError::auth("session_expired".to_string(), msg.unwrap_or_else(|| SESSION_EXPIRED_MSG.to_string()))),
        500 => Err(AppError::server("server_error".to_string(), msg.unwrap_or_else(|| "internal server error".to_string()))),
        601 => Err(AppError::user("warning".to_string(), msg.unwrap_or_else(|| "request rejected".to_string()))),
        other => Err(AppError::server(format!("code_{}", other), msg.unwrap_or_else(|| "unknown error".to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_code_passes_through() {
        let v = json!({"code": 200, "token": "abc"});
        assert_eq!(check_envelope(v.clone()).unwrap(), v);
    }

    #[test]
    fn body_without_code_passes_through() {
        let v = json!([{"serverName": "a"}]);
        assert_eq!(check_envelope(v.clone()).unwrap(), v);
        assert_eq!(check_envelope(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn code_401_is_session_expired() {
        let err = check_envelope(json!({"code": 401, "msg": ""})).unwrap_err();
        assert!(err.is_session_expired());
        assert_eq!(err.message(), SESSION_EXPIRED_MSG);
    }

    #[test]
    fn code_500_carries_server_message() {
        let err = check_envelope(json!({"code": 500, "msg": "captcha expired"})).unwrap_err();
        assert_eq!(err, AppError::server("server_error", "captcha expired"));
    }

    #[test]
    fn code_601_is_a_warning() {
        let err = check_envelope(json!({"code": 601, "msg": "duplicate"})).unwrap_err();
        assert!(matches!(err, AppError::UserInput { .. }));
    }

    #[test]
    fn unknown_code_keeps_number() {
        let err = check_envelope(json!({"code": 403})).unwrap_err();
        assert_eq!(err.code_str(), "code_403");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let cfg = ClientConfig { base_api: "http://localhost:1024/dev-api/".into(), ..Default::default() };
        let api = ApiClient::new(&cfg).unwrap();
        assert_eq!(api.endpoint("/getInfo"), "http://localhost:1024/dev-api/getInfo");
        assert_eq!(api.endpoint("logout"), "http://localhost:1024/dev-api/logout");
    }

    #[test]
    fn invalid_base_is_config_error() {
        let cfg = ClientConfig { base_api: "not a url".into(), ..Default::default() };
        let err = ApiClient::new(&cfg).err().unwrap();
        assert_eq!(err.code_str(), "invalid_base_url");
    }

    #[test]
    fn unauthorized_status_maps_to_session_expired() {
        let err = status_error(StatusCode::UNAUTHORIZED, &Value::Null);
        assert!(err.is_session_expired());
        let err = status_error(StatusCode::BAD_GATEWAY, &Value::String("<html>bad gateway</html>".into()));
        assert_eq!(err.code_str(), "http_502");
    }
}
