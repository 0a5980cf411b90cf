#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use money_console::api::LoginForm;
use money_console::identity::{AuthBackend, ProfileResponse, TokenStorage};
use money_console::license::{LicenseInfo, OneOrMany};
use money_console::notify::{DialogOptions, Navigator, Presenter, Route};
use money_console::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Confirm { title: String, message: String },
    Alert { title: String, message: String, html: bool },
}

/// Records every dialog and answers confirmations with a fixed choice.
pub struct RecordingPresenter {
    pub accept: bool,
    pub dialogs: Mutex<Vec<Dialog>>,
}

impl RecordingPresenter {
    pub fn new(accept: bool) -> Arc<Self> {
        Arc::new(Self { accept, dialogs: Mutex::new(Vec::new()) })
    }

    pub fn dialogs(&self) -> Vec<Dialog> { self.dialogs.lock().clone() }

    pub fn confirms(&self) -> Vec<String> {
        self.dialogs().into_iter().filter_map(|d| match d { Dialog::Confirm { message, .. } => Some(message), _ => None }).collect()
    }

    pub fn alerts(&self) -> Vec<(String, String, bool)> {
        self.dialogs()
            .into_iter()
            .filter_map(|d| match d { Dialog::Alert { title, message, html } => Some((title, message, html)), _ => None })
            .collect()
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn confirm(&self, message: &str, title: &str, _options: &DialogOptions) -> bool {
        self.dialogs.lock().push(Dialog::Confirm { title: title.to_string(), message: message.to_string() });
        self.accept
    }

    async fn alert(&self, message: &str, title: &str, options: &DialogOptions) {
        self.dialogs.lock().push(Dialog::Alert { title: title.to_string(), message: message.to_string(), html: options.html });
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn routes(&self) -> Vec<Route> { self.routes.lock().clone() }
}

impl Navigator for RecordingNavigator {
    fn push(&self, route: Route) { self.routes.lock().push(route); }
}

/// Backend answering from canned results. The license answer is raw JSON so the
/// one-or-many normalization runs exactly as it does over HTTP.
pub struct ScriptedBackend {
    pub login: Mutex<AppResult<String>>,
    pub profile: Mutex<AppResult<ProfileResponse>>,
    pub license: Mutex<AppResult<Value>>,
    pub logout: Mutex<AppResult<()>>,
    pub calls: Mutex<Vec<String>>,
    pub login_forms: Mutex<Vec<LoginForm>>,
}

impl ScriptedBackend {
    pub fn new(profile: ProfileResponse) -> Self {
        Self {
            login: Mutex::new(Ok("tok-1".to_string())),
            profile: Mutex::new(Ok(profile)),
            license: Mutex::new(Err(AppError::transport("connect_failed", "license service down"))),
            logout: Mutex::new(Ok(())),
            calls: Mutex::new(Vec::new()),
            login_forms: Mutex::new(Vec::new()),
        }
    }

    pub fn with_license(self, body: Value) -> Self {
        *self.license.lock() = Ok(body);
        self
    }

    pub fn calls(&self) -> Vec<String> { self.calls.lock().clone() }
}

#[async_trait]
impl AuthBackend for ScriptedBackend {
    async fn login(&self, form: &LoginForm) -> AppResult<String> {
        self.calls.lock().push("login".into());
        self.login_forms.lock().push(form.clone());
        self.login.lock().clone()
    }

    async fn get_info(&self, token: &str) -> AppResult<ProfileResponse> {
        self.calls.lock().push(format!("get_info:{}", token));
        self.profile.lock().clone()
    }

    async fn license_check(&self, token: &str) -> AppResult<Vec<LicenseInfo>> {
        self.calls.lock().push(format!("license_check:{}", token));
        let body = self.license.lock().clone()?;
        let records: OneOrMany<LicenseInfo> = serde_json::from_value(body)?;
        Ok(records.into_vec())
    }

    async fn logout(&self, token: &str) -> AppResult<()> {
        self.calls.lock().push(format!("logout:{}", token));
        self.logout.lock().clone()
    }
}

pub fn profile_json(v: Value) -> ProfileResponse {
    serde_json::from_value(v).expect("profile fixture")
}

/// Token storage whose removal always fails, e.g. a read-only token file.
pub struct StuckTokenStore {
    pub token: Option<String>,
}

impl TokenStorage for StuckTokenStore {
    fn get_token(&self) -> Option<String> { self.token.clone() }

    fn set_token(&mut self, token: &str) -> AppResult<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn remove_token(&mut self) -> AppResult<()> {
        Err(AppError::io("io_error", "permission denied"))
    }
}
