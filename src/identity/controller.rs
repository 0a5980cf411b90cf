use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::avatar::resolve_avatar;
use super::principal::ProfileResponse;
use super::provider::AuthBackend;
use super::session::{Session, SessionStore, DEFAULT_ROLE};
use super::token_store::TokenStorage;
use crate::api::LoginForm;
use crate::config::ClientConfig;
use crate::error::AppResult;
use crate::license::{Advisory, ADVISORY_TITLE};
use crate::notify::{DialogOptions, Navigator, NoticeKind, Presenter, Route};

pub const SECURITY_TITLE: &str = "Security notice";
pub const INITIAL_PASSWORD_MSG: &str = "Your password is still the initial password, please change it!";
pub const EXPIRED_PASSWORD_MSG: &str = "Your password has expired, please change it soon!";
pub const WELCOME_TITLE: &str = "Login successful";
pub const WELCOME_MSG: &str = "Welcome to the system, enjoy!";

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Drives login, profile bootstrap and logout against one backend, and owns the session.
pub struct SessionController<B: AuthBackend> {
    backend: B,
    store: SessionStore,
    tokens: Box<dyn TokenStorage>,
    presenter: Arc<dyn Presenter>,
    navigator: Arc<dyn Navigator>,
    base_api: String,
    default_avatar: String,
    clock: Clock,
}

impl<B: AuthBackend> SessionController<B> {
    /// The session starts out holding whatever token durable storage already has.
    pub fn new(
        backend: B,
        tokens: Box<dyn TokenStorage>,
        presenter: Arc<dyn Presenter>,
        navigator: Arc<dyn Navigator>,
        cfg: &ClientConfig,
    ) -> Self {
        let store = SessionStore::new(tokens.get_token());
        Self {
            backend,
            store,
            tokens,
            presenter,
            navigator,
            base_api: cfg.base_api.clone(),
            default_avatar: cfg.default_avatar.clone(),
            clock: Box::new(Utc::now),
        }
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn session(&self) -> &Session { self.store.session() }

    pub fn tokens(&self) -> &dyn TokenStorage { self.tokens.as_ref() }

    pub fn backend(&self) -> &B { &self.backend }

    pub async fn login(&mut self, form: LoginForm) -> AppResult<()> {
        let form = LoginForm { username: form.username.trim().to_string(), ..form };
        let token = self.backend.login(&form).await?;
        self.tokens.set_token(&token)?;
        self.store.set_token(token);
        info!(target: "money::session", "login succeeded user={}", form.username);
        Ok(())
    }

    /// Fetch the profile and apply it to the session, then run the password prompts
    /// and the license advisory. Only the profile fetch can fail this call.
    pub async fn get_info(&mut self) -> AppResult<ProfileResponse> {
        let token = self.store.session().token.clone();
        let res = self.backend.get_info(&token).await?;

        let avatar = resolve_avatar(res.user.avatar.as_deref(), &self.base_api, &self.default_avatar);
        match res.roles.as_ref().filter(|r| !r.is_empty()) {
            Some(roles) => {
                self.store.set_roles(roles.clone());
                self.store.set_permissions(res.permissions.clone().unwrap_or_default());
            }
            // Permissions are left as they were
            None => self.store.set_roles(vec![DEFAULT_ROLE.to_string()]),
        }
        self.store.set_id(res.user.user_id.clone().unwrap_or_default());
        self.store.set_name(res.user.user_name.clone().unwrap_or_default());
        self.store.set_nick_name(res.user.nick_name.clone().unwrap_or_default());
        self.store.set_avatar(avatar);
        info!(
            target: "money::session",
            "profile loaded user={} roles={} permissions={}",
            self.store.session().user_name,
            self.store.session().roles.len(),
            self.store.session().permissions.len()
        );

        if res.is_default_modify_pwd {
            self.prompt_password_change(INITIAL_PASSWORD_MSG).await;
        } else if res.is_password_expired {
            self.prompt_password_change(EXPIRED_PASSWORD_MSG).await;
        }

        self.show_license_advisory(&token).await;
        Ok(res)
    }

    async fn prompt_password_change(&self, message: &str) {
        let accepted = self
            .presenter
            .confirm(message, SECURITY_TITLE, &DialogOptions::confirm(NoticeKind::Warning))
            .await;
        if accepted {
            self.navigator.push(Route::reset_password());
        } else {
            debug!(target: "money::session", "password change prompt declined");
        }
    }

    async fn show_license_advisory(&self, token: &str) {
        match self.build_advisory(token).await {
            Ok(adv) => {
                info!(target: "money::license", "license advisory: {} server(s), {} expiring soon", adv.lines.len(), adv.expiring_count());
                let options = DialogOptions::alert(NoticeKind::Success).with_html();
                self.presenter.alert(&adv.to_html(), ADVISORY_TITLE, &options).await;
            }
            Err(e) => {
                warn!(target: "money::license", "license check unavailable, showing welcome instead: {}", e);
                self.presenter.alert(WELCOME_MSG, WELCOME_TITLE, &DialogOptions::alert(NoticeKind::Success)).await;
            }
        }
    }

    async fn build_advisory(&self, token: &str) -> AppResult<Advisory> {
        let records = self.backend.license_check(token).await?;
        Advisory::build(&records, (self.clock)())
    }

    /// Server logout. Local state is cleared only once the server accepted it;
    /// from then on the call succeeds even if the stored token cannot be removed.
    pub async fn logout(&mut self) -> AppResult<()> {
        let token = self.store.session().token.clone();
        self.backend.logout(&token).await?;
        self.store.set_token("");
        self.store.set_roles(Vec::new());
        self.store.set_permissions(Vec::new());
        if let Err(e) = self.tokens.remove_token() {
            // The server session is gone; a leftover file is rejected on next use
            warn!(target: "money::session", "logged out but failed to remove stored token: {}", e);
        }
        info!(target: "money::session", "logged out user={}", self.store.session().user_name);
        Ok(())
    }

    /// Drop the local token without telling the server.
    pub fn fed_logout(&mut self) {
        self.store.set_token("");
        if let Err(e) = self.tokens.remove_token() {
            warn!(target: "money::session", "failed to remove stored token: {}", e);
        }
        info!(target: "money::session", "local session cleared");
    }
}
