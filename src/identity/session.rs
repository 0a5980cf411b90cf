use serde::Serialize;

pub type SessionToken = String;

/// Placeholder role stored when the server supplies none.
pub const DEFAULT_ROLE: &str = "ROLE_DEFAULT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: String,
    pub user_name: String,
    pub nick_name: String,
    pub avatar: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool { !self.token.is_empty() }

    pub fn has_role(&self, role: &str) -> bool { self.roles.iter().any(|r| r == role) }

    /// `*:*:*` grants everything.
    pub fn has_permission(&self, perm: &str) -> bool {
        self.permissions.iter().any(|p| p == "*:*:*" || p == perm)
    }
}

/// Sole owner of the client session. Readers get `&Session`; writers go through the setters.
#[derive(Debug, Default)]
pub struct SessionStore {
    state: Session,
}

impl SessionStore {
    pub fn new(token: Option<SessionToken>) -> Self {
        Self { state: Session { token: token.unwrap_or_default(), ..Default::default() } }
    }

    pub fn session(&self) -> &Session { &self.state }

    pub fn set_token(&mut self, token: impl Into<SessionToken>) { self.state.token = token.into(); }
    pub fn set_id(&mut self, id: impl Into<String>) { self.state.user_id = id.into(); }
    pub fn set_name(&mut self, name: impl Into<String>) { self.state.user_name = name.into(); }
    pub fn set_nick_name(&mut self, nick: impl Into<String>) { self.state.nick_name = nick.into(); }
    pub fn set_avatar(&mut self, avatar: impl Into<String>) { self.state.avatar = avatar.into(); }
    pub fn set_roles(&mut self, roles: Vec<String>) { self.state.roles = roles; }
    pub fn set_permissions(&mut self, permissions: Vec<String>) { self.state.permissions = permissions; }
}
