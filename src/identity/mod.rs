//! Client-side identity: the session store and the flows that populate and clear it.
//! Keep the public surface thin and split implementation across sub-modules.

mod avatar;
mod controller;
mod principal;
mod provider;
mod session;
mod token_store;

pub use avatar::resolve_avatar;
pub use controller::{
    SessionController, EXPIRED_PASSWORD_MSG, INITIAL_PASSWORD_MSG, SECURITY_TITLE, WELCOME_MSG, WELCOME_TITLE,
};
pub use principal::{ProfileResponse, UserProfile};
pub use provider::AuthBackend;
pub use session::{Session, SessionStore, SessionToken, DEFAULT_ROLE};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStorage};
