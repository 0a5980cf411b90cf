use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AppResult;

/// Durable home of the session token between runs.
pub trait TokenStorage: Send + Sync {
    fn get_token(&self) -> Option<String>;
    fn set_token(&mut self, token: &str) -> AppResult<()>;
    fn remove_token(&mut self) -> AppResult<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<String>) -> Self { Self { token } }
}

impl TokenStorage for MemoryTokenStore {
    fn get_token(&self) -> Option<String> { self.token.clone() }

    fn set_token(&mut self, token: &str) -> AppResult<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn remove_token(&mut self) -> AppResult<()> {
        self.token = None;
        Ok(())
    }
}

/// One file holding the raw token.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }
}

impl TokenStorage for FileTokenStore {
    fn get_token(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let tok = raw.trim();
        if tok.is_empty() { None } else { Some(tok.to_string()) }
    }

    fn set_token(&mut self, token: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        debug!(target: "money::session", "token persisted to {}", self.path.display());
        Ok(())
    }

    fn remove_token(&mut self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
