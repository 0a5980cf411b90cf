//! Presentation surface used by the session flows: modal confirm/alert and route navigation.
//! The console implementations back the CLI; GUIs and tests provide their own.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogOptions {
    pub confirm_text: String,
    pub cancel_text: Option<String>,
    pub kind: NoticeKind,
    /// Body is HTML rather than plain text.
    pub html: bool,
}

impl DialogOptions {
    pub fn alert(kind: NoticeKind) -> Self {
        Self { confirm_text: "OK".into(), cancel_text: None, kind, html: false }
    }

    pub fn confirm(kind: NoticeKind) -> Self {
        Self { confirm_text: "OK".into(), cancel_text: Some("Cancel".into()), kind, html: false }
    }

    pub fn with_html(mut self) -> Self {
        self.html = true;
        self
    }
}

#[async_trait]
pub trait Presenter: Send + Sync {
    /// Resolves `true` when the user accepts; dismissing counts as declining.
    async fn confirm(&self, message: &str, title: &str, options: &DialogOptions) -> bool;
    async fn alert(&self, message: &str, title: &str, options: &DialogOptions);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub params: Vec<(String, String)>,
}

impl Route {
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), params: Vec::new() } }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Profile page opened on the password reset tab.
    pub fn reset_password() -> Self { Route::new("Profile").param("activeTab", "resetPwd") }
}

pub trait Navigator: Send + Sync {
    fn push(&self, route: Route);
}

static BREAK_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</div>|<hr[^>]*>").unwrap());
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Flatten an HTML dialog body to plain text lines for a terminal.
pub fn html_to_text(html: &str) -> String {
    let with_breaks = BREAK_TAGS.replace_all(html, "\n");
    let stripped = ANY_TAG.replace_all(&with_breaks, "");
    let text = stripped.replace("&lt;", "<").replace("&gt;", ">").replace("&quot;", "\"").replace("&amp;", "&");
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join("\n")
}

/// Prints dialogs to stdout and reads answers from stdin.
/// Non-interactive mode declines every confirmation.
#[derive(Debug, Clone, Default)]
pub struct ConsolePresenter {
    pub interactive: bool,
}

impl ConsolePresenter {
    pub fn new(interactive: bool) -> Self { Self { interactive } }

    fn render(message: &str, title: &str, options: &DialogOptions) -> String {
        let body = if options.html { html_to_text(message) } else { message.to_string() };
        format!("[{:?}] {}\n{}", options.kind, title, body)
    }
}

#[async_trait]
impl Presenter for ConsolePresenter {
    async fn confirm(&self, message: &str, title: &str, options: &DialogOptions) -> bool {
        println!("{}", Self::render(message, title, options));
        if !self.interactive {
            return false;
        }
        let prompt = format!(
            "{} [y] / {} [n]: ",
            options.confirm_text,
            options.cancel_text.as_deref().unwrap_or("Cancel")
        );
        let answer = tokio::task::spawn_blocking(move || {
            print!("{}", prompt);
            let _ = io::stdout().flush();
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;
        match answer {
            Ok(Ok(line)) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }

    async fn alert(&self, message: &str, title: &str, options: &DialogOptions) {
        println!("{}", Self::render(message, title, options));
    }
}

/// Logs navigation requests; the CLI has no pages to open.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn push(&self, route: Route) {
        let params = route.params.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join(",");
        info!(target: "money::session", "navigate to {} ({})", route.name, params);
        println!("-> open page '{}' {}", route.name, params);
    }
}
