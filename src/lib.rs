pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod license;
pub mod notify;

pub use error::{AppError, AppResult};
