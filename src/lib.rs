#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the oblio-relay application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod client;
pub mod handlers;
pub mod models;
pub mod obfuscation;
pub mod session;
pub mod settings;
pub mod utils;

/// Re-export commonly used items
pub use client::{ClientError, OblioClient};
pub use models::{ApiExchange, ApiResponse, CredentialPair, Session};
pub use session::SessionStore;
pub use settings::RelaySettings;
