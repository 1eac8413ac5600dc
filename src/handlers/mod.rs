// HTTP request handlers for the Oblio relay
pub mod authenticate;
pub mod health;
pub mod proxy;

// Re-export the main handler functions
pub use authenticate::authenticate;
pub use health::health;
pub use proxy::proxy;
