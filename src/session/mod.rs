//! Persisted login state
//!
//! One session record, stored as plain JSON under a fixed file path. The
//! store never retries and never surfaces IO problems to the caller: a
//! session that cannot be read or written simply does not exist, and the
//! user is asked to log in again.

pub mod store;

pub use store::SessionStore;
