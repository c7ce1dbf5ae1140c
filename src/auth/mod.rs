//! Authentication state
//!
//! Login, registration and logout themselves are CLI commands
//! (see `commands::auth`); this module only owns the persisted session.

pub mod session_store;

pub use session_store::{SessionStore, StoredSession};
