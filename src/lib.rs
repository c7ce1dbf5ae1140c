//! Flux Nova - ephemeral photo messaging client library
//!
//! This library provides the client side of the Flux Nova snap service:
//! the backend API client, the ephemeral snap viewer, session storage and
//! configuration.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: Backend trait, HTTP implementation and wire types
//! - `viewer`: Feed polling, the single-session snap controller and "mark seen"
//! - `auth`: Login session persistence in the OS keyring
//! - `media`: Data URI encoding and decoding of image payloads
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Handlers behind each CLI command
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fluxnova::{Config, HttpBackend, SnapViewer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let backend = Arc::new(HttpBackend::new(&config.api)?.with_token("token"));
//!     let viewer = SnapViewer::start(backend, config.viewer.poll_interval());
//!     viewer.poll_now().await?;
//!     for snap in viewer.feed() {
//!         println!("{} from {}", snap.id, snap.sender.username);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod media;
pub mod viewer;

// Re-export commonly used types
pub use api::{Backend, HttpBackend};
pub use config::Config;
pub use error::{FluxNovaError, Result};
pub use viewer::{OpenOutcome, SnapSessionController, SnapViewer};
