//! # Reportdesk
//!
//! A self-hostable report desk. Authors file violation reports with an
//! optional photo and signature; the designated commander accepts, rejects
//! and countersigns them. Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! reportdesk = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reportdesk::config::ServerConfig;
//! use reportdesk::server::{AppState, create_router};
//! use reportdesk::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config).unwrap());
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `reportdesk` binary. Disable with `default-features = false`.

pub mod attachments;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
pub mod workflow;
