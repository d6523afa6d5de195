//! `eduapi` - API gateway client for the EvolveEdu learning platform
//!
//! This library wraps every call to the backend REST service in one
//! pipeline: bearer-token authentication on the way out, one diagnostic
//! record per response, and status-driven side effects on the way back
//! (session reset on 401, user notifications on other failures).
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use eduapi::{ApiClient, Config};
//! use eduapi::storage::SqliteStore;
//!
//! # async fn run() -> eduapi::Result<()> {
//! let config = Config::load()?;
//! let store = SqliteStore::open(config.database_path())?;
//! let client = ApiClient::builder(config.api)
//!     .store(Arc::new(store))
//!     .build()?;
//!
//! let notes = client.get("notes/").await?;
//! println!("{}", notes.body());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod classify;
pub mod cli;
pub mod client;
pub mod config;
pub mod effects;
pub mod error;
pub mod logging;
pub mod storage;

pub use classify::{classify, Classification, Effects, Failure, Outcome};
pub use client::{ApiClient, ApiClientBuilder, ApiRequest, ApiResponse};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
