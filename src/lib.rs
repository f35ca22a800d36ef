//! Layered configuration resolver for the containerlab API server.
//!
//! Builds a single [`ResolvedConfig`](config::ResolvedConfig) from:
//! - Built-in defaults for every recognized key
//! - An optional dotenv-style file (`.env` by default)
//! - Process environment variables, which always win
//!
//! # Example
//!
//! ```no_run
//! use clab_api_config::config::resolve;
//!
//! let config = resolve(None).unwrap();
//! println!("binding port {}", config.api_port());
//! println!("tokens live for {:?}", config.jwt_expiration());
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ResolvedConfig, resolve};
pub use error::{ErrorKind, ResolveError, Result};
