//! edgehost
//!
//! Deploys serverless functions together with a directory of static
//! files and serves those files at the function's base URL, with a
//! week-long `Cache-Control` and gzip transfer encoding.

pub mod assets;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod function;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod store;
pub mod watch;

pub use error::{Error, Result};
