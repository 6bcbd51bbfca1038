//! Common utilities and shared types for crowdsource-rs.
//!
//! This crate provides the pieces every widget leans on:
//!
//! - **Configuration**: Widget settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Query strings**: Page filter parameters via [`parse_query`]
//! - **Transport**: The async HTTP seam via [`Transport`] and [`HttpTransport`]
//!
//! # Example
//!
//! ```no_run
//! use crowdsource_common::{AppResult, Config, HttpTransport, parse_query};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let _transport = HttpTransport::new(&config.backend)?;
//!     let params = parse_query("?zip=10001");
//!     println!("Forwarding {} filter(s)", params.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod query;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transport;

pub use config::{BackendConfig, Config, LightboxConfig, MapConfig};
pub use error::{AppError, AppResult};
pub use query::{QueryParams, parse_query, query_from_url, to_query_string};
pub use transport::{HttpResponse, HttpTransport, Transport};
