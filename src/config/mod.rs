//! Configuration modules for the Marquee API.
//!
//! Each submodule handles one aspect of configuration, loaded once from
//! environment variables at startup. Nothing here is hot-reloadable.
//!
//! # Modules
//!
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`database`]: PostgreSQL database connection pool initialization
//! - [`email`]: Email/SMTP configuration for sending notifications
//! - [`rate_limit`]: Per-client rate limiting configuration
//! - [`server`]: Listen port and environment name

pub mod cors;
pub mod database;
pub mod email;
pub mod rate_limit;
pub mod server;
