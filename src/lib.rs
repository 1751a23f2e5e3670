//! # Marquee API
//!
//! A REST API for a multi-tenant movie catalog built with Rust, Axum, and
//! PostgreSQL. Every inbound request passes through a fixed gatekeeping
//! pipeline before any handler runs:
//!
//! 1. **Panic recovery**: an uncaught fault anywhere below becomes a single
//!    well-formed 500 response and the connection is closed
//! 2. **Rate limiting**: an independent token bucket per client IP, with a
//!    background task evicting idle clients
//! 3. **Authentication**: opaque bearer tokens resolved through a one-way
//!    SHA-256 digest lookup; requests without credentials proceed as anonymous
//! 4. **Authorization**: per-route permission checks over the authenticated
//!    user's capability set, applied via extractor types
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── config/           # Environment-driven configuration
//! ├── middleware/       # Rate limiting, authentication, panic recovery
//! ├── modules/          # Feature modules
//! │   ├── healthcheck/ # Liveness endpoint
//! │   ├── movies/      # Movie catalog (permission-gated CRUD)
//! │   ├── tokens/      # Token generation and issuance endpoints
//! │   └── users/       # Registration and account activation
//! └── utils/           # Errors, email, password hashing
//! ```
//!
//! Each feature module follows a consistent structure: `model.rs` for data
//! types and DTOs, `service.rs` for business logic and SQL, `controller.rs`
//! for HTTP handlers, and `router.rs` for route registration.

pub mod config;
pub mod logging;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;
