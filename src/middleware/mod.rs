//! Request-gatekeeping middleware.
//!
//! The pipeline wraps the router in a fixed order, outermost first:
//!
//! 1. [`recover`]: panics anywhere below become controlled 500 responses
//! 2. [`rate_limit`]: per-client token buckets shed excess load before any
//!    credential work is spent
//! 3. [`auth`]: resolves the request's [`auth::Identity`]
//!
//! Authorization is applied per route through the extractor types generated
//! by [`require_permission!`](crate::require_permission), since different
//! routes require different permission codes.

pub mod auth;
pub mod rate_limit;
pub mod recover;
