//! Integration tests for Stratus.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the server against a test platform project
//! cargo run -p stratus-server
//!
//! # Run integration tests
//! cargo test -p stratus-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `auth_flow` - Sign-up / sign-in / sign-out surface tests
//! - `files` - File route access control tests
//!
//! Tests that need an emailed passcode cannot run unattended; the suite
//! covers everything observable without one (redirects, cookie clearing,
//! absence-as-data sign-in results, unauthenticated access).
