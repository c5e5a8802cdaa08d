//! AWS-oriented adapters and handlers for the template publisher custom
//! resource.
//!
//! This crate owns runtime integration details (the Lambda handler, the
//! CloudFormation response envelope, storage adapters and logging setup) and
//! builds on `template_publisher_core` for the event contract, validation,
//! key derivation and rendering.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
