//! Shared template publisher domain primitives.
//!
//! This crate owns the custom-resource event contract, property validation,
//! variable merging, destination key derivation and template rendering. It
//! intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod properties;
pub mod render;
pub mod storage_keys;
pub mod variables;
