//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod init;
pub mod secrets;
pub mod systems;
pub mod validate;
pub mod webhook;
