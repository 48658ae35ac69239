//! Core domain concepts shared across all subdomains.
//!
//! - [`participant`] - participant id helpers (`provider` / `provider:model`)
//! - [`error::DomainError`] - configuration errors

pub mod error;
pub mod participant;
