//! Storage traits for the token core's collaborators.
//!
//! This module defines storage interfaces for:
//!
//! - Revocation entries (shared across service instances)
//! - Client credential registrations
//!
//! In-memory implementations live in [`memory`]. The Redis revocation backend
//! is provided by the `camara-auth-redis` crate.

pub mod client;
pub mod memory;
pub mod revocation;

pub use client::{ClientCredential, CredentialLookup};
pub use memory::{MemoryCredentialStore, MemoryRevocationStore};
pub use revocation::{RevocationStore, revocation_key};
