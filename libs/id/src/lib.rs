//! # skiff-id
//!
//! Typed, prefixed identifiers for skiff resources.
//!
//! Registry entities are keyed by system-generated IDs; names are
//! user-controlled labels layered on top. IDs use a prefixed ULID format:
//!
//! - `dep_01HV4Z2WQXKJNM8GPQY6VBKC3D` — deployment
//! - `svc_01HV4Z3MXNKPQR9HSTZ7WCLD4E` — service
//!
//! ULIDs are time-ordered and carry 80 bits of randomness, so IDs stay
//! unique under arbitrary request rates (unlike wall-clock-derived IDs).
//! Every ID round-trips through its canonical string form with strict
//! parsing, and the prefix keeps resource kinds from being mixed up.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations.
pub use ulid::Ulid;
