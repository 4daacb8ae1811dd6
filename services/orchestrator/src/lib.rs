//! skiff orchestrator
//!
//! A single-node control surface for running multi-replica deployments
//! and services on top of a container runtime. The scheduler owns the
//! in-memory registry and all orchestration logic; the runtime backend,
//! the document store, and the HTTP transport are collaborators around
//! it.

pub mod api;
pub mod config;
pub mod runtime;
pub mod scheduler;
pub mod spec;
pub mod state;
pub mod store;
